use crate::{
    parsers::{
        blend::Block,
        cursor::ByteCursor,
        field::FieldInfo,
        primitive::BlendPrimitive,
        BlendParseError, Endianness, PointerSize, Result,
    },
    runtime::{BlockDecoder, FieldView, StructView},
};
use linked_hash_map::LinkedHashMap;
use std::{convert::TryFrom, fmt};

/// A decoded field value. Pointers are kept as the raw addresses stored in the file, nothing is dereferenced.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    /// `char` arrays, read up to the first NUL. Arrays of `char` arrays are an `Array` of these, one per row.
    String(String),
    /// An address, 0 for null pointers. Function pointers are stored the same way.
    Pointer(u64),
    /// Value and pointer arrays, flattened in declaration order.
    Array(Vec<Value>),
    Struct(Record),
    /// Bytes of a primitive this crate doesn't know how to read.
    Opaque(Vec<u8>),
}

/// One struct instance: field values by clean field name, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub fields: LinkedHashMap<String, Value>, //We use a LinkedHashMap here because we want to preserve insertion order
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A decoded block. The payload of a block can hold more than one struct, `records` has one entry per struct.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRecord {
    pub code: String,
    pub memory_address: u64,
    pub records: Vec<Record>,
}

impl BlockRecord {
    /// The first struct of the block, for blocks that hold a single one (which is most of them).
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Pointer(0) => write!(f, "null"),
            Value::Pointer(v) => write!(f, "@{:#x}", v),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Struct(record) => write!(f, "{}", record),
            Value::Opaque(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ ", self.type_name)?;
        for (name, value) in self.fields.iter().filter(|(n, _)| !n.starts_with("_pad")) {
            write!(f, "{}: {}, ", name, value)?;
        }
        write!(f, "}}")
    }
}

fn primitive<T: BlendPrimitive>(type_name: &str, data: &[u8], endianness: Endianness) -> Option<T> {
    if T::blender_names().iter().any(|name| *name == type_name) {
        T::parse(data, endianness)
    } else {
        None
    }
}

fn primitive_value(type_name: &str, data: &[u8], endianness: Endianness) -> Value {
    primitive::<u8>(type_name, data, endianness)
        .map(|v| Value::UInt(v.into()))
        .or_else(|| primitive::<i8>(type_name, data, endianness).map(|v| Value::Int(v.into())))
        .or_else(|| primitive::<u16>(type_name, data, endianness).map(|v| Value::UInt(v.into())))
        .or_else(|| primitive::<i16>(type_name, data, endianness).map(|v| Value::Int(v.into())))
        .or_else(|| primitive::<u32>(type_name, data, endianness).map(|v| Value::UInt(v.into())))
        .or_else(|| primitive::<i32>(type_name, data, endianness).map(|v| Value::Int(v.into())))
        .or_else(|| primitive::<u64>(type_name, data, endianness).map(Value::UInt))
        .or_else(|| primitive::<i64>(type_name, data, endianness).map(Value::Int))
        .or_else(|| primitive::<f32>(type_name, data, endianness).map(|v| Value::Float(v.into())))
        .or_else(|| primitive::<f64>(type_name, data, endianness).map(Value::Float))
        .unwrap_or_else(|| Value::Opaque(data.to_vec()))
}

fn string(data: &[u8]) -> Value {
    let string: Vec<u8> = data.iter().take_while(|&&b| b != 0).cloned().collect();
    Value::String(String::from_utf8_lossy(&string).into_owned())
}

/// `char name[64]` is one string, `char names[8][64]` is an array of 8 strings of 64 bytes each.
fn strings(field: &FieldView, data: &[u8]) -> Value {
    let row_len = match field.name().array_dimensions.last() {
        Some(&d) if d > 0 => usize::try_from(d).unwrap_or(data.len()),
        _ => data.len(),
    };

    if row_len == 0 || row_len >= data.len() {
        string(data)
    } else {
        Value::Array(data.chunks(row_len).map(string).collect())
    }
}

/// Structs nested by value deeper than this are rejected, a well formed file never gets close.
const MAX_DEPTH: usize = 64;

struct Layout {
    endianness: Endianness,
    pointer_size: PointerSize,
}

impl Layout {
    fn pointer(&self, data: &[u8]) -> Result<u64> {
        ByteCursor::new(data, self.endianness, self.pointer_size).read_pointer()
    }

    fn pointers(&self, data: &[u8]) -> Result<Vec<Value>> {
        data.chunks(self.pointer_size.bytes_num())
            .map(|chunk| self.pointer(chunk).map(Value::Pointer))
            .collect()
    }

    /// One element of a field: a nested struct or a primitive.
    fn element(&self, field: &FieldView, data: &[u8], depth: usize) -> Result<Value> {
        match field.structure() {
            Some(structure) => self.record(structure, data, depth + 1).map(Value::Struct),
            None => Ok(primitive_value(&field.r#type().name, data, self.endianness)),
        }
    }

    fn field(&self, field: &FieldView, data: &[u8], depth: usize) -> Result<Value> {
        match field.name().info() {
            FieldInfo::Pointer { .. } | FieldInfo::FnPointer => self.pointer(data).map(Value::Pointer),
            FieldInfo::PointerArray { .. } => self.pointers(data).map(Value::Array),
            FieldInfo::Value => self.element(field, data, depth),
            FieldInfo::ValueArray { .. } => {
                if field.r#type().name == "char" {
                    return Ok(strings(field, data));
                }

                let element_len = field.r#type().bytes_len.max(1);
                data.chunks(element_len)
                    .map(|chunk| self.element(field, chunk, depth))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
        }
    }

    fn record(&self, structure: StructView, data: &[u8], depth: usize) -> Result<Record> {
        if depth > MAX_DEPTH {
            return Err(BlendParseError::invalid_format(format!(
                "struct {} nested more than {} levels deep",
                structure.name(),
                MAX_DEPTH
            )));
        }

        let mut fields = LinkedHashMap::new();

        for field in structure.fields() {
            let start = field.offset();
            let end = start + field.bytes_len();
            let field_data = data.get(start..end).ok_or(BlendParseError::TruncatedStream {
                offset: start,
                needed: field.bytes_len(),
                available: data.len().saturating_sub(start),
            })?;

            fields.insert(
                field.name().clean_name.clone(),
                self.field(&field, field_data, depth)?,
            );
        }

        Ok(Record {
            type_name: String::from(structure.name()),
            fields,
        })
    }
}

/// Decodes every field of every struct in a block, using the offsets computed from the DNA.
///
/// The number of structs decoded is the block count, capped by how many whole structs fit in the payload. `DATA`
/// blocks holding plain arrays are bound to whatever struct their header names and decode as garbage, use the raw
/// bytes (`Blend::data`) for those.
#[derive(Debug, Default, Copy, Clone)]
pub struct RecordDecoder;

impl BlockDecoder for RecordDecoder {
    type Record = BlockRecord;

    fn decode(
        &self,
        block: &Block,
        structure: StructView<'_>,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<BlockRecord> {
        let payload = cursor.read_bytes(block.size)?;
        let layout = Layout {
            endianness: cursor.endianness(),
            pointer_size: cursor.pointer_size(),
        };

        let stride = structure.size().max(structure.fields_len());
        let count = if stride == 0 {
            block.count
        } else {
            block.count.min(payload.len() / stride)
        };

        let mut records = Vec::new();
        for i in 0..count {
            let data = &payload[i * stride..];
            records.push(layout.record(structure, data, 0)?);
        }

        Ok(BlockRecord {
            code: block.code.clone(),
            memory_address: block.memory_address,
            records,
        })
    }
}
