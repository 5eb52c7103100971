use crate::parsers::{
    cursor::ByteCursor, field::DeclaredName, BlendParseError, IndexKind, PointerSize, Result,
};
use std::convert::TryFrom;

/// The type catalog ("SDNA") of a blend file: every field name, every type and the layout of every struct Blender
/// wrote. Everything else refers to it through indices.
#[derive(Debug, Clone)]
pub struct Dna {
    pub names: Vec<DeclaredName>,
    pub types: Vec<DnaType>,
    pub structs: Vec<DnaStruct>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaType {
    /// Position of this type in `Dna::types`.
    pub id: usize,
    pub name: String,
    /// Size in bytes of the type. Types stored with size 0 are opaque pointer-sized placeholders and get the file's
    /// pointer size instead.
    pub bytes_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaField {
    pub type_index: usize, //index on Dna::types array
    pub name_index: usize, //index on Dna::names array
    /// Byte offset of the field inside its struct.
    pub offset: usize,
    /// Bytes this field takes up in the struct.
    pub bytes_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaStruct {
    pub type_index: usize, //index on Dna::types array
    pub fields: Vec<DnaField>,
    /// Sum of the length of every field, which is where the next field would start.
    pub fields_len: usize,
}

impl Dna {
    pub fn struct_type(&self, r#struct: &DnaStruct) -> &DnaType {
        &self.types[r#struct.type_index]
    }

    /// Finds the struct whose type is named `name`.
    pub fn struct_by_name(&self, name: &str) -> Option<(usize, &DnaStruct)> {
        self.structs
            .iter()
            .enumerate()
            .find(|(_, s)| self.types[s.type_index].name == name)
    }

    /// Finds the struct describing the type at `type_index`, if the type is a struct at all.
    pub fn struct_by_type_index(&self, type_index: usize) -> Option<(usize, &DnaStruct)> {
        self.structs
            .iter()
            .enumerate()
            .find(|(_, s)| s.type_index == type_index)
    }
}

/// How many bytes a field takes up in its struct. Pointers take the pointer size (times the first array dimension for
/// arrays of pointers), value arrays take the type size times every sized dimension and everything else takes the
/// type size. There is no alignment padding, Blender writes its structs already packed.
pub fn field_len(name: &DeclaredName, type_len: usize, pointer_size: PointerSize) -> Result<usize> {
    let len = if name.is_pointer() {
        let amount = match name.array_dimensions.first() {
            Some(&dimension) if dimension > 0 => {
                usize::try_from(dimension).map_err(|_| name.too_large())?
            }
            _ => 1,
        };
        pointer_size.bytes_num().checked_mul(amount)
    } else {
        match name.element_count()? {
            Some(multi) if multi != 0 => type_len.checked_mul(multi),
            _ => Some(type_len),
        }
    };
    len.ok_or_else(|| name.too_large())
}

fn check_index(index: usize, len: usize, kind: IndexKind) -> Result<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(BlendParseError::CorruptIndex { kind, index, len })
    }
}

#[derive(Debug)]
pub struct DnaParseContext {
    pointer_size: PointerSize,
}

impl DnaParseContext {
    pub fn new(pointer_size: PointerSize) -> Self {
        Self { pointer_size }
    }

    fn section_tag(&self, cursor: &mut ByteCursor, expected: &str) -> Result<()> {
        let offset = cursor.position();
        let found = cursor.read_fixed_or_terminated(4)?;
        if found != expected {
            return Err(BlendParseError::invalid_format(format!(
                "expected DNA section {} at offset {}, found {:?}",
                expected, offset, found
            )));
        }
        Ok(())
    }

    fn names(&self, cursor: &mut ByteCursor) -> Result<Vec<DeclaredName>> {
        self.section_tag(cursor, "NAME")?;
        let names_len = cursor.read_len()?;

        let mut names = Vec::new();
        for _ in 0..names_len {
            names.push(DeclaredName::parse(cursor.read_fixed_or_terminated(0)?));
        }
        cursor.align_to_4()?;

        Ok(names)
    }

    fn types(&self, cursor: &mut ByteCursor) -> Result<Vec<DnaType>> {
        self.section_tag(cursor, "TYPE")?;
        let types_len = cursor.read_len()?;

        let mut types = Vec::new();
        for id in 0..types_len {
            types.push(DnaType {
                id,
                name: cursor.read_fixed_or_terminated(0)?,
                bytes_len: 0,
            });
        }
        cursor.align_to_4()?;

        self.section_tag(cursor, "TLEN")?;
        for r#type in types.iter_mut() {
            r#type.bytes_len = match cursor.read_u16()? {
                0 => self.pointer_size.bytes_num(),
                len => usize::from(len),
            };
        }
        cursor.align_to_4()?;

        Ok(types)
    }

    fn structs(
        &self,
        cursor: &mut ByteCursor,
        names: &[DeclaredName],
        types: &[DnaType],
    ) -> Result<Vec<DnaStruct>> {
        self.section_tag(cursor, "STRC")?;
        let structs_len = cursor.read_len()?;

        let mut structs = Vec::new();
        for _ in 0..structs_len {
            let type_index =
                check_index(usize::from(cursor.read_u16()?), types.len(), IndexKind::Type)?;
            let fields_num = cursor.read_u16()?;

            let mut fields = Vec::new();
            let mut offset: usize = 0;
            for _ in 0..fields_num {
                let field_type_index =
                    check_index(usize::from(cursor.read_u16()?), types.len(), IndexKind::Type)?;
                let field_name_index =
                    check_index(usize::from(cursor.read_u16()?), names.len(), IndexKind::Name)?;

                let bytes_len = field_len(
                    &names[field_name_index],
                    types[field_type_index].bytes_len,
                    self.pointer_size,
                )?;

                fields.push(DnaField {
                    type_index: field_type_index,
                    name_index: field_name_index,
                    offset,
                    bytes_len,
                });
                offset = offset.checked_add(bytes_len).ok_or_else(|| {
                    BlendParseError::invalid_format(format!(
                        "struct {} is too large",
                        types[type_index].name
                    ))
                })?;
            }

            let r#type = &types[type_index];
            if offset != r#type.bytes_len {
                tracing::warn!(
                    "struct {} has {} bytes of fields but a declared size of {}",
                    r#type.name,
                    offset,
                    r#type.bytes_len
                );
            }

            structs.push(DnaStruct {
                type_index,
                fields,
                fields_len: offset,
            });
        }
        cursor.align_to_4()?;

        Ok(structs)
    }

    /// Parses the payload of the DNA block. `cursor` must be at the start of the payload.
    pub fn dna(&self, cursor: &mut ByteCursor) -> Result<Dna> {
        self.section_tag(cursor, "SDNA")?;
        let names = self.names(cursor)?;
        let types = self.types(cursor)?;
        let structs = self.structs(cursor, &names, &types)?;

        tracing::debug!(
            "DNA: {} names, {} types, {} structs",
            names.len(),
            types.len(),
            structs.len()
        );

        Ok(Dna {
            names,
            types,
            structs,
        })
    }
}
