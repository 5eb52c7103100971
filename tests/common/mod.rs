#![allow(dead_code)]

use blendfile::{Endianness, PointerSize};
use libflate::gzip::Encoder;
use std::io::Write;

/// Writes synthetic .blend files, block by block.
pub struct BlendWriter {
    pub pointer_size: PointerSize,
    pub endianness: Endianness,
    data: Vec<u8>,
}

impl BlendWriter {
    pub fn new(pointer_size: PointerSize, endianness: Endianness) -> Self {
        let mut writer = BlendWriter {
            pointer_size,
            endianness,
            data: Vec::new(),
        };
        writer.data.extend_from_slice(b"BLENDER");
        writer.data.push(match pointer_size {
            PointerSize::Bits32 => b'_',
            PointerSize::Bits64 => b'-',
        });
        writer.data.push(match endianness {
            Endianness::Little => b'v',
            Endianness::Big => b'V',
        });
        writer.data.extend_from_slice(b"280");
        writer
    }

    pub fn block(&mut self, code: &[u8], address: u64, dna_index: u32, count: u32, payload: &[u8]) -> &mut Self {
        let mut padded_code = [0u8; 4];
        padded_code[..code.len()].copy_from_slice(code);
        self.data.extend_from_slice(&padded_code);
        let size = u32_bytes(payload.len() as u32, self.endianness);
        self.data.extend_from_slice(&size);
        let address = pointer_bytes(address, self.pointer_size, self.endianness);
        self.data.extend_from_slice(&address);
        self.data.extend_from_slice(&u32_bytes(dna_index, self.endianness));
        self.data.extend_from_slice(&u32_bytes(count, self.endianness));
        self.data.extend_from_slice(payload);
        self
    }

    pub fn dna(&mut self, dna: &DnaSpec) -> &mut Self {
        let payload = dna.payload(self.endianness);
        self.block(b"DNA1", 0x9999, 0, 1, &payload)
    }

    pub fn end(&mut self) -> &mut Self {
        self.data.extend_from_slice(b"ENDB");
        self.data.extend_from_slice(&[0; 4]);
        let null = pointer_bytes(0, self.pointer_size, self.endianness);
        self.data.extend_from_slice(&null);
        self.data.extend_from_slice(&[0; 8]);
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        self.data.clone()
    }
}

pub fn u16_bytes(v: u16, endianness: Endianness) -> Vec<u8> {
    match endianness {
        Endianness::Little => v.to_le_bytes().to_vec(),
        Endianness::Big => v.to_be_bytes().to_vec(),
    }
}

pub fn u32_bytes(v: u32, endianness: Endianness) -> Vec<u8> {
    match endianness {
        Endianness::Little => v.to_le_bytes().to_vec(),
        Endianness::Big => v.to_be_bytes().to_vec(),
    }
}

pub fn f32_bytes(v: f32, endianness: Endianness) -> Vec<u8> {
    u32_bytes(v.to_bits(), endianness)
}

pub fn pointer_bytes(v: u64, pointer_size: PointerSize, endianness: Endianness) -> Vec<u8> {
    match (pointer_size, endianness) {
        (PointerSize::Bits32, _) => u32_bytes(v as u32, endianness),
        (PointerSize::Bits64, Endianness::Little) => v.to_le_bytes().to_vec(),
        (PointerSize::Bits64, Endianness::Big) => v.to_be_bytes().to_vec(),
    }
}

fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

/// The content of a DNA block.
pub struct DnaSpec {
    pub names: Vec<&'static str>,
    pub types: Vec<(&'static str, u16)>,
    /// (type index, [(field type index, field name index)])
    pub structs: Vec<(u16, Vec<(u16, u16)>)>,
}

impl DnaSpec {
    pub fn payload(&self, endianness: Endianness) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"SDNA");

        data.extend_from_slice(b"NAME");
        data.extend_from_slice(&u32_bytes(self.names.len() as u32, endianness));
        for name in &self.names {
            data.extend_from_slice(name.as_bytes());
            data.push(0);
        }
        pad4(&mut data);

        data.extend_from_slice(b"TYPE");
        data.extend_from_slice(&u32_bytes(self.types.len() as u32, endianness));
        for (name, _) in &self.types {
            data.extend_from_slice(name.as_bytes());
            data.push(0);
        }
        pad4(&mut data);

        data.extend_from_slice(b"TLEN");
        for (_, len) in &self.types {
            data.extend_from_slice(&u16_bytes(*len, endianness));
        }
        pad4(&mut data);

        data.extend_from_slice(b"STRC");
        data.extend_from_slice(&u32_bytes(self.structs.len() as u32, endianness));
        for (type_index, fields) in &self.structs {
            data.extend_from_slice(&u16_bytes(*type_index, endianness));
            data.extend_from_slice(&u16_bytes(fields.len() as u16, endianness));
            for (field_type, field_name) in fields {
                data.extend_from_slice(&u16_bytes(*field_type, endianness));
                data.extend_from_slice(&u16_bytes(*field_name, endianness));
            }
        }
        pad4(&mut data);

        data
    }
}

pub const THING_ADDRESS: u64 = 0x1000;
pub const NAMED_ADDRESS: u64 = 0x2000;
pub const DATA_ADDRESS: u64 = 0x3000;

/// Two structs:
///
/// ```text
/// struct Thing { int foo[3]; float *bar[3]; Thing *baz; };
/// struct Named { int id; char name[8]; void (*func)(); Named *next; };
/// ```
///
/// `void` is stored with size 0.
pub fn sample_dna(pointer_size: PointerSize) -> DnaSpec {
    let p = pointer_size.bytes_num() as u16;
    DnaSpec {
        names: vec!["foo[3]", "*bar[3]", "*baz", "id", "name[8]", "(*func)()", "*next"],
        types: vec![
            ("char", 1),
            ("int", 4),
            ("float", 4),
            ("void", 0),
            ("Thing", 12 + 4 * p),
            ("Named", 12 + 2 * p),
        ],
        structs: vec![
            (4, vec![(1, 0), (2, 1), (4, 2)]),
            (5, vec![(1, 3), (0, 4), (3, 5), (5, 6)]),
        ],
    }
}

pub fn thing_payload(pointer_size: PointerSize, endianness: Endianness) -> Vec<u8> {
    let mut data = Vec::new();
    for foo in &[1u32, 2, 3] {
        data.extend(u32_bytes(*foo, endianness));
    }
    for bar in &[0x10u64, 0, 0x30] {
        data.extend(pointer_bytes(*bar, pointer_size, endianness));
    }
    data.extend(pointer_bytes(THING_ADDRESS, pointer_size, endianness));
    data
}

pub fn named_payload(
    id: u32,
    name: &str,
    next: u64,
    pointer_size: PointerSize,
    endianness: Endianness,
) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend(u32_bytes(id, endianness));
    let mut name_bytes = [0u8; 8];
    name_bytes[..name.len()].copy_from_slice(name.as_bytes());
    data.extend_from_slice(&name_bytes);
    data.extend(pointer_bytes(0, pointer_size, endianness));
    data.extend(pointer_bytes(next, pointer_size, endianness));
    data
}

/// A complete file: one `Thing`, one `Named` and a `DATA` block with two more `Named`, then the DNA and `ENDB`.
pub fn sample_blend(pointer_size: PointerSize, endianness: Endianness) -> Vec<u8> {
    let mut data_payload = named_payload(1, "first", DATA_ADDRESS, pointer_size, endianness);
    data_payload.extend(named_payload(2, "second", 0, pointer_size, endianness));

    BlendWriter::new(pointer_size, endianness)
        .block(b"TH", THING_ADDRESS, 0, 1, &thing_payload(pointer_size, endianness))
        .block(
            b"NA",
            NAMED_ADDRESS,
            1,
            1,
            &named_payload(7, "cube", THING_ADDRESS, pointer_size, endianness),
        )
        .block(b"DATA", DATA_ADDRESS, 1, 2, &data_payload)
        .dna(&sample_dna(pointer_size))
        .end()
        .finish()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder::new(Vec::new()).expect("gzip encoder");
    encoder.write_all(data).expect("gzip write");
    encoder.finish().into_result().expect("gzip finish")
}
