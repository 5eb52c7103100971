//! # blendfile - A loader for Blender's .blend files
//!
//! ## Example
//!
//! ```ignore
//! use blendfile::{Blend, Value};
//!
//! /// Prints the name of every object
//! fn main() -> Result<(), blendfile::BlendParseError> {
//!     let blend = Blend::from_path("file.blend")?;
//!
//!     for block in blend.blocks_of_type("Object") {
//!         let object = blend.decode_block(block)?;
//!         if let Some(Value::Struct(id)) = object.first().and_then(|o| o.get("id")) {
//!             println!("{:?} at @{:#x}", id.get("name"), block.memory_address);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## The .blend file
//!
//! Blender creates the save file by dumping its memory to the disk, this means that a .blend file is a list of C-like
//! structs which can contain primitives, arrays, pointers and other structs. The layout of those structs changes from
//! version to version and from machine to machine, so the file carries its own description:
//!
//! - a 12 byte header: the `BLENDER` magic, the pointer size (`_` for 4 bytes, `-` for 8), the endianness (`v` for
//!   little, `V` for big) and a 3 digit version;
//! - a list of blocks, each with a 4 byte code, the payload length, the address the data had in memory, the index of
//!   its struct and how many structs the payload holds;
//! - the DNA block (`DNA1`), which lists every field name, every type with its size and every struct with its
//!   fields. It is written right before the `ENDB` terminator.
//!
//! Pointers stored inside a block refer to the memory address recorded in another block's header, which is why blocks
//! can be looked up by address.
//!
//! ### Learn more
//!
//! Documentation on the .blend file is a bit sparse, but the most common source is the [Mystery of the Blend](https://github.com/fschutt/mystery-of-the-blend-backup).
//!
//! ## This crate
//!
//! Loading a file (`Blend::from_path`, `Blend::from_data`, `Blend::from_bytes`) decompresses it if it is gzipped,
//! reads the header, indexes the blocks and parses the DNA, computing the offset of every field of every struct. If
//! any of this fails the load fails, there is no partially loaded file.
//!
//! Block payloads are not read until they are decoded. `Blend::decode` hands the payload and the struct the block is
//! bound to to a `BlockDecoder` and caches the result by memory address: decoding the same address twice returns the
//! same `Arc`. The default decoder, `RecordDecoder`, reads every field into a `Value`; implement `BlockDecoder` to
//! build your own types instead.
//!
//! `Blend::report` lists every struct layout and every block, which is the easiest way to find out what to read from a
//! file.
//!
//! ### Limitations
//!
//! This crate does not support writing .blend files. It only knows where fields are and how big they are, what a field
//! means in a given Blender version is up to the caller.

pub mod compression;
pub mod options;
pub mod parsers;
pub mod record;
pub mod report;
pub mod runtime;

pub use compression::{Decompress, Gzip};
pub use options::LoadOptions;
pub use parsers::{
    blend::{Block, Header},
    cursor::ByteCursor,
    dna::{Dna, DnaField, DnaStruct, DnaType},
    field::{DeclaredName, FieldInfo},
    BlendParseError, Endianness, IndexKind, PointerSize, Result,
};
pub use record::{BlockRecord, Record, RecordDecoder, Value};
pub use report::Report;
pub use runtime::{Blend, BlockDecoder, FieldView, StructView};
