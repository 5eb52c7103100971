pub mod blend;
pub mod cursor;
pub mod dna;
pub mod field;
pub mod primitive;

use std::{fmt, io};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlendParseError>;

/// Size of a pointer on the machine used to create the .blend file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerSize {
    Bits32,
    Bits64,
}

impl PointerSize {
    /// Returns the pointer size in bytes.
    pub fn bytes_num(self) -> usize {
        match self {
            PointerSize::Bits32 => 4,
            PointerSize::Bits64 => 8,
        }
    }
}

/// Endianness of the machine used to create the .blend file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Which table of the catalog (or the directory) an out-of-range index pointed into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IndexKind {
    Name,
    Type,
    Structure,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexKind::Name => "name",
            IndexKind::Type => "type",
            IndexKind::Structure => "structure",
        };
        f.write_str(s)
    }
}

/// Errors that abort loading a .blend file. A load either succeeds completely or returns one of these, no partially
/// loaded file is ever handed out.
///
/// Lookups that find nothing (a missing address, an ordinal past the end) are not errors, they return `None`.
#[derive(Debug, Error)]
pub enum BlendParseError {
    /// Bad magic (even after decompression), unknown pointer size or endianness marker, a catalog sub-section with
    /// the wrong tag or the `ENDB` terminator showing up before the catalog block.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// A fixed width read needed more bytes than the stream had left.
    #[error("stream truncated at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// An index read from the catalog or from a block header is out of range. The catalog and the directory disagree
    /// and the file can't be interpreted.
    #[error("corrupt {kind} index {index} (table has {len} entries)")]
    CorruptIndex {
        kind: IndexKind,
        index: usize,
        len: usize,
    },
    /// The stream didn't start with the magic and could not be decompressed either.
    /// A block handed to `Blend::decode` that isn't an entry of that file's directory.
    #[error("block @{memory_address:#x} does not belong to this file")]
    ForeignBlock { memory_address: u64 },
    #[error("could not decompress stream: {0}")]
    Decompression(#[source] io::Error),
    #[error(transparent)]
    IoError(#[from] io::Error),
}

impl BlendParseError {
    pub(crate) fn invalid_format<T: Into<String>>(reason: T) -> Self {
        BlendParseError::InvalidFormat(reason.into())
    }
}
