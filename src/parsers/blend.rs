use crate::parsers::{
    cursor::ByteCursor,
    dna::{Dna, DnaParseContext},
    BlendParseError, Endianness, IndexKind, PointerSize, Result,
};
use nom::{branch::alt, bytes::complete::tag, IResult};

/// Every uncompressed .blend file starts with these 7 bytes.
pub const MAGIC: &[u8; 7] = b"BLENDER";
/// Code of the block holding the type catalog. Older files may use `SDNA` as the block code as well.
pub const DNA_CODES: [&str; 2] = ["DNA1", "SDNA"];
/// Code of the terminator block, always the very last one in the file.
pub const END_CODE: &str = "ENDB";

type NomResult<'a, T> = IResult<&'a [u8], T, ()>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// The size of the pointer on the machine used to save the blend file.
    pub pointer_size: PointerSize,
    /// The endianness on the machine used to save the blend file.
    pub endianness: Endianness,
    /// The version of Blender used to save the blend file, verbatim (`"280"`, `"305"`, ...).
    pub version: String,
}

/// One entry of the block directory. Blocks are only indexed when the file is loaded, their payload is interpreted
/// later, on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The block code with the NUL padding removed: `"OB"`, `"ME"`, `"DATA"`, `"DNA1"`...
    pub code: String,
    /// Length in bytes of the payload.
    pub size: usize,
    /// Address the data had in Blender's memory when the file was saved. Pointers stored inside other blocks refer to
    /// this value, which makes it a stable key for the block.
    pub memory_address: u64,
    /// Index of the block's struct in `Dna::structs`, as recorded in the header.
    pub dna_index: usize,
    /// The payload can contain more than one struct, count tells us how many there are.
    pub count: usize,
    /// Position of the payload in the (decompressed) stream.
    pub offset: usize,
    structure: Option<usize>,
}

impl Block {
    /// Index of the struct this block was bound to when the file was linked, `None` before that.
    pub fn structure(&self) -> Option<usize> {
        self.structure
    }

    pub fn is_dna(&self) -> bool {
        DNA_CODES.iter().any(|code| *code == self.code)
    }
}

fn pointer_size_bits32(input: &[u8]) -> NomResult<PointerSize> {
    let (input, _) = tag("_")(input)?;
    Ok((input, PointerSize::Bits32))
}

fn pointer_size_bits64(input: &[u8]) -> NomResult<PointerSize> {
    let (input, _) = tag("-")(input)?;
    Ok((input, PointerSize::Bits64))
}

pub fn pointer_size(input: &[u8]) -> NomResult<PointerSize> {
    alt((pointer_size_bits32, pointer_size_bits64))(input)
}

fn endianness_little(input: &[u8]) -> NomResult<Endianness> {
    let (input, _) = tag("v")(input)?;
    Ok((input, Endianness::Little))
}

fn endianness_big(input: &[u8]) -> NomResult<Endianness> {
    let (input, _) = tag("V")(input)?;
    Ok((input, Endianness::Big))
}

pub fn endianness(input: &[u8]) -> NomResult<Endianness> {
    alt((endianness_little, endianness_big))(input)
}

pub fn has_magic(data: &[u8]) -> bool {
    data.len() >= MAGIC.len() && data[..MAGIC.len()] == MAGIC[..]
}

/// Reads the 12 byte file header and returns a cursor bound to the pointer size and endianness it declares. The
/// stream must already be decompressed.
pub fn header<'a>(data: &'a [u8]) -> Result<(Header, ByteCursor<'a>)> {
    let mut cursor = ByteCursor::new(data, Endianness::Little, PointerSize::Bits64);

    let magic = cursor.read_bytes(MAGIC.len())?;
    if magic != &MAGIC[..] {
        return Err(BlendParseError::invalid_format(format!(
            "bad magic {:?}",
            String::from_utf8_lossy(magic)
        )));
    }

    let marker = cursor.read_bytes(1)?;
    let (_, pointer_size) = pointer_size(marker).map_err(|_| {
        BlendParseError::invalid_format(format!("unknown pointer size marker {:?}", marker[0] as char))
    })?;

    let marker = cursor.read_bytes(1)?;
    let (_, endianness) = endianness(marker).map_err(|_| {
        BlendParseError::invalid_format(format!("unknown endianness marker {:?}", marker[0] as char))
    })?;

    let version = String::from_utf8_lossy(cursor.read_bytes(3)?).into_owned();

    tracing::debug!(
        "blend header: version {}, {:?}, {:?}",
        version,
        pointer_size,
        endianness
    );

    Ok((
        Header {
            pointer_size,
            endianness,
            version,
        },
        cursor.bind(endianness, pointer_size),
    ))
}

/// Reads one block header, leaving the cursor at the start of its payload.
pub fn block_header(cursor: &mut ByteCursor) -> Result<Block> {
    let code: String = cursor
        .read_fixed_or_terminated(4)?
        .chars()
        .filter(|&c| c != '\0')
        .collect();

    if code == END_CODE {
        return Err(BlendParseError::invalid_format(format!(
            "{} block found at offset {} before the DNA block",
            END_CODE,
            cursor.position() - 4
        )));
    }

    let size = cursor.read_len()?;
    let memory_address = cursor.read_pointer()?;
    let dna_index = cursor.read_len()?;
    let count = cursor.read_len()?;

    Ok(Block {
        code,
        size,
        memory_address,
        dna_index,
        count,
        offset: cursor.position(),
        structure: None,
    })
}

/// Lists every block up to and including the DNA block.
///
/// Scanning stops at the DNA block: Blender writes it right before `ENDB`, so every data block comes before it. This
/// is a convention of the writer and isn't verified, anything after the DNA block is never looked at.
pub fn blocks(cursor: &mut ByteCursor) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();

    loop {
        let block = block_header(cursor)?;
        let is_dna = block.is_dna();
        let size = block.size;
        blocks.push(block);

        if is_dna {
            break;
        }
        cursor.skip(size)?;
    }

    tracing::debug!("found {} blocks", blocks.len());

    Ok(blocks)
}

/// Binds every block to its struct definition.
pub fn link_blocks(blocks: &mut [Block], dna: &Dna) -> Result<()> {
    for block in blocks.iter_mut() {
        if block.dna_index >= dna.structs.len() {
            return Err(BlendParseError::CorruptIndex {
                kind: IndexKind::Structure,
                index: block.dna_index,
                len: dna.structs.len(),
            });
        }
        block.structure = Some(block.dna_index);
    }
    Ok(())
}

/// The header, block directory and catalog of a .blend file, fully linked.
#[derive(Debug)]
pub struct RawBlend {
    pub header: Header,
    pub blocks: Vec<Block>,
    pub dna: Dna,
}

impl RawBlend {
    /// Indexes an uncompressed .blend file. Block payloads are not interpreted.
    pub fn parse(data: &[u8]) -> Result<RawBlend> {
        let (header, mut cursor) = header(data)?;
        let mut blocks = blocks(&mut cursor)?;

        // `blocks` always ends with the DNA block
        let dna_offset = blocks.last().map(|b| b.offset).unwrap_or_default();
        cursor.seek(dna_offset)?;
        let dna = DnaParseContext::new(header.pointer_size).dna(&mut cursor)?;

        link_blocks(&mut blocks, &dna)?;

        Ok(RawBlend { header, blocks, dna })
    }
}
