use crate::{
    compression::{container_bytes, Decompress, Gzip},
    options::LoadOptions,
    parsers::{
        blend::{Block, Header, RawBlend},
        cursor::ByteCursor,
        dna::{Dna, DnaField, DnaStruct, DnaType},
        field::DeclaredName,
        BlendParseError, IndexKind, Result,
    },
    record::RecordDecoder,
    report::Report,
};
use std::{
    collections::HashMap,
    fmt,
    io::Read,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

/// A struct definition of the catalog together with the catalog itself, so field types and names can be followed.
#[derive(Clone, Copy)]
pub struct StructView<'a> {
    dna: &'a Dna,
    index: usize,
    r#struct: &'a DnaStruct,
}

impl<'a> fmt::Debug for StructView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructView")
            .field("index", &self.index)
            .field("name", &self.name())
            .field("size", &self.size())
            .finish()
    }
}

impl<'a> StructView<'a> {
    /// Returns `None` if `index` is not a valid struct index.
    pub fn new(dna: &'a Dna, index: usize) -> Option<Self> {
        dna.structs.get(index).map(|r#struct| StructView {
            dna,
            index,
            r#struct,
        })
    }

    pub fn dna(&self) -> &'a Dna {
        self.dna
    }

    /// Position of this struct in `Dna::structs`.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn r#type(&self) -> &'a DnaType {
        &self.dna.types[self.r#struct.type_index]
    }

    pub fn name(&self) -> &'a str {
        &self.r#type().name
    }

    /// Size of the struct as declared in the catalog.
    pub fn size(&self) -> usize {
        self.r#type().bytes_len
    }

    /// Size of the struct as computed from its fields.
    pub fn fields_len(&self) -> usize {
        self.r#struct.fields_len
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldView<'a>> + 'a {
        let dna = self.dna;
        self.r#struct
            .fields
            .iter()
            .map(move |field| FieldView { dna, field })
    }

    /// Looks a field up by its clean name.
    pub fn field(&self, name: &str) -> Option<FieldView<'a>> {
        self.fields().find(|f| f.name().clean_name == name)
    }
}

/// A field of a `StructView`.
#[derive(Clone, Copy)]
pub struct FieldView<'a> {
    dna: &'a Dna,
    field: &'a DnaField,
}

impl<'a> fmt::Debug for FieldView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldView")
            .field("type", &self.r#type().name)
            .field("name", &self.name().raw)
            .field("offset", &self.offset())
            .finish()
    }
}

impl<'a> FieldView<'a> {
    pub fn r#type(&self) -> &'a DnaType {
        &self.dna.types[self.field.type_index]
    }

    pub fn name(&self) -> &'a DeclaredName {
        &self.dna.names[self.field.name_index]
    }

    /// Byte offset of the field inside its struct.
    pub fn offset(&self) -> usize {
        self.field.offset
    }

    /// Bytes the field takes up inside its struct.
    pub fn bytes_len(&self) -> usize {
        self.field.bytes_len
    }

    /// The struct definition of the field's type, `None` for primitives.
    pub fn structure(&self) -> Option<StructView<'a>> {
        self.dna
            .struct_by_type_index(self.field.type_index)
            .and_then(|(index, _)| StructView::new(self.dna, index))
    }
}

/// Turns the payload of a block into a record. The loader calls it at most once per block address, see
/// `Blend::decode`.
pub trait BlockDecoder {
    type Record;

    /// `cursor` is positioned at the start of the block payload and bound to the file's endianness and pointer size.
    fn decode(
        &self,
        block: &Block,
        structure: StructView<'_>,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<Self::Record>;
}

/// A loaded blend file.
///
/// Loading reads the header, indexes every block up to the DNA block and parses the DNA. Block payloads are only
/// decoded when asked for, once per address: decoded records are cached for as long as the `Blend` lives.
pub struct Blend<D: BlockDecoder = RecordDecoder> {
    data: Vec<u8>,
    blend: RawBlend,
    options: LoadOptions,
    decoder: D,
    decoded: Mutex<HashMap<u64, Arc<D::Record>>>,
}

impl<D: BlockDecoder> fmt::Debug for Blend<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blend")
            .field("header", &self.blend.header)
            .field("blocks", &self.blend.blocks.len())
            .field("structs", &self.blend.dna.structs.len())
            .finish()
    }
}

impl Blend {
    /// Loads a blend file from disk, decompressing it if needed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Blend> {
        Blend::from_path_with(path, LoadOptions::default(), RecordDecoder)
    }

    pub fn from_data<R: Read>(data: R) -> Result<Blend> {
        Blend::from_data_with(data, LoadOptions::default(), RecordDecoder)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Blend> {
        Blend::load(data, LoadOptions::default(), &Gzip, RecordDecoder)
    }
}

impl<D: BlockDecoder> Blend<D> {
    pub fn from_path_with<P: AsRef<Path>>(path: P, options: LoadOptions, decoder: D) -> Result<Self> {
        use std::fs::File;

        let path = path.as_ref();
        let file = File::open(path)?;
        let blend = Blend::from_data_with(file, options, decoder)?;
        tracing::debug!(
            "loaded {:?}, Blender version {}",
            path,
            blend.version()
        );
        Ok(blend)
    }

    pub fn from_data_with<R: Read>(mut data: R, options: LoadOptions, decoder: D) -> Result<Self> {
        let mut buffer = Vec::new();
        data.read_to_end(&mut buffer)?;
        Blend::load(buffer, options, &Gzip, decoder)
    }

    /// Loads a blend file from memory using a custom decompressor. `options.decompress` still decides whether the
    /// decompressor is tried at all.
    pub fn load(
        data: Vec<u8>,
        options: LoadOptions,
        decompressor: &dyn Decompress,
        decoder: D,
    ) -> Result<Self> {
        let decompressor = if options.decompress {
            Some(decompressor)
        } else {
            None
        };
        let data = container_bytes(data, decompressor)?;
        let blend = RawBlend::parse(&data)?;

        Ok(Self {
            data,
            blend,
            options,
            decoder,
            decoded: Mutex::new(HashMap::new()),
        })
    }

    pub fn header(&self) -> &Header {
        &self.blend.header
    }

    pub fn version(&self) -> &str {
        &self.blend.header.version
    }

    /// Every block in file order, up to and including the DNA block.
    pub fn blocks(&self) -> &[Block] {
        &self.blend.blocks
    }

    pub fn dna(&self) -> &Dna {
        &self.blend.dna
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// The decompressed bytes of the file.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn structure(&self, index: usize) -> Option<StructView<'_>> {
        StructView::new(&self.blend.dna, index)
    }

    /// The struct a block was bound to when the file was loaded.
    pub fn structure_of(&self, block: &Block) -> Option<StructView<'_>> {
        block.structure().and_then(|index| self.structure(index))
    }

    pub fn structure_by_name(&self, name: &str) -> Option<StructView<'_>> {
        self.blend
            .dna
            .struct_by_name(name)
            .and_then(|(index, _)| self.structure(index))
    }

    pub fn has_structure(&self, name: &str) -> bool {
        self.blend.dna.struct_by_name(name).is_some()
    }

    /// Name of the struct type a block was bound to.
    pub fn type_name_of(&self, block: &Block) -> Option<&str> {
        self.structure_of(block).map(|s| s.name())
    }

    fn is_of_type(&self, block: &Block, type_name: &str) -> bool {
        self.type_name_of(block) == Some(type_name)
    }

    pub fn count_of_type(&self, type_name: &str) -> usize {
        self.blend
            .blocks
            .iter()
            .filter(|b| self.is_of_type(b, type_name))
            .count()
    }

    /// Every block bound to the struct named `type_name`, in file order.
    // todo: return iterator
    pub fn blocks_of_type(&self, type_name: &str) -> Vec<&Block> {
        self.blend
            .blocks
            .iter()
            .filter(|b| self.is_of_type(b, type_name))
            .collect()
    }

    /// The `ordinal`-th block bound to the struct named `type_name`.
    pub fn blocks_of_type_at(&self, type_name: &str, ordinal: usize) -> Option<&Block> {
        let block = self
            .blend
            .blocks
            .iter()
            .filter(|b| self.is_of_type(b, type_name))
            .nth(ordinal);

        if block.is_none() {
            tracing::warn!(
                "{} {} not found ({} in file)",
                type_name,
                ordinal,
                self.count_of_type(type_name)
            );
        }
        block
    }

    /// Root blocks have a code that tells us their type, "OB" for object, "ME" for mesh, "MA" for material, etc.
    pub fn blocks_with_code(&self, code: &str) -> Vec<&Block> {
        self.blend.blocks.iter().filter(|b| b.code == code).collect()
    }

    /// The first block saved from `address`.
    pub fn block_by_address(&self, address: u64) -> Option<&Block> {
        let block = self
            .blend
            .blocks
            .iter()
            .find(|b| b.memory_address == address);

        if block.is_none() {
            tracing::warn!("could not find block at address {:#x}", address);
        }
        block
    }

    /// Like `block_by_address` but a miss is not worth a warning.
    pub fn has_address(&self, address: u64) -> bool {
        self.blend
            .blocks
            .iter()
            .any(|b| b.memory_address == address)
    }

    /// Decodes a block, or returns the record decoded the first time a block with the same address was asked for.
    /// `None` in, `None` out.
    pub fn decode(&self, block: Option<&Block>) -> Result<Option<Arc<D::Record>>> {
        match block {
            Some(block) => self.decode_block(block).map(Some),
            None => Ok(None),
        }
    }

    /// `block` must be borrowed from `Blend::blocks` of this same file (directly or through a query), copies and blocks
    /// of other files are rejected with `ForeignBlock`.
    pub fn decode_block(&self, block: &Block) -> Result<Arc<D::Record>> {
        if !self
            .blend
            .blocks
            .as_ptr_range()
            .contains(&(block as *const Block))
        {
            return Err(BlendParseError::ForeignBlock {
                memory_address: block.memory_address,
            });
        }

        // Held while decoding so two threads can't decode the same address.
        let mut decoded = self.decoded.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(record) = decoded.get(&block.memory_address) {
            return Ok(Arc::clone(record));
        }

        let structure = match self.structure_of(block) {
            Some(structure) => structure,
            None => {
                return Err(BlendParseError::CorruptIndex {
                    kind: IndexKind::Structure,
                    index: block.dna_index,
                    len: self.blend.dna.structs.len(),
                })
            }
        };

        let mut cursor = ByteCursor::new(
            &self.data,
            self.blend.header.endianness,
            self.blend.header.pointer_size,
        );
        cursor.seek(block.offset)?;

        let record = Arc::new(self.decoder.decode(block, structure, &mut cursor)?);
        decoded.insert(block.memory_address, Arc::clone(&record));

        Ok(record)
    }

    pub fn decode_address(&self, address: u64) -> Result<Option<Arc<D::Record>>> {
        self.decode(self.block_by_address(address))
    }

    /// Decodes the blocks of a type in file order and returns the first record `predicate` accepts.
    pub fn find_decoded<F>(&self, type_name: &str, mut predicate: F) -> Result<Option<Arc<D::Record>>>
    where
        F: FnMut(&D::Record) -> bool,
    {
        for block in self.blocks_of_type(type_name) {
            let record = self.decode_block(block)?;
            if predicate(&record) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Number of distinct addresses decoded so far.
    pub fn decoded_len(&self) -> usize {
        self.decoded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// A listing of every struct and every block, see `Report`.
    pub fn report(&self) -> Report {
        Report::new(&self.blend, &self.options.report_denylist)
    }
}
