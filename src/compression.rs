use crate::parsers::{blend::has_magic, BlendParseError, Result};
use libflate::gzip::Decoder;
use std::io::{self, Read};

/// Turns a compressed stream into the bytes of a .blend file. Blender compresses with gzip, which `Gzip` handles, but
/// any stream-to-stream decompressor works.
pub trait Decompress {
    fn decompress(&self, raw: &[u8]) -> io::Result<Vec<u8>>;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct Gzip;

impl Decompress for Gzip {
    fn decompress(&self, raw: &[u8]) -> io::Result<Vec<u8>> {
        let mut decoder = Decoder::new(raw)?;
        let mut data = Vec::new();
        decoder.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl<F> Decompress for F
where
    F: Fn(&[u8]) -> io::Result<Vec<u8>>,
{
    fn decompress(&self, raw: &[u8]) -> io::Result<Vec<u8>> {
        self(raw)
    }
}

/// Returns `raw` if it starts with the .blend magic. Otherwise it is assumed to be compressed: it is decompressed once
/// and the magic checked again. `decompressor` set to `None` disables the second attempt.
pub fn container_bytes(raw: Vec<u8>, decompressor: Option<&dyn Decompress>) -> Result<Vec<u8>> {
    if has_magic(&raw) {
        return Ok(raw);
    }

    let decompressor = match decompressor {
        Some(decompressor) => decompressor,
        None => {
            return Err(BlendParseError::invalid_format(
                "missing BLENDER magic and decompression is disabled",
            ))
        }
    };

    let data = decompressor
        .decompress(&raw)
        .map_err(BlendParseError::Decompression)?;

    if !has_magic(&data) {
        return Err(BlendParseError::invalid_format(
            "missing BLENDER magic after decompression",
        ));
    }

    tracing::debug!(
        "decompressed {} bytes into {} bytes",
        raw.len(),
        data.len()
    );

    Ok(data)
}
