//! Named payload decoders and the layer data pipeline built on them.

use crate::error::DecodeError;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

/// Turns one byte payload into another (base64 text into bytes, zlib into raw, ...).
pub trait Decoder {
    fn decode(&self, input: &[u8]) -> anyhow::Result<Vec<u8>>;
}

impl<F> Decoder for F
where
    F: Fn(&[u8]) -> anyhow::Result<Vec<u8>>,
{
    fn decode(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        self(input)
    }
}

/// Lookup table from codec name (`"base64"`, `"zlib"`, ...) to decoder.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<String, Box<dyn Decoder>>,
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("DecoderRegistry").field("decoders", &names).finish()
    }
}

impl DecoderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the `base64` decoder.
    pub fn with_base64() -> Self {
        let mut registry = Self::new();
        registry.register("base64", Base64Decoder);
        registry
    }

    /// `base64` plus the shipped `zlib`, `gzip` and `zstd` decoders.
    pub fn with_compression() -> Self {
        let mut registry = Self::with_base64();
        registry.register("zlib", ZlibDecoder);
        registry.register("gzip", GzipDecoder);
        registry.register("zstd", ZstdDecoder);
        registry
    }

    /// Adds `decoder` under `name`, replacing any decoder already there.
    pub fn register(&mut self, name: impl Into<String>, decoder: impl Decoder + 'static) {
        self.decoders.insert(name.into(), Box::new(decoder));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.decoders.remove(name).is_some()
    }

    pub fn has(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Decoder> {
        self.decoders.get(name).map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    pub fn clear(&mut self) {
        self.decoders.clear();
    }

    /// Runs the decoder named `name` over `input`.
    ///
    /// Returns `Ok(None)` when no such decoder is registered. A decoder that
    /// turns a non-empty payload into nothing counts as a failure.
    pub fn run(&self, name: &str, input: &[u8]) -> Result<Option<Vec<u8>>, DecodeError> {
        let Some(decoder) = self.get(name) else {
            return Ok(None);
        };
        let out = decoder.decode(input).map_err(|source| DecodeError::Decoder {
            name: name.to_owned(),
            source,
        })?;
        if out.is_empty() && !input.is_empty() {
            return Err(DecodeError::EmptyOutput {
                name: name.to_owned(),
                input_len: input.len(),
            });
        }
        Ok(Some(out))
    }
}

/// Decodes a layer or chunk payload into raw GIDs.
///
/// `encoding` runs first, then `compression`, each only if registered. GIDs
/// are produced only when the encoding stage ran; otherwise the result is empty.
pub fn decode_layer_data(
    registry: &DecoderRegistry,
    encoding: &str,
    compression: &str,
    payload: &str,
) -> Result<Vec<u32>, DecodeError> {
    if registry.is_empty() || (encoding.is_empty() && compression.is_empty()) {
        return Ok(Vec::new());
    }

    let mut data = payload.as_bytes().to_vec();
    let mut decoded = false;
    if !encoding.is_empty() {
        if let Some(out) = registry.run(encoding, &data)? {
            data = out;
            decoded = true;
        }
    }
    if !compression.is_empty() {
        if let Some(out) = registry.run(compression, &data)? {
            data = out;
        }
    }

    if !decoded {
        return Ok(Vec::new());
    }
    Ok(bytes_to_gids(&data))
}

/// Groups bytes into little-endian `u32`s, dropping an incomplete tail.
pub fn bytes_to_gids(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Base64 that also accepts the URL-safe alphabet and `.` padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Decoder;

impl Decoder for Base64Decoder {
    fn decode(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        let normalized: Vec<u8> = input
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|&b| match b {
                b'-' => b'+',
                b'_' => b'/',
                b'.' => b'=',
                other => other,
            })
            .collect();
        Ok(LENIENT_BASE64.decode(normalized)?)
    }
}

/// zlib stream (`"compression": "zlib"`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibDecoder;

impl Decoder for ZlibDecoder {
    fn decode(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::new();
        flate2::read::ZlibDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}

/// gzip stream (`"compression": "gzip"`).
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipDecoder;

impl Decoder for GzipDecoder {
    fn decode(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::new();
        flate2::read::GzDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Zstandard frame (`"compression": "zstd"`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdDecoder;

impl Decoder for ZstdDecoder {
    fn decode(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(zstd::stream::decode_all(input)?)
    }
}
