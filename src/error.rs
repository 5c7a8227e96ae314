use std::path::PathBuf;
use thiserror::Error;

/// Outcome of a top-level parse, carried on every [`Map`](crate::Map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseStatus {
    /// The map and every mandatory field were found.
    #[default]
    Ok,
    /// The input file does not exist.
    FileNotFound,
    /// The JSON backend rejected the input.
    ParseError,
    /// A mandatory map or tileset field was missing.
    MissingData,
    /// The whole-file decoder produced no output.
    DecompressionError,
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParseStatus::Ok => "OK",
            ParseStatus::FileNotFound => "file not found",
            ParseStatus::ParseError => "parse error",
            ParseStatus::MissingData => "missing data",
            ParseStatus::DecompressionError => "decompression error",
        };
        f.write_str(s)
    }
}

/// Failure of one stage of the payload decoding pipeline.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A registered decoder returned an error.
    #[error("decoder '{name}' failed: {source}")]
    Decoder {
        /// Registry name of the decoder.
        name: String,
        /// Error reported by the decoder.
        #[source]
        source: anyhow::Error,
    },
    /// A registered decoder turned a non-empty payload into nothing.
    #[error("decoder '{name}' produced no output from {input_len} bytes")]
    EmptyOutput {
        /// Registry name of the decoder.
        name: String,
        /// Size of the payload handed to the decoder.
        input_len: usize,
    },
}

/// Failure reported by a [`JsonBackend`](crate::json::JsonBackend).
#[derive(Debug, Error)]
pub enum JsonError {
    /// Reading the file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The bytes are not valid JSON.
    #[error("invalid JSON{}: {message}", in_path(.path))]
    Syntax {
        /// File the bytes came from, if any.
        path: Option<PathBuf>,
        /// Backend-specific description.
        message: String,
    },
}

/// A tileset that cannot take part in GID resolution.
#[derive(Debug, Error)]
pub enum TilesetError {
    /// Mandatory fields are absent.
    #[error("tileset '{name}' is missing {}", .fields.join(", "))]
    MissingFields {
        /// Tileset name, possibly empty.
        name: String,
        /// JSON keys that were not found.
        fields: Vec<&'static str>,
    },
    /// `firstgid + tilecount` runs past the largest GID flip flags leave free.
    #[error("tileset '{name}' gid range {first_gid}+{tile_count} exceeds {max}", max = crate::gid::GID_MASK)]
    InvalidRange {
        /// Tileset name, possibly empty.
        name: String,
        /// First GID of the tileset.
        first_gid: u32,
        /// Number of tiles declared.
        tile_count: u32,
    },
    /// The external `source` file could not be read.
    #[error("external tileset {path}: {source}")]
    Source {
        /// Resolved path of the tileset file.
        path: PathBuf,
        /// Backend failure.
        #[source]
        source: JsonError,
    },
}

/// Failure while loading a world or project file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading the file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not the expected JSON document.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

fn in_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}
