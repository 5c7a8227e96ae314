use crate::codec::DecoderRegistry;
use crate::error::{JsonError, ParseStatus};
use crate::json::{JsonBackend, JsonDocument, SerdeJsonBackend};
use crate::loader::context::ParseContext;
use crate::map::Map;
use crate::project::Project;
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Knobs for [`Tileson`]. Deserializes from any serde source; missing keys
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Also register the `zlib`, `gzip` and `zstd` decoders.
    pub compression_codecs: bool,
    /// Decoder run over the whole input before JSON parsing.
    pub file_codec: Option<String>,
    /// Give every local id of a tileset a tile, even if the file omits it.
    pub generate_missing_tiles: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            compression_codecs: false,
            file_codec: None,
            generate_missing_tiles: true,
        }
    }
}

/// Parses map files into resolved [`Map`]s.
pub struct Tileson {
    backend: Box<dyn JsonBackend>,
    decoders: DecoderRegistry,
    project: Option<Project>,
    options: ParserOptions,
}

impl Default for Tileson {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Tileson {
    pub fn new(options: ParserOptions) -> Self {
        let decoders = if options.compression_codecs {
            DecoderRegistry::with_compression()
        } else {
            DecoderRegistry::with_base64()
        };
        Tileson {
            backend: Box::new(SerdeJsonBackend),
            decoders,
            project: None,
            options,
        }
    }

    /// Resolves enum and class properties against `project`'s types.
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = Some(project);
        self
    }

    pub fn with_backend(mut self, backend: Box<dyn JsonBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    /// Register or remove decoders, e.g. an `lzma` one.
    pub fn decoders_mut(&mut self) -> &mut DecoderRegistry {
        &mut self.decoders
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parses a map file. Relative tileset and template paths resolve
    /// against the file's directory.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Map {
        let path = path.as_ref();
        if !path.is_file() {
            return Map::with_status(
                ParseStatus::FileNotFound,
                format!("File not found: {}", path.display()),
            );
        }
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                return Map::with_status(ParseStatus::FileNotFound, format!("File not found: {err}"))
            }
        };
        let directory = path
            .parent()
            .map(|d| d.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./"));
        self.parse_document(&bytes, directory, |err| format!("Parse error: {err}"))
    }

    /// Parses a map held in memory. Templates cannot be loaded, external
    /// tilesets resolve against the working directory.
    pub fn parse_bytes(&self, data: &[u8]) -> Map {
        self.parse_document(data, PathBuf::new(), |_| "Memory error".to_owned())
    }

    fn parse_document(
        &self,
        data: &[u8],
        directory: PathBuf,
        describe: impl FnOnce(&JsonError) -> String,
    ) -> Map {
        let decoded;
        let data = match self.options.file_codec.as_deref() {
            Some(name) => match self.decoders.run(name, data) {
                Ok(Some(out)) if out.is_empty() => {
                    return Map::with_status(
                        ParseStatus::DecompressionError,
                        format!("file decoder '{name}' produced no output"),
                    )
                }
                Ok(Some(out)) => {
                    decoded = out;
                    decoded.as_slice()
                }
                Ok(None) => {
                    warn!("file decoder '{name}' is not registered");
                    data
                }
                Err(err) => {
                    return Map::with_status(ParseStatus::DecompressionError, err.to_string())
                }
            },
            None => data,
        };

        let mut doc: JsonDocument = match self.backend.parse_buffer(data) {
            Ok(doc) => doc,
            Err(err) => return Map::with_status(ParseStatus::ParseError, describe(&err)),
        };
        doc.set_directory(directory);

        let mut ctx = ParseContext::new(
            self.backend.as_ref(),
            &self.decoders,
            self.project.as_ref().map(|p| p.property_types()),
            doc.directory(),
        );
        ctx.generate_missing_tiles = self.options.generate_missing_tiles;
        let map = Map::parse(doc.root(), &mut ctx);
        debug!(
            "parsed map {}x{}: {} layers, {} tilesets, {} templates",
            map.size.x,
            map.size.y,
            map.layers.len(),
            map.tilesets.len(),
            ctx.template_count()
        );
        map
    }
}
