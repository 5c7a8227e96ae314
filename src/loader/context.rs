use crate::codec::DecoderRegistry;
use crate::json::{JsonBackend, JsonDocument};
use crate::project::PropertyTypes;
use log::{debug, warn};
use macroquad::math::IVec2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// State shared by every entity parser during one map parse.
pub(crate) struct ParseContext<'a> {
    pub backend: &'a dyn JsonBackend,
    pub decoders: &'a DecoderRegistry,
    pub types: Option<&'a PropertyTypes>,
    /// Directory relative `source`/`template` paths resolve against.
    pub directory: PathBuf,
    /// Map tile size, used for drawing rects and pixel positions.
    pub tile_size: IVec2,
    pub generate_missing_tiles: bool,
    templates: HashMap<PathBuf, Option<Rc<JsonDocument>>>,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        backend: &'a dyn JsonBackend,
        decoders: &'a DecoderRegistry,
        types: Option<&'a PropertyTypes>,
        directory: &Path,
    ) -> Self {
        ParseContext {
            backend,
            decoders,
            types,
            directory: directory.to_path_buf(),
            tile_size: IVec2::ZERO,
            generate_missing_tiles: true,
            templates: HashMap::new(),
        }
    }

    /// Loads a template file once per parse; later calls hit the cache,
    /// including for templates that failed to load. Documents parsed from
    /// memory have no directory and never load templates.
    pub fn template(&mut self, relative: &str) -> Option<Rc<JsonDocument>> {
        if self.directory.as_os_str().is_empty() {
            debug!("template {relative} skipped: document has no directory");
            return None;
        }
        let path = self.directory.join(relative);
        if let Some(cached) = self.templates.get(&path) {
            return cached.clone();
        }
        let loaded = match self.backend.parse_file(&path) {
            Ok(doc) => {
                debug!("loaded template {}", path.display());
                Some(Rc::new(doc))
            }
            Err(err) => {
                warn!("template {} unavailable: {err}", path.display());
                None
            }
        };
        self.templates.insert(path, loaded.clone());
        loaded
    }

    /// Number of distinct template paths seen so far.
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }
}
