//! Tiled project files and the custom type registry they carry.

mod class;
mod enums;
mod types;

pub use class::TiledClass;
pub use enums::{EnumDefinition, EnumStorageType, EnumValue};
pub use types::PropertyTypes;

use crate::error::LoadError;
use crate::json::JsonNode;
use crate::world::World;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProjectData {
    automapping_rules_file: String,
    commands: Vec<JsonValue>,
    extensions_path: String,
    folders: Vec<String>,
    object_types_file: String,
    property_types: Vec<JsonValue>,
}

/// A `.tiled-project` file.
///
/// The project owns the [`PropertyTypes`] registry; maps parsed with it only
/// borrow the registry while parsing.
#[derive(Debug, Default)]
pub struct Project {
    path: PathBuf,
    base_path: PathBuf,
    automapping_rules_file: String,
    commands: Vec<JsonValue>,
    extensions_path: String,
    object_types_file: String,
    folder_paths: Vec<PathBuf>,
    folders: Vec<ProjectFolder>,
    property_types: PropertyTypes,
}

impl Project {
    /// Reads a project file and scans its folders.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path
            .parent()
            .map(|d| d.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./"));
        let mut project = Self::parse_str(&txt, &base).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        project.path = path.to_path_buf();
        project.scan_folders();
        Ok(project)
    }

    /// Parses project JSON whose relative folders resolve against `base_path`.
    /// Folders are not scanned.
    pub fn parse_str(json: &str, base_path: &Path) -> Result<Self, serde_json::Error> {
        let data: ProjectData = serde_json::from_str(json)?;
        let items: Vec<&dyn JsonNode> = data
            .property_types
            .iter()
            .map(|v| v as &dyn JsonNode)
            .collect();
        let property_types = PropertyTypes::parse(&items);

        Ok(Project {
            path: PathBuf::new(),
            base_path: base_path.to_path_buf(),
            automapping_rules_file: data.automapping_rules_file,
            folder_paths: data.folders.iter().map(|f| base_path.join(f)).collect(),
            commands: data.commands,
            extensions_path: data.extensions_path,
            object_types_file: data.object_types_file,
            folders: Vec::new(),
            property_types,
        })
    }

    /// Project holding only a type registry.
    pub fn with_types(property_types: PropertyTypes) -> Self {
        Project {
            property_types,
            ..Default::default()
        }
    }

    fn scan_folders(&mut self) {
        self.folders = self
            .folder_paths
            .iter()
            .filter(|p| p.is_dir())
            .map(|p| ProjectFolder::load(p))
            .collect();
        debug!("project {}: {} folders", self.path.display(), self.folders.len());
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
    pub fn automapping_rules_file(&self) -> &str {
        &self.automapping_rules_file
    }
    pub fn commands(&self) -> &[JsonValue] {
        &self.commands
    }
    pub fn extensions_path(&self) -> &str {
        &self.extensions_path
    }
    pub fn object_types_file(&self) -> &str {
        &self.object_types_file
    }
    /// Folder paths from the project file, joined onto the base path.
    pub fn folder_paths(&self) -> &[PathBuf] {
        &self.folder_paths
    }
    pub fn folders(&self) -> &[ProjectFolder] {
        &self.folders
    }
    pub fn property_types(&self) -> &PropertyTypes {
        &self.property_types
    }
}

/// One folder of a project, scanned recursively.
#[derive(Debug, Default)]
pub struct ProjectFolder {
    path: PathBuf,
    world: Option<World>,
    files: Vec<PathBuf>,
    sub_folders: Vec<ProjectFolder>,
}

impl ProjectFolder {
    /// Lists `path`; the first `.world` file found is loaded as the folder's world.
    pub fn load(path: &Path) -> Self {
        let mut folder = ProjectFolder {
            path: path.to_path_buf(),
            ..Default::default()
        };
        let entries = match std::fs::read_dir(path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("cannot read project folder {}: {err}", path.display());
                return folder;
            }
        };

        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();
        for p in paths {
            if p.is_dir() {
                folder.sub_folders.push(ProjectFolder::load(&p));
                continue;
            }
            if folder.world.is_none() && p.extension().is_some_and(|e| e == "world") {
                match World::load(&p) {
                    Ok(world) => folder.world = Some(world),
                    Err(err) => warn!("skipping world {}: {err}", p.display()),
                }
            }
            folder.files.push(p);
        }
        folder
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn has_world_file(&self) -> bool {
        self.world.is_some()
    }
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
    pub fn sub_folders(&self) -> &[ProjectFolder] {
        &self.sub_folders
    }
}
