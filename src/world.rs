//! `.world` files: several maps laid out in one coordinate space.

use crate::error::LoadError;
use crate::loader::json_loader::Tileson;
use crate::map::Map;
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorldData {
    #[serde(default)]
    maps: Vec<WorldMapData>,
    #[serde(default)]
    only_show_adjacent_maps: bool,
    #[serde(default, rename = "type")]
    kind: String,
}

/// One map entry of a world file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldMapData {
    pub file_name: String,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    /// `file_name` joined onto the world's directory.
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct World {
    path: PathBuf,
    folder: PathBuf,
    map_data: Vec<WorldMapData>,
    only_show_adjacent_maps: bool,
    kind: String,
    maps: Vec<Map>,
}

impl World {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let folder = path
            .parent()
            .map(|d| d.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./"));
        let mut world = Self::parse_str(&txt, &folder).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        world.path = path.to_path_buf();
        Ok(world)
    }

    /// Parses world JSON; map paths resolve against `folder`.
    pub fn parse_str(json: &str, folder: &Path) -> Result<Self, serde_json::Error> {
        let data: WorldData = serde_json::from_str(json)?;
        let map_data = data
            .maps
            .into_iter()
            .map(|mut m| {
                m.path = folder.join(&m.file_name);
                m
            })
            .collect();
        Ok(World {
            path: PathBuf::new(),
            folder: folder.to_path_buf(),
            map_data,
            only_show_adjacent_maps: data.only_show_adjacent_maps,
            kind: data.kind,
            maps: Vec::new(),
        })
    }

    /// Parses every listed map that exists on disk, replacing previously
    /// loaded maps. Returns how many were parsed.
    pub fn load_maps(&mut self, parser: &Tileson) -> usize {
        self.maps.clear();
        for data in &self.map_data {
            if !data.path.is_file() {
                warn!("world map {} does not exist", data.path.display());
                continue;
            }
            self.maps.push(parser.parse_file(&data.path));
        }
        info!("loaded {} of {} world maps", self.maps.len(), self.map_data.len());
        self.maps.len()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.get(file_name).is_some()
    }

    pub fn get(&self, file_name: &str) -> Option<&WorldMapData> {
        self.map_data.iter().find(|m| m.file_name == file_name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn folder(&self) -> &Path {
        &self.folder
    }
    pub fn map_data(&self) -> &[WorldMapData] {
        &self.map_data
    }
    pub fn only_show_adjacent_maps(&self) -> bool {
        self.only_show_adjacent_maps
    }
    pub fn kind(&self) -> &str {
        &self.kind
    }
    /// Maps parsed by the last [`World::load_maps`] call.
    pub fn maps(&self) -> &[Map] {
        &self.maps
    }
}
