//! Tiled JSON maps, tilesets, templates, projects and worlds, resolved into a
//! typed model for Macroquad games.
//!
//! ```no_run
//! use tiled_resolve::{ParseStatus, Tileson};
//!
//! let map = Tileson::default().parse_file("assets/map.json");
//! assert_eq!(map.status(), ParseStatus::Ok);
//! let ground = map.layer("ground").expect("layer");
//! if let Some(tile) = map.tile_at(ground, 0, 0) {
//!     println!("tile {} from tileset {}", tile.id, map.tilesets[tile.tileset].name);
//! }
//! ```

pub mod codec;
mod color;
mod error;
pub mod gid;
mod index;
pub mod json;
mod layer;
mod loader {
    pub(crate) mod context;
    pub mod json_loader;
}
mod map;
mod object;
pub mod project;
mod property;
mod tile;
mod tileset;
mod wang;
mod world;

pub use codec::{Decoder, DecoderRegistry};
pub use color::Color;
pub use error::{DecodeError, JsonError, LoadError, ParseStatus, TilesetError};
pub use gid::{FlipFlags, TileId};
pub use index::TileIndex;
pub use json::{JsonBackend, JsonDocument, JsonNode, SerdeJsonBackend};
pub use layer::{Chunk, FlaggedTile, Layer, LayerType, TileObject};
pub use loader::json_loader::{ParserOptions, Tileson};
pub use map::Map;
pub use object::{Object, ObjectType, Text, TextAlignment};
pub use project::{EnumDefinition, EnumStorageType, EnumValue, Project, ProjectFolder, PropertyTypes, TiledClass};
pub use property::{FromProperty, ObjectRef, Property, PropertyCollection, PropertyType, PropertyValue};
pub use tile::{Animation, Frame, Tile, TileKey, TileRect};
pub use tileset::{
    resolve_tileset, FillMode, Grid, ObjectAlignment, TileRenderSize, Tileset, TilesetType,
    Transformations,
};
pub use wang::{Terrain, WangColor, WangSet, WangTile};
pub use world::{World, WorldMapData};
