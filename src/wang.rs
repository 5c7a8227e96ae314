//! Wang sets and the legacy terrain list of a tileset.

use crate::color::Color;
use crate::json::JsonNode;
use crate::project::{PropertyTypes, TiledClass};
use crate::property::{FromProperty, PropertyCollection};
use crate::tile;

/// Local tile id written as `tile`, shifted to the 1-based ids of
/// [`Tile::id`](crate::Tile::id). `-1` (no tile) gives `None`.
fn representative_tile(json: &dyn JsonNode) -> Option<Option<u32>> {
    json.field_i64("tile")
        .map(|t| u32::try_from(t).ok().and_then(|t| t.checked_add(1)))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WangColor {
    pub name: String,
    pub color: Color,
    pub probability: f32,
    pub tile: Option<u32>,
    pub class: String,
    pub properties: PropertyCollection,
    pub all_found: bool,
}

impl WangColor {
    pub(crate) fn parse(json: &dyn JsonNode, types: Option<&PropertyTypes>) -> Self {
        let color = json.field_str("color").map(Color::parse);
        let name = json.field_string("name");
        let probability = json.field_f32("probability");
        let tile = representative_tile(json);
        WangColor {
            all_found: color.is_some() && name.is_some() && probability.is_some() && tile.is_some(),
            name: name.unwrap_or_default(),
            color: color.unwrap_or_default(),
            probability: probability.unwrap_or(0.0),
            tile: tile.flatten(),
            class: json.field_string("class").unwrap_or_default(),
            properties: PropertyCollection::parse(&json.array("properties"), types),
        }
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.properties.value(name)
    }

    pub fn class_instance(&self, types: &PropertyTypes) -> Option<TiledClass> {
        tile::class_instance(&self.class, &self.properties, types)
    }
}

/// A tile tagged with the colours of its corners and edges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WangTile {
    /// 1-based, like [`Tile::id`](crate::Tile::id).
    pub tile_id: u32,
    /// Colour index per corner and edge, clockwise from the top edge.
    /// `0` means unset; `n` is `colors[n - 1]` of the set.
    pub wang_id: Vec<u32>,
    /// Flip flags were dropped from the format in Tiled 1.5 and read as
    /// `false` when absent.
    pub hflip: bool,
    pub vflip: bool,
    pub dflip: bool,
    pub all_found: bool,
}

impl WangTile {
    pub(crate) fn parse(json: &dyn JsonNode) -> Self {
        let tile_id = json.field_u32("tileid").and_then(|id| id.checked_add(1));
        WangTile {
            tile_id: tile_id.unwrap_or_default(),
            wang_id: json
                .array("wangid")
                .into_iter()
                .map(|v| v.as_u32().unwrap_or(0))
                .collect(),
            hflip: json.field_bool("hflip").unwrap_or(false),
            vflip: json.field_bool("vflip").unwrap_or(false),
            dflip: json.field_bool("dflip").unwrap_or(false),
            all_found: tile_id.is_some(),
        }
    }
}

/// Terrain brush definition. `colors` is the current format; the
/// `cornercolors`/`edgecolors` pair is what files older than Tiled 1.5 use.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WangSet {
    pub name: String,
    /// `corner`, `edge` or `mixed`; empty in old files.
    pub kind: String,
    pub class: String,
    pub tile: Option<u32>,
    pub colors: Vec<WangColor>,
    pub corner_colors: Vec<WangColor>,
    pub edge_colors: Vec<WangColor>,
    pub wang_tiles: Vec<WangTile>,
    pub properties: PropertyCollection,
    pub all_found: bool,
}

impl WangSet {
    pub(crate) fn parse(json: &dyn JsonNode, types: Option<&PropertyTypes>) -> Self {
        let colors = |key: &str| -> Vec<WangColor> {
            json.array(key)
                .into_iter()
                .map(|c| WangColor::parse(c, types))
                .collect()
        };
        let name = json.field_string("name");
        let tile = representative_tile(json);
        WangSet {
            all_found: name.is_some() && tile.is_some(),
            name: name.unwrap_or_default(),
            kind: json.field_string("type").unwrap_or_default(),
            class: json.field_string("class").unwrap_or_default(),
            tile: tile.flatten(),
            colors: colors("colors"),
            corner_colors: colors("cornercolors"),
            edge_colors: colors("edgecolors"),
            wang_tiles: json.array("wangtiles").into_iter().map(WangTile::parse).collect(),
            properties: PropertyCollection::parse(&json.array("properties"), types),
        }
    }

    pub fn color(&self, name: &str) -> Option<&WangColor> {
        self.colors.iter().find(|c| c.name == name)
    }

    /// Colour referenced by a `wang_id` entry.
    pub fn color_at(&self, index: u32) -> Option<&WangColor> {
        let i = usize::try_from(index.checked_sub(1)?).ok()?;
        self.colors.get(i)
    }

    /// Wang data of the 1-based tile `tile_id`.
    pub fn wang_tile(&self, tile_id: u32) -> Option<&WangTile> {
        self.wang_tiles.iter().find(|t| t.tile_id == tile_id)
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.properties.value(name)
    }

    pub fn class_instance(&self, types: &PropertyTypes) -> Option<TiledClass> {
        tile::class_instance(&self.class, &self.properties, types)
    }
}

/// Entry of the pre-1.5 `terrains` list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Terrain {
    pub name: String,
    pub tile: Option<u32>,
    pub properties: PropertyCollection,
    pub all_found: bool,
}

impl Terrain {
    pub(crate) fn parse(json: &dyn JsonNode, types: Option<&PropertyTypes>) -> Self {
        let name = json.field_string("name");
        let tile = representative_tile(json);
        Terrain {
            all_found: name.is_some() && tile.is_some(),
            name: name.unwrap_or_default(),
            tile: tile.flatten(),
            properties: PropertyCollection::parse(&json.array("properties"), types),
        }
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.properties.value(name)
    }
}
