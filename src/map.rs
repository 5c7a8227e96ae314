use crate::color::Color;
use crate::error::{DecodeError, ParseStatus, TilesetError};
use crate::index::TileIndex;
use crate::json::JsonNode;
use crate::layer::{self, Layer};
use crate::loader::context::ParseContext;
use crate::project::{PropertyTypes, TiledClass};
use crate::property::{FromProperty, Property, PropertyCollection};
use crate::tile::{self, Tile, TileKey};
use crate::tileset::{resolve_tileset, Tileset};
use log::{debug, warn};
use macroquad::math::{IVec2, Vec2};
use std::collections::BTreeSet;

/// A parsed map with every tile layer resolved against its tilesets.
///
/// Check [`Map::status`] before using anything else: maps that failed to
/// load are returned with a non-`Ok` status and whatever was read so far.
#[derive(Debug, Default)]
pub struct Map {
    /// Size in tiles.
    pub size: IVec2,
    pub tile_size: IVec2,
    pub background_color: Color,
    pub hex_side_length: i32,
    pub infinite: bool,
    pub next_layer_id: i32,
    pub next_object_id: i32,
    pub orientation: String,
    pub render_order: String,
    pub stagger_axis: String,
    pub stagger_index: String,
    pub tiled_version: String,
    pub kind: String,
    pub class: String,
    pub compression_level: i32,
    pub parallax_origin: Vec2,
    pub layers: Vec<Layer>,
    /// Tilesets that parsed; `Tileset::index` is the position here.
    pub tilesets: Vec<Tileset>,
    pub properties: PropertyCollection,

    index: TileIndex,
    tileset_errors: Vec<TilesetError>,
    status: ParseStatus,
    status_message: String,
}

impl Map {
    /// Empty map carrying only a failure status.
    pub fn with_status(status: ParseStatus, message: impl Into<String>) -> Self {
        Map {
            status,
            status_message: message.into(),
            ..Default::default()
        }
    }

    pub(crate) fn parse(json: &dyn JsonNode, ctx: &mut ParseContext) -> Self {
        let mut missing = Vec::new();

        let size = match (json.field_i32("width"), json.field_i32("height")) {
            (Some(w), Some(h)) => IVec2::new(w, h),
            _ => {
                missing.push("width/height");
                IVec2::ZERO
            }
        };
        let tile_size = match (json.field_i32("tilewidth"), json.field_i32("tileheight")) {
            (Some(w), Some(h)) => IVec2::new(w, h),
            _ => {
                missing.push("tilewidth/tileheight");
                IVec2::ZERO
            }
        };
        let mut required = |key: &'static str| {
            let value = json.field_string(key);
            if value.is_none() {
                missing.push(key);
            }
            value.unwrap_or_default()
        };
        let orientation = required("orientation");
        let tiled_version = required("tiledversion");
        let next_object_id = json.field_i32("nextobjectid").unwrap_or_else(|| {
            missing.push("nextobjectid");
            0
        });

        let mut map = Map {
            size,
            tile_size,
            background_color: json
                .field_str("backgroundcolor")
                .map(Color::parse)
                .unwrap_or_default(),
            hex_side_length: json.field_i32("hexsidelength").unwrap_or(0),
            infinite: json.field_bool("infinite").unwrap_or(false),
            next_layer_id: json.field_i32("nextlayerid").unwrap_or(0),
            next_object_id,
            orientation,
            render_order: json.field_string("renderorder").unwrap_or_default(),
            stagger_axis: json.field_string("staggeraxis").unwrap_or_default(),
            stagger_index: json.field_string("staggerindex").unwrap_or_default(),
            tiled_version,
            kind: json.field_string("type").unwrap_or_default(),
            class: json.field_string("class").unwrap_or_default(),
            compression_level: json.field_i32("compressionlevel").unwrap_or(-1),
            parallax_origin: Vec2::new(
                json.field_f32("parallaxoriginx").unwrap_or(0.0),
                json.field_f32("parallaxoriginy").unwrap_or(0.0),
            ),
            properties: PropertyCollection::parse(&json.array("properties"), ctx.types),
            ..Default::default()
        };

        ctx.tile_size = tile_size;
        map.layers = json
            .array("layers")
            .into_iter()
            .map(|l| Layer::parse(l, ctx))
            .collect();

        for ts_json in json.array("tilesets") {
            match Tileset::parse(ts_json, map.tilesets.len(), ctx) {
                Ok(ts) => map.tilesets.push(ts),
                Err(err) => {
                    warn!("{err}");
                    map.tileset_errors.push(err);
                }
            }
        }

        map.resolve_layers();

        if !missing.is_empty() || !map.tileset_errors.is_empty() {
            debug!("map is missing {missing:?}");
            map.status = ParseStatus::MissingData;
            map.status_message = "Missing map data...".to_owned();
        }
        map
    }

    /// Builds the tile index and materializes every tile layer: a first
    /// pass over all layers, one map-wide flipped-tile synthesis, then a
    /// second pass patching the cells the first pass queued.
    fn resolve_layers(&mut self) {
        self.index = TileIndex::build(&self.tilesets);
        if self.infinite {
            return;
        }

        for layer in &mut self.layers {
            layer.collect_tiles(&self.index, &self.tilesets, self.size.x, self.tile_size);
        }

        let mut flagged = BTreeSet::new();
        for layer in &self.layers {
            layer.gather_flagged(&mut flagged);
        }
        self.index.synthesize_flipped(&flagged, &self.tilesets);

        for layer in &mut self.layers {
            layer.resolve_flagged(&self.index, &self.tilesets, self.tile_size);
        }
    }

    pub fn status(&self) -> ParseStatus {
        self.status
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Why tilesets listed in the file are absent from [`Map::tilesets`].
    pub fn tileset_errors(&self) -> &[TilesetError] {
        &self.tileset_errors
    }

    /// Layers (at any depth) and chunks whose encoded data failed to decode.
    pub fn decode_errors(&self) -> Vec<(&str, &DecodeError)> {
        fn walk<'a>(layers: &'a [Layer], out: &mut Vec<(&'a str, &'a DecodeError)>) {
            for l in layers {
                if let Some(err) = &l.decode_error {
                    out.push((l.name.as_str(), err.as_ref()));
                }
                for c in &l.chunks {
                    if let Some(err) = &c.decode_error {
                        out.push((l.name.as_str(), err.as_ref()));
                    }
                }
                walk(&l.layers, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.layers, &mut out);
        out
    }

    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    /// Layer by name, searching nested groups depth first.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        layer::find_layer(&self.layers, name)
    }

    pub fn tileset(&self, name: &str) -> Option<&Tileset> {
        self.tilesets.iter().find(|t| t.name == name)
    }

    /// Tileset whose range contains the clean part of `gid`.
    pub fn tileset_by_gid(&self, gid: u32) -> Option<&Tileset> {
        resolve_tileset(&self.tilesets, gid & crate::gid::GID_MASK)
    }

    /// Tile for a GID as it appears in layer data, flags included.
    pub fn tile(&self, gid: u32) -> Option<&Tile> {
        self.index.tile(gid, &self.tilesets)
    }

    pub fn resolve(&self, key: TileKey) -> Option<&Tile> {
        self.index.resolve(key, &self.tilesets)
    }

    /// Tile placed at `(x, y)` of `layer`.
    pub fn tile_at(&self, layer: &Layer, x: i32, y: i32) -> Option<&Tile> {
        self.resolve(layer.tile_key(x, y)?)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.property(name)
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.properties.value(name)
    }

    pub fn class_instance(&self, types: &PropertyTypes) -> Option<TiledClass> {
        tile::class_instance(&self.class, &self.properties, types)
    }
}
