use crate::codec::{self, DecoderRegistry};
use crate::color::Color;
use crate::error::DecodeError;
use crate::gid;
use crate::index::TileIndex;
use crate::json::JsonNode;
use crate::loader::context::ParseContext;
use crate::object::{Object, ObjectType};
use crate::project::{PropertyTypes, TiledClass};
use crate::property::{FromProperty, PropertyCollection};
use crate::tile::{self, Tile, TileKey, TileRect};
use crate::tileset::Tileset;
use log::warn;
use macroquad::math::{IVec2, Vec2};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerType {
    #[default]
    Undefined,
    TileLayer,
    ObjectGroup,
    ImageLayer,
    Group,
}

impl LayerType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "tilelayer" => LayerType::TileLayer,
            "objectgroup" => LayerType::ObjectGroup,
            "imagelayer" => LayerType::ImageLayer,
            "group" => LayerType::Group,
            _ => LayerType::Undefined,
        }
    }
}

/// Block of tile data in an infinite map.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub size: IVec2,
    /// Position in tiles.
    pub position: IVec2,
    /// Raw GIDs, flags included, row-major over `size`.
    pub data: Vec<u32>,
    pub decode_error: Option<Arc<DecodeError>>,
}

impl Chunk {
    fn parse(json: &dyn JsonNode, encoding: &str, compression: &str, decoders: &DecoderRegistry) -> Self {
        let mut chunk = Chunk {
            size: IVec2::new(
                json.field_i32("width").unwrap_or(0),
                json.field_i32("height").unwrap_or(0),
            ),
            position: IVec2::new(json.field_i32("x").unwrap_or(0), json.field_i32("y").unwrap_or(0)),
            ..Default::default()
        };
        (chunk.data, chunk.decode_error) = read_data(json.get("data"), encoding, compression, decoders);
        chunk
    }

    /// Raw GID at chunk-local `(x, y)`.
    pub fn gid_at(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.size.x || y >= self.size.y {
            return None;
        }
        let i = y.checked_mul(self.size.x)?.checked_add(x)?;
        self.data.get(i as usize).copied()
    }
}

/// A resolved cell of a tile layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileObject {
    /// Cell in tile units.
    pub cell: IVec2,
    /// Cell origin in pixels.
    pub position: Vec2,
    pub drawing_rect: TileRect,
    pub tile: TileKey,
    /// GID as stored in the layer, flags included.
    pub gid: u32,
}

impl TileObject {
    fn new(cell: IVec2, tile_key: TileKey, tile: &Tile, gid: u32, tile_size: IVec2) -> Self {
        TileObject {
            cell,
            position: tile.position(cell, tile_size),
            drawing_rect: tile.drawing_rect,
            tile: tile_key,
            gid,
        }
    }
}

/// A cell whose GID was not in the index on the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlaggedTile {
    pub x: i32,
    pub y: i32,
    pub full_gid: u32,
    pub clean_gid: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub id: i32,
    pub name: String,
    pub kind: LayerType,
    /// The `type` string as written.
    pub type_str: String,
    pub class: String,
    pub opacity: f32,
    pub visible: bool,
    /// `x`/`y` in tiles.
    pub position: IVec2,
    pub size: IVec2,
    /// Tile size of the map grid the cells sit on.
    pub tile_size: IVec2,
    pub offset: Vec2,
    pub parallax: Vec2,
    pub tint_color: Color,
    pub transparent_color: Color,
    pub image: String,
    pub draw_order: String,
    pub encoding: String,
    pub compression: String,
    pub repeat_x: bool,
    pub repeat_y: bool,
    /// Raw GIDs of a finite tile layer.
    pub data: Vec<u32>,
    /// Set when an encoded `data` payload could not be decoded; `data` is
    /// then empty.
    pub decode_error: Option<Arc<DecodeError>>,
    pub chunks: Vec<Chunk>,
    pub layers: Vec<Layer>,
    pub objects: Vec<Object>,
    pub properties: PropertyCollection,
    /// Every mandatory field was present.
    pub all_found: bool,

    tiles: BTreeMap<(i32, i32), TileKey>,
    tile_objects: BTreeMap<(i32, i32), TileObject>,
    flagged: Vec<FlaggedTile>,
    unique_flagged: BTreeSet<u32>,
}

impl Layer {
    pub(crate) fn parse(json: &dyn JsonNode, ctx: &mut ParseContext) -> Self {
        let name = json.field_string("name");
        let opacity = json.field_f32("opacity");
        let type_str = json.field_string("type");
        let visible = json.field_bool("visible");
        let x = json.field_i32("x");
        let y = json.field_i32("y");
        let all_found = name.is_some()
            && opacity.is_some()
            && type_str.is_some()
            && visible.is_some()
            && x.is_some()
            && y.is_some();

        let encoding = json.field_string("encoding").unwrap_or_default();
        let compression = json.field_string("compression").unwrap_or_default();
        let type_str = type_str.unwrap_or_default();

        let mut layer = Layer {
            id: json.field_i32("id").unwrap_or(0),
            name: name.unwrap_or_default(),
            kind: LayerType::from_tag(&type_str),
            type_str,
            class: json.field_string("class").unwrap_or_default(),
            opacity: opacity.unwrap_or(0.0),
            visible: visible.unwrap_or(false),
            position: IVec2::new(x.unwrap_or(0), y.unwrap_or(0)),
            size: match (json.field_i32("width"), json.field_i32("height")) {
                (Some(w), Some(h)) => IVec2::new(w, h),
                _ => IVec2::ZERO,
            },
            tile_size: ctx.tile_size,
            offset: match (json.field_f32("offsetx"), json.field_f32("offsety")) {
                (Some(ox), Some(oy)) => Vec2::new(ox, oy),
                _ => Vec2::ZERO,
            },
            parallax: Vec2::new(
                json.field_f32("parallaxx").unwrap_or(1.0),
                json.field_f32("parallaxy").unwrap_or(1.0),
            ),
            tint_color: json.field_str("tintcolor").map(Color::parse).unwrap_or_default(),
            transparent_color: json
                .field_str("transparentcolor")
                .map(Color::parse)
                .unwrap_or_default(),
            image: json.field_string("image").unwrap_or_default(),
            draw_order: json.field_string("draworder").unwrap_or_default(),
            repeat_x: json.field_bool("repeatx").unwrap_or(false),
            repeat_y: json.field_bool("repeaty").unwrap_or(false),
            properties: PropertyCollection::parse(&json.array("properties"), ctx.types),
            all_found,
            ..Default::default()
        };

        (layer.data, layer.decode_error) =
            read_data(json.get("data"), &encoding, &compression, ctx.decoders);
        if let Some(err) = &layer.decode_error {
            warn!("layer '{}': tile data dropped: {err}", layer.name);
        }
        layer.chunks = json
            .array("chunks")
            .into_iter()
            .map(|c| Chunk::parse(c, &encoding, &compression, ctx.decoders))
            .collect();
        for chunk in &layer.chunks {
            if let Some(err) = &chunk.decode_error {
                warn!(
                    "layer '{}': chunk at {} dropped: {err}",
                    layer.name, chunk.position
                );
            }
        }
        layer.encoding = encoding;
        layer.compression = compression;

        layer.layers = json
            .array("layers")
            .into_iter()
            .map(|l| Layer::parse(l, ctx))
            .collect();
        layer.objects = json
            .array("objects")
            .into_iter()
            .map(|o| Object::parse(o, ctx))
            .collect();
        layer
    }

    /// First pass: resolve every non-zero cell whose GID is indexed and
    /// queue the rest. Recurses into group layers.
    pub(crate) fn collect_tiles(
        &mut self,
        index: &TileIndex,
        tilesets: &[Tileset],
        map_width: i32,
        tile_size: IVec2,
    ) {
        if map_width > 0 {
            for (i, &raw) in self.data.iter().enumerate() {
                if raw == 0 {
                    continue;
                }
                let x = i as i32 % map_width;
                let y = i as i32 / map_width;
                match index.key(raw) {
                    Some(key) => place(
                        &mut self.tiles,
                        &mut self.tile_objects,
                        index,
                        tilesets,
                        (x, y),
                        key,
                        raw,
                        tile_size,
                    ),
                    None => {
                        self.flagged.push(FlaggedTile {
                            x,
                            y,
                            full_gid: raw,
                            clean_gid: raw & gid::GID_MASK,
                        });
                        self.unique_flagged.insert(raw);
                    }
                }
            }
        }
        for child in &mut self.layers {
            child.collect_tiles(index, tilesets, map_width, tile_size);
        }
    }

    /// Distinct queued GIDs of this layer and its children.
    pub(crate) fn gather_flagged(&self, out: &mut BTreeSet<u32>) {
        out.extend(self.unique_flagged.iter().copied());
        for child in &self.layers {
            child.gather_flagged(out);
        }
    }

    /// Second pass: place queued cells that now resolve. Cells that still
    /// do not are logged and left empty.
    pub(crate) fn resolve_flagged(&mut self, index: &TileIndex, tilesets: &[Tileset], tile_size: IVec2) {
        for pending in std::mem::take(&mut self.flagged) {
            match index.key(pending.full_gid) {
                Some(key) => place(
                    &mut self.tiles,
                    &mut self.tile_objects,
                    index,
                    tilesets,
                    (pending.x, pending.y),
                    key,
                    pending.full_gid,
                    tile_size,
                ),
                None => warn!(
                    "layer '{}': gid {} at ({}, {}) matches no tile",
                    self.name, pending.clean_gid, pending.x, pending.y
                ),
            }
        }
        for child in &mut self.layers {
            child.resolve_flagged(index, tilesets, tile_size);
        }
    }

    /// Pixel position of the cell `(x, y)` on the map grid.
    pub fn cell_position(&self, x: i32, y: i32) -> Vec2 {
        IVec2::new(x, y).as_vec2() * self.tile_size.as_vec2()
    }

    pub fn tile_key(&self, x: i32, y: i32) -> Option<TileKey> {
        self.tiles.get(&(x, y)).copied()
    }

    pub fn tile_object(&self, x: i32, y: i32) -> Option<&TileObject> {
        self.tile_objects.get(&(x, y))
    }

    /// Resolved cells in row order of `(x, y)`.
    pub fn tiles(&self) -> impl Iterator<Item = (IVec2, TileKey)> + '_ {
        self.tiles.iter().map(|(&(x, y), &k)| (IVec2::new(x, y), k))
    }

    pub fn tile_objects(&self) -> impl Iterator<Item = &TileObject> {
        self.tile_objects.values()
    }

    /// Flagged GIDs seen by the first pass.
    pub fn unique_flagged(&self) -> &BTreeSet<u32> {
        &self.unique_flagged
    }

    pub fn object(&self, id: u32) -> Option<&Object> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn first_object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn objects_by_name(&self, name: &str) -> Vec<&Object> {
        self.objects.iter().filter(|o| o.name == name).collect()
    }

    pub fn objects_by_type(&self, kind: ObjectType) -> Vec<&Object> {
        self.objects.iter().filter(|o| o.object_type == kind).collect()
    }

    /// Child layer by name, searching nested groups depth first.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        find_layer(&self.layers, name)
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.properties.value(name)
    }

    pub fn class_instance(&self, types: &PropertyTypes) -> Option<TiledClass> {
        tile::class_instance(&self.class, &self.properties, types)
    }
}

pub(crate) fn find_layer<'a>(layers: &'a [Layer], name: &str) -> Option<&'a Layer> {
    layers
        .iter()
        .find_map(|l| if l.name == name { Some(l) } else { l.layer(name) })
}

#[allow(clippy::too_many_arguments)]
fn place(
    tiles: &mut BTreeMap<(i32, i32), TileKey>,
    tile_objects: &mut BTreeMap<(i32, i32), TileObject>,
    index: &TileIndex,
    tilesets: &[Tileset],
    cell: (i32, i32),
    key: TileKey,
    raw: u32,
    tile_size: IVec2,
) {
    let Some(tile) = index.resolve(key, tilesets) else {
        return;
    };
    tiles.insert(cell, key);
    tile_objects.insert(
        cell,
        TileObject::new(IVec2::new(cell.0, cell.1), key, tile, raw, tile_size),
    );
}

/// Reads `data` as a GID array or an encoded payload.
fn read_data(
    data: Option<&dyn JsonNode>,
    encoding: &str,
    compression: &str,
    decoders: &DecoderRegistry,
) -> (Vec<u32>, Option<Arc<DecodeError>>) {
    let Some(data) = data else {
        return (Vec::new(), None);
    };
    if data.is_array() {
        let gids = data
            .elements()
            .into_iter()
            .map(|g| g.as_u32().unwrap_or(0))
            .collect();
        return (gids, None);
    }
    let payload = data.as_str().unwrap_or_default();
    match codec::decode_layer_data(decoders, encoding, compression, payload) {
        Ok(gids) => (gids, None),
        Err(err) => (Vec::new(), Some(Arc::new(err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::SerdeJsonBackend;
    use serde_json::json;
    use std::path::Path;

    fn parse(json: serde_json::Value) -> Layer {
        let registry = DecoderRegistry::with_base64();
        let mut ctx = ParseContext::new(&SerdeJsonBackend, &registry, None, Path::new(""));
        Layer::parse(&json, &mut ctx)
    }

    #[test]
    fn reads_fields_and_defaults() {
        let layer = parse(json!({
            "name": "ground", "opacity": 1.0, "type": "tilelayer", "visible": true,
            "x": 0, "y": 0, "width": 2, "height": 1, "offsetx": 4, "offsety": 8,
            "parallaxx": 0.5, "tintcolor": "#ff00ff", "data": [1, 0]
        }));
        assert!(layer.all_found);
        assert_eq!(layer.kind, LayerType::TileLayer);
        assert_eq!(layer.parallax, Vec2::new(0.5, 1.0));
        assert_eq!(layer.offset, Vec2::new(4.0, 8.0));
        assert_eq!(layer.data, vec![1, 0]);
        assert!(layer.tint_color == "#ff00ff");
    }

    #[test]
    fn missing_mandatory_field_only_marks_layer() {
        let layer = parse(json!({"name": "x", "type": "objectgroup", "objects": [{"id": 3, "name": "a"}]}));
        assert!(!layer.all_found);
        assert_eq!(layer.kind, LayerType::ObjectGroup);
        assert_eq!(layer.object(3).map(|o| o.name.as_str()), Some("a"));
    }

    #[test]
    fn base64_layer_data() {
        let layer = parse(json!({"name": "b", "type": "tilelayer", "encoding": "base64", "data": "AQAAAAIAAAA="}));
        assert_eq!(layer.data, vec![1, 2]);
        assert!(layer.decode_error.is_none());
    }

    #[test]
    fn undecodable_data_is_recorded() {
        let layer = parse(json!({"name": "b", "type": "tilelayer", "encoding": "base64", "data": "@@@@"}));
        assert!(layer.data.is_empty());
        assert!(layer.decode_error.is_some());
    }

    #[test]
    fn chunks_decode_through_the_pipeline() {
        let layer = parse(json!({
            "name": "inf", "type": "tilelayer", "encoding": "base64",
            "chunks": [{"x": -16, "y": 0, "width": 2, "height": 1, "data": "AQAAAAIAAAA="}]
        }));
        let chunk = &layer.chunks[0];
        assert_eq!(chunk.position, IVec2::new(-16, 0));
        assert_eq!(chunk.gid_at(1, 0), Some(2));
        assert_eq!(chunk.gid_at(2, 0), None);
    }

    #[test]
    fn nested_group_lookup() {
        let layer = parse(json!({
            "name": "root", "type": "group",
            "layers": [{"name": "a", "type": "group", "layers": [{"name": "deep", "type": "imagelayer"}]}]
        }));
        assert_eq!(layer.layer("deep").map(|l| l.kind), Some(LayerType::ImageLayer));
        assert!(layer.layer("nope").is_none());
    }
}
