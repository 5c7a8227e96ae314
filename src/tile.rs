use crate::gid::{self, FlipFlags};
use crate::json::JsonNode;
use crate::layer::Layer;
use crate::loader::context::ParseContext;
use crate::project::{PropertyTypes, TiledClass};
use crate::property::{FromProperty, PropertyCollection};
use macroquad::math::{IVec2, Rect, Vec2};
use std::path::PathBuf;

/// Integer pixel rectangle inside a tileset image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TileRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        TileRect { x, y, width, height }
    }

    pub fn to_macroquad(&self) -> Rect {
        Rect::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// Stable handle to a tile owned either by a tileset or by the map's table
/// of synthesized flipped tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKey {
    /// Tile `id` (1-based) of the map's `tileset`-th tileset.
    Tileset { tileset: usize, id: u32 },
    /// Flipped variant keyed by its flagged GID.
    Synthesized { gid: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    /// Local tile id, 1-based like [`Tile::id`].
    pub tile_id: u32,
    /// Milliseconds.
    pub duration: u32,
}

impl Frame {
    fn parse(json: &dyn JsonNode) -> Self {
        Frame {
            tile_id: json
                .field_u32("tileid")
                .and_then(|id| id.checked_add(1))
                .unwrap_or_default(),
            duration: json.field_u32("duration").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Animation {
    pub frames: Vec<Frame>,
}

impl Animation {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn total_duration(&self) -> u32 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    /// Frame shown `elapsed_ms` into a looping playback.
    pub fn frame_at(&self, elapsed_ms: u32) -> Option<&Frame> {
        let total = self.total_duration();
        if total == 0 {
            return self.frames.first();
        }
        let mut t = elapsed_ms % total;
        for frame in &self.frames {
            if t < frame.duration {
                return Some(frame);
            }
            t -= frame.duration;
        }
        self.frames.last()
    }
}

/// One tile of a tileset, or a flipped variant synthesized while resolving
/// layer data.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    /// Local id, 1-based (`0` in the file becomes `1`).
    pub id: u32,
    /// Clean GID for tileset tiles, flagged GID for synthesized ones.
    pub gid: u32,
    /// Index of the owning tileset in [`Map::tilesets`](crate::Map::tilesets).
    pub tileset: usize,
    pub image: PathBuf,
    pub image_size: IVec2,
    /// Sub-rectangle of `image`; the whole image unless the file narrows it.
    pub sub_rect: TileRect,
    pub class: String,
    pub object_group: Option<Box<Layer>>,
    pub animation: Animation,
    /// Terrain index per corner (pre-1.5 files), `-1` for none.
    pub terrain: Vec<i32>,
    pub properties: PropertyCollection,
    /// Only set on synthesized flipped tiles.
    pub flip_flags: FlipFlags,
    /// Source rectangle to draw, derived from the tileset layout.
    pub drawing_rect: TileRect,
    pub all_found: bool,
}

impl Tile {
    /// Parses an entry of a tileset's `tiles` array.
    pub(crate) fn parse(
        json: &dyn JsonNode,
        tileset: usize,
        first_gid: u32,
        ctx: &mut ParseContext,
    ) -> Self {
        let id = json.field_u32("id").and_then(|id| id.checked_add(1));
        let image_size = match (json.field_i32("imagewidth"), json.field_i32("imageheight")) {
            (Some(w), Some(h)) => IVec2::new(w, h),
            _ => IVec2::ZERO,
        };
        let sub_rect = TileRect {
            x: json.field_i32("x").unwrap_or(0),
            y: json.field_i32("y").unwrap_or(0),
            width: json.field_i32("width").unwrap_or(image_size.x),
            height: json.field_i32("height").unwrap_or(image_size.y),
        };

        let object_group = json
            .get("objectgroup")
            .map(|og| Box::new(Layer::parse(og, ctx)));

        let animation = Animation {
            frames: json.array("animation").into_iter().map(Frame::parse).collect(),
        };

        // ids whose GID would leave the 29-bit range count as missing
        let gid = id
            .and_then(|id| first_gid.checked_add(id - 1))
            .filter(|g| *g <= gid::GID_MASK);
        Tile {
            id: id.unwrap_or_default(),
            gid: gid.unwrap_or_default(),
            tileset,
            image: json.field_str("image").map(PathBuf::from).unwrap_or_default(),
            image_size,
            sub_rect,
            class: json
                .field_string("type")
                .or_else(|| json.field_string("class"))
                .unwrap_or_default(),
            object_group,
            animation,
            terrain: json
                .array("terrain")
                .into_iter()
                .map(|t| t.as_i32().unwrap_or(-1))
                .collect(),
            properties: PropertyCollection::parse(&json.array("properties"), ctx.types),
            flip_flags: FlipFlags::NONE,
            drawing_rect: TileRect::default(),
            all_found: gid.is_some(),
        }
    }

    /// Empty tile standing in for an id the file did not list.
    pub(crate) fn missing(id: u32, tileset: usize, first_gid: u32) -> Self {
        Tile {
            id,
            gid: first_gid.saturating_add(id.saturating_sub(1)),
            tileset,
            all_found: true,
            ..Default::default()
        }
    }

    /// Flipped variant of `base` for the flagged GID `full_gid`.
    ///
    /// Shares the tileset, image, properties and drawing rect of `base`.
    pub(crate) fn flipped(base: &Tile, full_gid: u32, first_gid: u32) -> Self {
        let (flags, clean) = gid::decode(full_gid);
        Tile {
            id: clean.saturating_sub(first_gid) + 1,
            gid: full_gid,
            flip_flags: flags,
            object_group: None,
            ..base.clone()
        }
    }

    /// Clean GID, flags stripped.
    pub fn clean_gid(&self) -> u32 {
        self.gid & gid::GID_MASK
    }

    pub fn has_flip_flags(&self, flags: FlipFlags) -> bool {
        self.flip_flags.contains(flags)
    }

    /// Pixel position of the cell `(x, y)` for the given tile size.
    pub fn position(&self, cell: IVec2, tile_size: IVec2) -> Vec2 {
        cell.as_vec2() * tile_size.as_vec2()
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.properties.value(name)
    }

    /// The project class named by `class`, overridden by matching properties.
    pub fn class_instance(&self, types: &PropertyTypes) -> Option<TiledClass> {
        class_instance(&self.class, &self.properties, types)
    }
}

/// Clones the class `name` and overrides members with `properties`.
pub(crate) fn class_instance(
    name: &str,
    properties: &PropertyCollection,
    types: &PropertyTypes,
) -> Option<TiledClass> {
    if name.is_empty() {
        return None;
    }
    let mut class = types.class(name)?.clone();
    class.update_from_properties(properties);
    Some(class)
}
