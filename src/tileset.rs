use crate::color::Color;
use crate::error::TilesetError;
use crate::gid;
use crate::json::JsonNode;
use crate::loader::context::ParseContext;
use crate::project::{PropertyTypes, TiledClass};
use crate::property::{FromProperty, PropertyCollection};
use crate::tile::{self, Tile, TileRect};
use crate::wang::{Terrain, WangSet};
use log::debug;
use macroquad::math::IVec2;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TilesetType {
    #[default]
    Undefined,
    /// One image cut into a grid (`columns > 0`).
    ImageTileset,
    /// One image per tile (`columns == 0`).
    ImageCollectionTileset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectAlignment {
    #[default]
    Unspecified,
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl ObjectAlignment {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "topleft" => ObjectAlignment::TopLeft,
            "top" => ObjectAlignment::Top,
            "topright" => ObjectAlignment::TopRight,
            "left" => ObjectAlignment::Left,
            "center" => ObjectAlignment::Center,
            "right" => ObjectAlignment::Right,
            "bottomleft" => ObjectAlignment::BottomLeft,
            "bottom" => ObjectAlignment::Bottom,
            "bottomright" => ObjectAlignment::BottomRight,
            _ => ObjectAlignment::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileRenderSize {
    #[default]
    Undefined,
    Tile,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    #[default]
    Undefined,
    Stretch,
    PreserveAspectFit,
}

/// Tile grid used for tile objects and terrain overlays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    pub orientation: String,
    pub size: IVec2,
}

/// Which transformations the editor may apply to tiles of this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transformations {
    pub hflip: bool,
    pub vflip: bool,
    pub rotate: bool,
    pub prefer_untransformed: bool,
}

impl Transformations {
    fn parse(json: &dyn JsonNode) -> Self {
        Transformations {
            hflip: json.field_bool("hflip").unwrap_or(false),
            vflip: json.field_bool("vflip").unwrap_or(false),
            rotate: json.field_bool("rotate").unwrap_or(false),
            prefer_untransformed: json.field_bool("preferuntransformed").unwrap_or(false),
        }
    }
}

/// A tileset owning the GID range `[first_gid, first_gid + tile_count)`.
#[derive(Debug, Clone, Default)]
pub struct Tileset {
    /// Position in the map's tileset list.
    pub index: usize,
    pub first_gid: u32,
    /// `source` of an external tileset, as written in the map.
    pub source: Option<PathBuf>,
    pub columns: u32,
    pub kind: TilesetType,
    pub image: PathBuf,
    /// `image` joined onto the directory of the file that declared it.
    pub image_path: PathBuf,
    pub image_size: IVec2,
    pub margin: i32,
    pub spacing: i32,
    pub name: String,
    pub tile_count: u32,
    pub tile_size: IVec2,
    pub tile_offset: IVec2,
    pub transparent_color: Color,
    pub class: String,
    pub grid: Grid,
    pub object_alignment: ObjectAlignment,
    pub tile_render_size: TileRenderSize,
    pub fill_mode: FillMode,
    pub transformations: Transformations,
    pub wang_sets: Vec<WangSet>,
    /// Only present in files written before Tiled 1.5.
    pub terrains: Vec<Terrain>,
    pub properties: PropertyCollection,
    /// Sorted by id.
    pub(crate) tiles: Vec<Tile>,
}

impl Tileset {
    /// Parses a `tilesets` entry of a map, following `source` to an
    /// external file when present.
    pub(crate) fn parse(
        json: &dyn JsonNode,
        index: usize,
        ctx: &mut ParseContext,
    ) -> Result<Self, TilesetError> {
        let Some(first_gid) = json.field_u32("firstgid") else {
            return Err(TilesetError::MissingFields {
                name: json.field_string("name").unwrap_or_default(),
                fields: vec!["firstgid"],
            });
        };

        let Some(source) = json.field_str("source") else {
            let dir = ctx.directory.clone();
            return Self::parse_body(json, index, first_gid, None, &dir, ctx);
        };

        let path = ctx.directory.join(source);
        let doc = ctx
            .backend
            .parse_file(&path)
            .map_err(|source| TilesetError::Source {
                path: path.clone(),
                source,
            })?;
        debug!("loaded external tileset {}", path.display());

        let map_dir = std::mem::replace(&mut ctx.directory, doc.directory().to_path_buf());
        let result = Self::parse_body(
            doc.root(),
            index,
            first_gid,
            Some(PathBuf::from(source)),
            doc.directory(),
            ctx,
        );
        ctx.directory = map_dir;
        result
    }

    fn parse_body(
        json: &dyn JsonNode,
        index: usize,
        first_gid: u32,
        source: Option<PathBuf>,
        dir: &Path,
        ctx: &mut ParseContext,
    ) -> Result<Self, TilesetError> {
        let mut missing = Vec::new();

        let columns = json.field_u32("columns");
        let kind = match columns {
            Some(0) => TilesetType::ImageCollectionTileset,
            Some(_) => TilesetType::ImageTileset,
            None => {
                missing.push("columns");
                TilesetType::Undefined
            }
        };

        let mut image = PathBuf::new();
        let mut image_size = IVec2::ZERO;
        if kind == TilesetType::ImageTileset {
            match json.field_str("image") {
                Some(img) => image = PathBuf::from(img),
                None => missing.push("image"),
            }
            match (json.field_i32("imagewidth"), json.field_i32("imageheight")) {
                (Some(w), Some(h)) => image_size = IVec2::new(w, h),
                _ => missing.push("imagewidth/imageheight"),
            }
        }

        let mut required_i32 = |key: &'static str| {
            json.field_i32(key).unwrap_or_else(|| {
                missing.push(key);
                0
            })
        };
        let margin = required_i32("margin");
        let spacing = required_i32("spacing");
        let tile_count = required_i32("tilecount").max(0) as u32;

        let name = json.field_string("name");
        if name.is_none() {
            missing.push("name");
        }
        let tile_size = match (json.field_i32("tilewidth"), json.field_i32("tileheight")) {
            (Some(w), Some(h)) => IVec2::new(w, h),
            _ => {
                missing.push("tilewidth/tileheight");
                IVec2::ZERO
            }
        };

        let name = name.unwrap_or_default();
        if !missing.is_empty() {
            return Err(TilesetError::MissingFields { name, fields: missing });
        }
        let in_range = first_gid
            .checked_add(tile_count)
            .is_some_and(|end| end <= gid::GID_MASK + 1);
        if !in_range {
            return Err(TilesetError::InvalidRange { name, first_gid, tile_count });
        }

        let tile_offset = json
            .get("tileoffset")
            .map(|o| IVec2::new(o.field_i32("x").unwrap_or(0), o.field_i32("y").unwrap_or(0)))
            .unwrap_or_default();

        let grid = json
            .get("grid")
            .map(|g| Grid {
                orientation: g.field_string("orientation").unwrap_or_default(),
                size: IVec2::new(
                    g.field_i32("width").unwrap_or(0),
                    g.field_i32("height").unwrap_or(0),
                ),
            })
            .unwrap_or_default();

        let tile_render_size = match json.field_str("tilerendersize") {
            Some("tile") => TileRenderSize::Tile,
            Some("grid") => TileRenderSize::Grid,
            _ => TileRenderSize::Undefined,
        };
        let fill_mode = match json.field_str("fillmode") {
            Some("stretch") => FillMode::Stretch,
            Some("preserve-aspect-fit") => FillMode::PreserveAspectFit,
            _ => FillMode::Undefined,
        };

        let mut tileset = Tileset {
            index,
            first_gid,
            source,
            columns: columns.unwrap_or_default(),
            kind,
            image_path: dir.join(&image),
            image,
            image_size,
            margin,
            spacing,
            name,
            tile_count,
            tile_size,
            tile_offset,
            transparent_color: json
                .field_str("transparentcolor")
                .map(Color::parse)
                .unwrap_or_default(),
            class: json
                .field_string("class")
                .or_else(|| json.field_string("type"))
                .unwrap_or_default(),
            grid,
            object_alignment: json
                .field_str("objectalignment")
                .map(ObjectAlignment::from_tag)
                .unwrap_or_default(),
            tile_render_size,
            fill_mode,
            transformations: json
                .get("transformations")
                .map(Transformations::parse)
                .unwrap_or_default(),
            wang_sets: json
                .array("wangsets")
                .into_iter()
                .map(|w| WangSet::parse(w, ctx.types))
                .collect(),
            terrains: json
                .array("terrains")
                .into_iter()
                .map(|t| Terrain::parse(t, ctx.types))
                .collect(),
            properties: PropertyCollection::parse(&json.array("properties"), ctx.types),
            tiles: Vec::new(),
        };

        tileset.tiles = json
            .array("tiles")
            .into_iter()
            .map(|t| Tile::parse(t, index, first_gid, ctx))
            .collect();
        tileset.tiles.sort_by_key(|t| t.id);
        if ctx.generate_missing_tiles {
            tileset.generate_missing_tiles();
        }
        tileset.update_drawing_rects(ctx.tile_size);

        debug!(
            "tileset '{}' gids {}..{} ({} tiles)",
            tileset.name,
            tileset.first_gid,
            tileset.first_gid + tileset.tile_count,
            tileset.tiles.len()
        );
        Ok(tileset)
    }

    /// Adds an empty tile for every id in `1..=tile_count` the file left out.
    pub fn generate_missing_tiles(&mut self) {
        let missing: Vec<u32> = (1..=self.tile_count)
            .filter(|id| self.tile(*id).is_none())
            .collect();
        if missing.is_empty() {
            return;
        }
        for id in missing {
            self.tiles.push(Tile::missing(id, self.index, self.first_gid));
        }
        self.tiles.sort_by_key(|t| t.id);
    }

    fn update_drawing_rects(&mut self, map_tile_size: IVec2) {
        let rects: Vec<TileRect> = self
            .tiles
            .iter()
            .map(|t| self.drawing_rect(t.gid, t.image_size, map_tile_size))
            .collect();
        for (tile, rect) in self.tiles.iter_mut().zip(rects) {
            tile.drawing_rect = rect;
        }
    }

    /// Source rectangle of the tile with clean GID `gid`.
    pub fn drawing_rect(&self, gid: u32, image_size: IVec2, map_tile_size: IVec2) -> TileRect {
        match self.kind {
            TilesetType::ImageTileset if self.contains_gid(gid) && self.columns > 0 => {
                let base = (gid - self.first_gid) as i32;
                let columns = self.columns as i32;
                let rows = self.tile_count as i32 / columns;
                let col = base % columns;
                let row = base / columns;
                let offset = self.margin_spacing_offset(IVec2::new(col, row));
                TileRect {
                    x: col.saturating_mul(map_tile_size.x).saturating_add(offset.x),
                    y: row
                        .min((rows - 1).max(0))
                        .saturating_mul(map_tile_size.y)
                        .saturating_add(offset.y),
                    width: self.tile_size.x,
                    height: self.tile_size.y,
                }
            }
            TilesetType::ImageCollectionTileset => {
                TileRect::new(0, 0, image_size.x, image_size.y)
            }
            _ => TileRect::default(),
        }
    }

    /// Extra pixel offset margin and spacing add to the tile at `cell`.
    pub fn margin_spacing_offset(&self, cell: IVec2) -> IVec2 {
        if self.margin == 0 && self.spacing == 0 {
            return IVec2::ZERO;
        }
        IVec2::new(
            cell.x.saturating_mul(self.spacing).saturating_add(self.margin),
            cell.y.saturating_mul(self.spacing).saturating_add(self.margin),
        )
    }

    /// Whether the clean GID `gid` falls in this tileset's range.
    pub fn contains_gid(&self, gid: u32) -> bool {
        gid >= self.first_gid && (gid - self.first_gid) < self.tile_count
    }

    /// Tile by 1-based local id.
    pub fn tile(&self, id: u32) -> Option<&Tile> {
        self.tiles
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.tiles[i])
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn wang_set(&self, name: &str) -> Option<&WangSet> {
        self.wang_sets.iter().find(|w| w.name == name)
    }

    pub fn terrain(&self, name: &str) -> Option<&Terrain> {
        self.terrains.iter().find(|t| t.name == name)
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.properties.value(name)
    }

    pub fn class_instance(&self, types: &PropertyTypes) -> Option<TiledClass> {
        tile::class_instance(&self.class, &self.properties, types)
    }
}

/// Finds the tileset whose GID range contains the clean GID `gid`.
pub fn resolve_tileset(tilesets: &[Tileset], gid: u32) -> Option<&Tileset> {
    tilesets.iter().find(|t| t.contains_gid(gid))
}
