//! Map-wide `GID -> tile` table.

use crate::gid;
use crate::tile::{Tile, TileKey};
use crate::tileset::{resolve_tileset, Tileset};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// Resolves GIDs to tiles through stable [`TileKey`] handles.
///
/// Tileset tiles are addressed by `(tileset index, local id)`; flipped
/// variants synthesized from layer data live in the index itself.
#[derive(Debug, Clone, Default)]
pub struct TileIndex {
    lookup: HashMap<u32, TileKey>,
    synthesized: HashMap<u32, Tile>,
}

impl TileIndex {
    /// Indexes every tile of every tileset by clean GID. The first tileset
    /// claiming a GID keeps it.
    pub fn build(tilesets: &[Tileset]) -> Self {
        let mut index = TileIndex::default();
        for ts in tilesets {
            // gid 0 marks tiles whose id could not be placed
            for tile in ts.tiles().iter().filter(|t| t.gid != 0) {
                index.lookup.entry(tile.gid).or_insert(TileKey::Tileset {
                    tileset: ts.index,
                    id: tile.id,
                });
            }
        }
        debug!("tile index holds {} gids", index.lookup.len());
        index
    }

    pub fn key(&self, gid: u32) -> Option<TileKey> {
        self.lookup.get(&gid).copied()
    }

    pub fn contains(&self, gid: u32) -> bool {
        self.lookup.contains_key(&gid)
    }

    pub fn tile<'a>(&'a self, gid: u32, tilesets: &'a [Tileset]) -> Option<&'a Tile> {
        self.resolve(self.key(gid)?, tilesets)
    }

    pub fn resolve<'a>(&'a self, key: TileKey, tilesets: &'a [Tileset]) -> Option<&'a Tile> {
        match key {
            TileKey::Tileset { tileset, id } => tilesets.get(tileset)?.tile(id),
            TileKey::Synthesized { gid } => self.synthesized.get(&gid),
        }
    }

    /// Adds one flipped tile per flagged GID whose clean GID is known.
    /// Returns how many were created.
    pub fn synthesize_flipped(&mut self, flagged: &BTreeSet<u32>, tilesets: &[Tileset]) -> usize {
        let mut created = 0;
        for &full in flagged {
            if self.lookup.contains_key(&full) {
                continue;
            }
            let clean = full & gid::GID_MASK;
            let Some(base) = self.tile(clean, tilesets) else {
                warn!("gid {clean} (flagged {full:#010x}) matches no tile");
                continue;
            };
            let Some(ts) = resolve_tileset(tilesets, clean) else {
                continue;
            };
            let tile = Tile::flipped(base, full, ts.first_gid);
            self.synthesized.insert(full, tile);
            self.lookup.insert(full, TileKey::Synthesized { gid: full });
            created += 1;
        }
        if created > 0 {
            debug!("synthesized {created} flipped tiles");
        }
        created
    }

    pub fn synthesized(&self) -> impl Iterator<Item = &Tile> {
        self.synthesized.values()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
