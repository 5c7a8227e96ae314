//! Global tile ids and the flip flags packed into their top bits.

use std::ops::{BitAnd, BitOr, BitOrAssign};

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits

/// Subset of {horizontal, vertical, diagonal} flips applied to a placed tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlipFlags(u32);

impl FlipFlags {
    /// No flip.
    pub const NONE: FlipFlags = FlipFlags(0);
    /// Mirrored along the vertical axis.
    pub const HORIZONTAL: FlipFlags = FlipFlags(FLIP_H);
    /// Mirrored along the horizontal axis.
    pub const VERTICAL: FlipFlags = FlipFlags(FLIP_V);
    /// Anti-diagonal flip (x and y swapped).
    pub const DIAGONAL: FlipFlags = FlipFlags(FLIP_D);

    /// Keeps only the three flag bits of `raw`.
    #[inline]
    pub fn from_gid(raw: u32) -> Self {
        FlipFlags(raw & !GID_MASK)
    }
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
    /// True when every flag in `other` is set.
    #[inline]
    pub fn contains(self, other: FlipFlags) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for FlipFlags {
    type Output = FlipFlags;
    fn bitor(self, rhs: FlipFlags) -> FlipFlags {
        FlipFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FlipFlags {
    fn bitor_assign(&mut self, rhs: FlipFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FlipFlags {
    type Output = FlipFlags;
    fn bitand(self, rhs: FlipFlags) -> FlipFlags {
        FlipFlags(self.0 & rhs.0)
    }
}

/// A raw GID as it appears in layer data, flags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileId(pub u32);

impl TileId {
    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn flags(self) -> FlipFlags { FlipFlags::from_gid(self.0) }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
    #[inline] pub fn is_flipped(self) -> bool { !self.flags().is_empty() }
}

/// Splits a raw GID into its flip flags and clean id.
#[inline]
pub fn decode(raw: u32) -> (FlipFlags, u32) {
    let id = TileId(raw);
    (id.flags(), id.clean())
}

/// Packs flags back onto a clean id. Bits of `clean` above the mask are dropped.
#[inline]
pub fn encode(flags: FlipFlags, clean: u32) -> u32 {
    flags.bits() | (clean & GID_MASK)
}
