//! # Chunk Visibility
//!
//! A 15-bit record of which pairs of chunk faces can see each other through the
//! chunk's open interior. There are `6 * 5 / 2 = 15` unordered pairs of distinct
//! faces; pair `(a, b)` with `a < b` lives at bit
//!
//! ```text
//! a * (11 - a) / 2 + (b - a - 1)
//! ```
//!
//! A set bit means the two faces are **not** connected, so [`ChunkVisibility::ALL`]
//! is zero. Pairs are unordered, which makes `get_visible(a, b) == get_visible(b, a)`
//! hold structurally.

use std::fmt;

use crate::engine_state::voxels::block::block_side::BlockSide;

/// Number of unordered pairs of distinct faces.
pub const FACE_PAIR_COUNT: u32 = 15;

/// Face-to-face connectivity of one chunk.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChunkVisibility(u16);

impl ChunkVisibility {
    /// Every face sees every other face.
    pub const ALL: ChunkVisibility = ChunkVisibility(0);
    /// No face sees any other face.
    pub const NONE: ChunkVisibility = ChunkVisibility((1 << FACE_PAIR_COUNT) - 1);

    /// Wraps raw bits. Bits above the 15 pair bits are dropped.
    pub fn from_bits(bits: u16) -> Self {
        ChunkVisibility(bits & Self::NONE.0)
    }

    /// The raw bits, set meaning "not visible".
    pub fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    fn pair_bit(a: BlockSide, b: BlockSide) -> u16 {
        let (a, b) = if (a as usize) < (b as usize) {
            (a as usize, b as usize)
        } else {
            (b as usize, a as usize)
        };
        1 << (a * (11 - a) / 2 + (b - a - 1))
    }

    /// Returns `true` if `a` and `b` are connected. A face always sees itself.
    pub fn get_visible(self, a: BlockSide, b: BlockSide) -> bool {
        a == b || self.0 & Self::pair_bit(a, b) == 0
    }

    /// Marks `a` and `b` as connected or not. Setting a face against itself does nothing.
    pub fn set_visible(&mut self, a: BlockSide, b: BlockSide, visible: bool) {
        if a == b {
            return;
        }
        let bit = Self::pair_bit(a, b);
        if visible {
            self.0 &= !bit;
        } else {
            self.0 |= bit;
        }
    }

    /// Returns `true` if at least one pair of faces is connected.
    pub fn any_visible(self) -> bool {
        self != Self::NONE
    }

    /// Iterates every connected pair once, smaller side first.
    pub fn visible_pairs(self) -> impl Iterator<Item = (BlockSide, BlockSide)> {
        BlockSide::all().into_iter().flat_map(move |a| {
            BlockSide::all()
                .into_iter()
                .filter(move |&b| (a as usize) < (b as usize) && self.get_visible(a, b))
                .map(move |b| (a, b))
        })
    }
}

impl Default for ChunkVisibility {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Debug for ChunkVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkVisibility({:015b})", self.0)
    }
}
