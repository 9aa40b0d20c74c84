//! # Bit-Parallel Flood Fill
//!
//! Reachability through the air cells of one chunk, computed a row of cells at
//! a time. The grid is stored as `n * n` words, one per `(y, z)` pair, whose low
//! `n` bits are the cells along X:
//!
//! ```text
//! word(y, z) = y + z * n        bit x of the word = cell (x, y, z)
//! ```
//!
//! Growth along X is a shift within a word, `r | r << 1 | r >> 1`, repeated
//! until it stops changing. Growth along Y and Z moves the word's bits into the
//! four neighbouring words. Words that gained bits are pushed on a work stack
//! and flagged dirty so each is queued at most once at a time; the fill is done
//! when the stack is empty. The filled set only grows and is bounded by the air
//! mask, so this always terminates.

use bitvec::vec::BitVec;

use crate::core::error::{Result, VoxelError};
use crate::core::pool::Poolable;
use crate::engine_state::voxels::{
    block::{block_side::BlockSide, is_air},
    chunk::{Lod, VoxelGrid},
};

/// Grid sizes a flood fill accepts.
pub const SUPPORTED_SIZES: [usize; 4] = [4, 8, 16, 32];

/// Flood fill scratch buffers for one grid size.
#[derive(Debug)]
pub struct FloodFill {
    /// Cells per axis
    size: usize,
    /// Air cells of the loaded grid
    allows: Vec<u32>,
    /// Cells reached by the current fill
    filled: Vec<u32>,
    /// Words currently on the work stack
    dirty: BitVec,
    /// Words whose new bits still have to be spread
    stack: Vec<usize>,
}

impl FloodFill {
    /// Creates a flood fill for `size` cells per axis.
    ///
    /// # Errors
    /// [`VoxelError::InvalidGridSize`] unless `size` is 4, 8, 16 or 32.
    pub fn new(size: usize) -> Result<Self> {
        if !SUPPORTED_SIZES.contains(&size) {
            return Err(VoxelError::InvalidGridSize(size));
        }
        let words = size * size;
        Ok(FloodFill {
            size,
            allows: vec![0; words],
            filled: vec![0; words],
            dirty: BitVec::repeat(false, words),
            stack: Vec::with_capacity(words),
        })
    }

    /// Creates a flood fill sized for grids at `lod`.
    pub fn for_lod(lod: Lod) -> Self {
        let size = lod.voxels_per_axis();
        let words = size * size;
        FloodFill {
            size,
            allows: vec![0; words],
            filled: vec![0; words],
            dirty: BitVec::repeat(false, words),
            stack: Vec::with_capacity(words),
        }
    }

    /// Cells per axis.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Mask of the `size` low bits of a word.
    #[inline]
    fn row_mask(&self) -> u32 {
        if self.size == 32 {
            u32::MAX
        } else {
            (1 << self.size) - 1
        }
    }

    /// Loads the air mask of `grid`.
    ///
    /// # Errors
    /// [`VoxelError::InvalidGridSize`] if the grid is not `size` cells per axis.
    pub fn load(&mut self, grid: &VoxelGrid) -> Result<()> {
        let n = grid.voxels_per_axis();
        if n != self.size {
            return Err(VoxelError::InvalidGridSize(n));
        }

        let voxels = grid.as_slice();
        for (word, row) in self.allows.iter_mut().zip(voxels.chunks_exact(n)) {
            *word = row
                .iter()
                .enumerate()
                .filter(|(_, &material)| is_air(material))
                .fold(0, |bits, (x, _)| bits | 1 << x);
        }
        Ok(())
    }

    /// Loads an air mask directly, one word per `(y, z)` row.
    ///
    /// # Errors
    /// [`VoxelError::BufferLengthMismatch`] if `allows` is not `size * size` words.
    pub fn load_mask(&mut self, allows: &[u32]) -> Result<()> {
        if allows.len() != self.allows.len() {
            return Err(VoxelError::BufferLengthMismatch {
                expected: self.allows.len(),
                actual: allows.len(),
            });
        }
        let mask = self.row_mask();
        for (word, &row) in self.allows.iter_mut().zip(allows) {
            *word = row & mask;
        }
        Ok(())
    }

    /// Returns `true` if every cell of the loaded mask is solid.
    pub fn is_opaque(&self) -> bool {
        self.allows.iter().all(|&word| word == 0)
    }

    /// Floods from the air cells on `seed` and reports the faces reached.
    ///
    /// # Returns
    /// A mask with bit `side as usize` set for every face the fill touches,
    /// including `seed` itself whenever it has any air cell.
    pub fn fill_from(&mut self, seed: BlockSide) -> u8 {
        let n = self.size;
        self.filled.fill(0);
        self.dirty.fill(false);
        self.stack.clear();

        for word in 0..n * n {
            let (y, z) = (word % n, word / n);
            let seeded = match seed {
                BlockSide::LEFT => self.allows[word] & 1,
                BlockSide::RIGHT => self.allows[word] & 1 << (n - 1),
                BlockSide::BOTTOM if y == 0 => self.allows[word],
                BlockSide::TOP if y == n - 1 => self.allows[word],
                BlockSide::BACK if z == 0 => self.allows[word],
                BlockSide::FRONT if z == n - 1 => self.allows[word],
                _ => 0,
            };
            if seeded != 0 {
                self.filled[word] = seeded;
                self.dirty.set(word, true);
                self.stack.push(word);
            }
        }

        self.spread();
        self.touched_faces()
    }

    /// Runs the work stack to a fixed point.
    fn spread(&mut self) {
        let n = self.size;
        while let Some(word) = self.stack.pop() {
            self.dirty.set(word, false);

            let allows = self.allows[word];
            let mut reached = self.filled[word];
            loop {
                let grown = (reached | reached << 1 | reached >> 1) & allows;
                if grown == reached {
                    break;
                }
                reached = grown;
            }
            self.filled[word] = reached;

            let (y, z) = (word % n, word / n);
            let neighbours = [
                (y > 0).then(|| word - 1),
                (y + 1 < n).then(|| word + 1),
                (z > 0).then(|| word - n),
                (z + 1 < n).then(|| word + n),
            ];
            for neighbour in neighbours.into_iter().flatten() {
                let gained = reached & self.allows[neighbour] & !self.filled[neighbour];
                if gained != 0 {
                    self.filled[neighbour] |= gained;
                    if !self.dirty[neighbour] {
                        self.dirty.set(neighbour, true);
                        self.stack.push(neighbour);
                    }
                }
            }
        }
    }

    /// Faces the current fill result touches.
    fn touched_faces(&self) -> u8 {
        let n = self.size;
        let mut faces = 0u8;
        let mut mark = |side: BlockSide| faces |= 1 << side as u8;

        let any_row = self.filled.iter().fold(0, |bits, &word| bits | word);
        if any_row & 1 != 0 {
            mark(BlockSide::LEFT);
        }
        if any_row & 1 << (n - 1) != 0 {
            mark(BlockSide::RIGHT);
        }
        if (0..n).any(|z| self.filled[z * n] != 0) {
            mark(BlockSide::BOTTOM);
        }
        if (0..n).any(|z| self.filled[n - 1 + z * n] != 0) {
            mark(BlockSide::TOP);
        }
        if self.filled[..n].iter().any(|&word| word != 0) {
            mark(BlockSide::BACK);
        }
        if self.filled[n * (n - 1)..].iter().any(|&word| word != 0) {
            mark(BlockSide::FRONT);
        }
        faces
    }

    /// Returns `true` if the last fill reached cell `(x, y, z)`.
    pub fn is_filled(&self, x: usize, y: usize, z: usize) -> bool {
        self.filled[y + z * self.size] & 1 << x != 0
    }

    /// Number of cells reached by the last fill.
    pub fn filled_count(&self) -> usize {
        self.filled.iter().map(|word| word.count_ones() as usize).sum()
    }
}

impl Poolable for FloodFill {
    type Shape = Lod;

    fn create(lod: Lod) -> Self {
        FloodFill::for_lod(lod)
    }

    fn shape(&self) -> Lod {
        // Sizes come from `Lod`, so the matching level always exists.
        let lod = (self.size.trailing_zeros() as u8).abs_diff(5);
        Lod::new(lod).unwrap_or(Lod::COARSEST)
    }

    fn reshape(&mut self, lod: Lod) {
        let size = lod.voxels_per_axis();
        let words = size * size;
        self.size = size;
        self.allows.clear();
        self.allows.resize(words, 0);
        self.filled.clear();
        self.filled.resize(words, 0);
        self.dirty = BitVec::repeat(false, words);
        self.stack.clear();
    }
}
