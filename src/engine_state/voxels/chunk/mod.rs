//! # Chunk Module
//!
//! A chunk is a fixed 32x32x32 region of the world and the unit of storage,
//! meshing and occlusion analysis. This module holds the two representations a
//! chunk moves between and the types that address them:
//!
//! - [`VoxelGrid`]: a dense array of materials, used while generating, meshing
//!   and flood filling
//! - [`RunLengthChunk`]: a sorted run list, the resting representation the
//!   world keeps in memory
//! - [`Lod`]: how many fine voxels one stored cell covers
//! - [`ChunkKey`]: a chunk's position in chunk-grid coordinates
//!
//! ## Memory Layout
//!
//! Both representations share one linear index space, X fastest, then Y, then
//! Z:
//!
//! ```text
//! index = x + y * n + z * n * n      where n = 32 >> lod
//! ```
//!
//! Voxel coordinates passed to `get`/`set` are always fine coordinates in
//! `[0, 32)`; they are divided by the cell size before indexing, so the same
//! position addresses the right cell at any level of detail.

use cgmath::{Point3, Vector3};

use crate::core::error::{Result, VoxelError};
use crate::engine_state::occlusion::culler::Aabb;

use super::block::block_side::BlockSide;

mod chunk_creation;
pub mod chunk_iteration;
pub mod generators;
pub mod run_length;
pub mod voxel_grid;

pub(crate) use chunk_creation::RunLengthBuilder;
pub use generators::ChunkGenerator;
pub use run_length::{Run, RunLengthChunk};
pub use voxel_grid::VoxelGrid;

/// The dimension (width, height, depth) of a chunk in fine voxels.
pub const CHUNK_DIMENSION: usize = 32;
/// `log2(CHUNK_DIMENSION)`; world positions shift right by this to get chunk keys.
pub const CHUNK_SHIFT: u32 = 5;
/// The largest level of detail callers may request.
pub const MAX_REQUESTED_LOD: u8 = 5;
/// The coarsest level of detail actually stored. Grids never drop below
/// `MIN_VOXELS_PER_AXIS` cells per axis, so coarser requests are capped here.
pub const MAX_LOD: u8 = 3;
/// The smallest number of cells along one axis of any grid.
pub const MIN_VOXELS_PER_AXIS: usize = CHUNK_DIMENSION >> MAX_LOD;

/// A validated level of detail.
///
/// LoD `l` stores `32 >> l` cells per axis, each covering `2^l` fine voxels
/// along every axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Lod(u8);

impl Lod {
    /// Full detail: one cell per voxel.
    pub const FINEST: Lod = Lod(0);
    /// The coarsest stored level: 4 cells per axis.
    pub const COARSEST: Lod = Lod(MAX_LOD);

    /// Validates a requested level of detail.
    ///
    /// Values in `0..=5` are accepted; anything above [`MAX_LOD`] is capped so
    /// the grid keeps at least four cells per axis.
    ///
    /// # Errors
    /// Returns [`VoxelError::InvalidLod`] for values above 5.
    pub fn new(lod: u8) -> Result<Lod> {
        if lod > MAX_REQUESTED_LOD {
            return Err(VoxelError::InvalidLod(lod));
        }
        Ok(Lod(lod.min(MAX_LOD)))
    }

    /// The raw exponent.
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Number of cells along one axis.
    #[inline]
    pub fn voxels_per_axis(self) -> usize {
        CHUNK_DIMENSION >> self.0
    }

    /// Edge length of one cell in fine voxels.
    #[inline]
    pub fn voxel_size(self) -> usize {
        1 << self.0
    }

    /// Number of cells in a chunk at this level of detail.
    #[inline]
    pub fn volume(self) -> usize {
        let n = self.voxels_per_axis();
        n * n * n
    }

    /// Linear index of the cell containing the fine voxel `pos`.
    #[inline]
    pub fn index_of(self, pos: Point3<usize>) -> usize {
        let n = self.voxels_per_axis();
        let shift = self.0;
        (pos.x >> shift) + (pos.y >> shift) * n + (pos.z >> shift) * n * n
    }
}

impl TryFrom<u8> for Lod {
    type Error = VoxelError;

    fn try_from(value: u8) -> Result<Self> {
        Lod::new(value)
    }
}

/// Identifies a chunk by its position in chunk-grid coordinates.
///
/// Chunk `(cx, cy, cz)` covers world voxels `[cx*32, cx*32 + 32)` on X and so
/// on. Keys are plain values; hashing and equality are structural.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkKey(pub Point3<i32>);

impl ChunkKey {
    /// Creates a key from chunk coordinates.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkKey(Point3::new(x, y, z))
    }

    /// The chunk containing world voxel `pos`.
    ///
    /// Arithmetic shifts floor toward negative infinity, so `-1` maps to chunk
    /// `-1`, not `0`.
    pub fn from_world_position(pos: Point3<i32>) -> Self {
        ChunkKey(Point3::new(
            pos.x >> CHUNK_SHIFT,
            pos.y >> CHUNK_SHIFT,
            pos.z >> CHUNK_SHIFT,
        ))
    }

    /// The position of `pos` inside its chunk, in fine voxels.
    pub fn local_position(pos: Point3<i32>) -> Point3<usize> {
        let mask = CHUNK_DIMENSION as i32 - 1;
        Point3::new(
            (pos.x & mask) as usize,
            (pos.y & mask) as usize,
            (pos.z & mask) as usize,
        )
    }

    /// The world position of this chunk's minimum corner.
    pub fn world_origin(self) -> Point3<i32> {
        Point3::new(
            self.0.x << CHUNK_SHIFT,
            self.0.y << CHUNK_SHIFT,
            self.0.z << CHUNK_SHIFT,
        )
    }

    /// The adjacent chunk across `side`.
    pub fn neighbor(self, side: BlockSide) -> ChunkKey {
        ChunkKey(self.0 + side.offset())
    }

    /// The world-space box this chunk covers.
    pub fn aabb(self) -> Aabb {
        Aabb::of_chunk(self)
    }

    /// Chebyshev distance to `other`, in chunks.
    pub fn distance(self, other: ChunkKey) -> i32 {
        let delta: Vector3<i32> = self.0 - other.0;
        delta.x.abs().max(delta.y.abs()).max(delta.z.abs())
    }
}

impl std::fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chunk ({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}
