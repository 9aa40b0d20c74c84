//! # Occlusion Graph Builder
//!
//! Turns a chunk's voxels into its [`ChunkVisibility`]. One flood fill is run
//! from each of the six faces through the chunk's air cells; every face a fill
//! reaches is marked visible from the face it started on. The six fills are
//! independent and run back to back on the same scratch buffers.

use log::trace;

use crate::core::{error::Result, pool::Poolable};
use crate::engine_state::voxels::{block::block_side::BlockSide, chunk::VoxelGrid};

use super::{flood_fill::FloodFill, visibility::ChunkVisibility};

/// Builds face-to-face visibility records.
pub struct OcclusionGraphBuilder;

impl OcclusionGraphBuilder {
    /// Computes the visibility of `grid`.
    ///
    /// # Arguments
    /// * `grid` - The chunk's voxels
    /// * `flood_fill` - Scratch flood fill; reshaped if sized for another level of detail
    ///
    /// # Returns
    /// The visibility record: [`ChunkVisibility::ALL`] for an all-air chunk,
    /// [`ChunkVisibility::NONE`] for an all-solid one.
    pub fn build(grid: &VoxelGrid, flood_fill: &mut FloodFill) -> Result<ChunkVisibility> {
        if flood_fill.size() != grid.voxels_per_axis() {
            flood_fill.reshape(grid.lod());
        }
        flood_fill.load(grid)?;
        Ok(Self::build_loaded(flood_fill))
    }

    /// Computes visibility from a flood fill whose air mask is already loaded.
    pub fn build_loaded(flood_fill: &mut FloodFill) -> ChunkVisibility {
        let mut visibility = ChunkVisibility::NONE;
        for seed in BlockSide::all() {
            let reached = flood_fill.fill_from(seed);
            for face in BlockSide::all() {
                if face != seed && reached & 1 << face as u8 != 0 {
                    visibility.set_visible(seed, face, true);
                }
            }
            trace!("Flood from {:?} reached faces {:06b}", seed, reached);
        }
        visibility
    }
}
