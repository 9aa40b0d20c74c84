//! # Chunk Occlusion Task
//!
//! Builds a chunk's [`ChunkVisibility`] on a worker thread and records it in the
//! engine's visibility map, where the culler picks it up on the next query.

use log::{debug, error};

use crate::{
    core::{error::Result, MtResource},
    engine_state::{
        occlusion::{builder::OcclusionGraphBuilder, visibility::ChunkVisibility},
        task_management::task::{Subsystem, Task, TaskKey, TaskResult, WorkerScratch},
        voxels::{
            block::is_air,
            chunk::{ChunkKey, RunLengthChunk},
        },
        EngineState,
    },
};

/// A task that computes the face-to-face visibility of one chunk.
pub struct ChunkOcclusionTask {
    /// The chunk's position
    key: ChunkKey,
    /// The chunk to analyse
    chunk: MtResource<RunLengthChunk>,
}

impl ChunkOcclusionTask {
    /// Creates a new chunk occlusion task.
    pub fn new(key: ChunkKey, chunk: MtResource<RunLengthChunk>) -> Self {
        ChunkOcclusionTask { key, chunk }
    }

    fn build_visibility(&self, scratch: &mut WorkerScratch) -> Result<ChunkVisibility> {
        let chunk = self.chunk.get();
        let lod = chunk.lod();

        // Uniform chunks need no flood fill.
        if chunk.is_monochrome() {
            return Ok(if is_air(chunk.get_index(0)) {
                ChunkVisibility::ALL
            } else {
                ChunkVisibility::NONE
            });
        }

        let mut grid = scratch.grids.acquire(lod);
        let decompressed = chunk.decompress_into(grid.as_mut_slice());
        drop(chunk);

        let visibility = decompressed.and_then(|_| {
            scratch.flood_fills.with(lod, |flood_fill| {
                OcclusionGraphBuilder::build(&grid, flood_fill)
            })
        });
        scratch.grids.release(grid);
        visibility
    }
}

impl Task for ChunkOcclusionTask {
    fn key(&self) -> TaskKey {
        TaskKey::new(Subsystem::Occlusion, self.key)
    }

    fn process(&self, scratch: &mut WorkerScratch) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkOcclusionTaskResult {
            key: self.key,
            chunk: self.chunk.clone(),
            visibility: self.build_visibility(scratch),
        })
    }
}

/// The result of a chunk occlusion task.
pub struct ChunkOcclusionTaskResult {
    key: ChunkKey,
    chunk: MtResource<RunLengthChunk>,
    visibility: Result<ChunkVisibility>,
}

impl TaskResult for ChunkOcclusionTaskResult {
    fn handle_result(self: Box<Self>, state: &mut EngineState) -> Vec<Box<dyn Task + Send>> {
        let current = state
            .world
            .get(self.key)
            .is_some_and(|handle| handle.ptr_eq(&self.chunk));
        if !current {
            debug!("Discarding visibility of {}, chunk is no longer loaded", self.key);
            return Vec::new();
        }

        match self.visibility {
            Ok(visibility) => {
                state.visibility.insert(self.key, visibility);
            }
            Err(e) => error!("Failed to build visibility of {}: {}", self.key, e),
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::engine_state::voxels::{
        block::block_side::BlockSide,
        chunk::{generators::Empty, Lod, VoxelGrid},
    };
    use std::sync::Arc;

    fn run(state: &mut EngineState, key: ChunkKey, chunk: RunLengthChunk) -> WorkerScratch {
        let handle = state.world.insert(key, chunk);
        let mut scratch = WorkerScratch::default();
        ChunkOcclusionTask::new(key, handle)
            .process(&mut scratch)
            .handle_result(state);
        scratch
    }

    #[test]
    fn uniform_chunks_skip_the_flood_fill() {
        let mut state = EngineState::new(EngineConfig::default(), Arc::new(Empty));
        let air = ChunkKey::new(0, 0, 0);
        let stone = ChunkKey::new(1, 0, 0);
        let scratch = run(&mut state, air, RunLengthChunk::filled(Lod::FINEST, 0));
        run(&mut state, stone, RunLengthChunk::filled(Lod::FINEST, 2));

        assert_eq!(state.visibility[&air], ChunkVisibility::ALL);
        assert_eq!(state.visibility[&stone], ChunkVisibility::NONE);
        assert_eq!(scratch.flood_fills.created_count(), 0);
    }

    #[test]
    fn slab_chunk_blocks_vertical_sight() {
        let mut state = EngineState::new(EngineConfig::default(), Arc::new(Empty));
        let key = ChunkKey::new(0, 0, 0);
        let mut grid = VoxelGrid::new(Lod::new(1).unwrap());
        for z in 0..16 {
            for x in 0..16 {
                grid.set_cell(x, 4, z, 1);
            }
        }
        let scratch = run(&mut state, key, RunLengthChunk::compress_from(&grid));

        let visibility = state.visibility[&key];
        assert!(!visibility.get_visible(BlockSide::TOP, BlockSide::BOTTOM));
        assert!(visibility.get_visible(BlockSide::LEFT, BlockSide::RIGHT));
        assert_eq!(scratch.flood_fills.idle_count(), 1);
    }
}
