//! Task for generating mesh data for chunks in a background thread.
//!
//! This module contains the `ChunkMeshGenerationTask` which decompresses a chunk
//! and greedy meshes it on a worker, keeping the main thread responsive while
//! mesh generation is performed.

use cgmath::{Vector3, Zero};
use log::{debug, error};

use crate::{
    core::{error::Result, MtResource},
    engine_state::{
        rendering::meshing::ChunkMesh,
        task_management::task::{Subsystem, Task, TaskKey, TaskResult, WorkerScratch},
        voxels::chunk::{ChunkKey, RunLengthChunk},
        EngineState,
    },
};

/// A task that generates mesh data for a chunk in a background thread.
///
/// This task is responsible for:
/// 1. Decompressing the chunk into a pooled dense grid
/// 2. Meshing the grid with a pooled greedy mesher
/// 3. Handing the mesh to the [`MeshManager`](crate::engine_state::rendering::MeshManager)
///    on the main thread
pub struct ChunkMeshGenerationTask {
    /// The chunk's position
    key: ChunkKey,
    /// The chunk that needs mesh generation
    chunk: MtResource<RunLengthChunk>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `key` - The chunk's position
    /// * `chunk` - The chunk that needs mesh generation
    ///
    /// # Returns
    /// A new `ChunkMeshGenerationTask` instance
    pub fn new(key: ChunkKey, chunk: MtResource<RunLengthChunk>) -> Self {
        ChunkMeshGenerationTask { key, chunk }
    }

    fn build_mesh(&self, scratch: &mut WorkerScratch) -> Result<ChunkMesh> {
        let chunk = self.chunk.get();
        let lod = chunk.lod();

        let mut grid = scratch.grids.acquire(lod);
        let decompressed = chunk.decompress_into(grid.as_mut_slice());
        drop(chunk);

        let mesh = decompressed.map(|_| {
            scratch
                .meshers
                .with(lod, |mesher| mesher.mesh(&grid, Vector3::zero()))
        });
        scratch.grids.release(grid);
        mesh
    }
}

impl Task for ChunkMeshGenerationTask {
    fn key(&self) -> TaskKey {
        TaskKey::new(Subsystem::Meshing, self.key)
    }

    /// Processes the mesh generation task.
    ///
    /// # Returns
    /// A boxed `TaskResult` carrying the mesh, or the error that prevented it
    fn process(&self, scratch: &mut WorkerScratch) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkMeshGenerationTaskResult {
            key: self.key,
            chunk: self.chunk.clone(),
            mesh: self.build_mesh(scratch),
        })
    }
}

/// The result of a chunk mesh generation task.
pub struct ChunkMeshGenerationTaskResult {
    /// The chunk's position
    key: ChunkKey,
    /// The chunk the mesh was built from
    chunk: MtResource<RunLengthChunk>,
    /// The finished mesh
    mesh: Result<ChunkMesh>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    /// Stores the mesh, unless the chunk was replaced or unloaded while it was being built.
    ///
    /// # Returns
    /// An empty vector (no follow-up tasks)
    fn handle_result(self: Box<Self>, state: &mut EngineState) -> Vec<Box<dyn Task + Send>> {
        let current = state
            .world
            .get(self.key)
            .is_some_and(|handle| handle.ptr_eq(&self.chunk));
        if !current {
            debug!("Discarding mesh of {}, chunk is no longer loaded", self.key);
            return Vec::new();
        }

        match self.mesh {
            Ok(mesh) => {
                state.meshes.insert_mesh(self.key, mesh);
            }
            Err(e) => error!("Failed to mesh {}: {}", self.key, e),
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

    #[test]
    fn meshes_a_loaded_chunk() {
        let mut state = EngineState::new(EngineConfig::default(), Arc::new(Empty));
        let key = ChunkKey::new(0, 0, 0);
        let mut grid = VoxelGrid::new(Lod::FINEST);
        grid.set_cell(5, 5, 5, 3);
        let handle = state.world.insert(key, RunLengthChunk::compress_from(&grid));

        let mut scratch = WorkerScratch::default();
        let task = ChunkMeshGenerationTask::new(key, handle);
        assert_eq!(task.key(), TaskKey::new(Subsystem::Meshing, key));
        let follow_ups = task.process(&mut scratch).handle_result(&mut state);
        assert!(follow_ups.is_empty());

        let mesh = state.meshes.get(key).unwrap();
        assert_eq!(mesh.quad_count(), 6);
        assert_eq!(mesh.side_quad_count(BlockSide::TOP), 1);
        // Scratch goes back to the worker's pools.
        assert_eq!(scratch.grids.idle_count(), 1);
        assert_eq!(scratch.meshers.idle_count(), 1);
    }

    #[test]
    fn stale_mesh_is_discarded() {
        let mut state = EngineState::new(EngineConfig::default(), Arc::new(Empty));
        let key = ChunkKey::new(0, 0, 0);
        let handle = state
            .world
            .insert(key, RunLengthChunk::filled(Lod::FINEST, 0));
        let result = ChunkMeshGenerationTask::new(key, handle)
            .process(&mut WorkerScratch::default());

        state
            .world
            .insert(key, RunLengthChunk::filled(Lod::FINEST, 1));
        result.handle_result(&mut state);
        assert!(!state.meshes.is_chunk_meshed(key));
    }
}
