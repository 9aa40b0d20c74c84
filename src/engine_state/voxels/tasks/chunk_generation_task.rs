//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which handles asynchronous
//! generation of chunk data. This task is scheduled when a chunk is requested
//! that the world does not hold yet.

use std::sync::Arc;

use log::debug;
use web_time::Instant;

use crate::engine_state::{
    occlusion::tasks::chunk_occlusion_task::ChunkOcclusionTask,
    rendering::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask,
    task_management::task::{Subsystem, Task, TaskKey, TaskResult, WorkerScratch},
    voxels::chunk::{ChunkGenerator, ChunkKey, Lod, RunLengthChunk},
    EngineState,
};

/// A task that generates chunk data asynchronously.
///
/// This task is responsible for:
/// 1. Generating the chunk's voxels with the world's generator
/// 2. Compressing them into a run-length chunk
/// 3. Adding the chunk to the world and scheduling its meshing and occlusion tasks
pub struct ChunkGenerationTask {
    /// The chunk to generate
    key: ChunkKey,
    /// Level of detail to generate at
    lod: Lod,
    /// World seed
    seed: u64,
    /// The world generator
    generator: Arc<dyn ChunkGenerator>,
    /// Store uniform chunks at the coarsest level of detail
    promote_monochrome: bool,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `key` - The chunk to generate
    /// * `lod` - Level of detail to generate at
    /// * `seed` - World seed handed to the generator
    /// * `generator` - The world generator
    /// * `promote_monochrome` - Whether uniform chunks are stored at [`Lod::COARSEST`]
    ///
    /// # Returns
    /// A new `ChunkGenerationTask` instance
    pub fn new(
        key: ChunkKey,
        lod: Lod,
        seed: u64,
        generator: Arc<dyn ChunkGenerator>,
        promote_monochrome: bool,
    ) -> Self {
        ChunkGenerationTask {
            key,
            lod,
            seed,
            generator,
            promote_monochrome,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn key(&self) -> TaskKey {
        TaskKey::new(Subsystem::Generation, self.key)
    }

    /// Executes the chunk generation task.
    ///
    /// # Returns
    /// A boxed `TaskResult` containing the generated chunk
    fn process(&self, _scratch: &mut WorkerScratch) -> Box<dyn TaskResult + Send> {
        let start = Instant::now();

        let mut grid = self.generator.generate(self.key, self.seed, self.lod);
        if self.promote_monochrome {
            grid = grid.promote_if_monochrome();
        }
        let chunk = RunLengthChunk::compress_from(&grid);

        debug!(
            "Generated {} at {:?} in {:?} ({} runs)",
            self.key,
            chunk.lod(),
            start.elapsed(),
            chunk.run_count()
        );

        Box::new(ChunkGenerationTaskResult {
            key: self.key,
            chunk,
        })
    }
}

/// The result of a chunk generation task.
///
/// This contains the generated chunk data and is responsible for scheduling
/// the follow-up tasks that depend on it.
pub struct ChunkGenerationTaskResult {
    /// The chunk's position
    key: ChunkKey,
    /// The generated chunk
    chunk: RunLengthChunk,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Adds the chunk to the world.
    ///
    /// # Returns
    /// The chunk's mesh generation and occlusion tasks
    fn handle_result(self: Box<Self>, state: &mut EngineState) -> Vec<Box<dyn Task + Send>> {
        let handle = state.world.insert(self.key, self.chunk);
        vec![
            Box::new(ChunkMeshGenerationTask::new(self.key, handle.clone())),
            Box::new(ChunkOcclusionTask::new(self.key, handle)),
        ]
    }
}
