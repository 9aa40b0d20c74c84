//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work asynchronously across multiple threads.
//!
//! ## Core Components
//! - `TaskKey`: Identifies the single task a subsystem may run for a chunk at a time
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//! - `WorkerScratch`: Buffers a worker reuses from one task to the next
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread with that worker's scratch
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the main thread with the engine state
//! 5. The result can spawn follow-up tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the main thread
//! - Chunk data is shared with workers read-only; only the host mutates the world

use std::fmt;

use crate::{
    core::pool::Pool,
    engine_state::{
        occlusion::flood_fill::FloodFill,
        rendering::meshing::GreedyMesher,
        voxels::chunk::{ChunkKey, VoxelGrid},
        EngineState,
    },
};

/// The engine subsystem a task belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// World generation
    Generation,
    /// Greedy meshing
    Meshing,
    /// Occlusion graph building
    Occlusion,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsystem::Generation => "generation",
            Subsystem::Meshing => "meshing",
            Subsystem::Occlusion => "occlusion",
        };
        f.write_str(name)
    }
}

/// Identifies a task by subsystem and chunk.
///
/// At most one task per key is in flight at any time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskKey {
    /// The subsystem doing the work
    pub subsystem: Subsystem,
    /// The chunk the work is for
    pub chunk: ChunkKey,
}

impl TaskKey {
    /// Creates a key.
    pub fn new(subsystem: Subsystem, chunk: ChunkKey) -> Self {
        TaskKey { subsystem, chunk }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} task for {}", self.subsystem, self.chunk)
    }
}

/// Scratch objects owned by one worker and lent to each task it runs.
///
/// Each pool hands out objects sized for the level of detail asked for and
/// reshapes idle ones when the level changes between chunks.
#[derive(Debug, Default)]
pub struct WorkerScratch {
    /// Dense grids to decompress chunks into
    pub grids: Pool<VoxelGrid>,
    /// Meshers with their vertex tables and output buffers
    pub meshers: Pool<GreedyMesher>,
    /// Flood fill arenas
    pub flood_fills: Pool<FloodFill>,
}

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks are the primary mechanism for offloading work from the main thread to
/// background workers. They should be designed to be self-contained and own all
/// the data they need to perform their work.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should be relatively coarse-grained to amortize task scheduling overhead
/// - Runs to completion; there is no cancellation once a worker has picked it up
pub trait Task: Send {
    /// The key this task is scheduled under.
    fn key(&self) -> TaskKey;

    /// Processes the task and returns a result.
    ///
    /// This method contains the actual work to be performed asynchronously.
    /// It runs on a background thread and should avoid blocking operations
    /// that could starve other tasks.
    ///
    /// # Arguments
    /// * `scratch` - The running worker's reusable buffers
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be processed on the main thread.
    fn process(&self, scratch: &mut WorkerScratch) -> Box<dyn TaskResult + Send>;
}

/// A trait representing the result of processing a `Task`.
///
/// Task results are processed on the main thread and can:
/// - Store their output in the engine state
/// - Spawn follow-up tasks
pub trait TaskResult: Send {
    /// Handles the result of a completed task on the main thread.
    ///
    /// # Arguments
    /// * `state` - The engine state to apply the result to
    ///
    /// # Returns
    /// Follow-up tasks to schedule (can be empty).
    fn handle_result(self: Box<Self>, state: &mut EngineState) -> Vec<Box<dyn Task + Send>>;
}
