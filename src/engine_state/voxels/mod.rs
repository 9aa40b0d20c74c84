//! # Voxel Engine Core
//!
//! This module contains the voxel data side of the engine: how chunks are stored,
//! addressed, generated and edited.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Materials and the six axis-aligned sides
//! * **Chunk**: Dense and run-length chunk representations, levels of detail and generators
//! * **World**: The host-owned sparse map of chunks, with change listeners and a dirty set
//! * **Tasks**: Chunk generation, run on the worker pool
//!
//! ## Data Flow
//!
//! 1. The engine schedules a generation task for a requested chunk
//! 2. The worker generates a dense grid and compresses it to runs
//! 3. The host inserts the chunk into the world, firing listeners
//! 4. Mesh and occlusion tasks are scheduled for the new chunk
//!
//! ## Thread Safety
//!
//! * Chunk data is shared with workers through `MtResource` handles
//! * Only the host mutates the world map itself

pub mod block;
pub mod chunk;
pub mod tasks;
pub mod world;
