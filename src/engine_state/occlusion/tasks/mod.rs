//! Background tasks for the occlusion system.
//!
//! # Available Tasks
//! - `ChunkOcclusionTask`: Builds a chunk's face-to-face visibility

pub mod chunk_occlusion_task;
