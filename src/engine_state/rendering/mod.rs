//! Rendering side of the voxel engine.
//!
//! The engine does not draw anything itself. This module turns chunks into GPU-ready
//! geometry and keeps the finished meshes for a renderer to upload:
//!
//! - [`Vertex`]: A corner position and material packed into one `u32`
//! - [`meshing`]: The greedy mesher, the mesh format and the [`MeshManager`] cache
//! - [`tasks`]: The background task that meshes a chunk on a worker

pub mod meshing;
pub mod tasks;
mod vertex;

// Re-export commonly used types
pub use meshing::MeshManager;
pub use vertex::{Vertex, VERTEX_POSITION_RADIX};
