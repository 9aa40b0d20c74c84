//! Mesh generation for voxel rendering.
//!
//! This module converts voxel grids into compact quad meshes. It implements greedy meshing
//! to reduce the number of vertices and faces by combining coplanar faces with the same
//! material, and welds shared corners so every distinct vertex is stored once.
//!
//! # Architecture
//! - [`ChunkMesh`]: The output, a welded vertex buffer and per-direction quad ranges
//! - [`GreedyMesher`]: Reusable mesher scratch state, pooled per worker
//! - [`VertexTable`]: The open-addressed vertex-to-index table used for welding
//!
//! # Usage
//! ```
//! use cgmath::{Vector3, Zero};
//! use voxel_engine::engine_state::rendering::meshing::GreedyMesher;
//! use voxel_engine::engine_state::voxels::chunk::{Lod, VoxelGrid};
//!
//! let mut grid = VoxelGrid::new(Lod::FINEST);
//! grid.set_cell(4, 4, 4, 1);
//!
//! let mesh = GreedyMesher::new(Lod::FINEST).mesh(&grid, Vector3::zero());
//! assert_eq!(mesh.quad_count(), 6);
//! ```

mod greedy;
#[allow(clippy::module_inception)]
mod mesh;
mod vertex_table;

pub use greedy::GreedyMesher;
pub use mesh::*;
pub use vertex_table::VertexTable;
