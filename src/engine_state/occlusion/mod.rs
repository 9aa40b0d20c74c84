//! # Occlusion
//!
//! Portal-style occlusion culling at chunk granularity.
//!
//! Each chunk is summarised by a [`ChunkVisibility`]: which of its six faces can
//! see each other through open space inside the chunk. The
//! [`OcclusionGraphBuilder`] computes it with six bit-parallel flood fills, and
//! the [`OcclusionCuller`] walks the chunk grid from the camera, passing through
//! a chunk only between faces its record connects.
//!
//! ```
//! use std::collections::HashMap;
//! use voxel_engine::engine_state::occlusion::{
//!     ChunkVisibility, FloodFill, Frustum, OcclusionCuller, OcclusionGraphBuilder,
//! };
//! use voxel_engine::engine_state::voxels::chunk::{ChunkKey, Lod, VoxelGrid};
//!
//! let mut flood_fill = FloodFill::for_lod(Lod::FINEST);
//! let visibility =
//!     OcclusionGraphBuilder::build(&VoxelGrid::new(Lod::FINEST), &mut flood_fill).unwrap();
//! assert_eq!(visibility, ChunkVisibility::ALL);
//!
//! let mut records = HashMap::new();
//! records.insert(ChunkKey::new(0, 0, 0), visibility);
//! let visible =
//!     OcclusionCuller::visible_chunks(ChunkKey::new(0, 0, 0), &Frustum::everything(), &records, 4);
//! assert_eq!(visible.len(), 7);
//! ```

pub mod builder;
pub mod culler;
pub mod flood_fill;
pub mod tasks;
pub mod visibility;

pub use builder::OcclusionGraphBuilder;
pub use culler::{Aabb, Frustum, OcclusionCuller, Plane};
pub use flood_fill::FloodFill;
pub use visibility::ChunkVisibility;
