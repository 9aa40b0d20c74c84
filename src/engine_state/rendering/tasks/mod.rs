//! Worker tasks for the rendering side.
//!
//! Meshing is the only rendering work done off the polling thread. The task reads
//! the chunk through its shared handle, so the world can keep serving other tasks
//! while the mesh is built.
//!
//! - `ChunkMeshGenerationTask`: Greedy-meshes one chunk into a `ChunkMesh`

pub mod chunk_mesh_generation_task;
