//! Mesh generation and management for voxel rendering.
//!
//! This module owns the finished meshes of the world. Meshes are produced on the worker
//! pool by [`ChunkMeshGenerationTask`](crate::engine_state::rendering::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask)
//! and handed to the [`MeshManager`] on the host, which keeps a bounded number of them and
//! evicts the least recently meshed chunk when full.
//!
//! # Architecture
//! - `MeshManager`: Bounded store of finished meshes, keyed by chunk
//! - `mesh/`: The greedy mesher and the mesh format it produces
//!
//! # Performance Considerations
//! - Greedy meshing minimizes vertex count
//! - Meshes are shared as `Arc`s, so a renderer can hold one while the chunk is remeshed

use std::{num::NonZeroUsize, sync::Arc};

use log::debug;
use lru::LruCache;

use crate::engine_state::voxels::chunk::ChunkKey;

/// Core mesh generation algorithms and data structures.
mod mesh;

// Re-export the mesh module's public interface for external use
pub use mesh::*;

/// Keeps the meshes of recently meshed chunks.
///
/// # Performance Considerations
///
/// - Uses LRU caching to bound memory; the least recently meshed chunk is dropped first
/// - Lookups through [`MeshManager::get`] count as use and promote the chunk
pub struct MeshManager {
    /// LRU cache of finished meshes
    least_recently_meshed_chunks: LruCache<ChunkKey, Arc<ChunkMesh>>,
}

impl MeshManager {
    /// Creates a manager that keeps at most `capacity` meshes.
    pub fn new(capacity: NonZeroUsize) -> Self {
        MeshManager {
            least_recently_meshed_chunks: LruCache::new(capacity),
        }
    }

    /// Stores the mesh of `key`, replacing any previous one.
    ///
    /// # Returns
    ///
    /// The key of the chunk evicted to make room, if any.
    pub fn insert_mesh(&mut self, key: ChunkKey, mesh: ChunkMesh) -> Option<ChunkKey> {
        let evicted = self
            .least_recently_meshed_chunks
            .push(key, Arc::new(mesh))
            .and_then(|(evicted_key, _)| (evicted_key != key).then_some(evicted_key));
        if let Some(evicted_key) = evicted {
            debug!("Evicted mesh of {}", evicted_key);
        }
        evicted
    }

    /// The mesh of `key`, promoting it to most recently used.
    pub fn get(&mut self, key: ChunkKey) -> Option<Arc<ChunkMesh>> {
        self.least_recently_meshed_chunks.get(&key).cloned()
    }

    /// The mesh of `key`, without touching the eviction order.
    pub fn peek(&self, key: ChunkKey) -> Option<&Arc<ChunkMesh>> {
        self.least_recently_meshed_chunks.peek(&key)
    }

    /// Checks if a chunk has been meshed.
    ///
    /// # Returns
    ///
    /// `true` if a mesh for `key` is held
    pub fn is_chunk_meshed(&self, key: ChunkKey) -> bool {
        self.least_recently_meshed_chunks.contains(&key)
    }

    /// Drops the meshes of `keys`.
    pub fn unload_chunks(&mut self, keys: &[ChunkKey]) {
        for key in keys {
            self.least_recently_meshed_chunks.pop(key);
        }
    }

    /// Number of meshes held.
    pub fn len(&self) -> usize {
        self.least_recently_meshed_chunks.len()
    }

    /// Returns `true` if no mesh is held.
    pub fn is_empty(&self) -> bool {
        self.least_recently_meshed_chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_meshed() {
        let mut manager = MeshManager::new(NonZeroUsize::new(2).unwrap());
        let (a, b, c) = (
            ChunkKey::new(0, 0, 0),
            ChunkKey::new(1, 0, 0),
            ChunkKey::new(2, 0, 0),
        );
        assert_eq!(manager.insert_mesh(a, ChunkMesh::default()), None);
        assert_eq!(manager.insert_mesh(b, ChunkMesh::default()), None);
        assert!(manager.get(a).is_some());
        assert_eq!(manager.insert_mesh(c, ChunkMesh::default()), Some(b));
        assert!(manager.is_chunk_meshed(a));
        assert!(!manager.is_chunk_meshed(b));
    }

    #[test]
    fn remeshing_replaces_in_place() {
        let mut manager = MeshManager::new(NonZeroUsize::new(1).unwrap());
        let key = ChunkKey::new(0, 0, 0);
        manager.insert_mesh(key, ChunkMesh::default());
        let replacement = ChunkMesh {
            overflowed: true,
            ..ChunkMesh::default()
        };
        assert_eq!(manager.insert_mesh(key, replacement), None);
        assert!(manager.peek(key).is_some_and(|mesh| mesh.overflowed));
        manager.unload_chunks(&[key]);
        assert!(manager.is_empty());
    }
}
