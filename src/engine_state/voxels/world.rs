//! # World Module
//!
//! This module provides the `World` struct which manages the collection of chunks in the
//! voxel world. The host owns it; worker tasks only ever see individual chunk handles.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach where only chunks that have been generated or
//! inserted are kept in memory. Each chunk is kept in its run-length form behind an
//! [`MtResource`] so meshing and occlusion tasks can read it from worker threads while the
//! host keeps the authoritative handle.
//!
//! ## Change Tracking
//!
//! - Listeners registered with [`World::add_listener`] are called with the key and handle
//!   of every inserted or edited chunk.
//! - Edited chunks are also collected in a dirty set, drained with [`World::take_dirty`],
//!   which the engine uses to schedule remeshing and occlusion rebuilds.
//!
//! ## Performance Considerations
//!
//! - Chunk lookup is O(1) using a hash map
//! - A voxel edit is a binary search plus a run-list splice on one chunk

use std::collections::{HashMap, HashSet};

use cgmath::Point3;
use log::debug;

use crate::core::MtResource;
use crate::engine_state::voxels::block::Material;
use crate::engine_state::voxels::chunk::{ChunkKey, RunLengthChunk};

/// Called with the key and handle of every chunk inserted into or edited in the world.
pub type ChunkListener = Box<dyn FnMut(ChunkKey, &MtResource<RunLengthChunk>) + Send>;

/// Represents a voxel world composed of multiple chunks.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_engine::engine_state::voxels::chunk::{ChunkKey, Lod, RunLengthChunk};
/// use voxel_engine::engine_state::voxels::world::World;
///
/// let mut world = World::new();
/// world.insert(ChunkKey::new(0, 0, 0), RunLengthChunk::filled(Lod::FINEST, 0));
///
/// assert!(world.set_voxel(Point3::new(3, 4, 5), 7));
/// assert_eq!(world.get_voxel(Point3::new(3, 4, 5)), Some(7));
/// assert_eq!(world.take_dirty(), vec![ChunkKey::new(0, 0, 0)]);
/// ```
#[derive(Default)]
pub struct World {
    /// A mapping from chunk keys to chunk data.
    chunks: HashMap<ChunkKey, MtResource<RunLengthChunk>>,
    /// Callbacks fired on every insert and edit
    listeners: Vec<ChunkListener>,
    /// Chunks edited since the last [`World::take_dirty`]
    dirty: HashSet<ChunkKey>,
}

impl World {
    /// Creates a new, empty world.
    ///
    /// # Returns
    ///
    /// A new `World` instance with no chunks loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener fired on every chunk insert and edit.
    pub fn add_listener(&mut self, listener: ChunkListener) {
        self.listeners.push(listener);
    }

    /// Inserts a chunk, replacing any chunk already stored at `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - The chunk position
    /// * `chunk` - The chunk data
    ///
    /// # Returns
    ///
    /// The shared handle now stored in the world.
    pub fn insert(&mut self, key: ChunkKey, chunk: RunLengthChunk) -> MtResource<RunLengthChunk> {
        let handle = MtResource::new(chunk);
        if self.chunks.insert(key, handle.clone()).is_some() {
            debug!("Replaced {}", key);
        }
        self.notify(key, &handle);
        handle
    }

    /// Retrieves the handle of the chunk at `key`, if loaded.
    ///
    /// # Thread Safety
    ///
    /// The returned chunk is wrapped in a thread-safe reference-counted container,
    /// allowing it to be safely shared between the host and worker threads.
    pub fn get(&self, key: ChunkKey) -> Option<MtResource<RunLengthChunk>> {
        self.chunks.get(&key).cloned()
    }

    /// Removes and returns the chunk at `key`.
    pub fn remove(&mut self, key: ChunkKey) -> Option<MtResource<RunLengthChunk>> {
        self.dirty.remove(&key);
        self.chunks.remove(&key)
    }

    /// Returns `true` if a chunk is loaded at `key`.
    pub fn contains(&self, key: ChunkKey) -> bool {
        self.chunks.contains_key(&key)
    }

    /// Number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if no chunk is loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterates the keys of all loaded chunks.
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.chunks.keys().copied()
    }

    /// The material at world voxel `pos`, or `None` if its chunk is not loaded.
    pub fn get_voxel(&self, pos: Point3<i32>) -> Option<Material> {
        let chunk = self.chunks.get(&ChunkKey::from_world_position(pos))?;
        let local = ChunkKey::local_position(pos);
        let material = chunk.get().get(local);
        Some(material)
    }

    /// Sets the world voxel at `pos`.
    ///
    /// The containing chunk is marked dirty and listeners are notified, even when the
    /// material was already `material`.
    ///
    /// # Returns
    ///
    /// `false` if the chunk containing `pos` is not loaded.
    pub fn set_voxel(&mut self, pos: Point3<i32>, material: Material) -> bool {
        let key = ChunkKey::from_world_position(pos);
        let Some(handle) = self.chunks.get(&key).cloned() else {
            return false;
        };

        handle.get_mut().set(ChunkKey::local_position(pos), material);
        self.mark_dirty(key);
        self.notify(key, &handle);
        true
    }

    /// Flags `key` for rebuilding. Unloaded keys are ignored.
    pub fn mark_dirty(&mut self, key: ChunkKey) {
        if self.chunks.contains_key(&key) {
            self.dirty.insert(key);
        }
    }

    /// Returns `true` if any chunk is waiting to be rebuilt.
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Drains the dirty set.
    pub fn take_dirty(&mut self) -> Vec<ChunkKey> {
        self.dirty.drain().collect()
    }

    fn notify(&mut self, key: ChunkKey, handle: &MtResource<RunLengthChunk>) {
        for listener in &mut self.listeners {
            listener(key, handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::Lod;
    use std::sync::{Arc, Mutex};

    #[test]
    fn voxel_access_crosses_chunk_boundaries() {
        let mut world = World::new();
        world.insert(ChunkKey::new(-1, 0, 0), RunLengthChunk::filled(Lod::FINEST, 0));
        world.insert(ChunkKey::new(0, 0, 0), RunLengthChunk::filled(Lod::FINEST, 0));

        assert!(world.set_voxel(Point3::new(-1, 2, 3), 4));
        assert!(world.set_voxel(Point3::new(0, 2, 3), 5));
        assert!(!world.set_voxel(Point3::new(0, 40, 3), 5));

        assert_eq!(world.get_voxel(Point3::new(-1, 2, 3)), Some(4));
        assert_eq!(world.get_voxel(Point3::new(0, 2, 3)), Some(5));
        assert_eq!(world.get_voxel(Point3::new(0, 40, 3)), None);

        let mut dirty = world.take_dirty();
        dirty.sort_by_key(|key| key.0.x);
        assert_eq!(dirty, vec![ChunkKey::new(-1, 0, 0), ChunkKey::new(0, 0, 0)]);
        assert!(world.take_dirty().is_empty());
    }

    #[test]
    fn listeners_see_inserts_and_edits() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut world = World::new();
        let sink = seen.clone();
        world.add_listener(Box::new(move |key, handle| {
            sink.lock().unwrap().push((key, handle.get().run_count()));
        }));

        let key = ChunkKey::new(2, 0, 0);
        world.insert(key, RunLengthChunk::filled(Lod::FINEST, 0));
        world.set_voxel(Point3::new(64 + 5, 0, 0), 1);

        assert_eq!(*seen.lock().unwrap(), vec![(key, 1), (key, 3)]);
    }

    #[test]
    fn remove_clears_dirty_flag() {
        let mut world = World::new();
        let key = ChunkKey::new(0, 0, 0);
        world.insert(key, RunLengthChunk::filled(Lod::FINEST, 0));
        world.set_voxel(Point3::new(1, 1, 1), 2);
        assert!(world.remove(key).is_some());
        assert!(world.take_dirty().is_empty());
        assert!(world.is_empty());
    }
}
