//! # Engine Configuration
//!
//! Settings the host application hands to the engine once at startup. They are
//! plain data, deserialized from JSON so a host can keep them next to its other
//! assets. Every field has a default, so an empty object is a valid config.
//!
//! ```rust
//! use voxel_engine::core::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "worker_count": 2 }"#).unwrap();
//! assert_eq!(config.worker_count, 2);
//! assert_eq!(config.mesh_cache_capacity, 1024);
//! ```

use std::{num::NonZeroUsize, path::Path};

use serde::{Deserialize, Serialize};

use crate::core::error::Result;

/// Runtime settings for an [`Engine`](crate::engine_state::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker threads. `0` picks the available parallelism.
    pub worker_count: usize,
    /// How many finished chunk meshes are kept before the least recently
    /// meshed one is evicted.
    pub mesh_cache_capacity: usize,
    /// Maximum distance, in chunks on any axis, the occlusion culler walks
    /// away from the camera chunk.
    pub view_distance: i32,
    /// Level of detail requested from the chunk generator.
    pub generation_lod: u8,
    /// Seed handed to the chunk generator.
    pub world_seed: u64,
    /// Store uniform chunks at the coarsest level of detail.
    pub promote_monochrome: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            worker_count: 0,
            mesh_cache_capacity: 1024,
            view_distance: 16,
            generation_lod: 0,
            world_seed: 0,
            promote_monochrome: true,
        }
    }
}

impl EngineConfig {
    /// Parses a config from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Resolves `worker_count`, falling back to the machine's parallelism.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count;
        }
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    /// Mesh cache capacity clamped to at least one entry.
    pub fn mesh_cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.mesh_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
