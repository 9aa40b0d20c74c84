//! # Core Module
//!
//! Shared primitives used throughout the voxel engine: the crate error type,
//! the engine configuration, thread-safe resource handles and the scratch pool
//! workers use to recycle their buffers.
//!
//! ## Key Components
//! - `VoxelError`: Every failure the engine reports to its caller
//! - `EngineConfig`: Startup settings, deserialized from JSON
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//! - `Pool`: Acquire/release pool of scratch buffers, reshaped on demand
//!
//! ## Usage
//! ```rust
//! use voxel_engine::core::MtResource;
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

pub mod config;
pub mod error;
pub mod mt_resource;
pub mod pool;

pub use config::EngineConfig;
pub use error::{Result, VoxelError};
pub use mt_resource::MtResource;
pub use pool::{Pool, Poolable};
