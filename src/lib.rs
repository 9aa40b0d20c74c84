#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Engine
//!
//! The chunk pipeline of a voxel engine: storage, greedy meshing and portal-style
//! occlusion culling, run on a pool of worker threads.
//!
//! ## Key Modules
//!
//! * `core` - Errors, configuration, shared handles and scratch pools
//! * `engine_state` - The engine subsystems: voxels, meshing, occlusion and task management
//!
//! ## Architecture
//!
//! * Chunks are 32x32x32 voxels, stored run-length encoded and decompressed into dense
//!   grids only while a worker processes them
//! * Greedy meshing merges coplanar faces into rectangles and welds shared corners
//! * Each chunk records which of its faces see each other; the culler walks those
//!   records outward from the camera
//! * Work is keyed by subsystem and chunk, so one chunk never has two tasks of a kind running
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use voxel_engine::core::EngineConfig;
//! use voxel_engine::engine_state::{voxels::chunk::{generators::Solid, ChunkKey}, Engine};
//!
//! voxel_engine::init_logger();
//! let mut engine = Engine::new(EngineConfig::default(), Arc::new(Solid(1))).unwrap();
//! engine.request_chunk(ChunkKey::new(0, 0, 0)).unwrap();
//! engine.flush();
//! assert_eq!(engine.world().len(), 1);
//! ```
//!
//! ## Performance Considerations
//!
//! * Run-length storage keeps uniform and layered chunks to a handful of runs
//! * Flood fills and face masks work on whole 32-bit rows at a time
//! * Workers reuse their grids, meshers and flood fill buffers across chunks

pub mod core;
pub mod engine_state;

/// Initializes logging.
///
/// Native targets log to stdout through `env_logger`, filtered by `RUST_LOG`; web targets
/// log to the browser console and install a panic hook. Calling this more than once is
/// harmless.
pub fn init_logger() {
    cfg_if::cfg_if! {
        if #[cfg(target_family = "wasm")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            if console_log::init_with_level(log::Level::Info).is_ok() {
                log::info!("Logger initialized");
            }
        } else {
            let mut log_builder = env_logger::Builder::new();
            if log_builder
                .target(env_logger::Target::Stdout)
                .parse_env("RUST_LOG")
                .try_init()
                .is_ok()
            {
                log::info!("Logger initialized");
            }
        }
    }
}
