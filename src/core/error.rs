//! Error types for the voxel engine

use thiserror::Error;

use crate::engine_state::task_management::task::TaskKey;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum VoxelError {
    /// A level of detail outside the supported range.
    #[error("invalid level of detail {0}, expected 0..=5")]
    InvalidLod(u8),

    /// A flood fill was configured with an unsupported grid size.
    #[error("flood fill grid size {0} is not one of 4, 8, 16 or 32")]
    InvalidGridSize(usize),

    /// A dense buffer does not match the chunk volume.
    #[error("buffer holds {actual} voxels but the chunk needs {expected}")]
    BufferLengthMismatch { expected: usize, actual: usize },

    /// A run list no longer covers its index space exactly once.
    #[error("run list invariant violated: {0}")]
    InvariantViolation(String),

    /// A task with the same key is queued or running.
    #[error("{0} is already in flight")]
    AlreadyInFlight(TaskKey),

    /// The engine configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// The engine configuration could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, VoxelError>;
