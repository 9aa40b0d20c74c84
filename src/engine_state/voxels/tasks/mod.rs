//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation and processing.
//! These tasks are designed to be processed asynchronously to maintain smooth
//! performance during world generation and updates.

pub mod chunk_generation_task;
