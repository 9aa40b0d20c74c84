//! # Block Module
//!
//! This module provides the voxel material type and the six axis-aligned block
//! sides shared by the mesher (face directions) and the occlusion graph (chunk
//! faces).

pub mod block_side;

/// A voxel material ID.
///
/// Materials are opaque 16-bit codes; the engine only distinguishes air from
/// everything else. What a material looks like is the renderer's business.
pub type Material = u16;

/// The empty material. Air voxels are never meshed and let flood fills through.
pub const AIR: Material = 0;

/// Returns `true` if `material` is air.
#[inline]
pub fn is_air(material: Material) -> bool {
    material == AIR
}
