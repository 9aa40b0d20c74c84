//! Packed vertex format for chunk meshes.
//!
//! A mesh vertex is a single 32-bit word: an integer corner position in
//! `[0, 32]³` plus the material of the quad it belongs to. The renderer uploads
//! the words as-is and unpacks them in its vertex shader, so the buffer carries
//! one `u32` attribute per vertex and nothing else.

use cgmath::Point3;

use crate::engine_state::voxels::{block::Material, chunk::CHUNK_DIMENSION};

/// Number of distinct corner positions along one axis (`0..=32`).
pub const VERTEX_POSITION_RADIX: u32 = CHUNK_DIMENSION as u32 + 1;

/// A vertex in the voxel rendering pipeline.
///
/// # Memory Layout
/// A mixed-radix packing, base 33 for each position component, with the
/// material in the remaining high range:
///
/// ```text
/// raw = x + 33 * (y + 33 * (z + 33 * material))
/// ```
///
/// The largest value, `33³ * 65536 - 1`, fits in a `u32`. Two vertices are
/// equal exactly when their packed words are.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex(u32);

impl Vertex {
    /// Packs a corner position and material.
    ///
    /// # Arguments
    /// * `pos` - Corner position, each component in `0..=32`
    /// * `material` - Material of the quad the corner belongs to
    ///
    /// # Returns
    /// A new `Vertex` instance
    pub fn new(pos: Point3<u32>, material: Material) -> Self {
        debug_assert!(pos.x < VERTEX_POSITION_RADIX);
        debug_assert!(pos.y < VERTEX_POSITION_RADIX);
        debug_assert!(pos.z < VERTEX_POSITION_RADIX);
        let r = VERTEX_POSITION_RADIX;
        Vertex(pos.x + r * (pos.y + r * (pos.z + r * material as u32)))
    }

    /// Wraps an already packed word.
    pub fn from_raw(raw: u32) -> Self {
        Vertex(raw)
    }

    /// The packed word.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// The corner position.
    pub fn position(self) -> Point3<u32> {
        let r = VERTEX_POSITION_RADIX;
        Point3::new(self.0 % r, (self.0 / r) % r, (self.0 / (r * r)) % r)
    }

    /// The material of the quad this vertex belongs to.
    pub fn material(self) -> Material {
        let r = VERTEX_POSITION_RADIX;
        (self.0 / (r * r * r)) as Material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_and_unpacks() {
        let vertex = Vertex::new(Point3::new(32, 0, 17), 513);
        assert_eq!(vertex.position(), Point3::new(32, 0, 17));
        assert_eq!(vertex.material(), 513);
    }

    #[test]
    fn extreme_values_fit() {
        let vertex = Vertex::new(Point3::new(32, 32, 32), Material::MAX);
        assert_eq!(vertex.raw(), 33 * 33 * 33 * 65536 - 1);
        assert_eq!(vertex.material(), Material::MAX);
        assert_eq!(Vertex::new(Point3::new(0, 0, 0), 0).raw(), 0);
    }

    #[test]
    fn equality_is_by_packed_value() {
        let a = Vertex::new(Point3::new(1, 2, 3), 4);
        assert_eq!(a, Vertex::from_raw(a.raw()));
        assert_ne!(a, Vertex::new(Point3::new(1, 2, 3), 5));
    }
}
