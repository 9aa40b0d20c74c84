//! # Block Side Module
//!
//! This module defines the six axis-aligned sides of a voxel block. The same
//! enum names the sweep direction of the greedy mesher and the faces of a chunk
//! in the occlusion graph.

use cgmath::{InnerSpace, Vector3, Zero};
use num_derive::FromPrimitive;

/// Represents the six possible faces of a voxel block.
///
/// Sides come in negative/positive pairs per axis, so `side as usize / 2` is
/// the axis and the low bit is the sign.
///
/// The order is: [LEFT, RIGHT, BOTTOM, TOP, BACK, FRONT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum BlockSide {
    /// The left face (facing negative X)
    LEFT = 0,

    /// The right face (facing positive X)
    RIGHT = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The back face (facing negative Z)
    BACK = 4,

    /// The front face (facing positive Z)
    FRONT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in index order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::BACK,
            BlockSide::FRONT,
        ]
    }

    /// Converts an index in `0..6` back into a side.
    pub fn from_index(index: usize) -> Option<BlockSide> {
        num::FromPrimitive::from_usize(index)
    }

    /// The axis this side is perpendicular to: 0 = X, 1 = Y, 2 = Z.
    #[inline]
    pub fn axis(self) -> usize {
        self as usize >> 1
    }

    /// Whether the outward normal points along the positive axis.
    #[inline]
    pub fn is_positive(self) -> bool {
        self as usize & 1 == 1
    }

    /// The side facing the other way along the same axis.
    #[inline]
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
            BlockSide::BOTTOM => BlockSide::TOP,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::FRONT => BlockSide::BACK,
        }
    }

    /// The integer step from a cell to its neighbour across this side.
    pub fn offset(self) -> Vector3<i32> {
        let step = if self.is_positive() { 1 } else { -1 };
        let mut offset = Vector3::zero();
        offset[self.axis()] = step;
        offset
    }

    /// The outward unit normal of this side.
    pub fn normal(self) -> Vector3<f32> {
        self.offset().cast::<f32>().unwrap_or_else(Vector3::zero)
    }

    /// Determines whether faces on this side can be seen along `view_vec`.
    ///
    /// A side is culled when its outward normal points the same way as the view
    /// direction or is perpendicular to it (`dot >= 0`). The zero vector
    /// disables culling entirely.
    ///
    /// # Arguments
    /// * `view_vec` - The direction the camera looks along; need not be normalized
    pub fn is_visible_from(self, view_vec: Vector3<f32>) -> bool {
        if view_vec.is_zero() {
            return true;
        }
        self.normal().dot(view_vec) < 0.0
    }

    /// Returns every side that survives [`BlockSide::is_visible_from`].
    pub fn get_visible_sides(view_vec: Vector3<f32>) -> Vec<BlockSide> {
        BlockSide::all()
            .into_iter()
            .filter(|side| side.is_visible_from(view_vec))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips() {
        for (index, side) in BlockSide::all().into_iter().enumerate() {
            assert_eq!(side as usize, index);
            assert_eq!(BlockSide::from_index(index), Some(side));
        }
        assert_eq!(BlockSide::from_index(6), None);
    }

    #[test]
    fn opposite_shares_axis_and_flips_sign() {
        for side in BlockSide::all() {
            let opposite = side.opposite();
            assert_eq!(side.axis(), opposite.axis());
            assert_ne!(side.is_positive(), opposite.is_positive());
            assert_eq!(side.offset() + opposite.offset(), Vector3::zero());
        }
    }

    #[test]
    fn zero_view_keeps_every_side() {
        assert_eq!(BlockSide::get_visible_sides(Vector3::zero()).len(), 6);
    }

    #[test]
    fn looking_down_sees_only_top() {
        let visible = BlockSide::get_visible_sides(Vector3::new(0.0, -1.0, 0.0));
        assert_eq!(visible, vec![BlockSide::TOP]);
    }

    #[test]
    fn perpendicular_view_culls_the_side() {
        let view = Vector3::new(1.0, 0.0, 0.0);
        assert!(BlockSide::LEFT.is_visible_from(view));
        assert!(!BlockSide::RIGHT.is_visible_from(view));
        assert!(!BlockSide::TOP.is_visible_from(view));
        assert!(!BlockSide::FRONT.is_visible_from(view));
    }

    #[test]
    fn diagonal_view_sees_three_sides() {
        let visible = BlockSide::get_visible_sides(Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(
            visible,
            vec![BlockSide::LEFT, BlockSide::BOTTOM, BlockSide::BACK]
        );
    }
}
