//! Mesh data structures for voxel rendering.
//!
//! A [`ChunkMesh`] is what the mesher hands to the renderer: one welded vertex
//! buffer shared by all six directions and one quad index buffer split into
//! six contiguous per-direction ranges, so a renderer can skip back-facing
//! directions with a range instead of a filter.

use std::ops::Range;

use crate::engine_state::rendering::Vertex;
use crate::engine_state::voxels::block::block_side::BlockSide;

/// Largest number of vertices in one mesh; indices are 16-bit.
pub const MAX_VERTICES: usize = 65535;
/// Largest number of quads in one mesh.
pub const MAX_QUADS: usize = 65856;
/// Indices per quad.
pub const INDICES_PER_QUAD: usize = 4;

/// The meshed surface of one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMesh {
    /// Welded vertices, each a packed position and material
    pub vertices: Vec<Vertex>,
    /// Quad corner indices into `vertices`, four per quad
    pub indices: Vec<u16>,
    /// Quad ranges (in quads, not indices) for each [`BlockSide`], by side index
    pub side_ranges: [Range<usize>; 6],
    /// Set when the vertex or quad limit was hit and quads were dropped
    pub overflowed: bool,
}

impl ChunkMesh {
    /// Number of quads across all directions.
    pub fn quad_count(&self) -> usize {
        self.indices.len() / INDICES_PER_QUAD
    }

    /// Returns `true` if the mesh has no quads.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The quad index ranges facing `side`, four indices per quad.
    pub fn quads(&self, side: BlockSide) -> &[u16] {
        let range = &self.side_ranges[side as usize];
        &self.indices[range.start * INDICES_PER_QUAD..range.end * INDICES_PER_QUAD]
    }

    /// Number of quads facing `side`.
    pub fn side_quad_count(&self, side: BlockSide) -> usize {
        self.side_ranges[side as usize].len()
    }

    /// Converts the quad list into a triangle list, two triangles per quad,
    /// keeping each quad's winding.
    pub fn triangle_indices(&self) -> Vec<u16> {
        let mut triangles = Vec::with_capacity(self.quad_count() * 6);
        for quad in self.indices.chunks_exact(INDICES_PER_QUAD) {
            triangles.extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
        }
        triangles
    }

    /// The vertex buffer as raw bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The quad index buffer as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    fn two_quad_mesh() -> ChunkMesh {
        let mut side_ranges: [Range<usize>; 6] = Default::default();
        side_ranges[BlockSide::TOP as usize] = 0..1;
        side_ranges[BlockSide::BOTTOM as usize] = 1..2;
        side_ranges[BlockSide::BACK as usize] = 2..2;
        ChunkMesh {
            vertices: (0..6)
                .map(|i| Vertex::new(Point3::new(i, 0, 0), 1))
                .collect(),
            indices: vec![0, 1, 2, 3, 2, 3, 4, 5],
            side_ranges,
            overflowed: false,
        }
    }

    #[test]
    fn per_side_ranges() {
        let mesh = two_quad_mesh();
        assert_eq!(mesh.quad_count(), 2);
        assert_eq!(mesh.quads(BlockSide::TOP), &[0, 1, 2, 3]);
        assert_eq!(mesh.quads(BlockSide::BOTTOM), &[2, 3, 4, 5]);
        assert!(mesh.quads(BlockSide::LEFT).is_empty());
        assert_eq!(mesh.side_quad_count(BlockSide::BACK), 0);
    }

    #[test]
    fn triangles_keep_winding() {
        let mesh = two_quad_mesh();
        assert_eq!(
            mesh.triangle_indices(),
            vec![0, 1, 2, 0, 2, 3, 2, 3, 4, 2, 4, 5]
        );
    }

    #[test]
    fn byte_views() {
        let mesh = two_quad_mesh();
        assert_eq!(mesh.vertex_bytes().len(), 6 * 4);
        assert_eq!(mesh.index_bytes().len(), 8 * 2);
    }
}
