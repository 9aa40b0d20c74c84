//! Greedy meshing implementation for voxel rendering.
//!
//! This module implements the greedy meshing algorithm which combines adjacent coplanar
//! faces with the same material into larger quads, significantly reducing the number of
//! vertices and primitives needed to render a chunk.
//!
//! # Algorithm
//!
//! Each of the six directions is swept independently, one layer of cells at a time. For a
//! direction on axis `a` the layer is indexed by columns along `u = (a + 1) % 3` (bits of a
//! row mask) and rows along `v = (a + 2) % 3`. Per row two masks are built:
//!
//! - `no_rects`: cells whose face cannot be meshed, because the cell is air or because the
//!   next cell in the sweep direction is solid and buries the face. Cells past the chunk
//!   boundary count as solid, so a chunk never meshes its own outer shell
//! - `rect_starts`: cells that begin a horizontal span, where the material changes or the
//!   previous cell is in `no_rects`, minus `no_rects` itself
//!
//! Rectangles are then peeled off greedily from the lowest row that still has a start: grow
//! right while the material holds, grow up while the whole span holds, and mark the covered
//! bits consumed. Consuming a rectangle seeds a start just past its right edge so the cells
//! after it can still open their own rectangle.
//!
//! # Capacity
//!
//! Indices are 16-bit, so a mesh holds at most [`MAX_VERTICES`] vertices and [`MAX_QUADS`]
//! quads. A quad that would exceed either limit is dropped whole and the mesh is flagged
//! `overflowed`; meshing never fails.

use std::ops::Range;

use cgmath::{Point3, Vector3};
use log::{debug, warn};
use web_time::Instant;

use crate::core::pool::Poolable;
use crate::engine_state::rendering::Vertex;
use crate::engine_state::voxels::{
    block::{block_side::BlockSide, is_air, Material},
    chunk::{Lod, VoxelGrid},
};

use super::{
    mesh::{ChunkMesh, MAX_QUADS, MAX_VERTICES},
    vertex_table::VertexTable,
};

/// Reusable scratch state for meshing chunks at one level of detail.
#[derive(Debug)]
pub struct GreedyMesher {
    /// The level of detail the layer buffers are sized for
    lod: Lod,
    /// Vertex welding table
    table: VertexTable,
    /// Vertices emitted by the current call
    vertices: Vec<Vertex>,
    /// Quad indices emitted by the current call, in side order
    indices: Vec<u16>,
    /// Materials of the current layer, row-major
    layer: Vec<Material>,
    /// Per-row mask of cells that cannot start or join a rectangle
    no_rects: Vec<u32>,
    /// Per-row mask of cells that start a rectangle
    rect_starts: Vec<u32>,
    /// Set when a quad was dropped during the current call
    overflowed: bool,
}

impl GreedyMesher {
    /// Creates a mesher sized for grids at `lod`.
    pub fn new(lod: Lod) -> Self {
        let n = lod.voxels_per_axis();
        GreedyMesher {
            lod,
            table: VertexTable::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            layer: vec![0; n * n],
            no_rects: vec![0; n],
            rect_starts: vec![0; n],
            overflowed: false,
        }
    }

    /// The level of detail the mesher is currently sized for.
    pub fn lod(&self) -> Lod {
        self.lod
    }

    /// Meshes `grid`.
    ///
    /// # Arguments
    /// * `grid` - The chunk to mesh; cells outside it count as solid
    /// * `view` - View direction used to skip back-facing directions; the zero vector
    ///   meshes all six
    ///
    /// # Returns
    /// A new `ChunkMesh` with positions in fine voxel units, `[0, 32]` on every axis.
    pub fn mesh(&mut self, grid: &VoxelGrid, view: Vector3<f32>) -> ChunkMesh {
        let start = Instant::now();

        if grid.lod() != self.lod {
            self.reshape(grid.lod());
        }
        self.table.clear();
        self.vertices.clear();
        self.indices.clear();
        self.overflowed = false;

        let mut side_ranges: [Range<usize>; 6] = Default::default();
        for side in BlockSide::all() {
            let first_quad = self.indices.len() / 4;
            if side.is_visible_from(view) {
                self.mesh_side(grid, side);
            }
            side_ranges[side as usize] = first_quad..self.indices.len() / 4;
        }

        if self.overflowed {
            warn!(
                "Mesh capacity reached, dropped quads (vertices: {}, quads: {})",
                self.vertices.len(),
                self.indices.len() / 4
            );
        }

        debug!(
            "Greedy meshed {} quads, {} vertices in {:?}",
            self.indices.len() / 4,
            self.vertices.len(),
            start.elapsed()
        );

        ChunkMesh {
            vertices: self.vertices.clone(),
            indices: self.indices.clone(),
            side_ranges,
            overflowed: self.overflowed,
        }
    }

    /// Sweeps every layer of one direction.
    fn mesh_side(&mut self, grid: &VoxelGrid, side: BlockSide) {
        let n = grid.voxels_per_axis();
        let axis = side.axis();
        let u_axis = (axis + 1) % 3;
        let v_axis = (axis + 2) % 3;

        for layer_index in 0..n {
            // The neighbouring layer the face looks into, if inside the chunk.
            let facing = if side.is_positive() {
                (layer_index + 1 < n).then_some(layer_index + 1)
            } else {
                layer_index.checked_sub(1)
            };

            for row in 0..n {
                let mut no_rects = 0u32;
                let mut rect_starts = 0u32;
                for column in 0..n {
                    let mut cell = [0usize; 3];
                    cell[axis] = layer_index;
                    cell[u_axis] = column;
                    cell[v_axis] = row;
                    let material = grid.get_cell(cell[0], cell[1], cell[2]);
                    self.layer[row * n + column] = material;

                    let covered = facing.map_or(true, |facing| {
                        cell[axis] = facing;
                        !is_air(grid.get_cell(cell[0], cell[1], cell[2]))
                    });
                    if is_air(material) || covered {
                        no_rects |= 1 << column;
                    }

                    let starts = column == 0
                        || material != self.layer[row * n + column - 1]
                        || no_rects & (1 << (column - 1)) != 0;
                    if starts {
                        rect_starts |= 1 << column;
                    }
                }
                self.no_rects[row] = no_rects;
                self.rect_starts[row] = rect_starts & !no_rects;
            }

            self.extract_rectangles(side, layer_index, n, grid.voxel_size() as u32);
        }
    }

    /// Peels rectangles off the current layer masks and emits a quad for each.
    fn extract_rectangles(&mut self, side: BlockSide, layer_index: usize, n: usize, size: u32) {
        for row in 0..n {
            while self.rect_starts[row] != 0 {
                let x = self.rect_starts[row].trailing_zeros() as usize;
                let material = self.layer[row * n + x];

                let mut x2 = x + 1;
                while x2 < n
                    && (self.no_rects[row] | self.rect_starts[row]) & (1 << x2) == 0
                    && self.layer[row * n + x2] == material
                {
                    x2 += 1;
                }

                let width = x2 - x;
                let mask = if width == 32 {
                    u32::MAX
                } else {
                    ((1u32 << width) - 1) << x
                };

                let mut y2 = row + 1;
                while y2 < n
                    && self.no_rects[y2] & mask == 0
                    && self.rect_starts[y2] & mask & !(1 << x) == 0
                    && self.layer[y2 * n + x..y2 * n + x2]
                        .iter()
                        .all(|&other| other == material)
                {
                    y2 += 1;
                }

                for covered_row in row..y2 {
                    self.no_rects[covered_row] |= mask;
                    self.rect_starts[covered_row] &= !mask;
                    if x2 < n && self.no_rects[covered_row] & (1 << x2) == 0 {
                        self.rect_starts[covered_row] |= 1 << x2;
                    }
                }

                let plane = if side.is_positive() {
                    (layer_index as u32 + 1) * size
                } else {
                    layer_index as u32 * size
                };
                self.emit_quad(
                    side,
                    plane,
                    (x as u32 * size, x2 as u32 * size),
                    (row as u32 * size, y2 as u32 * size),
                    material,
                );
            }
        }
    }

    /// Welds and appends one quad, or drops it if it does not fit.
    fn emit_quad(
        &mut self,
        side: BlockSide,
        plane: u32,
        (u0, u1): (u32, u32),
        (v0, v1): (u32, u32),
        material: Material,
    ) {
        let axis = side.axis();
        let corner = |u: u32, v: u32| {
            let mut p = [0u32; 3];
            p[axis] = plane;
            p[(axis + 1) % 3] = u;
            p[(axis + 2) % 3] = v;
            Vertex::new(Point3::new(p[0], p[1], p[2]), material)
        };

        // Counter-clockwise seen from outside the face.
        let corners = if side.is_positive() {
            [corner(u0, v0), corner(u1, v0), corner(u1, v1), corner(u0, v1)]
        } else {
            [corner(u0, v0), corner(u0, v1), corner(u1, v1), corner(u1, v0)]
        };

        let missing = corners
            .iter()
            .filter(|&&vertex| self.table.get(vertex).is_none())
            .count();
        if self.indices.len() / 4 >= MAX_QUADS || self.vertices.len() + missing > MAX_VERTICES {
            self.overflowed = true;
            return;
        }

        for vertex in corners {
            let index = match self.table.get(vertex) {
                Some(index) => index,
                None => {
                    let index = self.vertices.len() as u16;
                    self.table.insert(vertex, index);
                    self.vertices.push(vertex);
                    index
                }
            };
            self.indices.push(index);
        }
    }
}

impl Poolable for GreedyMesher {
    type Shape = Lod;

    fn create(lod: Lod) -> Self {
        GreedyMesher::new(lod)
    }

    fn shape(&self) -> Lod {
        self.lod
    }

    fn reshape(&mut self, lod: Lod) {
        let n = lod.voxels_per_axis();
        self.lod = lod;
        self.layer.clear();
        self.layer.resize(n * n, 0);
        self.no_rects.clear();
        self.no_rects.resize(n, 0);
        self.rect_starts.clear();
        self.rect_starts.resize(n, 0);
    }
}
