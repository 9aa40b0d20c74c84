//! # Voxel Grid Module
//!
//! The dense chunk representation: one material per cell, stored in the linear
//! order described in the [chunk module](super). Grids are what generators
//! produce and what the mesher and occlusion builder consume.
//!
//! ## Level of Detail
//!
//! A grid at LoD `l` stores `32 >> l` cells per axis. [`VoxelGrid::with_lod`]
//! resamples between levels:
//!
//! - **Finer**: every coarse cell is copied into all the fine cells it covers.
//! - **Coarser**: each coarse cell takes the material of one representative
//!   fine cell, the one at offset `f / 2` along every axis of the `f`-wide
//!   block it covers (the cell just past the block's centre). The choice is
//!   deterministic, so a coarsen-then-refine round trip reproduces that
//!   representative everywhere in the block.

use cgmath::Point3;

use crate::core::error::{Result, VoxelError};
use crate::core::pool::Poolable;
use crate::engine_state::voxels::block::{is_air, Material, AIR};

use super::Lod;

/// A fixed-size 3D array of materials at a given level of detail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    /// The level of detail this grid is sampled at
    lod: Lod,
    /// `lod.volume()` materials in X-then-Y-then-Z order
    voxels: Vec<Material>,
}

impl VoxelGrid {
    /// Creates a grid filled with air.
    pub fn new(lod: Lod) -> Self {
        Self::filled(lod, AIR)
    }

    /// Creates a grid with every cell set to `material`.
    pub fn filled(lod: Lod, material: Material) -> Self {
        VoxelGrid {
            lod,
            voxels: vec![material; lod.volume()],
        }
    }

    /// Creates a grid from a dense slice in linear order.
    ///
    /// # Errors
    /// [`VoxelError::BufferLengthMismatch`] if `voxels` is not exactly one
    /// chunk's worth of cells at `lod`.
    pub fn from_slice(lod: Lod, voxels: &[Material]) -> Result<Self> {
        let mut grid = Self::new(lod);
        grid.fill_from_slice(voxels)?;
        Ok(grid)
    }

    /// The level of detail of this grid.
    #[inline]
    pub fn lod(&self) -> Lod {
        self.lod
    }

    /// Number of cells along one axis.
    #[inline]
    pub fn voxels_per_axis(&self) -> usize {
        self.lod.voxels_per_axis()
    }

    /// Edge length of one cell in fine voxels.
    #[inline]
    pub fn voxel_size(&self) -> usize {
        self.lod.voxel_size()
    }

    /// Total number of cells.
    #[inline]
    pub fn volume(&self) -> usize {
        self.voxels.len()
    }

    /// Linear index of cell `(x, y, z)`, in cell coordinates.
    #[inline]
    pub fn cell_index(&self, x: usize, y: usize, z: usize) -> usize {
        let n = self.voxels_per_axis();
        x + y * n + z * n * n
    }

    /// The material at fine voxel position `pos` (each component in `[0, 32)`).
    #[inline]
    pub fn get(&self, pos: Point3<usize>) -> Material {
        self.voxels[self.lod.index_of(pos)]
    }

    /// Sets the cell containing fine voxel position `pos`.
    #[inline]
    pub fn set(&mut self, pos: Point3<usize>, material: Material) {
        let index = self.lod.index_of(pos);
        self.voxels[index] = material;
    }

    /// The material of cell `(x, y, z)`, in cell coordinates.
    #[inline]
    pub fn get_cell(&self, x: usize, y: usize, z: usize) -> Material {
        self.voxels[self.cell_index(x, y, z)]
    }

    /// Sets cell `(x, y, z)`, in cell coordinates.
    #[inline]
    pub fn set_cell(&mut self, x: usize, y: usize, z: usize, material: Material) {
        let index = self.cell_index(x, y, z);
        self.voxels[index] = material;
    }

    /// The cells in linear order.
    pub fn as_slice(&self) -> &[Material] {
        &self.voxels
    }

    /// Mutable access to the cells in linear order.
    pub fn as_mut_slice(&mut self) -> &mut [Material] {
        &mut self.voxels
    }

    /// Sets every cell to `material`.
    pub fn fill(&mut self, material: Material) {
        self.voxels.fill(material);
    }

    /// Resets every cell to air.
    pub fn clear(&mut self) {
        self.fill(AIR);
    }

    /// Overwrites the grid with a dense slice in linear order.
    ///
    /// # Errors
    /// [`VoxelError::BufferLengthMismatch`] if the lengths differ; the grid is
    /// left untouched in that case.
    pub fn fill_from_slice(&mut self, voxels: &[Material]) -> Result<()> {
        if voxels.len() != self.voxels.len() {
            return Err(VoxelError::BufferLengthMismatch {
                expected: self.voxels.len(),
                actual: voxels.len(),
            });
        }
        self.voxels.copy_from_slice(voxels);
        Ok(())
    }

    /// Overwrites cells in linear order from `materials`, stopping at whichever
    /// runs out first. Returns the number of cells written.
    pub fn fill_from<I: IntoIterator<Item = Material>>(&mut self, materials: I) -> usize {
        let mut written = 0;
        for (cell, material) in self.voxels.iter_mut().zip(materials) {
            *cell = material;
            written += 1;
        }
        written
    }

    /// Returns `true` if every cell holds the same material.
    pub fn is_monochrome(&self) -> bool {
        match self.voxels.first() {
            Some(&first) => self.voxels.iter().all(|&material| material == first),
            None => true,
        }
    }

    /// Number of cells that are not air.
    pub fn count_non_air(&self) -> usize {
        self.voxels.iter().filter(|&&material| !is_air(material)).count()
    }

    /// Returns a copy of this grid resampled at `lod`.
    ///
    /// See the [module documentation](self) for the sampling rules.
    pub fn with_lod(&self, lod: Lod) -> VoxelGrid {
        if lod == self.lod {
            return self.clone();
        }

        let mut resampled = VoxelGrid::new(lod);
        let n = lod.voxels_per_axis();

        if lod < self.lod {
            let shift = self.lod.get() - lod.get();
            for z in 0..n {
                for y in 0..n {
                    for x in 0..n {
                        let material = self.get_cell(x >> shift, y >> shift, z >> shift);
                        resampled.set_cell(x, y, z, material);
                    }
                }
            }
        } else {
            let factor = 1usize << (lod.get() - self.lod.get());
            let half = factor / 2;
            for z in 0..n {
                for y in 0..n {
                    for x in 0..n {
                        let material =
                            self.get_cell(x * factor + half, y * factor + half, z * factor + half);
                        resampled.set_cell(x, y, z, material);
                    }
                }
            }
        }

        resampled
    }

    /// Moves a uniform grid to the coarsest level of detail.
    ///
    /// Non-uniform grids are returned unchanged.
    pub fn promote_if_monochrome(self) -> VoxelGrid {
        if self.lod != Lod::COARSEST && self.is_monochrome() {
            let material = self.voxels.first().copied().unwrap_or(AIR);
            return VoxelGrid::filled(Lod::COARSEST, material);
        }
        self
    }
}

impl Poolable for VoxelGrid {
    type Shape = Lod;

    fn create(lod: Lod) -> Self {
        VoxelGrid::new(lod)
    }

    fn shape(&self) -> Lod {
        self.lod
    }

    fn reshape(&mut self, lod: Lod) {
        self.lod = lod;
        self.voxels.clear();
        self.voxels.resize(lod.volume(), AIR);
    }
}
