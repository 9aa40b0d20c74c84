//! # Chunk Generators
//!
//! World generation is a collaborator of the engine, not part of it: anything
//! implementing [`ChunkGenerator`] can fill chunks. The generators here are
//! small deterministic ones used by tests, benches and demos.

use std::fmt::Debug;

use crate::engine_state::voxels::block::{Material, AIR};

use super::{ChunkKey, Lod, VoxelGrid};

/// Produces the initial voxels of a chunk.
///
/// Implementations must be deterministic in `(key, seed, lod)`; the engine may
/// regenerate a chunk and expects the same result.
pub trait ChunkGenerator: Send + Sync + Debug {
    /// Generates the chunk at `key`.
    ///
    /// # Arguments
    /// * `key` - The chunk to generate
    /// * `seed` - The world seed
    /// * `lod` - The level of detail of the returned grid
    ///
    /// # Returns
    /// A grid at `lod`
    fn generate(&self, key: ChunkKey, seed: u64, lod: Lod) -> VoxelGrid;
}

/// Fills every chunk with air.
#[derive(Debug, Default, Clone, Copy)]
pub struct Empty;

impl ChunkGenerator for Empty {
    fn generate(&self, _key: ChunkKey, _seed: u64, lod: Lod) -> VoxelGrid {
        VoxelGrid::new(lod)
    }
}

/// Fills every chunk with one material.
#[derive(Debug, Clone, Copy)]
pub struct Solid(pub Material);

impl ChunkGenerator for Solid {
    fn generate(&self, _key: ChunkKey, _seed: u64, lod: Lod) -> VoxelGrid {
        VoxelGrid::filled(lod, self.0)
    }
}

/// Alternates `material` and air between neighbouring cells along every axis.
#[derive(Debug, Clone, Copy)]
pub struct Checkerboard(pub Material);

impl ChunkGenerator for Checkerboard {
    fn generate(&self, _key: ChunkKey, _seed: u64, lod: Lod) -> VoxelGrid {
        let mut grid = VoxelGrid::new(lod);
        let n = lod.voxels_per_axis();
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    if (x + y + z) % 2 == 0 {
                        grid.set_cell(x, y, z, self.0);
                    }
                }
            }
        }
        grid
    }
}

/// Sets each cell to a random material from `materials` with probability
/// `density`, otherwise air.
#[derive(Debug, Clone)]
pub struct RandomFill {
    /// Chance in `[0, 1]` that a cell is solid
    pub density: f64,
    /// Materials solid cells are drawn from; air-only when empty
    pub materials: Vec<Material>,
}

impl RandomFill {
    /// Creates a generator filling with `material` at `density`.
    pub fn new(density: f64, material: Material) -> Self {
        RandomFill {
            density,
            materials: vec![material],
        }
    }

    /// Mixes the chunk key into the world seed so neighbouring chunks differ.
    fn chunk_seed(key: ChunkKey, seed: u64) -> u64 {
        let p = key.0;
        seed ^ (p.x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (p.y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
            ^ (p.z as u64).wrapping_mul(0x1656_67B1_9E37_79F9)
    }
}

impl ChunkGenerator for RandomFill {
    fn generate(&self, key: ChunkKey, seed: u64, lod: Lod) -> VoxelGrid {
        let mut rng = fastrand::Rng::with_seed(Self::chunk_seed(key, seed));
        let mut grid = VoxelGrid::new(lod);
        if self.materials.is_empty() {
            return grid;
        }
        for cell in grid.as_mut_slice() {
            if rng.f64() < self.density {
                *cell = self.materials[rng.usize(..self.materials.len())];
            }
        }
        grid
    }
}

/// Flat ground: every world voxel below `height` is `material`.
#[derive(Debug, Clone, Copy)]
pub struct Flat {
    /// World Y of the first air layer
    pub height: i32,
    /// The ground material
    pub material: Material,
}

impl ChunkGenerator for Flat {
    fn generate(&self, key: ChunkKey, _seed: u64, lod: Lod) -> VoxelGrid {
        let origin_y = key.world_origin().y;
        let size = lod.voxel_size() as i32;
        let n = lod.voxels_per_axis();
        let mut grid = VoxelGrid::new(lod);
        for y in 0..n {
            // A cell is ground when its lowest voxel is.
            let material = if origin_y + y as i32 * size < self.height {
                self.material
            } else {
                AIR
            };
            for z in 0..n {
                for x in 0..n {
                    grid.set_cell(x, y, z, material);
                }
            }
        }
        grid
    }
}
