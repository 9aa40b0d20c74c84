//! # Run-Length Chunk Module
//!
//! The resting representation of a chunk: a list of `(material, start)` runs
//! over the linear index space of the chunk, sorted by start.
//!
//! ## Invariants
//!
//! - at least one run exists, and the first starts at index 0
//! - starts are strictly increasing (no duplicates, no empty runs)
//! - every start lies inside the chunk volume
//!
//! Together these mean every index is covered by exactly one run: the last run
//! whose start is not greater than the index. Adjacent runs may share a
//! material (see [`RunLengthChunk::replace_all`]); such a list is still
//! correct, just not minimal.
//!
//! ### Performance Characteristics
//! - **Point lookup**: O(log R) binary search over R runs
//! - **Point edit**: O(log R) lookup plus O(R) for the list insert/remove
//! - **Decompress/compress**: O(volume)

use cgmath::Point3;

use crate::core::error::{Result, VoxelError};
use crate::engine_state::voxels::block::Material;

use super::{chunk_iteration::ChunkRunIterator, Lod, RunLengthBuilder, VoxelGrid};

/// One run: `material` from `start` up to the next run's start.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Run {
    /// Material of every cell in the run
    pub material: Material,
    /// Linear index of the first cell in the run
    pub start: u32,
}

/// A chunk stored as a sorted run list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunLengthChunk {
    lod: Lod,
    runs: Vec<Run>,
}

impl RunLengthChunk {
    /// A chunk where every cell holds `material`.
    pub fn filled(lod: Lod, material: Material) -> Self {
        RunLengthChunk {
            lod,
            runs: vec![Run { material, start: 0 }],
        }
    }

    /// Builds a chunk from an explicit run list, checking every invariant.
    ///
    /// # Errors
    /// [`VoxelError::InvariantViolation`] describing the first broken rule.
    pub fn from_runs(lod: Lod, runs: Vec<Run>) -> Result<Self> {
        let chunk = RunLengthChunk { lod, runs };
        chunk.validate()?;
        Ok(chunk)
    }

    /// Wraps runs the caller has already produced in order.
    pub(super) fn from_sorted_runs(lod: Lod, runs: Vec<Run>) -> Self {
        debug_assert!(!runs.is_empty());
        RunLengthChunk { lod, runs }
    }

    /// The level of detail of this chunk.
    pub fn lod(&self) -> Lod {
        self.lod
    }

    /// The runs, sorted by start.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Number of runs.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Iterates the chunk as `(index range, material)` spans.
    pub fn spans(&self) -> ChunkRunIterator<'_> {
        ChunkRunIterator::new(self)
    }

    /// Returns `true` if every run holds the same material.
    pub fn is_monochrome(&self) -> bool {
        let first = self.runs[0].material;
        self.runs.iter().all(|run| run.material == first)
    }

    /// Checks the run-list invariants.
    pub fn validate(&self) -> Result<()> {
        let volume = self.lod.volume();
        let first = self
            .runs
            .first()
            .ok_or_else(|| VoxelError::InvariantViolation("run list is empty".to_string()))?;
        if first.start != 0 {
            return Err(VoxelError::InvariantViolation(format!(
                "first run starts at {} instead of 0",
                first.start
            )));
        }
        for pair in self.runs.windows(2) {
            if pair[1].start <= pair[0].start {
                return Err(VoxelError::InvariantViolation(format!(
                    "run starting at {} follows run starting at {}",
                    pair[1].start, pair[0].start
                )));
            }
        }
        if let Some(last) = self.runs.last() {
            if last.start as usize >= volume {
                return Err(VoxelError::InvariantViolation(format!(
                    "run starts at {} past the chunk volume {}",
                    last.start, volume
                )));
            }
        }
        Ok(())
    }

    /// Index of the run covering linear index `index`.
    #[inline]
    fn run_index(&self, index: usize) -> usize {
        // The first run starts at 0, so at least one run satisfies the predicate.
        self.runs.partition_point(|run| run.start as usize <= index) - 1
    }

    /// One past the last index covered by run `run`.
    #[inline]
    fn run_end(&self, run: usize) -> usize {
        self.runs
            .get(run + 1)
            .map_or(self.lod.volume(), |next| next.start as usize)
    }

    /// The material at fine voxel position `pos`.
    pub fn get(&self, pos: Point3<usize>) -> Material {
        self.get_index(self.lod.index_of(pos))
    }

    /// The material at linear index `index`.
    pub fn get_index(&self, index: usize) -> Material {
        self.runs[self.run_index(index)].material
    }

    /// Sets the cell containing fine voxel position `pos`.
    pub fn set(&mut self, pos: Point3<usize>, material: Material) {
        self.set_index(self.lod.index_of(pos), material);
    }

    /// Sets the cell at linear index `index`, keeping the run list minimal
    /// around the edit.
    ///
    /// The edited cell either sits alone in its run, at the run's start, at
    /// its end, or strictly inside it. In the first three cases it may join
    /// the neighbouring run on either side if that run already holds
    /// `material`; otherwise it splits off into a run of its own.
    pub fn set_index(&mut self, index: usize, material: Material) {
        let run = self.run_index(index);
        if self.runs[run].material == material {
            return;
        }

        let start = self.runs[run].start as usize;
        let end = self.run_end(run);
        let at_start = index == start;
        let at_end = index + 1 == end;
        let joins_previous = at_start && run > 0 && self.runs[run - 1].material == material;
        let joins_next =
            at_end && run + 1 < self.runs.len() && self.runs[run + 1].material == material;
        let old_material = self.runs[run].material;

        match (at_start, at_end) {
            // The run is exactly this one cell.
            (true, true) => match (joins_previous, joins_next) {
                (true, true) => {
                    self.runs.drain(run..run + 2);
                }
                (true, false) => {
                    self.runs.remove(run);
                }
                (false, true) => {
                    self.runs[run + 1].start = index as u32;
                    self.runs.remove(run);
                }
                (false, false) => {
                    self.runs[run].material = material;
                }
            },
            (true, false) => {
                self.runs[run].start = index as u32 + 1;
                if !joins_previous {
                    self.runs.insert(
                        run,
                        Run {
                            material,
                            start: index as u32,
                        },
                    );
                }
            }
            (false, true) => {
                if joins_next {
                    self.runs[run + 1].start = index as u32;
                } else {
                    self.runs.insert(
                        run + 1,
                        Run {
                            material,
                            start: index as u32,
                        },
                    );
                }
            }
            (false, false) => {
                self.runs.splice(
                    run + 1..run + 1,
                    [
                        Run {
                            material,
                            start: index as u32,
                        },
                        Run {
                            material: old_material,
                            start: index as u32 + 1,
                        },
                    ],
                );
            }
        }
    }

    /// Rewrites every run of `from` to `to`.
    ///
    /// Run boundaries are left alone, so runs that end up next to another run
    /// of `to` are not merged. Returns the number of runs changed.
    pub fn replace_all(&mut self, from: Material, to: Material) -> usize {
        let mut replaced = 0;
        for run in self.runs.iter_mut().filter(|run| run.material == from) {
            run.material = to;
            replaced += 1;
        }
        replaced
    }

    /// Expands the runs into `buffer`, one material per cell.
    ///
    /// # Errors
    /// - [`VoxelError::BufferLengthMismatch`] if `buffer` is not one chunk long
    /// - [`VoxelError::InvariantViolation`] if the runs do not cover the chunk
    ///   exactly
    pub fn decompress_into(&self, buffer: &mut [Material]) -> Result<()> {
        let volume = self.lod.volume();
        if buffer.len() != volume {
            return Err(VoxelError::BufferLengthMismatch {
                expected: volume,
                actual: buffer.len(),
            });
        }

        let mut written = 0;
        for (span, material) in self.spans() {
            if span.start != written || span.end <= span.start || span.end > volume {
                return Err(VoxelError::InvariantViolation(format!(
                    "span {:?} does not continue from index {}",
                    span, written
                )));
            }
            buffer[span.clone()].fill(material);
            written = span.end;
        }

        if written != volume {
            return Err(VoxelError::InvariantViolation(format!(
                "runs expand to {} cells, chunk needs {}",
                written, volume
            )));
        }
        Ok(())
    }

    /// Expands the runs into a fresh grid.
    pub fn decompress(&self) -> Result<VoxelGrid> {
        let mut grid = VoxelGrid::new(self.lod);
        self.decompress_into(grid.as_mut_slice())?;
        Ok(grid)
    }

    /// Compresses a dense grid into a minimal run list.
    ///
    /// The run list is allocated with roughly 40% headroom over the number of
    /// runs found, so later single-voxel edits rarely reallocate.
    pub fn compress_from(grid: &VoxelGrid) -> Self {
        let voxels = grid.as_slice();
        let transitions = voxels.windows(2).filter(|pair| pair[0] != pair[1]).count();
        let capacity = (transitions + 1) * 7 / 5 + 1;

        let mut builder = RunLengthBuilder::with_capacity(capacity);
        for &material in voxels {
            builder.push_material(material);
        }

        // A grid always supplies exactly one chunk's worth of cells.
        RunLengthChunk::from_sorted_runs(grid.lod(), builder.into_runs())
    }
}

impl From<&VoxelGrid> for RunLengthChunk {
    fn from(grid: &VoxelGrid) -> Self {
        RunLengthChunk::compress_from(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(chunk: &RunLengthChunk) -> Vec<(Material, u32)> {
        chunk.runs().iter().map(|r| (r.material, r.start)).collect()
    }

    fn chunk_from(pairs: &[(Material, u32)]) -> RunLengthChunk {
        RunLengthChunk::from_runs(
            Lod::COARSEST,
            pairs
                .iter()
                .map(|&(material, start)| Run { material, start })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn validate_catches_broken_lists() {
        let lod = Lod::COARSEST;
        assert!(RunLengthChunk::from_runs(lod, vec![]).is_err());
        assert!(RunLengthChunk::from_runs(lod, vec![Run { material: 1, start: 3 }]).is_err());
        assert!(RunLengthChunk::from_runs(
            lod,
            vec![Run { material: 1, start: 0 }, Run { material: 2, start: 0 }]
        )
        .is_err());
        assert!(RunLengthChunk::from_runs(
            lod,
            vec![Run { material: 1, start: 0 }, Run { material: 2, start: 64 }]
        )
        .is_err());
    }

    #[test]
    fn get_finds_covering_run() {
        let chunk = chunk_from(&[(1, 0), (2, 10), (3, 11)]);
        assert_eq!(chunk.get_index(0), 1);
        assert_eq!(chunk.get_index(9), 1);
        assert_eq!(chunk.get_index(10), 2);
        assert_eq!(chunk.get_index(11), 3);
        assert_eq!(chunk.get_index(63), 3);
    }

    #[test]
    fn set_same_material_is_noop() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10)]);
        chunk.set_index(5, 1);
        assert_eq!(runs(&chunk), vec![(1, 0), (2, 10)]);
    }

    #[test]
    fn set_interior_splits_in_three() {
        let mut chunk = chunk_from(&[(1, 0)]);
        chunk.set_index(5, 2);
        assert_eq!(runs(&chunk), vec![(1, 0), (2, 5), (1, 6)]);
    }

    #[test]
    fn set_at_sequence_start_and_end() {
        let mut chunk = chunk_from(&[(1, 0)]);
        chunk.set_index(0, 2);
        assert_eq!(runs(&chunk), vec![(2, 0), (1, 1)]);
        chunk.set_index(63, 3);
        assert_eq!(runs(&chunk), vec![(2, 0), (1, 1), (3, 63)]);
    }

    #[test]
    fn set_merges_with_previous() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10)]);
        chunk.set_index(10, 1);
        assert_eq!(runs(&chunk), vec![(1, 0), (2, 11)]);
    }

    #[test]
    fn set_merges_with_next() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10)]);
        chunk.set_index(9, 2);
        assert_eq!(runs(&chunk), vec![(1, 0), (2, 9)]);
    }

    #[test]
    fn set_single_cell_run_merges_both_sides() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10), (1, 11)]);
        chunk.set_index(10, 1);
        assert_eq!(runs(&chunk), vec![(1, 0)]);
    }

    #[test]
    fn set_single_cell_run_merges_one_side() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10), (3, 11)]);
        chunk.set_index(10, 3);
        assert_eq!(runs(&chunk), vec![(1, 0), (3, 10)]);

        let mut chunk = chunk_from(&[(1, 0), (2, 10), (3, 11)]);
        chunk.set_index(10, 1);
        assert_eq!(runs(&chunk), vec![(1, 0), (3, 11)]);

        let mut chunk = chunk_from(&[(1, 0), (2, 10), (3, 11)]);
        chunk.set_index(10, 4);
        assert_eq!(runs(&chunk), vec![(1, 0), (4, 10), (3, 11)]);
    }

    #[test]
    fn set_split_at_run_start_without_merge() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10)]);
        chunk.set_index(10, 3);
        assert_eq!(runs(&chunk), vec![(1, 0), (3, 10), (2, 11)]);
    }

    #[test]
    fn set_split_at_run_end_without_merge() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10)]);
        chunk.set_index(9, 3);
        assert_eq!(runs(&chunk), vec![(1, 0), (3, 9), (2, 10)]);
    }

    #[test]
    fn random_edits_match_dense_model() {
        let mut rng = fastrand::Rng::with_seed(42);
        let lod = Lod::new(1).unwrap();
        let mut model = VoxelGrid::new(lod);
        let mut chunk = RunLengthChunk::compress_from(&model);

        for _ in 0..5000 {
            let pos = Point3::new(rng.usize(0..32), rng.usize(0..32), rng.usize(0..32));
            let material = rng.u16(0..4);
            model.set(pos, material);
            chunk.set(pos, material);
        }

        chunk.validate().unwrap();
        assert_eq!(chunk.decompress().unwrap(), model);
        assert_eq!(chunk, RunLengthChunk::compress_from(&model));
    }

    #[test]
    fn replace_all_keeps_boundaries() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10), (1, 20)]);
        assert_eq!(chunk.replace_all(2, 1), 1);
        assert_eq!(runs(&chunk), vec![(1, 0), (1, 10), (1, 20)]);
        assert!(chunk.is_monochrome());
        let grid = chunk.decompress().unwrap();
        assert!(grid.is_monochrome());
        assert_eq!(RunLengthChunk::compress_from(&grid).run_count(), 1);
    }

    #[test]
    fn decompress_checks_buffer_length() {
        let chunk = chunk_from(&[(1, 0)]);
        let mut buffer = vec![0; 63];
        assert!(matches!(
            chunk.decompress_into(&mut buffer),
            Err(VoxelError::BufferLengthMismatch {
                expected: 64,
                actual: 63
            })
        ));
    }

    #[test]
    fn decompress_rejects_corrupt_runs() {
        let mut chunk = chunk_from(&[(1, 0), (2, 10)]);
        chunk.runs[1].start = 70;
        let mut buffer = vec![0; 64];
        assert!(matches!(
            chunk.decompress_into(&mut buffer),
            Err(VoxelError::InvariantViolation(_))
        ));
    }

    #[test]
    fn compress_round_trip() {
        let mut rng = fastrand::Rng::with_seed(9);
        for l in 0..=3 {
            let lod = Lod::new(l).unwrap();
            let mut grid = VoxelGrid::new(lod);
            for cell in grid.as_mut_slice() {
                *cell = if rng.u8(0..4) == 0 { rng.u16(1..3) } else { 0 };
            }
            let chunk = RunLengthChunk::compress_from(&grid);
            chunk.validate().unwrap();
            assert_eq!(chunk.decompress().unwrap(), grid);
        }
    }

    #[test]
    fn compress_of_decompress_is_equivalent() {
        let redundant = chunk_from(&[(1, 0), (1, 5), (2, 30), (2, 31)]);
        let minimal = RunLengthChunk::compress_from(&redundant.decompress().unwrap());
        assert_eq!(runs(&minimal), vec![(1, 0), (2, 30)]);
        assert_eq!(
            minimal.decompress().unwrap(),
            redundant.decompress().unwrap()
        );
    }
}
