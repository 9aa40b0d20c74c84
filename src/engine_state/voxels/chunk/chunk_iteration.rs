//! # Chunk Iteration Module
//!
//! This module provides an iterator over the runs of a [`RunLengthChunk`],
//! yielding each run as the half-open index range it covers together with its
//! material. Decompression and any other bulk consumer of a run list walk the
//! chunk through it, so the "where does this run end" arithmetic lives in one
//! place.

use std::ops::Range;

use crate::engine_state::voxels::block::Material;

use super::{Run, RunLengthChunk};

/// An iterator over the spans of a run-length chunk.
///
/// Each item is `(range, material)`; consecutive ranges are adjacent and the
/// last one ends at the chunk volume.
pub struct ChunkRunIterator<'a> {
    /// The runs being walked
    runs: &'a [Run],
    /// Index of the next run to yield
    current_run: usize,
    /// One past the last linear index of the chunk
    volume: usize,
}

impl<'a> ChunkRunIterator<'a> {
    /// Creates an iterator over every run of `chunk`.
    pub fn new(chunk: &'a RunLengthChunk) -> Self {
        ChunkRunIterator {
            runs: chunk.runs(),
            current_run: 0,
            volume: chunk.lod().volume(),
        }
    }
}

impl Iterator for ChunkRunIterator<'_> {
    type Item = (Range<usize>, Material);

    fn next(&mut self) -> Option<Self::Item> {
        let run = self.runs.get(self.current_run)?;
        let end = self
            .runs
            .get(self.current_run + 1)
            .map_or(self.volume, |next| next.start as usize);
        self.current_run += 1;
        Some((run.start as usize..end, run.material))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.runs.len() - self.current_run;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkRunIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::Lod;

    #[test]
    fn yields_adjacent_ranges() {
        let chunk = RunLengthChunk::from_runs(
            Lod::COARSEST,
            vec![
                Run {
                    material: 0,
                    start: 0,
                },
                Run {
                    material: 5,
                    start: 40,
                },
            ],
        )
        .unwrap();
        let spans: Vec<_> = ChunkRunIterator::new(&chunk).collect();
        assert_eq!(spans, vec![(0..40, 0), (40..64, 5)]);
    }
}
