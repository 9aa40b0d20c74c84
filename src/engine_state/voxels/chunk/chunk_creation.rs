//! # Chunk Creation Module
//!
//! This module provides the builder [`RunLengthChunk::compress_from`] runs a dense
//! grid through. Materials are pushed in linear index order and the run list stays
//! minimal as it goes: a material equal to the previous one extends the current
//! run instead of opening a new one.

use crate::engine_state::voxels::block::Material;

use super::Run;
#[cfg(doc)]
use super::RunLengthChunk;

/// Accumulates runs from materials pushed in index order.
#[derive(Debug)]
pub(crate) struct RunLengthBuilder {
    /// Runs emitted so far, sorted by start index
    runs: Vec<Run>,
    /// The linear index the next pushed material lands on
    next_index: usize,
}

impl RunLengthBuilder {
    /// Creates a builder with room for `capacity` runs before reallocating.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        RunLengthBuilder {
            runs: Vec::with_capacity(capacity.max(1)),
            next_index: 0,
        }
    }

    /// Appends one cell.
    pub(crate) fn push_material(&mut self, material: Material) {
        self.push_span(material, 1);
    }

    /// Appends `count` consecutive cells of the same material.
    pub(crate) fn push_span(&mut self, material: Material, count: usize) {
        if count == 0 {
            return;
        }

        let extends_last = self
            .runs
            .last()
            .is_some_and(|run| run.material == material);
        if !extends_last {
            self.runs.push(Run {
                material,
                start: self.next_index as u32,
            });
        }

        self.next_index += count;
    }

    /// Takes the runs. Covering the whole chunk is the caller's job.
    pub(crate) fn into_runs(self) -> Vec<Run> {
        self.runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_equal_neighbours() {
        let mut builder = RunLengthBuilder::with_capacity(4);
        builder.push_span(1, 10);
        builder.push_material(1);
        builder.push_span(2, 0);
        builder.push_span(2, 20);
        builder.push_span(1, 33);
        assert_eq!(
            builder.into_runs(),
            vec![
                Run {
                    material: 1,
                    start: 0
                },
                Run {
                    material: 2,
                    start: 11
                },
                Run {
                    material: 1,
                    start: 31
                },
            ]
        );
    }

    #[test]
    fn empty_builder_has_no_runs() {
        let mut builder = RunLengthBuilder::with_capacity(0);
        builder.push_span(3, 0);
        assert!(builder.into_runs().is_empty());
    }
}
