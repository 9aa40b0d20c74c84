//! Open-addressed vertex welding table.
//!
//! Maps packed vertices to their index in the mesh's vertex buffer so quads
//! sharing a corner share the index. Keys are stored flat; a slot holding
//! [`EMPTY_SLOT`] is free. Collisions probe by a fixed odd stride, which visits
//! every slot of the power-of-two table before repeating.

use crate::engine_state::rendering::Vertex;

/// `log2` of the number of slots.
const TABLE_BITS: u32 = 17;
/// Number of slots; twice the largest vertex count, so probe chains stay short.
pub const TABLE_CAPACITY: usize = 1 << TABLE_BITS;
/// Marks a free slot. No packed vertex reaches this value.
const EMPTY_SLOT: u32 = u32::MAX;
/// Probe stride.
const PROBE_STRIDE: usize = 0x9E37;

/// Vertex to index lookup for one mesh.
#[derive(Debug)]
pub struct VertexTable {
    keys: Vec<u32>,
    values: Vec<u16>,
    len: usize,
}

impl Default for VertexTable {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        VertexTable {
            keys: vec![EMPTY_SLOT; TABLE_CAPACITY],
            values: vec![0; TABLE_CAPACITY],
            len: 0,
        }
    }

    /// Empties the table, keeping its allocation.
    pub fn clear(&mut self) {
        if self.len > 0 {
            self.keys.fill(EMPTY_SLOT);
            self.len = 0;
        }
    }

    /// Number of stored vertices.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no vertex is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn home_slot(raw: u32) -> usize {
        (raw.wrapping_mul(2_654_435_761) >> (32 - TABLE_BITS)) as usize
    }

    /// Finds the slot holding `vertex`, or the free slot it would go in.
    #[inline]
    fn probe(&self, vertex: Vertex) -> usize {
        let raw = vertex.raw();
        let mut slot = Self::home_slot(raw);
        // The table is never more than half full, so a free slot always exists.
        loop {
            let key = self.keys[slot];
            if key == raw || key == EMPTY_SLOT {
                return slot;
            }
            slot = (slot + PROBE_STRIDE) & (TABLE_CAPACITY - 1);
        }
    }

    /// The index previously assigned to `vertex`.
    pub fn get(&self, vertex: Vertex) -> Option<u16> {
        let slot = self.probe(vertex);
        (self.keys[slot] != EMPTY_SLOT).then(|| self.values[slot])
    }

    /// Records `index` for `vertex`, which must not be present yet.
    pub fn insert(&mut self, vertex: Vertex, index: u16) {
        let slot = self.probe(vertex);
        debug_assert_eq!(self.keys[slot], EMPTY_SLOT);
        debug_assert!(self.len < TABLE_CAPACITY / 2);
        self.keys[slot] = vertex.raw();
        self.values[slot] = index;
        self.len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn stores_and_finds() {
        let mut table = VertexTable::new();
        let a = Vertex::new(Point3::new(1, 2, 3), 1);
        let b = Vertex::new(Point3::new(3, 2, 1), 1);
        assert_eq!(table.get(a), None);
        table.insert(a, 0);
        table.insert(b, 1);
        assert_eq!(table.get(a), Some(0));
        assert_eq!(table.get(b), Some(1));
        assert_eq!(table.len(), 2);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.get(a), None);
    }

    #[test]
    fn survives_dense_fill() {
        let mut table = VertexTable::new();
        let mut index = 0u16;
        for z in 0..33 {
            for y in 0..33 {
                for x in 0..33 {
                    table.insert(Vertex::new(Point3::new(x, y, z), 7), index);
                    index += 1;
                }
            }
        }
        assert_eq!(table.get(Vertex::new(Point3::new(32, 32, 32), 7)), Some(index - 1));
        assert_eq!(table.get(Vertex::new(Point3::new(5, 0, 0), 7)), Some(5));
    }
}
