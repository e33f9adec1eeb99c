//! The global qubit table.

use std::collections::{BTreeMap, BTreeSet};

use crate::circuit::Coord;
use crate::pauli::Qubit;

use super::CompileError;

/// Assigns global qubit indices by coordinate.
///
/// Indices are handed out in coordinate order among the coordinates first
/// seen in the same chunk, so the numbering only depends on the order in
/// which chunks are appended.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct QubitTable {
    /// The coordinate each chunk-level qubit name was placed at.
    placements: BTreeMap<Qubit, Coord>,
    /// The global index of each coordinate.
    indices: BTreeMap<Coord, Qubit>,
}

impl QubitTable {
    /// Register the qubits of a chunk.
    ///
    /// Returns the qubits assigned a fresh global index, in index order.
    pub fn register(
        &mut self,
        element: usize,
        coords: &BTreeMap<Qubit, Coord>,
    ) -> Result<Vec<(Qubit, Coord)>, CompileError> {
        for (&qubit, &conflicting) in coords {
            if let Some(&existing) = self.placements.get(&qubit) {
                if existing != conflicting {
                    return Err(CompileError::CoordinateConflict {
                        element,
                        qubit,
                        existing,
                        conflicting,
                    });
                }
            }
        }
        self.placements.extend(coords.iter().map(|(&q, &c)| (q, c)));

        let fresh: BTreeSet<Coord> = coords
            .values()
            .filter(|c| !self.indices.contains_key(*c))
            .copied()
            .collect();
        Ok(fresh
            .into_iter()
            .map(|coord| {
                let qubit = Qubit(self.indices.len() as u32);
                self.indices.insert(coord, qubit);
                (qubit, coord)
            })
            .collect())
    }

    /// The global index of a registered chunk-level qubit.
    pub fn global(&self, qubit: Qubit) -> Option<Qubit> {
        self.placements
            .get(&qubit)
            .and_then(|coord| self.indices.get(coord))
            .copied()
    }

    /// The number of global qubits.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_asserts::assert_matches;

    fn placements(entries: &[(u32, (f64, f64))]) -> BTreeMap<Qubit, Coord> {
        entries
            .iter()
            .map(|&(q, c)| (Qubit(q), Coord::from(c)))
            .collect()
    }

    #[test]
    fn sorted_assignment() {
        let mut table = QubitTable::default();
        let fresh = table
            .register(0, &placements(&[(0, (2.0, 0.0)), (1, (1.0, 1.0)), (2, (1.0, 0.0))]))
            .unwrap();
        assert_eq!(
            fresh,
            vec![
                (Qubit(0), Coord::new(1.0, 0.0)),
                (Qubit(1), Coord::new(1.0, 1.0)),
                (Qubit(2), Coord::new(2.0, 0.0)),
            ]
        );
        assert_eq!(table.global(Qubit(0)), Some(Qubit(2)));
        assert_eq!(table.global(Qubit(2)), Some(Qubit(0)));

        let fresh = table
            .register(1, &placements(&[(0, (2.0, 0.0)), (5, (0.0, 0.0))]))
            .unwrap();
        assert_eq!(fresh, vec![(Qubit(3), Coord::new(0.0, 0.0))]);
        assert_eq!(table.global(Qubit(5)), Some(Qubit(3)));
        assert_eq!(table.global(Qubit(9)), None);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn conflicting_placement() {
        let mut table = QubitTable::default();
        table.register(0, &placements(&[(0, (0.0, 0.0))])).unwrap();
        assert_matches!(
            table.register(3, &placements(&[(0, (0.0, 1.0))])),
            Err(CompileError::CoordinateConflict { element: 3, qubit: Qubit(0), .. })
        );
    }
}
