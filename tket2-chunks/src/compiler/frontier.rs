//! The live operators awaiting a consumer.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::flow::FlowFlags;
use crate::pauli::PauliMap;

/// A set of absolute measurement records combined by parity.
pub(super) type RecordSet = BTreeSet<usize>;

/// Toggle every record of `other` in `records`.
pub(super) fn xor_records(records: &mut RecordSet, other: impl IntoIterator<Item = usize>) {
    for r in other {
        if !records.remove(&r) {
            records.insert(r);
        }
    }
}

/// A live operator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct FrontierEntry {
    /// Absolute records whose parity witnesses the operator.
    pub records: RecordSet,
    /// The observable the operator contributes to.
    pub obs_key: Option<usize>,
    /// Flags of the flow that opened the entry.
    pub flags: FlowFlags,
}

/// The live operators, in the order they were opened.
#[derive(Clone, Debug, Default)]
pub(super) struct Frontier {
    entries: IndexMap<PauliMap, FrontierEntry>,
}

impl Frontier {
    /// Open an entry. Returns `false`, leaving the frontier unchanged, if the
    /// operator is already live.
    pub fn open(&mut self, pauli: PauliMap, entry: FrontierEntry) -> bool {
        if self.entries.contains_key(&pauli) {
            return false;
        }
        self.entries.insert(pauli, entry);
        true
    }

    /// Close the entry of a live operator.
    pub fn take(&mut self, pauli: &PauliMap) -> Option<FrontierEntry> {
        self.entries.shift_remove(pauli)
    }

    /// The entry of a live operator.
    pub fn get(&self, pauli: &PauliMap) -> Option<&FrontierEntry> {
        self.entries.get(pauli)
    }

    /// The live operators.
    pub fn paulis(&self) -> impl Iterator<Item = &PauliMap> + '_ {
        self.entries.keys()
    }

    /// Close every entry, in the order they were opened.
    pub fn drain(&mut self) -> impl Iterator<Item = (PauliMap, FrontierEntry)> + '_ {
        self.entries.drain(..)
    }

    /// Move every record forward by `offset`.
    pub fn advance(&mut self, offset: usize) {
        for entry in self.entries.values_mut() {
            entry.records = entry.records.iter().map(|r| r + offset).collect();
        }
    }

    /// The entries with records made relative to `num_measurements`, sorted
    /// by operator.
    ///
    /// Two frontiers with the same shape behave identically under the same
    /// elements, up to a shift of the record numbering.
    pub fn shape(&self, num_measurements: usize) -> FrontierShape {
        FrontierShape(
            self.entries
                .iter()
                .map(|(pauli, entry)| {
                    let records = entry
                        .records
                        .iter()
                        .map(|&r| r as i64 - num_measurements as i64)
                        .collect();
                    (pauli.clone(), records, entry.obs_key, entry.flags.clone())
                })
                .sorted_by(|a, b| a.0.cmp(&b.0))
                .collect(),
        )
    }
}

/// A frontier up to the numbering of its records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct FrontierShape(Vec<(PauliMap, Vec<i64>, Option<usize>, FlowFlags)>);

#[cfg(test)]
mod tests {
    use super::*;

    fn pm(s: &str) -> PauliMap {
        s.parse().unwrap()
    }

    fn entry(records: impl IntoIterator<Item = usize>) -> FrontierEntry {
        FrontierEntry {
            records: records.into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn record_parity() {
        let mut records: RecordSet = [1, 2, 3].into();
        xor_records(&mut records, [2, 4]);
        assert_eq!(records, [1, 3, 4].into());
    }

    #[test]
    fn open_and_take() {
        let mut frontier = Frontier::default();
        assert!(frontier.open(pm("X0"), entry([0])));
        assert!(frontier.open(pm("Z0"), entry([1])));
        assert!(!frontier.open(pm("X0"), entry([5])));
        assert_eq!(frontier.take(&pm("X0")), Some(entry([0])));
        assert_eq!(frontier.take(&pm("X0")), None);
        assert_eq!(frontier.paulis().collect_vec(), vec![&pm("Z0")]);
    }

    #[test]
    fn shapes_ignore_numbering() {
        let mut a = Frontier::default();
        a.open(pm("Z1"), entry([3]));
        a.open(pm("Z0"), entry([2, 3]));
        let mut b = Frontier::default();
        b.open(pm("Z0"), entry([12, 13]));
        b.open(pm("Z1"), entry([13]));
        assert_eq!(a.shape(4), b.shape(14));
        assert_ne!(a.shape(4), b.shape(15));

        a.advance(10);
        assert_eq!(a.get(&pm("Z0")), Some(&entry([12, 13])));
        assert_eq!(a.shape(14), b.shape(14));
    }
}
