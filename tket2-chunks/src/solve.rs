//! Parity solving over GF(2).
//!
//! Both the automatic measurement solver and automatic reflows need to find
//! a subset of candidate vectors whose XOR equals a target vector. This
//! module implements that once: Gaussian elimination decides solvability and
//! yields a particular solution, and the null space of the candidates is then
//! searched for the smallest subset, ties broken by earliest candidates.
//!
//! Small null spaces are enumerated exhaustively. Larger ones are first
//! improved by local search over single and paired null-space vectors, then
//! by a bounded search over candidate subsets of increasing size.

use std::cmp::Ordering;

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::pauli::{PauliMap, Qubit};

/// Default bound on the null-space dimension searched exhaustively.
pub const DEFAULT_MAX_ENUMERATION: usize = 16;

/// Hard cap on the enumeration bound. Larger requests are clamped to it.
pub const MAX_ENUMERATION_LIMIT: usize = 24;

/// A fixed-length vector over GF(2).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
}

impl BitVec {
    /// The zero vector of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// The number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has length zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read a bit.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    /// Flip a bit.
    #[inline]
    pub fn toggle(&mut self, i: usize) {
        self.words[i / 64] ^= 1 << (i % 64);
    }

    /// Set a bit.
    #[inline]
    pub fn set(&mut self, i: usize, value: bool) {
        if self.get(i) != value {
            self.toggle(i);
        }
    }

    /// Add another vector of the same length.
    pub fn xor_assign(&mut self, other: &BitVec) {
        debug_assert_eq!(self.len, other.len);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a ^= b;
        }
    }

    /// Whether every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// The number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// The index of the lowest set bit.
    pub fn first_one(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, &w)| w != 0)
            .map(|(i, w)| i * 64 + w.trailing_zeros() as usize)
    }

    /// The indices of the set bits, in increasing order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&i| self.get(i))
    }
}

/// Find a subset of `candidates` whose XOR equals `target`.
///
/// The returned indices are increasing. Among all solutions the smallest is
/// chosen, and among those the lexicographically first.
///
/// `max_enumeration` bounds the work, and is clamped to
/// [`MAX_ENUMERATION_LIMIT`]. Null spaces of up to that many dimensions are
/// enumerated exhaustively, so the result is exact. Beyond it the answer is
/// a local minimum over single and paired null-space steps, refined by
/// checking up to `2^max_enumeration` candidate subsets in order of size.
///
/// Returns `None` if the target is outside the span of the candidates.
pub fn solve_parity(
    candidates: &[BitVec],
    target: &BitVec,
    max_enumeration: usize,
) -> Option<Vec<usize>> {
    let n = candidates.len();
    // Pivot rows kept with the candidate combination that produced them.
    let mut pivots: Vec<(usize, BitVec, BitVec)> = Vec::new();
    let mut null_space: Vec<BitVec> = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        let mut row = candidate.clone();
        let mut combo = BitVec::zeros(n);
        combo.toggle(i);
        reduce(&pivots, &mut row, &mut combo);
        match row.first_one() {
            Some(bit) => pivots.push((bit, row, combo)),
            None => null_space.push(combo),
        }
    }

    let mut residue = target.clone();
    let mut solution = BitVec::zeros(n);
    reduce(&pivots, &mut residue, &mut solution);
    if !residue.is_zero() {
        return None;
    }

    let limit = max_enumeration.min(MAX_ENUMERATION_LIMIT);
    let best = if null_space.len() <= limit {
        enumerate_minimal(solution, &null_space)
    } else {
        let local = descend(solution, &null_space);
        search_by_size(candidates, target, &local, 1 << limit).unwrap_or(local)
    };
    Some(best.ones().collect())
}

/// Find a subset of `candidates` whose unsigned product equals `target`.
///
/// Signs and keys are ignored; see [`solve_parity`] for tie-breaking.
pub fn solve_pauli_product(
    candidates: &[PauliMap],
    target: &PauliMap,
    max_enumeration: usize,
) -> Option<Vec<usize>> {
    let encoder = PauliEncoder::new(candidates.iter().chain([target]));
    let rows = candidates.iter().map(|p| encoder.encode(p)).collect_vec();
    solve_parity(&rows, &encoder.encode(target), max_enumeration)
}

fn reduce(pivots: &[(usize, BitVec, BitVec)], row: &mut BitVec, combo: &mut BitVec) {
    for (bit, pivot, pivot_combo) in pivots {
        if row.get(*bit) {
            row.xor_assign(pivot);
            combo.xor_assign(pivot_combo);
        }
    }
}

/// Ordering of candidate subsets: fewer elements first, then earliest.
fn subset_order(a: &BitVec, b: &BitVec) -> Ordering {
    a.count_ones()
        .cmp(&b.count_ones())
        .then_with(|| a.ones().cmp(b.ones()))
}

fn enumerate_minimal(start: BitVec, null_space: &[BitVec]) -> BitVec {
    let mut best = start.clone();
    let mut current = start;
    // Gray-code walk over every combination of null-space vectors.
    for step in 1..(1usize << null_space.len()) {
        current.xor_assign(&null_space[step.trailing_zeros() as usize]);
        if subset_order(&current, &best) == Ordering::Less {
            best = current.clone();
        }
    }
    best
}

/// Local search: apply single or paired null-space vectors while they give
/// a smaller subset.
fn descend(start: BitVec, null_space: &[BitVec]) -> BitVec {
    let mut best = start;
    loop {
        let improved = {
            let flipped = |vs: &[&BitVec]| {
                let mut next = best.clone();
                vs.iter().for_each(|v| next.xor_assign(v));
                next
            };
            let singles = null_space.iter().map(|v| flipped(&[v]));
            let pairs = null_space
                .iter()
                .tuple_combinations()
                .map(|(u, v)| flipped(&[u, v]));
            singles
                .chain(pairs)
                .find(|next| subset_order(next, &best) == Ordering::Less)
        };
        match improved {
            Some(next) => best = next,
            None => return best,
        }
    }
}

/// Look for a solution no larger than `known` by trying candidate subsets in
/// order of size, then lexicographically.
///
/// Returns `None` if more than `budget` subsets would need to be checked.
fn search_by_size(
    candidates: &[BitVec],
    target: &BitVec,
    known: &BitVec,
    budget: usize,
) -> Option<BitVec> {
    let mut visited = 0usize;
    for size in 0..=known.count_ones() {
        for subset in (0..candidates.len()).combinations(size) {
            visited += 1;
            if visited > budget {
                return None;
            }
            let mut sum = BitVec::zeros(target.len());
            for &i in &subset {
                sum.xor_assign(&candidates[i]);
            }
            if sum == *target {
                let mut found = BitVec::zeros(candidates.len());
                subset.into_iter().for_each(|i| found.toggle(i));
                return Some(found);
            }
        }
    }
    None
}

/// Encodes pauli products as symplectic bit vectors over a fixed qubit set.
#[derive(Clone, Debug)]
pub(crate) struct PauliEncoder {
    index: FxHashMap<Qubit, usize>,
}

impl PauliEncoder {
    /// Index every qubit appearing in the given operators.
    pub fn new<'a>(paulis: impl IntoIterator<Item = &'a PauliMap>) -> Self {
        let index = paulis
            .into_iter()
            .flat_map(PauliMap::qubits)
            .sorted()
            .dedup()
            .enumerate()
            .map(|(i, q)| (q, i))
            .collect();
        Self { index }
    }

    /// The `(x, z)` bit pairs of an operator. Qubits outside the index are
    /// ignored.
    pub fn encode(&self, pauli: &PauliMap) -> BitVec {
        let mut bits = BitVec::zeros(2 * self.index.len());
        for (q, p) in pauli.iter() {
            let Some(&i) = self.index.get(&q) else {
                continue;
            };
            let (x, z) = p.xz_bits();
            bits.set(2 * i, x);
            bits.set(2 * i + 1, z);
        }
        bits
    }
}
