//! Flow contracts declared by chunks.
//!
//! A [`Flow`] states that the operator `start` entering a chunk, times the
//! parity of some of the chunk's own measurements, is related to the operator
//! `end` leaving it. The compiler matches flows across chunks to place
//! detectors and observable inclusions.

use std::collections::BTreeSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::circuit::Coord;
use crate::pauli::{PauliMap, Qubit};

/// The flag marking flows whose detectors should be postselected.
pub const POSTSELECT: &str = "postselect";

/// The chunk-local measurements witnessing a flow.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementRefs {
    /// Indices into the chunk's measurement record, in record order.
    Explicit(Vec<usize>),
    /// Solve for the measurements from the chunk's measurement gates.
    Auto,
}

impl Default for MeasurementRefs {
    fn default() -> Self {
        MeasurementRefs::Explicit(Vec::new())
    }
}

/// An unordered set of string flags attached to a flow.
pub type FlowFlags = BTreeSet<SmolStr>;

/// A contract over one chunk.
///
/// At least one of `start` and `end` is present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    start: Option<PauliMap>,
    #[serde(default)]
    end: Option<PauliMap>,
    #[serde(default)]
    measurements: MeasurementRefs,
    #[serde(default)]
    center: Option<Coord>,
    #[serde(default)]
    obs_key: Option<usize>,
    #[serde(default)]
    flags: FlowFlags,
}

impl Flow {
    /// A flow consuming `start` on entry and producing `end` on exit.
    ///
    /// Returns `None` if both are absent.
    pub fn new(start: Option<PauliMap>, end: Option<PauliMap>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            return None;
        }
        Some(Self::from_parts(start, end))
    }

    /// A flow consuming an operator and producing nothing.
    pub fn input(start: PauliMap) -> Self {
        Self::from_parts(Some(start), None)
    }

    /// A flow producing an operator from nothing.
    pub fn output(end: PauliMap) -> Self {
        Self::from_parts(None, Some(end))
    }

    /// A flow consuming `start` and producing `end`.
    pub fn passthrough(start: PauliMap, end: PauliMap) -> Self {
        Self::from_parts(Some(start), Some(end))
    }

    fn from_parts(start: Option<PauliMap>, end: Option<PauliMap>) -> Self {
        Self {
            start,
            end,
            measurements: MeasurementRefs::default(),
            center: None,
            obs_key: None,
            flags: FlowFlags::new(),
        }
    }

    /// Set the chunk-local measurement indices witnessing the flow.
    pub fn with_measurements(mut self, measurements: impl IntoIterator<Item = usize>) -> Self {
        self.measurements = MeasurementRefs::Explicit(measurements.into_iter().collect());
        self
    }

    /// Let the compiler solve for the witnessing measurements.
    pub fn with_auto_measurements(mut self) -> Self {
        self.measurements = MeasurementRefs::Auto;
        self
    }

    /// Set the coordinate used for derived annotations.
    pub fn with_center(mut self, center: impl Into<Coord>) -> Self {
        self.center = Some(center.into());
        self
    }

    /// Mark the flow as part of a logical observable.
    pub fn with_obs_key(mut self, obs_key: usize) -> Self {
        self.obs_key = Some(obs_key);
        self
    }

    /// Add a flag.
    pub fn with_flag(mut self, flag: impl Into<SmolStr>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// The operator consumed on entry.
    #[inline]
    pub fn start(&self) -> Option<&PauliMap> {
        self.start.as_ref()
    }

    /// The operator produced on exit.
    #[inline]
    pub fn end(&self) -> Option<&PauliMap> {
        self.end.as_ref()
    }

    /// The witnessing measurements.
    #[inline]
    pub fn measurements(&self) -> &MeasurementRefs {
        &self.measurements
    }

    /// The explicit annotation coordinate, if any.
    #[inline]
    pub fn center(&self) -> Option<Coord> {
        self.center
    }

    /// The observable this flow contributes to, if any.
    #[inline]
    pub fn obs_key(&self) -> Option<usize> {
        self.obs_key
    }

    /// The flow's flags.
    #[inline]
    pub fn flags(&self) -> &FlowFlags {
        &self.flags
    }

    /// Whether the flow carries the given flag.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Whether both ends are present.
    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// The qubits touched by either end, in increasing order.
    pub fn qubits(&self) -> Vec<Qubit> {
        self.start
            .iter()
            .chain(self.end.iter())
            .flat_map(PauliMap::qubits)
            .sorted()
            .dedup()
            .collect()
    }

    /// The operator the witnessing measurements must reproduce.
    ///
    /// This is the unsigned product of whichever ends are present.
    pub fn measurement_target(&self) -> PauliMap {
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => s.xor(e),
            (Some(p), None) | (None, Some(p)) => p.unsigned(),
            (None, None) => PauliMap::identity(),
        }
    }

    /// A copy of the flow with extra flags merged in.
    pub(crate) fn with_merged_flags<'a>(&self, flags: impl IntoIterator<Item = &'a SmolStr>) -> Self {
        let mut flow = self.clone();
        flow.flags.extend(flags.into_iter().cloned());
        flow
    }
}
