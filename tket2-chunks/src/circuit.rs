//! The measurement-circuit instruction stream.
//!
//! A [`Circuit`] is an append-only list of [`Instruction`]s. Measurement
//! gates produce records with globally increasing indices; annotations refer
//! back to them with relative [`RecTarget`]s. This is the stream chunks are
//! written in, and the stream the [`ChunkCompiler`] produces.
//!
//! [`ChunkCompiler`]: crate::ChunkCompiler

mod annotations;
pub mod coords;
mod instruction;

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

pub use annotations::{Annotation, AnnotationKind};
pub use coords::Coord;
pub use instruction::{Gate, GateTarget, Instruction, MeasurementKind, RecTarget};

use crate::pauli::{PauliMap, Qubit};

/// An append-only stream of circuit instructions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Instruction>", into = "Vec<Instruction>")]
pub struct Circuit {
    instructions: Vec<Instruction>,
    /// Cached number of records produced by `instructions`.
    num_measurements: usize,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gate by name.
    ///
    /// Returns the global indices of the records the gate produced, which is
    /// an empty range for non-measurement gates.
    pub fn append(
        &mut self,
        name: impl Into<SmolStr>,
        targets: impl IntoIterator<Item = impl Into<GateTarget>>,
        args: impl IntoIterator<Item = f64>,
    ) -> Result<Range<usize>, CircuitError> {
        let gate = Gate::try_new(name, targets, args)?;
        Ok(self.append_gate(gate))
    }

    /// Append an already validated gate.
    pub fn append_gate(&mut self, gate: Gate) -> Range<usize> {
        self.push(Instruction::Gate(gate))
    }

    /// Append a step separator.
    pub fn append_tick(&mut self) {
        self.push(Instruction::Tick);
    }

    /// Declare the coordinates of a qubit.
    pub fn append_qubit_coords(&mut self, qubit: Qubit, coords: Vec<f64>) {
        self.push(Instruction::QubitCoords { qubit, coords });
    }

    /// Append a detector over relative record targets.
    pub fn append_detector(&mut self, records: Vec<RecTarget>, coords: Vec<f64>) {
        self.push(Instruction::Detector { records, coords });
    }

    /// Append an observable inclusion over relative record targets.
    pub fn append_observable_include(&mut self, index: usize, records: Vec<RecTarget>) {
        self.push(Instruction::ObservableInclude { index, records });
    }

    /// Offset the coordinates of all later annotations.
    pub fn append_shift_coords(&mut self, coords: Vec<f64>) {
        self.push(Instruction::ShiftCoords(coords));
    }

    /// Append a block repeated `repetitions` times.
    ///
    /// Returns the range of records produced over all repetitions.
    pub fn append_repeat(&mut self, repetitions: usize, body: Circuit) -> Range<usize> {
        self.push(Instruction::Repeat { repetitions, body })
    }

    /// Append the contents of another circuit.
    pub fn extend(&mut self, other: Circuit) {
        for inst in other.instructions {
            self.push(inst);
        }
    }

    /// Append an arbitrary instruction, returning the records it produced.
    pub fn push(&mut self, inst: Instruction) -> Range<usize> {
        let start = self.num_measurements;
        self.num_measurements += inst.num_measurements();
        self.instructions.push(inst);
        start..self.num_measurements
    }

    /// The instructions in the stream.
    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The number of top-level instructions. Repeat blocks count once.
    #[inline]
    pub fn num_instructions(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the circuit has no instructions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The total number of measurement records, including repeats.
    #[inline]
    pub fn num_measurements(&self) -> usize {
        self.num_measurements
    }

    /// The qubits addressed by gates anywhere in the circuit.
    pub fn qubits(&self) -> BTreeSet<Qubit> {
        let mut qubits = BTreeSet::new();
        self.collect_qubits(&mut qubits);
        qubits
    }

    fn collect_qubits(&self, qubits: &mut BTreeSet<Qubit>) {
        for inst in &self.instructions {
            match inst {
                Instruction::Gate(gate) => qubits.extend(gate.qubits()),
                Instruction::Repeat { body, .. } => body.collect_qubits(qubits),
                _ => {}
            }
        }
    }

    /// The operator measured by each record, in record order.
    pub fn measured_paulis(&self) -> Vec<PauliMap> {
        let mut paulis = Vec::with_capacity(self.num_measurements);
        for inst in &self.instructions {
            match inst {
                Instruction::Gate(gate) => paulis.extend(gate.measured_paulis()),
                Instruction::Repeat { repetitions, body } => {
                    let body_paulis = body.measured_paulis();
                    for _ in 0..*repetitions {
                        paulis.extend(body_paulis.iter().cloned());
                    }
                }
                _ => {}
            }
        }
        paulis
    }

    /// The same circuit with gate and coordinate qubits renamed.
    pub fn relabelled(&self, mut f: impl FnMut(Qubit) -> Qubit) -> Circuit {
        self.relabelled_with(&mut f)
    }

    fn relabelled_with(&self, f: &mut impl FnMut(Qubit) -> Qubit) -> Circuit {
        let mut circ = Circuit::new();
        for inst in &self.instructions {
            let inst = match inst {
                Instruction::Gate(gate) => Instruction::Gate(gate.relabelled(&mut *f)),
                Instruction::QubitCoords { qubit, coords } => Instruction::QubitCoords {
                    qubit: f(*qubit),
                    coords: coords.clone(),
                },
                Instruction::Repeat { repetitions, body } => Instruction::Repeat {
                    repetitions: *repetitions,
                    body: body.relabelled_with(f),
                },
                other => other.clone(),
            };
            circ.push(inst);
        }
        circ
    }

    pub(crate) fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        for inst in &self.instructions {
            inst.fmt_indented(f, indent)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl From<Vec<Instruction>> for Circuit {
    fn from(instructions: Vec<Instruction>) -> Self {
        let mut circ = Circuit::new();
        for inst in instructions {
            circ.push(inst);
        }
        circ
    }
}

impl From<Circuit> for Vec<Instruction> {
    fn from(circ: Circuit) -> Self {
        circ.instructions
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Errors when building circuit instructions.
#[derive(Debug, Display, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CircuitError {
    /// The targets do not fit the gate.
    #[display("invalid targets for {gate}: {reason}")]
    InvalidTargets {
        /// The gate name.
        gate: SmolStr,
        /// What is wrong with the targets.
        reason: String,
    },
}
