//! Circuit fragments and their flow contracts.
//!
//! A compiled program is a sequence of [`ChunkElement`]s:
//!
//! - [`Chunk`]: a circuit fragment with local qubit coordinates and [`Flow`]s.
//! - [`ChunkReflow`]: re-expresses live operators as products of each other,
//!   without adding instructions.
//! - [`ChunkLoop`]: a sequence of elements repeated a fixed number of times.

mod chunk_loop;
mod reflow;

use std::collections::{BTreeMap, BTreeSet};

use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};

pub use chunk_loop::ChunkLoop;
pub use reflow::{ChunkReflow, ReflowError, ReflowInputs};

use crate::circuit::{Circuit, Coord, Instruction};
use crate::flow::{Flow, MeasurementRefs};
use crate::pauli::{PauliMap, Qubit};
use crate::solve::solve_pauli_product;

/// An element of a chunk program.
#[derive(Clone, Debug, From)]
#[non_exhaustive]
pub enum ChunkElement {
    /// A circuit fragment.
    Chunk(Chunk),
    /// A relabelling of the live operators.
    Reflow(ChunkReflow),
    /// A repeated sequence of elements.
    Loop(ChunkLoop),
}

impl ChunkElement {
    /// Check the element is well formed, recursing into loop bodies.
    pub fn verify(&self) -> Result<(), InvalidChunk> {
        match self {
            ChunkElement::Chunk(chunk) => chunk.verify(),
            ChunkElement::Reflow(reflow) => reflow.verify().map_err(InvalidChunk::from),
            ChunkElement::Loop(chunk_loop) => chunk_loop.verify(),
        }
    }
}

/// A circuit fragment annotated with flows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    circuit: Circuit,
    qubit_coords: BTreeMap<Qubit, Coord>,
    flows: Vec<Flow>,
    #[serde(default)]
    discarded_inputs: Vec<PauliMap>,
    #[serde(default)]
    discarded_outputs: Vec<PauliMap>,
}

impl Chunk {
    /// Create a chunk without checking it.
    ///
    /// See [`Chunk::try_new`] for a checked constructor.
    pub fn new(
        circuit: Circuit,
        qubit_coords: impl IntoIterator<Item = (impl Into<Qubit>, impl Into<Coord>)>,
        flows: impl IntoIterator<Item = Flow>,
    ) -> Self {
        Self {
            circuit,
            qubit_coords: qubit_coords
                .into_iter()
                .map(|(q, c)| (q.into(), c.into()))
                .collect(),
            flows: flows.into_iter().collect(),
            discarded_inputs: Vec::new(),
            discarded_outputs: Vec::new(),
        }
    }

    /// Create a chunk and check it with [`Chunk::verify`].
    pub fn try_new(
        circuit: Circuit,
        qubit_coords: impl IntoIterator<Item = (impl Into<Qubit>, impl Into<Coord>)>,
        flows: impl IntoIterator<Item = Flow>,
    ) -> Result<Self, InvalidChunk> {
        let chunk = Self::new(circuit, qubit_coords, flows);
        chunk.verify()?;
        Ok(chunk)
    }

    /// Declare operators consumed from the frontier without any check.
    pub fn with_discarded_inputs(mut self, paulis: impl IntoIterator<Item = PauliMap>) -> Self {
        self.discarded_inputs.extend(paulis);
        self
    }

    /// Declare produced operators that no later chunk needs to consume.
    pub fn with_discarded_outputs(mut self, paulis: impl IntoIterator<Item = PauliMap>) -> Self {
        self.discarded_outputs.extend(paulis);
        self
    }

    /// The chunk's instructions, over chunk-local qubit names.
    #[inline]
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// The coordinate of every qubit the chunk uses.
    #[inline]
    pub fn qubit_coords(&self) -> &BTreeMap<Qubit, Coord> {
        &self.qubit_coords
    }

    /// The chunk's flows.
    #[inline]
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Operators the chunk silently consumes.
    #[inline]
    pub fn discarded_inputs(&self) -> &[PauliMap] {
        &self.discarded_inputs
    }

    /// Operators the chunk produces but does not expose.
    #[inline]
    pub fn discarded_outputs(&self) -> &[PauliMap] {
        &self.discarded_outputs
    }

    /// Whether a start operator is exempt from matching.
    pub fn is_discarded_input(&self, pauli: &PauliMap) -> bool {
        self.discarded_inputs.contains(pauli)
    }

    /// Whether an end operator is not added to the frontier.
    pub fn is_discarded_output(&self, pauli: &PauliMap) -> bool {
        self.discarded_outputs.contains(pauli)
    }

    /// The coordinate annotations derived from `flow` are placed at.
    ///
    /// Uses the flow's explicit center, else the mean coordinate of its
    /// qubits.
    pub fn flow_center(&self, flow: &Flow) -> Coord {
        flow.center().unwrap_or_else(|| {
            Coord::mean(
                flow.qubits()
                    .into_iter()
                    .filter_map(|q| self.qubit_coords.get(&q).copied()),
            )
            .unwrap_or_default()
        })
    }

    /// The chunk-local measurement indices witnessing `flow`.
    ///
    /// Explicit indices are returned as declared. Automatic ones are solved
    /// from the operators measured by the chunk's measurement gates, picking
    /// the smallest and then earliest subset. Returns `None` if no subset of
    /// the chunk's measurements reproduces the flow.
    pub fn resolve_measurements(&self, flow: &Flow, max_enumeration: usize) -> Option<Vec<usize>> {
        match flow.measurements() {
            MeasurementRefs::Explicit(refs) => Some(refs.clone()),
            MeasurementRefs::Auto => solve_pauli_product(
                &self.circuit.measured_paulis(),
                &flow.measurement_target(),
                max_enumeration,
            ),
        }
    }

    /// Check the chunk is well formed.
    ///
    /// Every qubit used by an instruction or flow must have a coordinate,
    /// every flow must have a start or an end with in-range measurement
    /// indices, annotations and repeat blocks are not allowed, and no two
    /// flows may produce the same operator.
    pub fn verify(&self) -> Result<(), InvalidChunk> {
        for inst in self.circuit.instructions() {
            if inst.is_annotation() || matches!(inst, Instruction::Repeat { .. }) {
                return Err(InvalidChunk::UnsupportedInstruction {
                    instruction: inst.to_string(),
                });
            }
        }

        let used = self
            .circuit
            .qubits()
            .into_iter()
            .chain(self.flows.iter().flat_map(Flow::qubits))
            .chain(
                self.discarded_inputs
                    .iter()
                    .chain(&self.discarded_outputs)
                    .flat_map(|p| p.qubits().collect::<Vec<_>>()),
            );
        for qubit in used {
            if !self.qubit_coords.contains_key(&qubit) {
                return Err(InvalidChunk::MissingCoordinate { qubit });
            }
        }

        let num_measurements = self.circuit.num_measurements();
        let mut outputs = BTreeSet::new();
        for (index, flow) in self.flows.iter().enumerate() {
            if flow.start().is_none() && flow.end().is_none() {
                return Err(InvalidChunk::EmptyFlow { flow: index });
            }
            if let MeasurementRefs::Explicit(refs) = flow.measurements() {
                if let Some(&measurement) = refs.iter().find(|&&m| m >= num_measurements) {
                    return Err(InvalidChunk::MeasurementOutOfRange {
                        flow: index,
                        measurement,
                        num_measurements,
                    });
                }
            }
            if let Some(end) = flow.end() {
                if !outputs.insert(end) {
                    return Err(InvalidChunk::DuplicateOutput { pauli: end.clone() });
                }
            }
        }
        Ok(())
    }
}

/// Reasons a chunk element is malformed.
#[derive(Debug, Display, Clone, PartialEq, Error, From)]
#[non_exhaustive]
pub enum InvalidChunk {
    /// A qubit is used without a declared coordinate.
    #[display("qubit {qubit} has no coordinate")]
    MissingCoordinate {
        /// The qubit.
        qubit: Qubit,
    },
    /// A flow has neither a start nor an end.
    #[display("flow {flow} has neither a start nor an end")]
    EmptyFlow {
        /// The index of the flow in the chunk.
        flow: usize,
    },
    /// A flow refers to a measurement the chunk does not make.
    #[display("flow {flow} refers to measurement {measurement} but the chunk only has {num_measurements}")]
    MeasurementOutOfRange {
        /// The index of the flow in the chunk.
        flow: usize,
        /// The offending measurement index.
        measurement: usize,
        /// The number of measurements in the chunk.
        num_measurements: usize,
    },
    /// The chunk contains an instruction chunks cannot carry.
    #[display("chunks cannot contain '{instruction}'")]
    UnsupportedInstruction {
        /// The rendered instruction.
        instruction: String,
    },
    /// Two flows produce the same operator.
    #[display("more than one flow produces {pauli}")]
    DuplicateOutput {
        /// The duplicated operator.
        pauli: PauliMap,
    },
    /// A reflow is inconsistent.
    #[display("invalid reflow: {_0}")]
    #[from]
    Reflow(ReflowError),
}
