//! Compilation of chunk programs into a single circuit.
//!
//! The [`ChunkCompiler`] consumes [`ChunkElement`]s in order. Each chunk's
//! qubits are mapped onto a global numbering by coordinate and its
//! instructions appended to the output. The chunk's flows are then matched
//! against the live operators left by earlier chunks, emitting a detector or
//! observable inclusion for every consumed operator and opening a new live
//! operator for every produced one.

mod frontier;
pub mod log;
mod loops;
mod qubits;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use derive_more::{Display, Error};
use itertools::Itertools;

use crate::chunk::{Chunk, ChunkElement, ChunkReflow, InvalidChunk, ReflowError};
use crate::circuit::{Circuit, Coord, RecTarget};
use crate::flow::Flow;
use crate::pauli::{PauliMap, PauliMapError, Qubit};
use crate::solve::DEFAULT_MAX_ENUMERATION;

use frontier::{xor_records, Frontier, FrontierEntry, RecordSet};
use log::{log_empty_annotation, CompileLogger, ElementKind, COMPILE_TARGET};
use qubits::QubitTable;

/// Configuration for a [`ChunkCompiler`].
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkCompilerOptions {
    /// Coordinate shift appended after every chunk. Empty to disable.
    ///
    /// Defaults to `[0, 0, 1]`, advancing the time coordinate of detectors.
    pub coord_shift: Vec<f64>,
    /// Whether to separate consecutive chunks with a `TICK`.
    pub step_separators: bool,
    /// Whether to declare the coordinates of each new qubit.
    pub declare_coords: bool,
    /// Whether observable records are included as soon as a flow consumes
    /// them, rather than carried along until the observable is closed.
    pub eager_observables: bool,
    /// Bound on the null-space dimension searched exhaustively when solving
    /// automatic measurements and reflows.
    ///
    /// The work grows as `2^max_solver_enumeration`, and values above
    /// [`MAX_ENUMERATION_LIMIT`] are clamped to it.
    ///
    /// [`MAX_ENUMERATION_LIMIT`]: crate::solve::MAX_ENUMERATION_LIMIT
    pub max_solver_enumeration: usize,
}

impl Default for ChunkCompilerOptions {
    fn default() -> Self {
        Self {
            coord_shift: vec![0.0, 0.0, 1.0],
            step_separators: true,
            declare_coords: true,
            eager_observables: true,
            max_solver_enumeration: DEFAULT_MAX_ENUMERATION,
        }
    }
}

/// A function computing extra detector coordinates from the consuming flow.
pub type ExtraCoords = Box<dyn Fn(&Flow) -> Vec<f64>>;

/// Compiles a sequence of chunk elements into one circuit.
///
/// # Example
///
/// ```
/// use tket2_chunks::{Chunk, ChunkCompiler, Circuit, Flow, PauliMap};
///
/// let z0: PauliMap = "Z0".parse().unwrap();
/// let mut prepare = Circuit::new();
/// prepare.append("R", [0u32], []).unwrap();
/// let mut measure = Circuit::new();
/// measure.append("M", [0u32], []).unwrap();
///
/// let mut compiler = ChunkCompiler::new();
/// compiler
///     .append(Chunk::new(prepare, [(0u32, (0.0, 0.0))], [Flow::output(z0.clone())]))
///     .unwrap();
/// compiler
///     .append(Chunk::new(
///         measure,
///         [(0u32, (0.0, 0.0))],
///         [Flow::input(z0).with_measurements([0])],
///     ))
///     .unwrap();
/// let circuit = compiler.finish().unwrap();
/// assert_eq!(circuit.detectors().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ChunkCompiler {
    config: CompileConfig,
    state: CompileState,
    circuit: Circuit,
    num_elements: usize,
    logger: CompileLogger,
}

impl ChunkCompiler {
    /// Create a compiler with the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with the given options.
    pub fn with_options(options: ChunkCompilerOptions) -> Self {
        Self {
            config: CompileConfig {
                options,
                extra_coords: None,
            },
            ..Default::default()
        }
    }

    /// Append extra coordinates to every detector, computed from the flow
    /// that consumed the operator.
    ///
    /// The flow passed to `f` carries the flags of both the producing and the
    /// consuming flow.
    pub fn with_extra_coords(mut self, f: impl Fn(&Flow) -> Vec<f64> + 'static) -> Self {
        self.config.extra_coords = Some(Box::new(f));
        self
    }

    /// The compiler's options.
    #[inline]
    pub fn options(&self) -> &ChunkCompilerOptions {
        &self.config.options
    }

    /// The number of elements appended so far.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// The number of measurement records in the output so far.
    #[inline]
    pub fn num_measurements(&self) -> usize {
        self.state.num_measurements
    }

    /// The operators produced so far and not yet consumed, in the order they
    /// were produced.
    pub fn live_paulis(&self) -> Vec<PauliMap> {
        self.state.frontier.paulis().cloned().collect()
    }

    /// Compile the next element of the program.
    ///
    /// # Errors
    ///
    /// Any error aborts the compilation; the compiler must not be used
    /// afterwards.
    #[tracing::instrument(target = "chunks::metrics", skip_all)]
    pub fn append(&mut self, element: impl Into<ChunkElement>) -> Result<(), CompileError> {
        let element = element.into();
        let index = self.num_elements;
        self.logger.log_element(index, ElementKind::of(&element));
        self.config
            .compile_element(&mut self.state, &mut self.circuit, &element, index)?;
        self.num_elements += 1;
        Ok(())
    }

    /// Close every remaining operator and return the compiled circuit.
    ///
    /// Live observable operators have their pending records included.
    ///
    /// # Errors
    ///
    /// Fails with [`CompileError::UnterminatedFlow`] if a live operator is not
    /// part of an observable.
    #[tracing::instrument(target = "chunks::metrics", skip_all)]
    pub fn finish(mut self) -> Result<Circuit, CompileError> {
        let num_measurements = self.state.num_measurements;
        for (pauli, entry) in self.state.frontier.drain() {
            let Some(index) = entry.obs_key else {
                return Err(CompileError::UnterminatedFlow { pauli });
            };
            if entry.records.is_empty() {
                log_empty_annotation(self.num_elements, &pauli);
                continue;
            }
            self.circuit
                .append_observable_include(index, lookbacks(&entry.records, num_measurements));
        }
        self.logger
            .log_finish(&self.circuit, self.state.qubits.len());
        Ok(self.circuit)
    }
}

/// The immutable part of a compiler.
#[derive(Default)]
struct CompileConfig {
    options: ChunkCompilerOptions,
    extra_coords: Option<ExtraCoords>,
}

impl fmt::Debug for CompileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileConfig")
            .field("options", &self.options)
            .field("extra_coords", &self.extra_coords.is_some())
            .finish()
    }
}

/// Everything an element can change, apart from the output instructions.
///
/// Loop folding compiles iterations against copies of this state.
#[derive(Clone, Debug, Default)]
struct CompileState {
    qubits: QubitTable,
    frontier: Frontier,
    num_measurements: usize,
    /// Whether a chunk has been emitted yet.
    started: bool,
}

impl CompileState {
    /// Skip `offset` records, as if that many measurements had been appended
    /// without touching the live operators.
    fn advance(&mut self, offset: usize) {
        self.num_measurements += offset;
        self.frontier.advance(offset);
    }
}

impl CompileConfig {
    fn compile_element(
        &self,
        state: &mut CompileState,
        out: &mut Circuit,
        element: &ChunkElement,
        index: usize,
    ) -> Result<(), CompileError> {
        match element {
            ChunkElement::Chunk(chunk) => self.compile_chunk(state, out, chunk, index),
            ChunkElement::Reflow(reflow) => self.compile_reflow(state, reflow, index),
            ChunkElement::Loop(chunk_loop) => self.compile_loop(state, out, chunk_loop, index),
        }
    }

    fn compile_chunk(
        &self,
        state: &mut CompileState,
        out: &mut Circuit,
        chunk: &Chunk,
        element: usize,
    ) -> Result<(), CompileError> {
        chunk
            .verify()
            .map_err(|source| CompileError::InvalidChunk { element, source })?;

        let fresh = state.qubits.register(element, chunk.qubit_coords())?;
        let relabel: BTreeMap<Qubit, Qubit> = chunk
            .qubit_coords()
            .keys()
            .filter_map(|&q| Some((q, state.qubits.global(q)?)))
            .collect();

        if state.started && self.options.step_separators {
            out.append_tick();
        }
        state.started = true;
        if self.options.declare_coords {
            for (qubit, coord) in fresh {
                out.append_qubit_coords(qubit, coord.to_vec());
            }
        }

        let base = state.num_measurements;
        out.extend(
            chunk
                .circuit()
                .relabelled(|q| relabel.get(&q).copied().unwrap_or(q)),
        );
        state.num_measurements += chunk.circuit().num_measurements();

        let witnesses: Vec<RecordSet> = chunk
            .flows()
            .iter()
            .map(|flow| {
                let refs = chunk
                    .resolve_measurements(flow, self.options.max_solver_enumeration)
                    .ok_or_else(|| CompileError::AutoMeasurementUnsolvable {
                        element,
                        target: flow.measurement_target(),
                    })?;
                let mut records = RecordSet::new();
                xor_records(&mut records, refs.into_iter().map(|m| base + m));
                Ok(records)
            })
            .collect::<Result<_, CompileError>>()?;

        for pauli in chunk.discarded_inputs() {
            state.frontier.take(pauli);
        }

        // Entries opened by pass-through observables instead of their witness.
        let mut carried: Vec<Option<FrontierEntry>> = vec![None; witnesses.len()];
        for (i, (flow, witness)) in chunk.flows().iter().zip(&witnesses).enumerate() {
            let Some(start) = flow.start() else {
                continue;
            };
            if chunk.is_discarded_input(start) {
                continue;
            }
            let prev = state
                .frontier
                .take(start)
                .ok_or_else(|| CompileError::DanglingFlow {
                    element,
                    pauli: start.clone(),
                })?;
            let mut records = prev.records;
            xor_records(&mut records, witness.iter().copied());
            let merged = flow.with_merged_flags(&prev.flags);

            match flow.obs_key().or(prev.obs_key) {
                Some(obs_key) if self.options.eager_observables || flow.end().is_none() => {
                    self.emit_observable(out, state, obs_key, &records, element, start);
                    carried[i] = Some(FrontierEntry {
                        records: RecordSet::new(),
                        obs_key: Some(obs_key),
                        flags: flow.flags().clone(),
                    });
                }
                Some(obs_key) => {
                    carried[i] = Some(FrontierEntry {
                        records,
                        obs_key: Some(obs_key),
                        flags: flow.flags().clone(),
                    });
                }
                None => {
                    let center = chunk.flow_center(&merged);
                    self.emit_detector(out, state, &merged, center, &records, element, start);
                }
            }
        }

        for (i, (flow, witness)) in chunk.flows().iter().zip(witnesses).enumerate() {
            let Some(end) = flow.end() else {
                continue;
            };
            if chunk.is_discarded_output(end) {
                continue;
            }
            let entry = carried[i].take().unwrap_or_else(|| FrontierEntry {
                records: witness,
                obs_key: flow.obs_key(),
                flags: flow.flags().clone(),
            });
            if !state.frontier.open(end.clone(), entry) {
                return Err(CompileError::OverlappingFlow {
                    element,
                    pauli: end.clone(),
                });
            }
        }

        if !self.options.coord_shift.is_empty() {
            out.append_shift_coords(self.options.coord_shift.clone());
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_detector(
        &self,
        out: &mut Circuit,
        state: &CompileState,
        flow: &Flow,
        center: Coord,
        records: &RecordSet,
        element: usize,
        pauli: &PauliMap,
    ) {
        if records.is_empty() {
            log_empty_annotation(element, pauli);
            return;
        }
        let mut coords = center.to_vec();
        coords.push(0.0);
        if let Some(extra_coords) = &self.extra_coords {
            coords.extend(extra_coords(flow));
        }
        out.append_detector(lookbacks(records, state.num_measurements), coords);
    }

    fn emit_observable(
        &self,
        out: &mut Circuit,
        state: &CompileState,
        obs_key: usize,
        records: &RecordSet,
        element: usize,
        pauli: &PauliMap,
    ) {
        if records.is_empty() {
            log_empty_annotation(element, pauli);
            return;
        }
        out.append_observable_include(obs_key, lookbacks(records, state.num_measurements));
    }

    fn compile_reflow(
        &self,
        state: &mut CompileState,
        reflow: &ChunkReflow,
        element: usize,
    ) -> Result<(), CompileError> {
        let available = state.frontier.paulis().cloned().collect_vec();
        let resolved = reflow
            .resolve(&available, self.options.max_solver_enumeration)
            .map_err(|err| reflow_error(element, err))?;

        let mut consumed = BTreeSet::new();
        let mut outputs = Vec::with_capacity(resolved.len());
        for (output, inputs) in resolved {
            let mut entry = FrontierEntry::default();
            for input in inputs {
                let prev = state
                    .frontier
                    .get(&input)
                    .ok_or_else(|| CompileError::DanglingFlow {
                        element,
                        pauli: input.clone(),
                    })?;
                xor_records(&mut entry.records, prev.records.iter().copied());
                entry.flags.extend(prev.flags.iter().cloned());
                entry.obs_key = entry.obs_key.or(prev.obs_key);
                consumed.insert(input);
            }
            outputs.push((output, entry));
        }

        for pauli in consumed.iter().chain(reflow.discarded_inputs()) {
            state.frontier.take(pauli);
        }
        let num_outputs = outputs.len();
        for (output, entry) in outputs {
            if !state.frontier.open(output.clone(), entry) {
                return Err(CompileError::OverlappingFlow {
                    element,
                    pauli: output,
                });
            }
        }
        tracing::debug!(
            target: COMPILE_TARGET,
            element,
            outputs = num_outputs,
            consumed = consumed.len(),
            "applied reflow"
        );
        Ok(())
    }
}

/// Relative targets for absolute records, seen from the end of a stream with
/// `num_measurements` records.
fn lookbacks(records: &RecordSet, num_measurements: usize) -> Vec<RecTarget> {
    records
        .iter()
        .map(|&r| RecTarget::lookback(r, num_measurements))
        .collect()
}

fn reflow_error(element: usize, err: ReflowError) -> CompileError {
    match err {
        ReflowError::Mismatch { output, product } => CompileError::ReflowAlgebra {
            element,
            output,
            product,
        },
        ReflowError::Unsolvable { output } => CompileError::ReflowUnsolvable { element, output },
        ReflowError::Algebra(source) => CompileError::PauliAlgebra { element, source },
    }
}

/// Errors raised while compiling a chunk program.
///
/// `element` is the index of the offending top-level element, in append
/// order.
#[derive(Debug, Display, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// A qubit name was placed at two different coordinates.
    #[display("element {element} places qubit {qubit} at {conflicting}, but it is already at {existing}")]
    CoordinateConflict {
        /// The offending element.
        element: usize,
        /// The qubit.
        qubit: Qubit,
        /// The coordinate it was first placed at.
        existing: Coord,
        /// The new coordinate.
        conflicting: Coord,
    },
    /// A flow consumes an operator that is not live.
    #[display("element {element} consumes {pauli}, which no earlier element produced")]
    DanglingFlow {
        /// The offending element.
        element: usize,
        /// The consumed operator.
        pauli: PauliMap,
    },
    /// An operator is still live at the end of the program.
    #[display("{pauli} is never consumed and is not part of an observable")]
    UnterminatedFlow {
        /// The live operator.
        pauli: PauliMap,
    },
    /// The explicit inputs of a reflow output multiply to something else.
    #[display("element {element}: reflow inputs of {output} multiply to {product}")]
    ReflowAlgebra {
        /// The offending element.
        element: usize,
        /// The declared output.
        output: PauliMap,
        /// The product of its inputs.
        product: PauliMap,
    },
    /// No product of the live operators gives a reflow output.
    #[display("element {element}: no product of the live operators gives {output}")]
    ReflowUnsolvable {
        /// The offending element.
        element: usize,
        /// The requested output.
        output: PauliMap,
    },
    /// No subset of a chunk's measurements witnesses a flow.
    #[display("element {element}: no subset of the chunk's measurements gives {target}")]
    AutoMeasurementUnsolvable {
        /// The offending element.
        element: usize,
        /// The operator the measurements had to reproduce.
        target: PauliMap,
    },
    /// A loop body does not settle into a repeating pattern.
    #[display("element {element}: loop body does not reach a steady state")]
    LoopPeriodicity {
        /// The offending loop.
        element: usize,
    },
    /// A loop has fewer repetitions than it needs.
    #[display("element {element}: loop has {repetitions} repetitions but needs at least {required}")]
    LoopTooShort {
        /// The offending loop.
        element: usize,
        /// The declared repetitions.
        repetitions: usize,
        /// The minimum number of repetitions.
        required: usize,
    },
    /// An element failed validation.
    #[display("element {element} is invalid: {source}")]
    InvalidChunk {
        /// The offending element.
        element: usize,
        /// What is wrong with it.
        source: InvalidChunk,
    },
    /// A flow produces an operator that is already live.
    #[display("element {element} produces {pauli}, which is already live")]
    OverlappingFlow {
        /// The offending element.
        element: usize,
        /// The produced operator.
        pauli: PauliMap,
    },
    /// Operators with different keys were multiplied, or the product is not
    /// hermitian.
    #[display("element {element}: {source}")]
    PauliAlgebra {
        /// The offending element.
        element: usize,
        /// The algebra error.
        source: PauliMapError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::POSTSELECT;
    use cool_asserts::assert_matches;
    use rstest::{fixture, rstest};

    fn pm(s: &str) -> PauliMap {
        s.parse().unwrap()
    }

    fn circuit(name: &str, qubits: &[u32]) -> Circuit {
        let mut circ = Circuit::new();
        circ.append(name, qubits.iter().copied(), []).unwrap();
        circ
    }

    #[fixture]
    fn prepare() -> Chunk {
        Chunk::new(
            circuit("R", &[0]),
            [(0u32, (0.0, 0.0))],
            [Flow::output(pm("Z0"))],
        )
    }

    #[fixture]
    fn measure() -> Chunk {
        Chunk::new(
            circuit("M", &[0]),
            [(0u32, (0.0, 0.0))],
            [Flow::input(pm("Z0")).with_measurements([0])],
        )
    }

    #[rstest]
    fn output_layout(prepare: Chunk, measure: Chunk) {
        let mut compiler = ChunkCompiler::new();
        compiler.append(prepare).unwrap();
        compiler.append(measure).unwrap();
        assert_eq!(compiler.num_elements(), 2);
        assert_eq!(compiler.num_measurements(), 1);
        assert!(compiler.live_paulis().is_empty());
        assert_eq!(
            compiler.finish().unwrap().to_string(),
            "QUBIT_COORDS(0, 0) 0\n\
             R 0\n\
             SHIFT_COORDS(0, 0, 1)\n\
             TICK\n\
             M 0\n\
             DETECTOR(0, 0, 0) rec[-1]\n\
             SHIFT_COORDS(0, 0, 1)\n"
        );
    }

    #[rstest]
    fn bare_options(prepare: Chunk, measure: Chunk) {
        let options = ChunkCompilerOptions {
            coord_shift: vec![],
            step_separators: false,
            declare_coords: false,
            ..Default::default()
        };
        let mut compiler = ChunkCompiler::with_options(options);
        compiler.append(prepare).unwrap();
        compiler.append(measure).unwrap();
        assert_eq!(
            compiler.finish().unwrap().to_string(),
            "R 0\nM 0\nDETECTOR(0, 0, 0) rec[-1]\n"
        );
    }

    #[rstest]
    fn qubits_are_renumbered_by_coordinate(measure: Chunk) {
        let prepare = Chunk::new(
            circuit("R", &[0, 7]),
            [(0u32, (0.0, 0.0)), (7, (-1.0, 0.0))],
            [Flow::output(pm("Z0"))],
        );
        let mut compiler = ChunkCompiler::new();
        compiler.append(prepare).unwrap();
        compiler.append(measure).unwrap();
        let text = compiler.finish().unwrap().to_string();
        assert!(text.starts_with("QUBIT_COORDS(-1, 0) 0\nQUBIT_COORDS(0, 0) 1\nR 1 0\n"));
        assert!(text.contains("M 1\n"));
    }

    #[rstest]
    fn passthrough_opens_with_its_witness(prepare: Chunk, measure: Chunk) {
        let cycle = Chunk::new(
            circuit("M", &[0]),
            [(0u32, (0.0, 0.0))],
            [Flow::passthrough(pm("Z0"), pm("Z0")).with_measurements([0])],
        );
        let mut compiler = ChunkCompiler::new();
        compiler.append(prepare).unwrap();
        compiler.append(cycle.clone()).unwrap();
        compiler.append(cycle).unwrap();
        compiler.append(measure).unwrap();
        let dets = compiler.finish().unwrap().detectors();
        let records = dets.iter().map(|d| d.records.clone()).collect_vec();
        assert_eq!(records, vec![vec![0], vec![0, 1], vec![1, 2]]);
    }

    #[rstest]
    #[case::producer(true, false)]
    #[case::consumer(false, true)]
    #[case::both(true, true)]
    #[case::neither(false, false)]
    fn postselection_flags_are_merged(#[case] on_output: bool, #[case] on_input: bool) {
        let flagged = |flow: Flow, flag: bool| if flag { flow.with_flag(POSTSELECT) } else { flow };
        let prepare = Chunk::new(
            circuit("R", &[0]),
            [(0u32, (0.0, 0.0))],
            [flagged(Flow::output(pm("Z0")), on_output)],
        );
        let measure = Chunk::new(
            circuit("M", &[0]),
            [(0u32, (0.0, 0.0))],
            [flagged(Flow::input(pm("Z0")).with_measurements([0]), on_input)],
        );
        let mut compiler = ChunkCompiler::new().with_extra_coords(|flow| {
            if flow.has_flag(POSTSELECT) {
                vec![999.0]
            } else {
                vec![]
            }
        });
        compiler.append(prepare).unwrap();
        compiler.append(measure).unwrap();
        let dets = compiler.finish().unwrap().detectors();
        let expected = if on_output || on_input {
            vec![0.0, 0.0, 1.0, 999.0]
        } else {
            vec![0.0, 0.0, 1.0]
        };
        assert_eq!(dets[0].coords, expected);
    }

    #[rstest]
    fn discarded_input_flows_emit_nothing(prepare: Chunk) {
        let measure = Chunk::new(
            circuit("M", &[0]),
            [(0u32, (0.0, 0.0))],
            [Flow::input(pm("Z0")).with_measurements([0])],
        )
        .with_discarded_inputs([pm("Z0")]);
        let mut compiler = ChunkCompiler::new();
        compiler.append(prepare).unwrap();
        compiler.append(measure).unwrap();
        assert!(compiler.live_paulis().is_empty());
        let circ = compiler.finish().unwrap();
        assert_eq!(circ.num_measurements(), 1);
        assert!(circ.annotations().is_empty());
    }

    #[rstest]
    fn discarded_operators(prepare: Chunk) {
        let drop = Chunk::new(Circuit::new(), [(0u32, (0.0, 0.0))], [])
            .with_discarded_inputs([pm("Z0")]);
        let mut compiler = ChunkCompiler::new();
        compiler.append(prepare).unwrap();
        compiler.append(drop).unwrap();
        assert!(compiler.live_paulis().is_empty());

        let hidden = Chunk::new(
            circuit("R", &[0]),
            [(0u32, (0.0, 0.0))],
            [Flow::output(pm("X0"))],
        )
        .with_discarded_outputs([pm("X0")]);
        compiler.append(hidden).unwrap();
        assert!(compiler.live_paulis().is_empty());
        assert!(compiler.finish().is_ok());
    }

    #[rstest]
    fn reflow_merges_entries() {
        let prepare = Chunk::new(
            circuit("M", &[0, 1]),
            [(0u32, (0.0, 0.0)), (1, (1.0, 0.0))],
            [
                Flow::output(pm("Z0")).with_measurements([0]),
                Flow::output(pm("Z1")).with_measurements([1]),
            ],
        );
        let measure = Chunk::new(
            circuit("MZZ", &[0, 1]),
            [(0u32, (0.0, 0.0)), (1, (1.0, 0.0))],
            [Flow::input(pm("Z0*Z1")).with_auto_measurements()],
        );
        let mut compiler = ChunkCompiler::new();
        compiler.append(prepare).unwrap();
        compiler
            .append(ChunkReflow::from_explicit([(
                pm("Z0*Z1"),
                vec![pm("Z0"), pm("Z1")],
            )]))
            .unwrap();
        assert_eq!(compiler.live_paulis(), vec![pm("Z0*Z1")]);
        compiler.append(measure).unwrap();
        let dets = compiler.finish().unwrap().detectors();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].records, vec![0, 1, 2]);
    }

    #[rstest]
    fn overlapping_output(prepare: Chunk) {
        let mut compiler = ChunkCompiler::new();
        compiler.append(prepare.clone()).unwrap();
        assert_matches!(
            compiler.append(prepare),
            Err(CompileError::OverlappingFlow { element: 1, .. })
        );
    }

    #[rstest]
    fn invalid_chunk(measure: Chunk) {
        let bad = Chunk::new(circuit("M", &[3]), [(0u32, (0.0, 0.0))], []);
        let mut compiler = ChunkCompiler::new();
        assert_matches!(
            compiler.append(bad),
            Err(CompileError::InvalidChunk {
                element: 0,
                source: InvalidChunk::MissingCoordinate { .. }
            })
        );
        let mut compiler = ChunkCompiler::new();
        assert_matches!(
            compiler.append(measure),
            Err(CompileError::DanglingFlow { element: 0, .. })
        );
    }
}
