//! Logging utilities for the chunk compiler.
//!
//! Events are emitted with [`tracing`]. The library never installs a
//! subscriber; filter on the targets below to follow a compilation.

use crate::chunk::ChunkElement;
use crate::circuit::Circuit;
use crate::pauli::PauliMap;

/// The logging target for per-element events.
pub const COMPILE_TARGET: &str = "chunks::compile";
/// The logging target for loop folding decisions.
pub const LOOP_TARGET: &str = "chunks::loop";
/// The logging target for function spans and compilation summaries.
pub const METRICS_TARGET: &str = "chunks::metrics";

/// Tracks a compilation for progress reporting.
#[derive(Clone, Debug, Default)]
pub(crate) struct CompileLogger {
    elements: usize,
    chunks: usize,
    reflows: usize,
    loops: usize,
}

/// The kind of a top-level element, for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub(crate) enum ElementKind {
    #[display("chunk")]
    Chunk,
    #[display("reflow")]
    Reflow,
    #[display("loop")]
    Loop,
}

impl ElementKind {
    /// The kind of an element.
    pub fn of(element: &ChunkElement) -> Self {
        match element {
            ChunkElement::Chunk(_) => ElementKind::Chunk,
            ChunkElement::Reflow(_) => ElementKind::Reflow,
            ChunkElement::Loop(_) => ElementKind::Loop,
        }
    }
}

impl CompileLogger {
    /// Log a top-level element about to be compiled.
    #[inline]
    pub fn log_element(&mut self, index: usize, kind: ElementKind) {
        self.elements += 1;
        match kind {
            ElementKind::Chunk => self.chunks += 1,
            ElementKind::Reflow => self.reflows += 1,
            ElementKind::Loop => self.loops += 1,
        }
        tracing::debug!(target: COMPILE_TARGET, index, %kind, "appending element");
    }

    /// Log the end of a compilation.
    pub fn log_finish(&self, circuit: &Circuit, qubits: usize) {
        tracing::info!(
            target: METRICS_TARGET,
            qubits,
            elements = self.elements,
            chunks = self.chunks,
            reflows = self.reflows,
            loops = self.loops,
            instructions = circuit.num_instructions(),
            measurements = circuit.num_measurements(),
            "finished compilation"
        );
    }
}

/// Log an annotation that was not emitted because it has no records.
#[inline]
pub(crate) fn log_empty_annotation(element: usize, pauli: &PauliMap) {
    tracing::trace!(target: COMPILE_TARGET, element, %pauli, "skipping annotation with no records");
}

/// Log how a loop was folded.
#[inline]
pub(crate) fn log_loop_fold(element: usize, repetitions: usize, peeled: usize) {
    tracing::debug!(
        target: LOOP_TARGET,
        element,
        repetitions,
        peeled,
        "folded loop into a repeat block"
    );
}

/// Log a loop emitted without a repeat block.
#[inline]
pub(crate) fn log_loop_literal(element: usize, repetitions: usize) {
    tracing::debug!(target: LOOP_TARGET, element, repetitions, "emitting loop literally");
}
