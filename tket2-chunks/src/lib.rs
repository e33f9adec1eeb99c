//! Composition of annotated measurement-circuit fragments.
//!
//! Large error-correction circuits are easier to write as a sequence of
//! small fragments, or [`Chunk`]s. Each chunk declares [`Flow`]s: which
//! Pauli products ([`PauliMap`]s) it consumes on entry, which it produces on
//! exit, and which of its own measurements witness the relation. The
//! [`ChunkCompiler`] joins the fragments into a single [`Circuit`], numbering
//! qubits and measurement records globally, and turns every matched pair of
//! flows into a detector or an observable inclusion.
//!
//! Repeated sections are written as a [`ChunkLoop`] and compiled into a
//! single repeat block once they reach a steady state. A [`ChunkReflow`]
//! re-expresses the live operators as products of each other between chunks,
//! without adding instructions.
//!
//! # Example
//!
//! ```
//! use tket2_chunks::{Chunk, ChunkCompiler, ChunkLoop, Circuit, Flow, PauliMap};
//!
//! let z0: PauliMap = "Z0".parse().unwrap();
//! let coords = [(0u32, (0.0, 0.0))];
//! let single = |name: &str| {
//!     let mut circ = Circuit::new();
//!     circ.append(name, [0u32], []).unwrap();
//!     circ
//! };
//!
//! let prepare = Chunk::new(single("R"), coords, [Flow::output(z0.clone())]);
//! let cycle = Chunk::new(
//!     single("M"),
//!     coords,
//!     [Flow::passthrough(z0.clone(), z0.clone()).with_measurements([0])],
//! );
//! let measure = Chunk::new(
//!     single("M"),
//!     coords,
//!     [Flow::input(z0).with_measurements([0])],
//! );
//!
//! let mut compiler = ChunkCompiler::new();
//! compiler.append(prepare).unwrap();
//! compiler.append(ChunkLoop::new([cycle], 1000)).unwrap();
//! compiler.append(measure).unwrap();
//! let circuit = compiler.finish().unwrap();
//!
//! assert_eq!(circuit.num_measurements(), 1001);
//! assert_eq!(circuit.detectors().len(), 1001);
//! println!("{circuit}");
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod chunk;
pub mod circuit;
pub mod compiler;
pub mod flow;
pub mod pauli;
pub mod solve;

pub use chunk::{Chunk, ChunkElement, ChunkLoop, ChunkReflow, InvalidChunk, ReflowInputs};
pub use circuit::{Circuit, CircuitError, Coord, GateTarget, Instruction, RecTarget};
pub use compiler::{ChunkCompiler, ChunkCompilerOptions, CompileError};
pub use flow::{Flow, MeasurementRefs, POSTSELECT};
pub use pauli::{Pauli, PauliMap, PauliMapError, Qubit, Sign};
