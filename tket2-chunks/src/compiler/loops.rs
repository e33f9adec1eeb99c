//! Folding of loops into repeat blocks.
//!
//! A loop body is compiled against throwaway copies of the compiler state.
//! When an iteration produces exactly the same instructions as the previous
//! one and leaves the live operators in the same shape, every later
//! iteration will too, so the remaining iterations can be emitted as a
//! single repeat block. At most one leading iteration is peeled off before
//! that steady state must be reached.

use crate::chunk::{ChunkElement, ChunkLoop};
use crate::circuit::Circuit;

use super::log::{log_loop_fold, log_loop_literal};
use super::{CompileConfig, CompileError, CompileState};

/// One compiled iteration of a loop body.
#[derive(Clone, Debug)]
struct Iteration {
    circuit: Circuit,
    state: CompileState,
}

impl Iteration {
    /// Whether `next` repeats this iteration, up to record numbering.
    fn is_repeated_by(&self, next: &Iteration) -> bool {
        self.circuit == next.circuit
            && self.state.frontier.shape(self.state.num_measurements)
                == next.state.frontier.shape(next.state.num_measurements)
    }

    /// Emit the iteration literally.
    fn emit(self, state: &mut CompileState, out: &mut Circuit) {
        out.extend(self.circuit);
        *state = self.state;
    }

    /// Emit the iteration as a repeat block. The iteration must be in steady
    /// state.
    fn emit_repeated(self, state: &mut CompileState, out: &mut Circuit, repetitions: usize) {
        let per_iteration = self.circuit.num_measurements();
        if !self.circuit.is_empty() {
            out.append_repeat(repetitions, self.circuit);
        }
        *state = self.state;
        state.advance((repetitions - 1) * per_iteration);
    }
}

impl CompileConfig {
    pub(super) fn compile_loop(
        &self,
        state: &mut CompileState,
        out: &mut Circuit,
        chunk_loop: &ChunkLoop,
        element: usize,
    ) -> Result<(), CompileError> {
        let repetitions = chunk_loop.repetitions();
        if repetitions == 0 {
            return Err(CompileError::LoopTooShort {
                element,
                repetitions,
                required: 1,
            });
        }
        let body = chunk_loop.body();

        let first = self.run_iteration(state, body, element)?;
        if repetitions == 1 {
            log_loop_literal(element, repetitions);
            first.emit(state, out);
            return Ok(());
        }

        let second = self.run_iteration(&first.state, body, element)?;
        if first.is_repeated_by(&second) {
            log_loop_fold(element, repetitions, 0);
            first.emit_repeated(state, out, repetitions);
            return Ok(());
        }
        if repetitions == 2 {
            log_loop_literal(element, repetitions);
            first.emit(state, out);
            second.emit(state, out);
            return Ok(());
        }

        let third = self.run_iteration(&second.state, body, element)?;
        if !second.is_repeated_by(&third) {
            return Err(CompileError::LoopPeriodicity { element });
        }
        log_loop_fold(element, repetitions, 1);
        first.emit(state, out);
        second.emit_repeated(state, out, repetitions - 1);
        Ok(())
    }

    /// Compile one iteration of `body` against a copy of `state`.
    fn run_iteration(
        &self,
        state: &CompileState,
        body: &[ChunkElement],
        element: usize,
    ) -> Result<Iteration, CompileError> {
        let mut iteration = Iteration {
            circuit: Circuit::new(),
            state: state.clone(),
        };
        for inner in body {
            self.compile_element(&mut iteration.state, &mut iteration.circuit, inner, element)?;
        }
        Ok(iteration)
    }
}
