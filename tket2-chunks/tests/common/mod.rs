//! Chunk generators shared by the integration tests.
#![allow(dead_code)]

use tket2_chunks::{Chunk, Circuit, Flow, GateTarget, Pauli, PauliMap, Qubit};

pub fn pm(s: &str) -> PauliMap {
    s.parse().unwrap()
}

/// Place every qubit `q` at `(q, 0)`.
pub fn line_coords(qubits: impl IntoIterator<Item = u32>) -> Vec<(u32, (f64, f64))> {
    qubits.into_iter().map(|q| (q, (q as f64, 0.0))).collect()
}

/// Append a product measurement of each operator.
pub fn append_mpp(circ: &mut Circuit, products: &[PauliMap]) {
    let mut targets = Vec::new();
    for product in products {
        for (i, (q, p)) in product.iter().enumerate() {
            if i > 0 {
                targets.push(GateTarget::Combiner);
            }
            targets.push(GateTarget::Pauli(p, q));
        }
    }
    circ.append("MPP", targets, []).unwrap();
}

/// A bit-flip repetition code on a line.
///
/// Data qubits sit on even positions and measure qubits on odd ones.
#[derive(Clone, Copy, Debug)]
pub struct RepetitionCode {
    pub distance: u32,
}

impl RepetitionCode {
    pub fn new(distance: u32) -> Self {
        Self { distance }
    }

    pub fn data(&self) -> Vec<u32> {
        (0..self.distance).map(|i| 2 * i).collect()
    }

    pub fn ancillas(&self) -> Vec<u32> {
        (0..self.distance - 1).map(|i| 2 * i + 1).collect()
    }

    pub fn stabilizers(&self) -> Vec<PauliMap> {
        self.ancillas()
            .into_iter()
            .map(|a| PauliMap::from_basis(Pauli::Z, [a - 1, a + 1]))
            .collect()
    }

    pub fn observable(&self) -> PauliMap {
        PauliMap::from_basis(Pauli::Z, [Qubit(0)])
    }

    /// Reset every data qubit.
    pub fn init(&self) -> Chunk {
        let mut circ = Circuit::new();
        circ.append("R", self.data(), []).unwrap();
        let flows = self
            .stabilizers()
            .into_iter()
            .map(Flow::output)
            .chain([Flow::output(self.observable()).with_obs_key(0)]);
        Chunk::new(circ, line_coords(self.data()), flows)
    }

    /// Measure every stabilizer once through the ancillas.
    pub fn cycle(&self) -> Chunk {
        let mut circ = Circuit::new();
        circ.append("R", self.ancillas(), []).unwrap();
        let left = self.ancillas().into_iter().flat_map(|a| [a - 1, a]);
        circ.append("CX", left, []).unwrap();
        let right = self.ancillas().into_iter().flat_map(|a| [a + 1, a]);
        circ.append("CX", right, []).unwrap();
        circ.append("M", self.ancillas(), []).unwrap();
        let flows = self
            .stabilizers()
            .into_iter()
            .enumerate()
            .map(|(i, s)| Flow::passthrough(s.clone(), s).with_measurements([i]))
            .chain([Flow::passthrough(self.observable(), self.observable()).with_obs_key(0)]);
        Chunk::new(circ, line_coords(0..2 * self.distance - 1), flows)
    }

    /// Measure every data qubit.
    pub fn measure(&self) -> Chunk {
        let mut circ = Circuit::new();
        circ.append("M", self.data(), []).unwrap();
        let flows = self
            .stabilizers()
            .into_iter()
            .enumerate()
            .map(|(i, s)| Flow::input(s).with_measurements([i, i + 1]))
            .chain([Flow::input(self.observable())
                .with_obs_key(0)
                .with_measurements([0])]);
        Chunk::new(circ, line_coords(self.data()), flows)
    }
}
