use tket2_chunks::{Chunk, Circuit, Flow, Pauli, PauliMap};

/// Place every qubit `q` at `(q, 0)`.
fn line_coords(qubits: impl IntoIterator<Item = u32>) -> Vec<(u32, (f64, f64))> {
    qubits.into_iter().map(|q| (q, (q as f64, 0.0))).collect()
}

/// The chunks of a repetition code memory experiment with the given
/// distance: initialisation, one stabilizer round, and final measurement.
///
/// Data qubits sit on even positions and measure qubits on odd ones.
pub fn repetition_code(distance: u32) -> (Chunk, Chunk, Chunk) {
    let data = (0..distance).map(|i| 2 * i).collect::<Vec<_>>();
    let ancillas = (0..distance - 1).map(|i| 2 * i + 1).collect::<Vec<_>>();
    let stabilizers = ancillas
        .iter()
        .map(|&a| PauliMap::from_basis(Pauli::Z, [a - 1, a + 1]))
        .collect::<Vec<_>>();

    let mut init = Circuit::new();
    init.append("R", data.iter().copied(), []).unwrap();
    let init = Chunk::new(
        init,
        line_coords(data.iter().copied()),
        stabilizers.iter().cloned().map(Flow::output),
    );

    let mut cycle = Circuit::new();
    cycle.append("R", ancillas.iter().copied(), []).unwrap();
    cycle
        .append("CX", ancillas.iter().flat_map(|&a| [a - 1, a]), [])
        .unwrap();
    cycle
        .append("CX", ancillas.iter().flat_map(|&a| [a + 1, a]), [])
        .unwrap();
    cycle.append("M", ancillas.iter().copied(), []).unwrap();
    let cycle = Chunk::new(
        cycle,
        line_coords(0..2 * distance - 1),
        stabilizers
            .iter()
            .enumerate()
            .map(|(i, s)| Flow::passthrough(s.clone(), s.clone()).with_measurements([i])),
    );

    let mut measure = Circuit::new();
    measure.append("M", data.iter().copied(), []).unwrap();
    let measure = Chunk::new(
        measure,
        line_coords(data.iter().copied()),
        stabilizers
            .iter()
            .map(|s| Flow::input(s.clone()).with_auto_measurements()),
    );

    (init, cycle, measure)
}
