use criterion::{black_box, criterion_group, BenchmarkId, Criterion};
use tket2_chunks::solve::{solve_pauli_product, DEFAULT_MAX_ENUMERATION};
use tket2_chunks::{Pauli, PauliMap};

/// A chain of `ZZ` operators on neighbouring qubits, padded with redundant
/// products so the candidates have a null space to search.
fn zz_chain(len: u32) -> Vec<PauliMap> {
    let chain = (0..len).map(|i| PauliMap::from_basis(Pauli::Z, [i, i + 1]));
    let redundant = (0..len / 2).map(|i| PauliMap::from_basis(Pauli::Z, [2 * i, 2 * i + 2]));
    chain.chain(redundant).collect()
}

fn bench_solve(c: &mut Criterion) {
    let mut g = c.benchmark_group("solve pauli products");

    for len in [8, 16, 32] {
        g.bench_with_input(BenchmarkId::new("zz_chain", len), &len, |b, &len| {
            let candidates = zz_chain(len);
            let target = PauliMap::from_basis(Pauli::Z, [0, len]);
            b.iter(|| {
                black_box(solve_pauli_product(
                    &candidates,
                    &target,
                    DEFAULT_MAX_ENUMERATION,
                ))
            })
        });
    }
    g.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        bench_solve,
}
