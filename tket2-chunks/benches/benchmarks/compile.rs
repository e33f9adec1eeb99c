use criterion::{black_box, criterion_group, AxisScale, BenchmarkId, Criterion, PlotConfiguration};
use tket2_chunks::{ChunkCompiler, ChunkLoop};

use super::generators::repetition_code;

fn bench_compile_literal(c: &mut Criterion) {
    let mut g = c.benchmark_group("compile unrolled rounds");
    g.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for rounds in [10, 100, 1_000] {
        g.bench_with_input(BenchmarkId::new("literal", rounds), &rounds, |b, &rounds| {
            let (init, cycle, measure) = repetition_code(9);
            b.iter(|| {
                let mut compiler = ChunkCompiler::new();
                compiler.append(init.clone()).unwrap();
                for _ in 0..rounds {
                    compiler.append(cycle.clone()).unwrap();
                }
                compiler.append(measure.clone()).unwrap();
                black_box(compiler.finish().unwrap())
            })
        });
    }
    g.finish();
}

fn bench_compile_loop(c: &mut Criterion) {
    let mut g = c.benchmark_group("compile folded rounds");
    g.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for distance in [3, 9, 27] {
        g.bench_with_input(BenchmarkId::new("loop", distance), &distance, |b, &distance| {
            let (init, cycle, measure) = repetition_code(distance);
            b.iter(|| {
                let mut compiler = ChunkCompiler::new();
                compiler.append(init.clone()).unwrap();
                compiler
                    .append(ChunkLoop::new([cycle.clone()], 1_000))
                    .unwrap();
                compiler.append(measure.clone()).unwrap();
                black_box(compiler.finish().unwrap())
            })
        });
    }
    g.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        bench_compile_literal,
        bench_compile_loop,
}
