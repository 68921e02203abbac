use criterion::{black_box, criterion_group, criterion_main, Criterion};
use bfoalign::{
    alignment::{seed_population, Alignment},
    chemotaxis::{ChemotaxisEngine, EnergyParams, PopulationOperator},
    control::{BfoaOptions, OptimizationLoop},
    sequence::{InMemorySource, SequenceSource},
};

fn source() -> InMemorySource {
    InMemorySource::from_strs(&[
        ("p1", "MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKVKALPDAQ"),
        ("p2", "MKTAYIAKQRQISFVKSHFSRQDILDLWIYHTQGYFPDWQNYTPGPGVRYPLTFGWCYKLVPV"),
        ("p3", "MSTAYIAKQRQLSFVKSHFSRQLEERLGLIEVQGDGTQDNLSGAEKAVQVKVKALPDAQFEVV"),
        ("p4", "MKTAYIAKERQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEK"),
    ])
}

fn bench_run(c: &mut Criterion) {
    let source = source();

    let mut group = c.benchmark_group("optimization_run");
    group.sample_size(20);
    for bacteria in [4, 8, 16].iter() {
        group.bench_function(&format!("run_{}_bacteria", bacteria), |b| {
            b.iter(|| {
                let options = BfoaOptions::builder()
                    .num_bacteria(*bacteria)
                    .num_iterations(5)
                    .initial_step(20.0)
                    .anomaly_threshold(1.0e9)
                    .build();
                let mut optimizer =
                    OptimizationLoop::new(options, ChemotaxisEngine::with_seed(7)).unwrap();
                let report = optimizer.run(black_box(&source));
                assert!(report.is_ok());
            })
        });
    }
    group.finish();
}

fn bench_energy(c: &mut Criterion) {
    let sequences = source().load().unwrap();
    let energy = EnergyParams::default();

    let mut group = c.benchmark_group("energy_tables");
    for size in [8, 32, 128].iter() {
        let population: Vec<Alignment> = seed_population(&sequences, *size);
        group.bench_function(&format!("energy_{}", size), |b| {
            b.iter(|| {
                let mut engine = ChemotaxisEngine::with_seed(11);
                engine.reset_counters(*size);
                engine.score(black_box(&population)).unwrap();
                engine
                    .build_energy_tables(black_box(&population), &energy)
                    .unwrap();
                engine.combine_fitness().unwrap();
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_run, bench_energy);
criterion_main!(benches);
