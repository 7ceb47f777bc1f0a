//! Benchmarks: one slab of tent propagation and the bare DAG scheduler.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tent_dg::{run_parallel_dependency, Advection1D, ConservationLaw, DependencyDag, IntervalMesh};

fn bench_propagate_slab(c: &mut Criterion) {
    c.bench_function("propagate_slab_advection_64", |b| {
        let mesh = IntervalMesh::uniform_periodic(0.0, 1.0, 64);
        let mut cl = ConservationLaw::new(Advection1D::new(1.0), mesh, 3).unwrap();
        cl.set_initial(&|x, u| u[0] = (2.0 * std::f64::consts::PI * x[0]).sin());
        cl.pitch_tents(0.1, 1.0).unwrap();
        b.iter(|| {
            cl.propagate().unwrap();
            black_box(cl.u[0]);
        });
    });
}

fn bench_scheduler_noop(c: &mut Criterion) {
    c.bench_function("scheduler_noop_chain_4096", |b| {
        let dag = DependencyDag::from_dependents(
            (0..4096)
                .map(|i| if i + 1 < 4096 { vec![i + 1] } else { vec![] })
                .collect(),
        );
        b.iter(|| {
            run_parallel_dependency(&dag, |i| {
                black_box(i);
                Ok(())
            })
            .unwrap();
        });
    });
}

criterion_group!(benches, bench_propagate_slab, bench_scheduler_noop);
criterion_main!(benches);
