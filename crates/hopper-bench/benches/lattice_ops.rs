//! Criterion micro-benchmarks for lattice operations.

use criterion::{criterion_group, criterion_main, Criterion};
use hopper_core::{Face, FluxId, SiteId, Species};
use hopper_lattice::{Dimensions, Lattice};
use std::hint::black_box;

fn device() -> Lattice {
    let mut lattice = Lattice::new(Dimensions::new(20, 20, 20), 2).unwrap();
    lattice
        .register_special(FluxId(0), Species::Source, Face::Left)
        .unwrap();
    lattice
        .register_special(FluxId(1), Species::Drain, Face::Right)
        .unwrap();
    lattice
}

/// Benchmark: neighbours() at range 1 for all 8K sites.
fn bench_neighbours_range1_8k(c: &mut Criterion) {
    let lattice = device();
    c.bench_function("neighbours_range1_8k", |b| {
        b.iter(|| {
            for i in 0..lattice.volume() {
                black_box(lattice.neighbours(SiteId(i), 1));
            }
        });
    });
}

/// Benchmark: neighbours() at range 2 for all 8K sites (spills the inline buffer).
fn bench_neighbours_range2_8k(c: &mut Criterion) {
    let lattice = device();
    c.bench_function("neighbours_range2_8k", |b| {
        b.iter(|| {
            for i in 0..lattice.volume() {
                black_box(lattice.neighbours(SiteId(i), 2));
            }
        });
    });
}

/// Benchmark: index/coordinate round trip for all sites.
fn bench_index_roundtrip_8k(c: &mut Criterion) {
    let lattice = device();
    c.bench_function("index_roundtrip_8k", |b| {
        b.iter(|| {
            for i in 0..lattice.volume() {
                let (x, y, z) = lattice.coords(SiteId(i));
                black_box(lattice.site_index(x, y, z));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_neighbours_range1_8k,
    bench_neighbours_range2_8k,
    bench_index_roundtrip_8k
);
criterion_main!(benches);
