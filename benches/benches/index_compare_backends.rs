// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fascicle_index::{Aabb3D, Backend, FiberDataset, Fibers, FlatVec, KdTree, SpatialIndex, Sphere};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
}

/// Random-walk fibers in a 200^3 volume, `points` vertices each.
fn gen_walk_fibers(fibers: usize, points: usize) -> Fibers {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    Fibers::from_polylines((0..fibers).map(|_| {
        let mut p = [
            rng.next_f32() * 200.0,
            rng.next_f32() * 200.0,
            rng.next_f32() * 200.0,
        ];
        (0..points)
            .map(|_| {
                for c in &mut p {
                    *c += (rng.next_f32() - 0.5) * 4.0;
                }
                p
            })
            .collect::<Vec<_>>()
    }))
}

/// Parallel straight fibers along x, like a compact bundle.
fn gen_bundle_fibers(side: usize, points: usize) -> Fibers {
    Fibers::from_polylines((0..side * side).map(|i| {
        let (y, z) = ((i % side) as f32, (i / side) as f32);
        (0..points)
            .map(|x| [x as f32, y, z])
            .collect::<Vec<_>>()
    }))
}

fn bench_build<B: Backend>(c: &mut Criterion, name: &str) {
    let mut group = c.benchmark_group(format!("{name}_build"));
    for &n in &[1_000usize, 10_000] {
        let fibers = gen_walk_fibers(n, 20);
        group.throughput(Throughput::Elements(fibers.point_count() as u64));
        group.bench_function(format!("walk_n{n}"), |b| {
            b.iter(|| black_box(SpatialIndex::<B>::with_backend(&fibers)));
        });
    }
    group.finish();
}

fn bench_queries<B: Backend>(c: &mut Criterion, name: &str) {
    let mut group = c.benchmark_group(format!("{name}_query"));
    let fibers = gen_walk_fibers(10_000, 20);
    let index = SpatialIndex::<B>::with_backend(&fibers);
    group.bench_function("box_small", |b| {
        let q = Aabb3D::new([90.0; 3], [110.0; 3]);
        b.iter(|| black_box(index.box_mask(q).count_ones()));
    });
    group.bench_function("box_large", |b| {
        let q = Aabb3D::new([20.0; 3], [180.0; 3]);
        b.iter(|| black_box(index.box_mask(q).count_ones()));
    });
    group.bench_function("sphere_small", |b| {
        let q = Sphere::new([100.0; 3], 10.0);
        b.iter(|| black_box(index.radius_mask(q).count_ones()));
    });
    group.bench_function("box_sweep", |b| {
        b.iter_batched(
            || Rng::new(0xBADC_F00D_1234_5678),
            |mut rng| {
                let mut hits = 0;
                for _ in 0..64 {
                    let lo = [
                        rng.next_f32() * 180.0,
                        rng.next_f32() * 180.0,
                        rng.next_f32() * 180.0,
                    ];
                    let q = Aabb3D::new(lo, [lo[0] + 20.0, lo[1] + 20.0, lo[2] + 20.0]);
                    hits += index.box_mask(q).count_ones();
                }
                black_box(hits);
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_kdtree(c: &mut Criterion) {
    bench_build::<KdTree>(c, "kdtree");
    bench_queries::<KdTree>(c, "kdtree");
}

fn bench_flatvec(c: &mut Criterion) {
    bench_build::<FlatVec>(c, "flatvec");
    bench_queries::<FlatVec>(c, "flatvec");
}

fn bench_bundle(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_bundle");
    let fibers = gen_bundle_fibers(64, 100);
    let index = SpatialIndex::new(&fibers);
    group.throughput(Throughput::Elements(fibers.fiber_count() as u64));
    group.bench_function("slab_through_bundle", |b| {
        let q = Aabb3D::new([49.0, -1.0, -1.0], [51.0, 65.0, 65.0]);
        b.iter(|| black_box(index.box_mask(q).count_ones()));
    });
    group.finish();
}

criterion_group!(benches, bench_kdtree, bench_flatvec, bench_bundle);
criterion_main!(benches);
