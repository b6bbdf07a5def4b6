// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fascicle_index::{Aabb3D, FiberDataset, Fibers, SpatialIndex};

use rstar::{AABB, RTree};

fn gen_grid_fibers(n: usize) -> Fibers {
    Fibers::from_polylines((0..n * n).map(|i| {
        let (x, y) = ((i % n) as f32, (i / n) as f32);
        (0..n).map(|z| [x, y, z as f32]).collect::<Vec<_>>()
    }))
}

fn to_rstar_points(fibers: &Fibers) -> Vec<[f32; 3]> {
    fibers
        .points()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect()
}

fn bench_rtree_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_external_compare_f32");
    for &n in &[32usize, 64] {
        let fibers = gen_grid_fibers(n);
        let query = Aabb3D::new([4.0; 3], [12.0; 3]);
        group.throughput(Throughput::Elements(fibers.point_count() as u64));

        group.bench_function(format!("fascicle_build_query_n{n}"), |b| {
            b.iter(|| {
                let idx = SpatialIndex::new(&fibers);
                black_box(idx.box_mask(query).count_ones());
            });
        });

        group.bench_function(format!("rstar_build_query_bulk_n{n}"), |b| {
            b.iter_batched(
                || to_rstar_points(&fibers),
                |points| {
                    let tree = RTree::bulk_load(points);
                    let aabb = AABB::from_corners(query.min, query.max);
                    let hits: usize = tree.locate_in_envelope(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rtree_external_compare);
criterion_main!(benches);
