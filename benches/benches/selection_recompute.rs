// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fascicle_index::{Fibers, SpatialIndex};
use fascicle_select::{BoxFace, Roi, SelectionManager};

fn gen_grid_fibers(n: usize) -> Fibers {
    Fibers::from_polylines((0..n * n).map(|i| {
        let (x, y) = ((i % n) as f32, (i / n) as f32);
        (0..n).map(|z| [x, y, z as f32]).collect::<Vec<_>>()
    }))
}

fn populated(branches: usize) -> SelectionManager {
    let manager = SelectionManager::new();
    for i in 0..branches {
        let o = (i * 6) as f32;
        let master = manager
            .add_roi(Roi::aabb([o, o, 0.0], [o + 8.0, o + 8.0, 63.0]), None)
            .unwrap();
        manager
            .add_roi_beside(Roi::sphere([o + 4.0, o + 4.0, 32.0], 6.0).negated(), master)
            .unwrap();
    }
    manager
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    let fibers = gen_grid_fibers(64);
    let index = SpatialIndex::new(&fibers);

    group.bench_function("cached", |b| {
        let manager = populated(8);
        let _ = manager.selection(&index);
        b.iter(|| black_box(manager.selection(&index).revision()));
    });

    group.bench_function("drag_one_roi", |b| {
        let manager = populated(8);
        let dragged = manager.rois()[0];
        let mut delta = 0.5;
        b.iter(|| {
            manager.move_face(dragged, BoxFace::MaxX, delta);
            delta = -delta;
            black_box(manager.selection(&index).selected_count())
        });
    });

    group.bench_function("queued_drag_one_roi", |b| {
        let manager = populated(8);
        let editor = manager.editor();
        let dragged = manager.rois()[0];
        let mut offset = 0.5;
        b.iter(|| {
            editor.translate(dragged, [offset, 0.0, 0.0]);
            offset = -offset;
            black_box(manager.selection(&index).selected_count())
        });
    });

    group.bench_function("recolor_only", |b| {
        let manager = populated(8);
        let branch = manager.branches()[0];
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let color = if flip {
                fascicle_select::Color::BLUE
            } else {
                fascicle_select::Color::GREEN
            };
            manager.set_branch_color(branch, color);
            black_box(manager.selection(&index).revision())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_selection);
criterion_main!(benches);
