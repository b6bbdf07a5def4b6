// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection basics.
//!
//! Build a small bundle, gate it with a box, carve a hole with a negated
//! sphere, add a second branch, and read back bits and colours.
//!
//! Run:
//! - `cargo run -p fascicle_demos --example selection_basics`

use fascicle_index::{Fibers, SpatialIndex};
use fascicle_select::{Color, Roi, SelectionManager};

fn main() {
    // Ten straight fibers along x, stacked in y.
    let fibers = Fibers::from_polylines((0..10).map(|y| {
        (0..=20)
            .map(|x| [x as f32, y as f32, 0.0])
            .collect::<Vec<_>>()
    }));
    let index = SpatialIndex::new(&fibers);
    let manager = SelectionManager::new();

    // With no ROIs everything is shown.
    println!("no ROIs: {} selected", manager.selection(&index).selected_count());

    // Branch 1: fibers through the box, except those touching the sphere.
    let gate = manager
        .add_roi(Roi::aabb([9.0, 0.0, -1.0], [11.0, 5.0, 1.0]), None)
        .unwrap();
    manager
        .add_roi_beside(Roi::sphere([20.0, 2.0, 0.0], 0.5).negated(), gate)
        .unwrap();
    let s = manager.selection(&index);
    println!("box AND NOT sphere: {:?}", s.iter_selected().collect::<Vec<_>>());
    assert_eq!(s.iter_selected().collect::<Vec<_>>(), vec![0, 1, 3, 4, 5]);

    // Branch 2, OR'ed in, with its own colour.
    let top = manager
        .add_roi(Roi::aabb([0.0, 8.5, -1.0], [0.0, 9.5, 1.0]), None)
        .unwrap();
    let top_branch = manager.branch_of(top).unwrap();
    manager.set_branch_color(top_branch, Color::BLUE);
    let s = manager.selection(&index);
    println!("... OR top: {:?}", s.iter_selected().collect::<Vec<_>>());
    println!("fiber 9 colour: {:?}", s.color_of(9));
    assert_eq!(s.color_of(9), Color::BLUE);

    // Negate the whole first branch.
    let gate_branch = manager.branch_of(gate).unwrap();
    manager.set_branch_negate(gate_branch, true);
    let s = manager.selection(&index);
    println!("NOT branch 1 OR top: {:?}", s.iter_selected().collect::<Vec<_>>());

    // A clean manager answers from cache.
    index.reset_query_count();
    let again = manager.selection(&index);
    assert_eq!(again.revision(), s.revision());
    println!("queries for a clean re-read: {}", index.query_count());
}
