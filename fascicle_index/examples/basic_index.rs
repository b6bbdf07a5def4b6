// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Fascicle Index: build over a few fibers, then query by box and radius.

use fascicle_index::{Aabb3D, Fibers, SpatialIndex};

fn main() {
    let fibers = Fibers::from_polylines([
        vec![[0.0, 0.0, 0.0], [0.5, 0.5, 0.5], [1.0, 1.0, 1.0]],
        vec![[3.0, 3.0, 3.0], [0.9, 0.0, 0.0], [3.0, 0.0, 0.0]],
        vec![[5.0, 0.0, 0.0], [6.0, 0.0, 0.0]],
    ]);
    let index = SpatialIndex::new(&fibers);
    println!("index: {:?}", index);

    // Box query
    let hits = index.query_box([-1.0; 3], [1.0; 3]);
    println!("fibers in unit box: {:?}", hits);

    // Sphere query
    let hits = index.query_radius([5.5, 0.0, 0.0], 0.5);
    println!("fibers near (5.5, 0, 0): {:?}", hits);

    // Masks are what the selection layer combines.
    let mask = index.box_mask(Aabb3D::new([0.0; 3], [4.0; 3]));
    println!("mask: {:?} ({} selected)", mask.to_bools(), mask.count_ones());
    println!("queries answered: {}", index.query_count());
}
