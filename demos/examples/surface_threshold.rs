// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thresholding a scalar field.
//!
//! A per-point "anisotropy" value selects fibers that pass through a hot spot.
//! Sliding the threshold re-tests only the surface ROI.
//!
//! Run:
//! - `cargo run -p fascicle_demos --example surface_threshold`

use std::sync::Arc;

use fascicle_index::{FiberDataset, Fibers, SpatialIndex, distance_squared};
use fascicle_select::{Roi, SampledField, ScalarField, SelectionManager, SurfaceRoi};

fn main() {
    let fibers = Fibers::from_polylines((0..50).map(|i| {
        let y = i as f32 * 0.4;
        (0..40).map(|x| [x as f32 * 0.5, y, 0.0]).collect::<Vec<_>>()
    }));
    // Field peaks at (10, 10, 0) and falls off with distance.
    let values = (0..fibers.point_count())
        .map(|p| {
            let d2 = distance_squared(fibers.point(p), [10.0, 10.0, 0.0]);
            1.0 / (1.0 + d2 * 0.05)
        })
        .collect();
    let field: Arc<dyn ScalarField> = Arc::new(SampledField::new(values));
    println!("field max: {:.3}", field.max_value());

    let index = SpatialIndex::new(&fibers);
    let manager = SelectionManager::new();
    let roi = manager
        .add_roi(Roi::surface(SurfaceRoi::new(field, 0.2)), None)
        .unwrap();

    let mut previous = usize::MAX;
    for t in [0.2, 0.4, 0.6, 0.8] {
        manager.set_threshold(roi, t);
        let n = manager.selection(&index).selected_count();
        println!("threshold {t:.1}: {n} fibers");
        assert!(n <= previous, "higher thresholds select fewer fibers");
        previous = n;
    }

    // Thresholds above the field maximum are clamped.
    manager.set_threshold(roi, 5.0);
    if let Some(snapshot) = manager.roi(roi)
        && let fascicle_select::RoiShape::Surface(s) = &snapshot.roi.shape
    {
        println!("clamped threshold: {:.3}", s.threshold());
    }
}
