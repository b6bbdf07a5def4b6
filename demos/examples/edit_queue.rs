// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dragging a box from another thread.
//!
//! An interaction thread posts face drags through a `RoiEditor`; the reader
//! picks them up at the start of each query. Observers report structural
//! changes.
//!
//! Run:
//! - `cargo run -p fascicle_demos --example edit_queue`

use std::sync::mpsc;
use std::thread;

use fascicle_index::{Fibers, SpatialIndex};
use fascicle_select::{BoxFace, Roi, SelectionEvent, SelectionManager};

fn main() {
    // A 32 x 32 grid of fibers along z.
    let fibers = Fibers::from_polylines((0..1024).map(|i| {
        let (x, y) = ((i % 32) as f32, (i / 32) as f32);
        (0..16).map(|z| [x, y, z as f32]).collect::<Vec<_>>()
    }));
    let index = SpatialIndex::new(&fibers);
    let manager = SelectionManager::new();

    manager.on_add(|e| println!("observer: {e:?}"));
    manager.on_branch_remove(|e| {
        if let SelectionEvent::BranchRemoved { branch } = e {
            println!("observer: branch {branch:?} gone");
        }
    });

    let roi = manager
        .add_roi(Roi::aabb([0.0, 0.0, 0.0], [1.0, 31.0, 15.0]), None)
        .unwrap();
    println!("start: {} fibers", manager.selection(&index).selected_count());

    let editor = manager.editor();
    let (frame_tx, frame_rx) = mpsc::channel::<()>();
    thread::scope(|s| {
        s.spawn(move || {
            for _ in 0..8 {
                editor.move_face(roi, BoxFace::MaxX, 2.0);
                let _ = frame_tx.send(());
            }
        });
        for _ in frame_rx {
            let sel = manager.selection(&index);
            println!(
                "revision {:>2}: {:>4} fibers selected",
                sel.revision(),
                sel.selected_count()
            );
        }
    });

    let last = manager.selection(&index);
    assert_eq!(last.selected_count(), 18 * 32);
    println!("final ROI: {:?}", manager.roi(roi).map(|r| r.roi.shape));

    manager.remove_roi(roi).unwrap();
    assert!(manager.is_nothing_filtered());
}
