// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat point array with linear scans. Small and simple; the oracle for the KD-tree.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb3D, Point3, Sphere};

/// Flat point array backend with linear scans.
#[derive(Clone, Default)]
pub struct FlatVec {
    points: Vec<Point3>,
}

impl Debug for FlatVec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlatVec")
            .field("points", &self.points.len())
            .finish_non_exhaustive()
    }
}

impl Backend for FlatVec {
    fn build(points: &[f32]) -> Self {
        Self {
            points: points
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        }
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn query_box<'a>(&'a self, aabb: Aabb3D) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        for (i, p) in self.points.iter().enumerate() {
            if aabb.contains_point(*p) {
                out.push(i);
            }
        }
        Box::new(out.into_iter())
    }

    fn query_radius<'a>(&'a self, sphere: Sphere) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        for (i, p) in self.points.iter().enumerate() {
            if sphere.contains_point(*p) {
                out.push(i);
            }
        }
        Box::new(out.into_iter())
    }
}
