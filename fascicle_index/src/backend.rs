// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for point indexing implementations.

use alloc::boxed::Box;

use crate::types::{Aabb3D, Sphere};
use core::fmt::Debug;

/// Static point-index abstraction used by [`SpatialIndex`](crate::SpatialIndex).
///
/// A backend is built once over a flat point array and answers range queries
/// with global point indices (positions in that array). It knows nothing about
/// fibers.
pub trait Backend: Debug {
    /// Build over a flat point array (3 floats per point).
    fn build(points: &[f32]) -> Self
    where
        Self: Sized;

    /// Number of indexed points.
    fn len(&self) -> usize;

    /// True if no points are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query points inside the box (bounds inclusive).
    fn query_box<'a>(&'a self, aabb: Aabb3D) -> Box<dyn Iterator<Item = usize> + 'a>;

    /// Query points inside or on the sphere.
    fn query_radius<'a>(&'a self, sphere: Sphere) -> Box<dyn Iterator<Item = usize> + 'a>;
}
