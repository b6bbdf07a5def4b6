// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `SpatialIndex` API: point queries resolved to owning fibers.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::backend::Backend;
use crate::backends::kdtree::KdTree;
use crate::dataset::FiberDataset;
use crate::mask::FiberMask;
use crate::types::{Aabb3D, Point3, Sphere};

/// Per-point scalar values sampled by threshold queries.
///
/// `sample` is called with global point indices of the indexed dataset.
pub trait PointSampler {
    /// The scalar value at global point index `point`.
    fn sample(&self, point: usize) -> f32;
}

impl<F: Fn(usize) -> f32> PointSampler for F {
    fn sample(&self, point: usize) -> f32 {
        self(point)
    }
}

static NEXT_INDEX_ID: AtomicU64 = AtomicU64::new(1);

/// A static spatial index over the points of a fiber dataset.
///
/// Queries follow the "any point inside" rule: a fiber is reported when at
/// least one of its points lies inside the query volume.
pub struct SpatialIndex<B: Backend = KdTree> {
    id: u64,
    backend: B,
    point_fiber: Vec<u32>,
    fiber_count: usize,
    queries: AtomicU64,
}

impl<B: Backend> Debug for SpatialIndex<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("id", &self.id)
            .field("backend", &self.backend)
            .field("fibers", &self.fiber_count)
            .field("queries", &self.query_count())
            .finish_non_exhaustive()
    }
}

impl SpatialIndex<KdTree> {
    /// Build a KD-tree index over all points of `dataset`.
    pub fn new<D: FiberDataset + ?Sized>(dataset: &D) -> Self {
        Self::with_backend(dataset)
    }
}

impl<B: Backend> SpatialIndex<B> {
    /// Build an index over all points of `dataset` using backend `B`.
    pub fn with_backend<D: FiberDataset + ?Sized>(dataset: &D) -> Self {
        let points = dataset.points();
        let n = dataset.point_count().min(points.len() / 3);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Fiber indices are stored as 32-bit values by design."
        )]
        let point_fiber = (0..n).map(|i| dataset.fiber_of(i) as u32).collect();
        Self {
            id: NEXT_INDEX_ID.fetch_add(1, Ordering::Relaxed),
            backend: B::build(&points[..n * 3]),
            point_fiber,
            fiber_count: dataset.fiber_count(),
            queries: AtomicU64::new(0),
        }
    }

    /// Identity of this index, unique within the process.
    ///
    /// Results cached against one index are never valid for another, even when
    /// both cover the same number of fibers.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of fibers in the indexed dataset.
    pub fn fiber_count(&self) -> usize {
        self.fiber_count
    }

    /// Number of indexed points.
    pub fn point_count(&self) -> usize {
        self.point_fiber.len()
    }

    /// True if the index holds no points; every query then comes back empty.
    pub fn is_empty(&self) -> bool {
        self.point_fiber.is_empty()
    }

    /// Fiber owning the point at global index `point`.
    pub fn fiber_of(&self, point: usize) -> usize {
        self.point_fiber[point] as usize
    }

    /// Access the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of spatial queries answered since construction or the last reset.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Reset the query counter to zero.
    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::Relaxed);
    }

    /// Fibers with at least one point inside the box `[min, max]`, bounds inclusive.
    ///
    /// Returns sorted, deduplicated fiber indices.
    pub fn query_box(&self, min: Point3, max: Point3) -> Vec<usize> {
        self.box_mask(Aabb3D::new(min, max)).iter_ones().collect()
    }

    /// Fibers with at least one point within `radius` of `center`.
    ///
    /// Returns sorted, deduplicated fiber indices.
    pub fn query_radius(&self, center: Point3, radius: f32) -> Vec<usize> {
        self.radius_mask(Sphere::new(center, radius))
            .iter_ones()
            .collect()
    }

    /// [`query_box`](Self::query_box) as a per-fiber mask.
    pub fn box_mask(&self, aabb: Aabb3D) -> FiberMask {
        self.bump();
        self.collect_fibers(self.backend.query_box(aabb))
    }

    /// [`query_radius`](Self::query_radius) as a per-fiber mask.
    pub fn radius_mask(&self, sphere: Sphere) -> FiberMask {
        self.bump();
        self.collect_fibers(self.backend.query_radius(sphere))
    }

    /// Fibers with at least one point whose sampled value exceeds `threshold` by more than `epsilon`.
    ///
    /// This walks every point; there is no spatial pruning for scalar predicates.
    pub fn threshold_mask<S: PointSampler + ?Sized>(
        &self,
        sampler: &S,
        threshold: f32,
        epsilon: f32,
    ) -> FiberMask {
        self.bump();
        let mut mask = FiberMask::none(self.fiber_count);
        for (point, &fiber) in self.point_fiber.iter().enumerate() {
            let fiber = fiber as usize;
            if !mask.get(fiber) && sampler.sample(point) - threshold > epsilon {
                mask.insert(fiber);
            }
        }
        mask
    }

    fn bump(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    fn collect_fibers(&self, points: impl Iterator<Item = usize>) -> FiberMask {
        let mut mask = FiberMask::none(self.fiber_count);
        for p in points {
            mask.insert(self.point_fiber[p] as usize);
        }
        mask
    }
}
