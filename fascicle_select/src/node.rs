// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single ROI and its cached per-fiber result.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use fascicle_index::{Backend, FiberMask, SpatialIndex};

use crate::sync::{get_mut, lock};
use crate::types::{Roi, RoiFlags, RoiId, RoiShape};

/// A cached bit vector guarded by a dirty flag.
///
/// The cache is also considered stale when queried against a different index
/// than the one it was computed from.
#[derive(Debug)]
pub(crate) struct MaskCache {
    dirty: bool,
    source: Option<u64>,
    bits: Arc<FiberMask>,
}

impl MaskCache {
    pub(crate) fn new() -> Self {
        Self {
            dirty: true,
            source: None,
            bits: Arc::new(FiberMask::default()),
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// The cached bits, recomputing them with `compute` if stale.
    ///
    /// `index_id` identifies the [`SpatialIndex`] the bits are computed from.
    pub(crate) fn get_or_update(
        &mut self,
        index_id: u64,
        compute: impl FnOnce() -> FiberMask,
    ) -> Arc<FiberMask> {
        if self.dirty || self.source != Some(index_id) {
            self.bits = Arc::new(compute());
            self.source = Some(index_id);
            self.dirty = false;
        }
        Arc::clone(&self.bits)
    }
}

/// One ROI inside a branch: a shape, its flags, and a cached test result.
///
/// The cached bits already include negation. Inactive nodes always report every
/// fiber as selected, whether or not they are negated.
pub struct SelectionNode {
    id: RoiId,
    roi: Roi,
    cache: Mutex<MaskCache>,
}

impl Debug for SelectionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionNode")
            .field("id", &self.id)
            .field("roi", &self.roi)
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

impl SelectionNode {
    pub(crate) fn new(id: RoiId, roi: Roi) -> Self {
        Self {
            id,
            roi,
            cache: Mutex::new(MaskCache::new()),
        }
    }

    /// Handle of this ROI.
    pub fn id(&self) -> RoiId {
        self.id
    }

    /// The ROI description.
    pub fn roi(&self) -> &Roi {
        &self.roi
    }

    /// The ROI shape.
    pub fn shape(&self) -> &RoiShape {
        &self.roi.shape
    }

    /// The ROI flags.
    pub fn flags(&self) -> RoiFlags {
        self.roi.flags
    }

    /// Whether the cached bits are stale.
    pub fn is_dirty(&self) -> bool {
        lock(&self.cache).is_dirty()
    }

    /// Run the geometric test against `index`, bypassing the cache.
    ///
    /// Always issues exactly one index query for an active node and none for an
    /// inactive one.
    pub fn test<B: Backend>(&self, index: &SpatialIndex<B>) -> FiberMask {
        let n = index.fiber_count();
        if !self.roi.is_active() {
            return FiberMask::all(n);
        }
        let mut bits = match &self.roi.shape {
            RoiShape::Box(aabb) => index.box_mask(*aabb),
            RoiShape::Sphere(sphere) => index.radius_mask(*sphere),
            RoiShape::Surface(surface) => index.threshold_mask(
                &|p: usize| surface.field().sample(p),
                surface.threshold(),
                surface.epsilon(),
            ),
        };
        if self.roi.is_negated() {
            bits.invert();
        }
        bits
    }

    /// The node's bits, recomputed only if dirty.
    pub fn bits<B: Backend>(&self, index: &SpatialIndex<B>) -> Arc<FiberMask> {
        lock(&self.cache).get_or_update(index.id(), || {
            tracing::trace!(roi = ?self.id, "recomputing ROI bits");
            self.test(index)
        })
    }

    pub(crate) fn mark_dirty(&mut self) {
        get_mut(&mut self.cache).mark_dirty();
    }

    /// Modify the ROI through `f`; marks the node dirty if `f` reports a change.
    pub(crate) fn edit(&mut self, f: impl FnOnce(&mut Roi) -> bool) -> bool {
        let changed = f(&mut self.roi);
        if changed {
            self.mark_dirty();
        }
        changed
    }
}
