// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scalar fields and thresholded surface ROIs.

use std::fmt::Debug;
use std::sync::Arc;

/// Epsilon a sample must clear above the threshold for its point to count.
pub const SURFACE_EPSILON: f32 = 0.1;

/// A per-point scalar field over the fiber dataset.
///
/// `sample` takes a global point index, in the same numbering the spatial index
/// uses. Fields are shared between threads, so implementations must be
/// `Send + Sync`.
pub trait ScalarField: Send + Sync {
    /// Value at global point index `point`.
    fn sample(&self, point: usize) -> f32;

    /// Largest value the field can take. Thresholds are clamped to it.
    fn max_value(&self) -> f32;
}

/// A scalar field stored as one value per point.
///
/// Points past the end of the stored values sample as `f32::NEG_INFINITY` and
/// never clear a threshold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampledField {
    values: Vec<f32>,
    max: f32,
}

impl SampledField {
    /// Wrap per-point values.
    pub fn new(values: Vec<f32>) -> Self {
        let max = values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f32::NEG_INFINITY, f32::max);
        Self { values, max }
    }

    /// The stored values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl ScalarField for SampledField {
    fn sample(&self, point: usize) -> f32 {
        self.values.get(point).copied().unwrap_or(f32::NEG_INFINITY)
    }

    fn max_value(&self) -> f32 {
        self.max
    }
}

/// Selects fibers with at least one point whose sample exceeds `threshold + epsilon`.
#[derive(Clone)]
pub struct SurfaceRoi {
    field: Arc<dyn ScalarField>,
    threshold: f32,
    epsilon: f32,
}

impl Debug for SurfaceRoi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceRoi")
            .field("threshold", &self.threshold)
            .field("epsilon", &self.epsilon)
            .field("max_value", &self.field.max_value())
            .finish_non_exhaustive()
    }
}

impl SurfaceRoi {
    /// Threshold `field` at `threshold`, clamped to the field maximum.
    pub fn new(field: Arc<dyn ScalarField>, threshold: f32) -> Self {
        let mut surface = Self {
            field,
            threshold: 0.0,
            epsilon: SURFACE_EPSILON,
        };
        surface.set_threshold(threshold);
        surface
    }

    /// Replace the epsilon used in the comparison.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Current threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Comparison epsilon.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// The sampled field.
    pub fn field(&self) -> &Arc<dyn ScalarField> {
        &self.field
    }

    /// Set the threshold, clamped to the field maximum. Returns whether it changed.
    pub fn set_threshold(&mut self, threshold: f32) -> bool {
        let max = self.field.max_value();
        let clamped = if threshold > max { max } else { threshold };
        if clamped.to_bits() == self.threshold.to_bits() {
            return false;
        }
        self.threshold = clamped;
        true
    }

    /// Whether the point at `point` clears the threshold.
    pub fn passes(&self, point: usize) -> bool {
        self.field.sample(point) - self.threshold > self.epsilon
    }

    /// Same field, threshold, and epsilon.
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.field, &other.field)
            && self.threshold.to_bits() == other.threshold.to_bits()
            && self.epsilon.to_bits() == other.epsilon.to_bits()
    }
}
