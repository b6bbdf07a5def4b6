// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for fiber dataset construction.

use thiserror::Error;

/// Errors that can occur when assembling a [`Fibers`](crate::Fibers) dataset.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FibersError {
    /// The flat vertex array does not hold whole `[x, y, z]` triples.
    #[error("vertex array length {0} is not a multiple of 3")]
    VerticesNotTriples(usize),

    /// Start and length tables disagree on the number of fibers.
    #[error("{starts} fiber start indices but {lengths} fiber lengths")]
    LengthMismatch {
        /// Number of start indices.
        starts: usize,
        /// Number of lengths.
        lengths: usize,
    },

    /// A fiber does not begin where the previous one ended.
    #[error("fiber {fiber} starts at point {start}, expected {expected}")]
    NonContiguous {
        /// Offending fiber.
        fiber: usize,
        /// Its declared start.
        start: usize,
        /// The point index where it had to start.
        expected: usize,
    },

    /// A fiber extends past the end of the vertex array.
    #[error("fiber {fiber} ends at point {end}, but there are only {points} points")]
    OutOfBounds {
        /// Offending fiber.
        fiber: usize,
        /// One past its last point.
        end: usize,
        /// Number of points in the vertex array.
        points: usize,
    },

    /// Points at the end of the vertex array belong to no fiber.
    #[error("{0} trailing points are not owned by any fiber")]
    TrailingPoints(usize),
}

/// Result type for dataset construction.
pub type Result<T> = core::result::Result<T, FibersError>;
