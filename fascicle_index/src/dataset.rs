// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber datasets: the read-only polyline collection the index is built over.

use alloc::vec::Vec;
use core::ops::Range;

use crate::error::{FibersError, Result};
use crate::types::Point3;

/// Read-only view of a fiber (polyline) dataset.
///
/// Fibers are concatenated in order into one flat point array; every point is
/// owned by exactly one fiber.
pub trait FiberDataset {
    /// Total number of points over all fibers.
    fn point_count(&self) -> usize;

    /// Flat point array, 3 floats per point, fibers concatenated in order.
    fn points(&self) -> &[f32];

    /// Index of the fiber that owns the point at global index `point`.
    fn fiber_of(&self, point: usize) -> usize;

    /// Number of fibers.
    fn fiber_count(&self) -> usize;
}

/// A fiber dataset stored as a flat vertex array plus per-fiber start and length tables.
#[derive(Clone, Debug, Default)]
pub struct Fibers {
    vertices: Vec<f32>,
    starts: Vec<usize>,
    lengths: Vec<usize>,
    point_fiber: Vec<u32>,
}

impl Fibers {
    /// Assemble a dataset from a flat vertex array and per-fiber start/length tables.
    ///
    /// Fibers must be contiguous and in order, and together cover every point.
    pub fn new(vertices: Vec<f32>, starts: Vec<usize>, lengths: Vec<usize>) -> Result<Self> {
        if vertices.len() % 3 != 0 {
            return Err(FibersError::VerticesNotTriples(vertices.len()));
        }
        if starts.len() != lengths.len() {
            return Err(FibersError::LengthMismatch {
                starts: starts.len(),
                lengths: lengths.len(),
            });
        }
        let points = vertices.len() / 3;
        let mut point_fiber = Vec::with_capacity(points);
        let mut expected = 0;
        for (fiber, (&start, &len)) in starts.iter().zip(&lengths).enumerate() {
            if start != expected {
                return Err(FibersError::NonContiguous {
                    fiber,
                    start,
                    expected,
                });
            }
            let end = start + len;
            if end > points {
                return Err(FibersError::OutOfBounds { fiber, end, points });
            }
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Fiber indices are stored as 32-bit values by design."
            )]
            point_fiber.extend(core::iter::repeat_n(fiber as u32, len));
            expected = end;
        }
        if expected != points {
            return Err(FibersError::TrailingPoints(points - expected));
        }
        Ok(Self {
            vertices,
            starts,
            lengths,
            point_fiber,
        })
    }

    /// Build a dataset from a sequence of polylines.
    pub fn from_polylines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[Point3]>,
    {
        let mut out = Self::default();
        for line in lines {
            let line = line.as_ref();
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Fiber indices are stored as 32-bit values by design."
            )]
            let fiber = out.starts.len() as u32;
            out.starts.push(out.point_fiber.len());
            out.lengths.push(line.len());
            for p in line {
                out.vertices.extend_from_slice(p);
                out.point_fiber.push(fiber);
            }
        }
        out
    }

    /// Range of global point indices owned by `fiber`.
    pub fn fiber_range(&self, fiber: usize) -> Range<usize> {
        let start = self.starts[fiber];
        start..start + self.lengths[fiber]
    }

    /// Flat coordinates of the points of `fiber`.
    pub fn fiber_points(&self, fiber: usize) -> &[f32] {
        let r = self.fiber_range(fiber);
        &self.vertices[r.start * 3..r.end * 3]
    }

    /// The point at global index `i`.
    pub fn point(&self, i: usize) -> Point3 {
        [
            self.vertices[i * 3],
            self.vertices[i * 3 + 1],
            self.vertices[i * 3 + 2],
        ]
    }

    /// Per-fiber start indices.
    pub fn line_starts(&self) -> &[usize] {
        &self.starts
    }

    /// Per-fiber point counts.
    pub fn line_lengths(&self) -> &[usize] {
        &self.lengths
    }
}

impl FiberDataset for Fibers {
    fn point_count(&self) -> usize {
        self.point_fiber.len()
    }

    fn points(&self) -> &[f32] {
        &self.vertices
    }

    fn fiber_of(&self, point: usize) -> usize {
        self.point_fiber[point] as usize
    }

    fn fiber_count(&self) -> usize {
        self.starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn polylines_map_points_to_fibers() {
        let fibers = Fibers::from_polylines([
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            vec![],
            vec![[5.0, 5.0, 5.0]],
        ]);
        assert_eq!(fibers.fiber_count(), 3);
        assert_eq!(fibers.point_count(), 3);
        assert_eq!(fibers.fiber_of(0), 0);
        assert_eq!(fibers.fiber_of(1), 0);
        assert_eq!(fibers.fiber_of(2), 2);
        assert!(fibers.fiber_range(1).is_empty());
        assert_eq!(fibers.fiber_points(2), &[5.0, 5.0, 5.0]);
        assert_eq!(fibers.point(1), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn new_validates_layout() {
        let v = vec![0.0; 9];
        assert_eq!(
            Fibers::new(vec![0.0; 4], vec![0], vec![1]).unwrap_err(),
            FibersError::VerticesNotTriples(4)
        );
        assert_eq!(
            Fibers::new(v.clone(), vec![0, 1], vec![1]).unwrap_err(),
            FibersError::LengthMismatch {
                starts: 2,
                lengths: 1
            }
        );
        assert_eq!(
            Fibers::new(v.clone(), vec![0, 2], vec![1, 1]).unwrap_err(),
            FibersError::NonContiguous {
                fiber: 1,
                start: 2,
                expected: 1
            }
        );
        assert_eq!(
            Fibers::new(v.clone(), vec![0, 2], vec![2, 2]).unwrap_err(),
            FibersError::OutOfBounds {
                fiber: 1,
                end: 4,
                points: 3
            }
        );
        assert_eq!(
            Fibers::new(v.clone(), vec![0], vec![2]).unwrap_err(),
            FibersError::TrailingPoints(1)
        );
        let ok = Fibers::new(v, vec![0, 2], vec![2, 1]).unwrap();
        assert_eq!(ok.fiber_of(2), 1);
        assert_eq!(ok.line_starts(), &[0, 2]);
        assert_eq!(ok.line_lengths(), &[2, 1]);
    }
}
