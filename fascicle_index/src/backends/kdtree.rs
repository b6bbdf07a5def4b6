// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Balanced KD-tree over 3D points, packed into a single array.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb3D, Axis, Point3, Sphere, lt};

#[derive(Copy, Clone, Debug)]
struct Entry {
    point: Point3,
    id: u32,
}

/// A static KD-tree splitting at the median, axes cycling x → y → z.
///
/// Every tree node holds exactly one point. The tree is implicit in the entry
/// order, see the [module docs](crate::backends) for the layout.
#[derive(Clone, Default)]
pub struct KdTree {
    entries: Vec<Entry>,
}

impl Debug for KdTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdTree")
            .field("points", &self.entries.len())
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl KdTree {
    /// Number of levels in the tree (0 when empty).
    pub fn depth(&self) -> usize {
        (usize::BITS - self.entries.len().leading_zeros()) as usize
    }

    fn order_on(a: &Entry, b: &Entry, axis: usize) -> Ordering {
        a.point[axis]
            .total_cmp(&b.point[axis])
            .then(a.id.cmp(&b.id))
    }

    fn partition(slice: &mut [Entry], depth: usize) {
        if slice.len() <= 1 {
            return;
        }
        let axis = Axis::cycle(depth).index();
        let mid = slice.len() / 2;
        slice.select_nth_unstable_by(mid, |a, b| Self::order_on(a, b, axis));
        let (left, rest) = slice.split_at_mut(mid);
        Self::partition(left, depth + 1);
        Self::partition(&mut rest[1..], depth + 1);
    }

    fn search_box(&self, lo: usize, hi: usize, depth: usize, aabb: &Aabb3D, out: &mut Vec<usize>) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let entry = &self.entries[mid];
        let axis = Axis::cycle(depth).index();
        let v = entry.point[axis];
        let below = lt(v, aabb.min[axis]);
        let above = lt(aabb.max[axis], v);
        if !below {
            self.search_box(lo, mid, depth + 1, aabb, out);
        }
        if !below && !above && aabb.contains_point(entry.point) {
            out.push(entry.id as usize);
        }
        if !above {
            self.search_box(mid + 1, hi, depth + 1, aabb, out);
        }
    }

    fn search_radius(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        sphere: &Sphere,
        out: &mut Vec<usize>,
    ) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let entry = &self.entries[mid];
        let axis = Axis::cycle(depth).index();
        let d = entry.point[axis] - sphere.center[axis];
        // Squared per-axis distance bounds the distance to every point on the far side.
        let far = d * d > sphere.radius * sphere.radius;
        let below = far && d < 0.0;
        let above = far && d > 0.0;
        if !below {
            self.search_radius(lo, mid, depth + 1, sphere, out);
        }
        if !far && sphere.contains_point(entry.point) {
            out.push(entry.id as usize);
        }
        if !above {
            self.search_radius(mid + 1, hi, depth + 1, sphere, out);
        }
    }
}

impl Backend for KdTree {
    fn build(points: &[f32]) -> Self {
        let mut entries: Vec<Entry> = points
            .chunks_exact(3)
            .enumerate()
            .map(|(i, c)| {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Point indices are stored as 32-bit values by design."
                )]
                let id = i as u32;
                Entry {
                    point: [c[0], c[1], c[2]],
                    id,
                }
            })
            .collect();
        Self::partition(&mut entries, 0);
        Self { entries }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn query_box<'a>(&'a self, aabb: Aabb3D) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        if !aabb.is_empty() {
            self.search_box(0, self.entries.len(), 0, &aabb, &mut out);
        }
        Box::new(out.into_iter())
    }

    fn query_radius<'a>(&'a self, sphere: Sphere) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        if sphere.radius >= 0.0 {
            self.search_radius(0, self.entries.len(), 0, &sphere, &mut out);
        }
        Box::new(out.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::flatvec::FlatVec;
    use alloc::vec;

    fn sorted(it: impl Iterator<Item = usize>) -> Vec<usize> {
        let mut v: Vec<usize> = it.collect();
        v.sort_unstable();
        v
    }

    // Deterministic pseudo-random cloud with plenty of repeated coordinates.
    fn cloud(n: usize) -> Vec<f32> {
        let mut s: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut out = Vec::with_capacity(n * 3);
        for _ in 0..n * 3 {
            s ^= s << 13;
            s ^= s >> 7;
            s ^= s << 17;
            out.push((s % 41) as f32 * 0.5 - 10.0);
        }
        out
    }

    #[test]
    fn empty_tree_answers_nothing() {
        let t = KdTree::build(&[]);
        assert!(t.is_empty());
        assert_eq!(t.depth(), 0);
        assert_eq!(t.query_box(Aabb3D::new([-1e9; 3], [1e9; 3])).count(), 0);
        assert_eq!(t.query_radius(Sphere::new([0.0; 3], 1e9)).count(), 0);
    }

    #[test]
    fn median_layout_is_balanced() {
        let t = KdTree::build(&cloud(1000));
        assert_eq!(t.len(), 1000);
        assert_eq!(t.depth(), 10);
    }

    #[test]
    fn box_queries_match_linear_scan() {
        let pts = cloud(2000);
        let kd = KdTree::build(&pts);
        let flat = FlatVec::build(&pts);
        let boxes = [
            Aabb3D::new([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]),
            Aabb3D::new([0.0, -10.0, 2.5], [0.0, 10.0, 2.5]),
            Aabb3D::new([-10.0; 3], [10.0; 3]),
            Aabb3D::new([3.0, 3.0, 3.0], [2.0, 4.0, 4.0]),
            Aabb3D::new([-4.5, 0.5, -7.0], [6.0, 1.5, 9.5]),
        ];
        for b in boxes {
            assert_eq!(sorted(kd.query_box(b)), sorted(flat.query_box(b)), "box {b:?}");
        }
    }

    #[test]
    fn radius_queries_match_linear_scan() {
        let pts = cloud(2000);
        let kd = KdTree::build(&pts);
        let flat = FlatVec::build(&pts);
        for (c, r) in [
            ([0.0, 0.0, 0.0], 3.0),
            ([5.0, -5.0, 2.5], 0.5),
            ([9.5, 9.5, 9.5], 0.0),
            ([0.0, 0.0, 0.0], 100.0),
            ([1.0, 1.0, 1.0], -1.0),
        ] {
            let s = Sphere::new(c, r);
            assert_eq!(sorted(kd.query_radius(s)), sorted(flat.query_radius(s)), "sphere {s:?}");
        }
    }

    #[test]
    fn duplicate_points_are_all_found() {
        let pts = vec![1.0_f32; 3 * 17];
        let kd = KdTree::build(&pts);
        let hits = sorted(kd.query_box(Aabb3D::new([1.0; 3], [1.0; 3])));
        assert_eq!(hits, (0..17).collect::<Vec<_>>());
    }

    #[test]
    fn build_is_deterministic() {
        let pts = cloud(500);
        let a = KdTree::build(&pts);
        let b = KdTree::build(&pts);
        let ids_a: Vec<u32> = a.entries.iter().map(|e| e.id).collect();
        let ids_b: Vec<u32> = b.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
