// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;

/// A point in 3D, `[x, y, z]`.
pub type Point3 = [f32; 3];

/// One of the three coordinate axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// All axes in splitting order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// The splitting axis at tree depth `depth` (x, y, z, x, ...).
    pub const fn cycle(depth: usize) -> Self {
        Self::ALL[depth % 3]
    }

    /// Component index of this axis in a [`Point3`].
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Axis-aligned bounding box in 3D.
///
/// Bounds are inclusive on every face: a point lying exactly on a face is inside.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3D {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3D {
    /// Create a new AABB from min/max corners. The corners are taken as given.
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an AABB spanning two opposite corners given in any order.
    pub fn from_corners(a: Point3, b: Point3) -> Self {
        let mut min = a;
        let mut max = b;
        for i in 0..3 {
            min[i] = min_t(a[i], b[i]);
            max[i] = max_t(a[i], b[i]);
        }
        Self { min, max }
    }

    /// Whether this AABB contains the point (inclusive). NaN coordinates are never contained.
    pub fn contains_point(&self, p: Point3) -> bool {
        (0..3).all(|i| le(self.min[i], p[i]) && le(p[i], self.max[i]))
    }

    /// Return true if the AABB is inverted on any axis (contains nothing).
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| lt(self.max[i], self.min[i]))
    }

    /// Smallest AABB containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = min_t(self.min[i], other.min[i]);
            out.max[i] = max_t(self.max[i], other.max[i]);
        }
        out
    }

    /// Center point of the box.
    pub fn center(&self) -> Point3 {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ]
    }

    /// The box moved by `offset`.
    pub fn translate(&self, offset: Point3) -> Self {
        Self {
            min: add(self.min, offset),
            max: add(self.max, offset),
        }
    }
}

/// A solid sphere, boundary inclusive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    /// Center of the sphere.
    pub center: Point3,
    /// Radius; negative radii contain nothing.
    pub radius: f32,
}

impl Sphere {
    /// Create a sphere.
    pub const fn new(center: Point3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether the point lies inside or on the sphere.
    pub fn contains_point(&self, p: Point3) -> bool {
        self.radius >= 0.0 && le(distance_squared(self.center, p), self.radius * self.radius)
    }

    /// Bounding box of the sphere.
    pub fn bounds(&self) -> Aabb3D {
        let r = self.radius.max(0.0);
        Aabb3D::new(
            [self.center[0] - r, self.center[1] - r, self.center[2] - r],
            [self.center[0] + r, self.center[1] + r, self.center[2] + r],
        )
    }
}

/// Squared Euclidean distance between two points.
#[inline]
pub fn distance_squared(a: Point3, b: Point3) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

#[inline]
pub(crate) fn add(a: Point3, b: Point3) -> Point3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o == Ordering::Less)
        .unwrap_or(false)
}
