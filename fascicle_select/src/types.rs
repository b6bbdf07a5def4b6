// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types: handles, flags, colours, and ROI descriptions.

use fascicle_index::{Aabb3D, Axis, Point3, Sphere};

use crate::field::SurfaceRoi;

/// Identifier for a ROI (a [`SelectionNode`](crate::SelectionNode)) in a manager.
///
/// A small, copyable handle made of the issuing manager's tag and a serial
/// number. Serials are never reused, so a handle to a removed ROI stays stale
/// forever and never aliases a newer ROI.
///
/// ### Foreign and stale handles
///
/// - A handle issued by a *different* manager is foreign. Removing through a
///   foreign handle is a programming error.
/// - A handle whose ROI has been removed is stale. Operations on stale handles
///   are ignored.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RoiId(pub(crate) u32, pub(crate) u64);

/// Identifier for a [`Branch`](crate::Branch) in a manager.
///
/// Same semantics as [`RoiId`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BranchId(pub(crate) u32, pub(crate) u64);

impl RoiId {
    pub(crate) const fn owner(self) -> u32 {
        self.0
    }
}

impl BranchId {
    pub(crate) const fn owner(self) -> u32 {
        self.0
    }
}

bitflags::bitflags! {
    /// Per-ROI state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RoiFlags: u8 {
        /// ROI takes part in selection. Inactive ROIs impose no constraint.
        const ACTIVE = 0b0000_0001;
        /// ROI result is inverted (logical NOT) before it is combined.
        const NEGATE = 0b0000_0010;
    }
}

impl Default for RoiFlags {
    fn default() -> Self {
        Self::ACTIVE
    }
}

/// An RGBA colour with components in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque red.
    pub const RED: Self = Self::rgba(1.0, 0.0, 0.0, 1.0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgba(0.0, 1.0, 0.0, 1.0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgba(0.0, 0.0, 1.0, 1.0);

    /// Create a colour from its components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One face of a box ROI, used by face-drag edits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoxFace {
    /// Face at the minimum x.
    MinX,
    /// Face at the maximum x.
    MaxX,
    /// Face at the minimum y.
    MinY,
    /// Face at the maximum y.
    MaxY,
    /// Face at the minimum z.
    MinZ,
    /// Face at the maximum z.
    MaxZ,
}

impl BoxFace {
    /// The axis this face is perpendicular to.
    pub const fn axis(self) -> Axis {
        match self {
            Self::MinX | Self::MaxX => Axis::X,
            Self::MinY | Self::MaxY => Axis::Y,
            Self::MinZ | Self::MaxZ => Axis::Z,
        }
    }

    /// True for the faces on the maximum side.
    pub const fn is_max(self) -> bool {
        matches!(self, Self::MaxX | Self::MaxY | Self::MaxZ)
    }
}

/// The geometric predicate of a ROI.
#[derive(Clone, Debug)]
pub enum RoiShape {
    /// Axis-aligned box; selects fibers with a point inside (bounds inclusive).
    Box(Aabb3D),
    /// Sphere; selects fibers with a point inside or on the surface.
    Sphere(Sphere),
    /// Thresholded scalar field; selects fibers with a point sampling above the threshold.
    Surface(SurfaceRoi),
}

impl PartialEq for RoiShape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Box(a), Self::Box(b)) => a == b,
            (Self::Sphere(a), Self::Sphere(b)) => a == b,
            (Self::Surface(a), Self::Surface(b)) => a.same_as(b),
            _ => false,
        }
    }
}

/// Description of a ROI to add to a manager.
#[derive(Clone, Debug, PartialEq)]
pub struct Roi {
    /// Geometric predicate.
    pub shape: RoiShape,
    /// Activity and negation.
    pub flags: RoiFlags,
}

impl Roi {
    /// An active, non-negated ROI with the given shape.
    pub fn new(shape: RoiShape) -> Self {
        Self {
            shape,
            flags: RoiFlags::default(),
        }
    }

    /// A box ROI spanning two opposite corners.
    pub fn aabb(a: Point3, b: Point3) -> Self {
        Self::new(RoiShape::Box(Aabb3D::from_corners(a, b)))
    }

    /// A sphere ROI.
    pub fn sphere(center: Point3, radius: f32) -> Self {
        Self::new(RoiShape::Sphere(Sphere::new(center, radius)))
    }

    /// A thresholded scalar-field ROI.
    pub fn surface(surface: SurfaceRoi) -> Self {
        Self::new(RoiShape::Surface(surface))
    }

    /// This ROI with [`RoiFlags::NEGATE`] set.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.flags.insert(RoiFlags::NEGATE);
        self
    }

    /// This ROI with [`RoiFlags::ACTIVE`] cleared.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.flags.remove(RoiFlags::ACTIVE);
        self
    }

    /// Whether the ROI takes part in selection.
    pub fn is_active(&self) -> bool {
        self.flags.contains(RoiFlags::ACTIVE)
    }

    /// Whether the ROI result is inverted.
    pub fn is_negated(&self) -> bool {
        self.flags.contains(RoiFlags::NEGATE)
    }
}
