// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! ROI edits and the queue that carries them from interactive threads.
//!
//! Interactive code (a drag handler, a slider) posts [`RoiEdit`]s through a
//! cloneable [`RoiEditor`]. The manager drains the queue under its write lock,
//! either explicitly via
//! [`apply_pending_edits`](crate::SelectionManager::apply_pending_edits) or at the
//! start of the next selection query. Direct setters on the manager go through
//! the same [`RoiEdit::apply`] path, so both routes share one notion of "changed".

use std::sync::mpsc::Sender;

use fascicle_index::{Point3, Sphere};

use crate::types::{BoxFace, Roi, RoiFlags, RoiId, RoiShape};

/// A single change to one ROI.
#[derive(Clone, Debug, PartialEq)]
pub enum RoiEdit {
    /// Replace the ROI's shape.
    SetShape {
        /// Target ROI.
        roi: RoiId,
        /// New shape.
        shape: RoiShape,
    },
    /// Move a box or sphere ROI by `offset`. No effect on surfaces.
    Translate {
        /// Target ROI.
        roi: RoiId,
        /// Displacement.
        offset: Point3,
    },
    /// Drag one face of a box ROI along its axis. The box never inverts; the
    /// face stops at the opposite face.
    MoveFace {
        /// Target ROI.
        roi: RoiId,
        /// Face to move.
        face: BoxFace,
        /// Signed displacement along the face's axis.
        delta: f32,
    },
    /// Resize a sphere ROI. Negative radii clamp to zero.
    SetRadius {
        /// Target ROI.
        roi: RoiId,
        /// New radius.
        radius: f32,
    },
    /// Change a surface ROI threshold. Clamped to the field maximum.
    SetThreshold {
        /// Target ROI.
        roi: RoiId,
        /// New threshold.
        threshold: f32,
    },
    /// Toggle [`RoiFlags::ACTIVE`].
    SetActive {
        /// Target ROI.
        roi: RoiId,
        /// Whether the ROI takes part in selection.
        active: bool,
    },
    /// Toggle [`RoiFlags::NEGATE`].
    SetNegate {
        /// Target ROI.
        roi: RoiId,
        /// Whether the ROI result is inverted.
        negate: bool,
    },
}

impl RoiEdit {
    /// The ROI this edit targets.
    pub fn roi(&self) -> RoiId {
        match self {
            Self::SetShape { roi, .. }
            | Self::Translate { roi, .. }
            | Self::MoveFace { roi, .. }
            | Self::SetRadius { roi, .. }
            | Self::SetThreshold { roi, .. }
            | Self::SetActive { roi, .. }
            | Self::SetNegate { roi, .. } => *roi,
        }
    }

    /// Apply this edit to `target`. Returns whether anything changed.
    ///
    /// Edits that do not fit the ROI's shape (a radius for a box, say) are
    /// ignored and report no change.
    pub fn apply(self, target: &mut Roi) -> bool {
        match self {
            Self::SetShape { shape, .. } => {
                if target.shape == shape {
                    return false;
                }
                target.shape = shape;
                true
            }
            Self::Translate { offset, .. } => {
                if offset == [0.0; 3] {
                    return false;
                }
                match &mut target.shape {
                    RoiShape::Box(aabb) => {
                        *aabb = aabb.translate(offset);
                        true
                    }
                    RoiShape::Sphere(sphere) => {
                        *sphere = Sphere::new(
                            [
                                sphere.center[0] + offset[0],
                                sphere.center[1] + offset[1],
                                sphere.center[2] + offset[2],
                            ],
                            sphere.radius,
                        );
                        true
                    }
                    RoiShape::Surface(_) => false,
                }
            }
            Self::MoveFace { face, delta, .. } => {
                let RoiShape::Box(aabb) = &mut target.shape else {
                    return false;
                };
                let axis = face.axis().index();
                let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
                let moved = if face.is_max() {
                    let v = (hi + delta).max(lo);
                    aabb.max[axis] = v;
                    v
                } else {
                    let v = (lo + delta).min(hi);
                    aabb.min[axis] = v;
                    v
                };
                let before = if face.is_max() { hi } else { lo };
                moved.to_bits() != before.to_bits()
            }
            Self::SetRadius { radius, .. } => {
                let RoiShape::Sphere(sphere) = &mut target.shape else {
                    return false;
                };
                let radius = radius.max(0.0);
                if radius.to_bits() == sphere.radius.to_bits() {
                    return false;
                }
                sphere.radius = radius;
                true
            }
            Self::SetThreshold { threshold, .. } => {
                let RoiShape::Surface(surface) = &mut target.shape else {
                    return false;
                };
                surface.set_threshold(threshold)
            }
            Self::SetActive { active, .. } => set_flag(&mut target.flags, RoiFlags::ACTIVE, active),
            Self::SetNegate { negate, .. } => set_flag(&mut target.flags, RoiFlags::NEGATE, negate),
        }
    }
}

fn set_flag(flags: &mut RoiFlags, flag: RoiFlags, on: bool) -> bool {
    if flags.contains(flag) == on {
        return false;
    }
    flags.set(flag, on);
    true
}

/// A cloneable, `Send` handle for posting ROI edits to a manager.
///
/// Obtained from [`SelectionManager::editor`](crate::SelectionManager::editor).
/// Posting never blocks and never touches the manager's locks.
#[derive(Clone, Debug)]
pub struct RoiEditor {
    tx: Sender<RoiEdit>,
}

impl RoiEditor {
    pub(crate) fn new(tx: Sender<RoiEdit>) -> Self {
        Self { tx }
    }

    /// Queue `edit`. Returns `false` if the manager has been dropped.
    pub fn post(&self, edit: RoiEdit) -> bool {
        self.tx.send(edit).is_ok()
    }

    /// Queue a translation of `roi`.
    pub fn translate(&self, roi: RoiId, offset: Point3) -> bool {
        self.post(RoiEdit::Translate { roi, offset })
    }

    /// Queue a face drag on box `roi`.
    pub fn move_face(&self, roi: RoiId, face: BoxFace, delta: f32) -> bool {
        self.post(RoiEdit::MoveFace { roi, face, delta })
    }

    /// Queue a shape replacement for `roi`.
    pub fn set_shape(&self, roi: RoiId, shape: RoiShape) -> bool {
        self.post(RoiEdit::SetShape { roi, shape })
    }

    /// Queue a radius change for sphere `roi`.
    pub fn set_radius(&self, roi: RoiId, radius: f32) -> bool {
        self.post(RoiEdit::SetRadius { roi, radius })
    }

    /// Queue a threshold change for surface `roi`.
    pub fn set_threshold(&self, roi: RoiId, threshold: f32) -> bool {
        self.post(RoiEdit::SetThreshold { roi, threshold })
    }
}
