// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=fascicle_select --heading-base-level=0

//! Fascicle Select: interactive ROI-based fiber selection.
//!
//! Fascicle Select decides which fibers of a tractogram are shown, given a set of
//! regions of interest (ROIs) arranged in branches.
//!
//! - A ROI ([`SelectionNode`]) is a box, a sphere, or a thresholded scalar field.
//!   It selects every fiber with at least one point inside.
//! - A [`Branch`] ANDs its ROIs together.
//! - The [`SelectionManager`] ORs all branches. With no branches, every fiber is shown.
//! - Any ROI or branch can be negated; any ROI can be deactivated.
//!
//! Spatial queries are answered by [`fascicle_index::SpatialIndex`]. Every level caches
//! its result as a [`FiberMask`](fascicle_index::FiberMask) and only recomputes when
//! something below it changed, so dragging one box re-queries exactly one ROI.
//!
//! ## API overview
//!
//! - [`SelectionManager`]: owns branches and observers; answers [`SelectionManager::selection`].
//! - [`Roi`], [`RoiShape`], [`RoiFlags`]: what to add.
//! - [`RoiId`], [`BranchId`]: opaque handles tagged with the issuing manager.
//! - [`RoiEdit`] / [`RoiEditor`]: geometry edits, applied directly or queued from other threads.
//! - [`SelectionEvent`]: structural notifications (ROI added or removed, branch removed).
//! - [`Selection`]: an immutable snapshot of bits and per-fiber colours.
//!
//! ### Minimal usage
//!
//! ```
//! use fascicle_index::{Fibers, SpatialIndex};
//! use fascicle_select::{Roi, SelectionManager};
//!
//! // Three fibers along x, at y = 0, 1, 2.
//! let fibers = Fibers::from_polylines((0..3).map(|y| {
//!     vec![[0.0, y as f32, 0.0], [5.0, y as f32, 0.0], [10.0, y as f32, 0.0]]
//! }));
//! let index = SpatialIndex::new(&fibers);
//! let manager = SelectionManager::new();
//!
//! // Fibers passing through the box, but not through the sphere.
//! let gate = manager.add_roi(Roi::aabb([4.0, -0.5, -1.0], [6.0, 1.5, 1.0]), None)?;
//! manager.add_roi_beside(Roi::sphere([10.0, 1.0, 0.0], 0.1).negated(), gate)?;
//!
//! let selection = manager.selection(&index);
//! assert_eq!(selection.iter_selected().collect::<Vec<_>>(), vec![0]);
//!
//! // Nothing changed: the cached snapshot is returned.
//! let queries = index.query_count();
//! let again = manager.selection(&index);
//! assert_eq!(again.revision(), selection.revision());
//! assert_eq!(index.query_count(), queries);
//! # Ok::<(), fascicle_select::SelectionError>(())
//! ```
//!
//! ### Threads
//!
//! The manager is `Send + Sync` and every method takes `&self`. Reads run in
//! parallel; structural edits serialize behind one lock. For interaction,
//! [`SelectionManager::editor`] hands out a channel-backed [`RoiEditor`] whose
//! edits are applied at the start of the next query.
//!
//! ### Logging
//!
//! Structural changes are logged with [`tracing`] at `debug`, recomputation at
//! `trace`, and misuse of foreign handles at `warn`. Install any subscriber to
//! see them.

mod branch;
mod config;
mod edit;
mod error;
mod field;
mod manager;
mod node;
mod observer;
mod sync;
mod types;

pub use branch::Branch;
pub use config::SelectionConfig;
pub use edit::{RoiEdit, RoiEditor};
pub use error::{Result, SelectionError};
pub use field::{SURFACE_EPSILON, SampledField, ScalarField, SurfaceRoi};
pub use manager::{RoiSnapshot, Selection, SelectionManager};
pub use node::SelectionNode;
pub use observer::{Callback, EventKind, ObserverHandle, Observers, SelectionEvent, notify};
pub use types::{BoxFace, BranchId, Color, Roi, RoiFlags, RoiId, RoiShape};
