// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Branches: AND-combined groups of ROIs with optional negation and a colour.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use fascicle_index::{Backend, FiberMask, SpatialIndex};

use crate::node::{MaskCache, SelectionNode};
use crate::sync::{get_mut, lock};
use crate::types::{BranchId, Color, RoiId};

/// Outcome of removing a node from a branch.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum NodeRemoval {
    /// The node was not in this branch.
    Missing,
    /// The node was removed; the branch still has nodes.
    Removed,
    /// The node was removed and the branch is now empty; its owner must drop it.
    Emptied,
}

/// An ordered, non-empty list of ROIs combined with logical AND.
///
/// The first node is the branch's master ROI. A negated branch inverts the
/// conjunction before it is cached.
pub struct Branch {
    id: BranchId,
    nodes: Vec<SelectionNode>,
    negate: bool,
    color: Color,
    cache: Mutex<MaskCache>,
}

impl Debug for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Branch")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("negate", &self.negate)
            .field("color", &self.color)
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

impl Branch {
    pub(crate) fn new(id: BranchId, master: SelectionNode, color: Color) -> Self {
        Self {
            id,
            nodes: vec![master],
            negate: false,
            color,
            cache: Mutex::new(MaskCache::new()),
        }
    }

    /// Handle of this branch.
    pub fn id(&self) -> BranchId {
        self.id
    }

    /// The nodes in insertion order; the first is the master.
    pub fn nodes(&self) -> &[SelectionNode] {
        &self.nodes
    }

    /// The master ROI.
    pub fn master(&self) -> Option<&SelectionNode> {
        self.nodes.first()
    }

    /// Whether `roi` belongs to this branch.
    pub fn contains(&self, roi: RoiId) -> bool {
        self.nodes.iter().any(|n| n.id() == roi)
    }

    /// Whether the branch result is inverted.
    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// Display colour for fibers this branch selects.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Whether the cached bits are stale.
    pub fn is_dirty(&self) -> bool {
        lock(&self.cache).is_dirty()
    }

    /// The branch's bits, recomputed only if dirty.
    ///
    /// Clean nodes contribute their cached bits without touching the index.
    pub fn bits<B: Backend>(&self, index: &SpatialIndex<B>) -> Arc<FiberMask> {
        lock(&self.cache).get_or_update(index.id(), || {
            tracing::trace!(branch = ?self.id, nodes = self.nodes.len(), "recomputing branch bits");
            let mut acc = FiberMask::all(index.fiber_count());
            for node in &self.nodes {
                acc.and_with(&node.bits(index));
            }
            if self.negate {
                acc.invert();
            }
            acc
        })
    }

    pub(crate) fn mark_dirty(&mut self) {
        get_mut(&mut self.cache).mark_dirty();
    }

    pub(crate) fn add_node(&mut self, node: SelectionNode) {
        self.nodes.push(node);
        self.mark_dirty();
    }

    pub(crate) fn remove_node(&mut self, roi: RoiId) -> NodeRemoval {
        let Some(pos) = self.nodes.iter().position(|n| n.id() == roi) else {
            return NodeRemoval::Missing;
        };
        self.nodes.remove(pos);
        self.mark_dirty();
        if self.nodes.is_empty() {
            NodeRemoval::Emptied
        } else {
            NodeRemoval::Removed
        }
    }

    pub(crate) fn set_negate(&mut self, negate: bool) -> bool {
        if self.negate == negate {
            return false;
        }
        self.negate = negate;
        self.mark_dirty();
        true
    }

    /// Changing the colour leaves the cached bits valid.
    pub(crate) fn set_color(&mut self, color: Color) -> bool {
        if self.color == color {
            return false;
        }
        self.color = color;
        true
    }

    /// Run `f` on node `roi`; marks the branch dirty if `f` reports a change.
    ///
    /// Returns `None` if `roi` is not in this branch.
    pub(crate) fn edit_node(
        &mut self,
        roi: RoiId,
        f: impl FnOnce(&mut SelectionNode) -> bool,
    ) -> Option<bool> {
        let node = self.nodes.iter_mut().find(|n| n.id() == roi)?;
        let changed = f(node);
        if changed {
            self.mark_dirty();
        }
        Some(changed)
    }
}
