// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The selection manager: owns branches, combines them, and caches the result.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};

use fascicle_index::{Backend, FiberMask, Point3, SpatialIndex};
use tracing::{debug, trace, warn};

use crate::branch::{Branch, NodeRemoval};
use crate::config::SelectionConfig;
use crate::edit::{RoiEdit, RoiEditor};
use crate::error::{Result, SelectionError};
use crate::node::SelectionNode;
use crate::observer::{EventKind, ObserverHandle, Observers, SelectionEvent, notify};
use crate::sync::{get_mut, lock, read, write};
use crate::types::{BoxFace, BranchId, Color, Roi, RoiId, RoiShape};

/// Tags handles with the manager that issued them.
static NEXT_OWNER: AtomicU32 = AtomicU32::new(1);

/// The combined result of all branches at one point in time.
///
/// Snapshots are immutable and shared: holding one does not block edits, and
/// later edits produce a new snapshot with a higher [`revision`](Self::revision).
pub struct Selection {
    bits: Arc<FiberMask>,
    colors: Vec<Color>,
    base_color: Color,
    revision: u64,
}

impl Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("fibers", &self.bits.len())
            .field("selected", &self.bits.count_ones())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Selection {
    /// Per-fiber selection bits.
    pub fn bits(&self) -> &FiberMask {
        &self.bits
    }

    /// Shared handle to the selection bits.
    pub fn shared_bits(&self) -> Arc<FiberMask> {
        Arc::clone(&self.bits)
    }

    /// Number of fibers covered.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True if the dataset has no fibers.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Whether `fiber` is selected.
    pub fn is_selected(&self, fiber: usize) -> bool {
        self.bits.get(fiber)
    }

    /// Number of selected fibers.
    pub fn selected_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Indices of selected fibers, ascending.
    pub fn iter_selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Per-fiber display colours.
    ///
    /// A fiber takes the colour of the last branch (in creation order) that
    /// selects it; unselected fibers get the configured base colour.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Display colour of `fiber`.
    ///
    /// Fibers outside the dataset get the base colour.
    pub fn color_of(&self, fiber: usize) -> Color {
        self.colors.get(fiber).copied().unwrap_or(self.base_color)
    }

    /// Monotonic counter, bumped on every recomputation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// A point-in-time copy of one ROI and where it sits.
#[derive(Clone, Debug, PartialEq)]
pub struct RoiSnapshot {
    /// The ROI handle.
    pub id: RoiId,
    /// The branch holding it.
    pub branch: BranchId,
    /// Shape and flags.
    pub roi: Roi,
    /// Whether it is the first ROI of its branch.
    pub is_master: bool,
}

#[derive(Debug, Default)]
struct SelectionCache {
    dirty: bool,
    source: Option<u64>,
    selection: Option<Arc<Selection>>,
    revision: u64,
}

#[derive(Debug, Default)]
struct Inner {
    branches: Vec<Branch>,
    observers: Observers,
    selected: Option<RoiId>,
    cache: Mutex<SelectionCache>,
}

impl Inner {
    fn mark_dirty(&mut self) {
        get_mut(&mut self.cache).dirty = true;
    }

    fn branch_pos(&self, branch: BranchId) -> Option<usize> {
        self.branches.iter().position(|b| b.id() == branch)
    }

    fn branch_pos_of(&self, roi: RoiId) -> Option<usize> {
        self.branches.iter().position(|b| b.contains(roi))
    }

    fn node(&self, roi: RoiId) -> Option<(&Branch, &SelectionNode)> {
        self.branches
            .iter()
            .find_map(|b| b.nodes().iter().find(|n| n.id() == roi).map(|n| (b, n)))
    }

    /// Apply `edit`; `None` if its ROI is gone.
    fn apply(&mut self, edit: RoiEdit) -> Option<bool> {
        let roi = edit.roi();
        let pos = self.branch_pos_of(roi)?;
        let changed = self.branches[pos].edit_node(roi, |node| node.edit(|r| edit.apply(r)))?;
        if changed {
            self.mark_dirty();
        }
        Some(changed)
    }
}

/// Where a new ROI goes.
#[derive(Copy, Clone, Debug)]
enum Placement {
    NewBranch,
    Branch(BranchId),
    Beside(RoiId),
}

/// Owns every branch for one fiber dataset and answers "which fibers are selected".
///
/// The result is the OR of all branches; with no branches, every fiber is
/// selected. Results are cached at every level (ROI, branch, manager) and only
/// recomputed along dirty paths.
///
/// ### Concurrency
///
/// All methods take `&self`. Structure and ROI state live behind one
/// [`RwLock`]: queries take it shared, mutations take it exclusively. Cached bit
/// vectors sit in per-entity mutexes locked in manager → branch → node order.
/// The edit queue is drained under its own mutex, taken before the structure
/// lock. Observers are called after the lock is released.
///
/// ### Handles
///
/// [`RoiId`] and [`BranchId`] carry the issuing manager's tag. Removing through a
/// foreign handle is a programming error: it panics in debug builds and returns
/// an error in release builds. Stale handles are ignored.
pub struct SelectionManager {
    owner: u32,
    serial: AtomicU64,
    config: SelectionConfig,
    inner: RwLock<Inner>,
    edits_tx: Sender<RoiEdit>,
    edits_rx: Mutex<Receiver<RoiEdit>>,
}

impl Debug for SelectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = read(&self.inner);
        f.debug_struct("SelectionManager")
            .field("owner", &self.owner)
            .field("branches", &inner.branches.len())
            .field("observers", &inner.observers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionManager {
    /// Create an empty manager with default configuration.
    pub fn new() -> Self {
        Self::with_config(SelectionConfig::default())
    }

    /// Create an empty manager.
    pub fn with_config(config: SelectionConfig) -> Self {
        let (edits_tx, edits_rx) = mpsc::channel();
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            serial: AtomicU64::new(0),
            config,
            inner: RwLock::new(Inner::default()),
            edits_tx,
            edits_rx: Mutex::new(edits_rx),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// A handle for posting edits from other threads.
    pub fn editor(&self) -> RoiEditor {
        RoiEditor::new(self.edits_tx.clone())
    }

    fn next_serial(&self) -> u64 {
        self.serial.fetch_add(1, Ordering::Relaxed)
    }

    fn check_roi(&self, roi: RoiId) -> Result<()> {
        if roi.owner() == self.owner {
            return Ok(());
        }
        warn!(?roi, "ROI handle from another selection manager");
        Err(SelectionError::ForeignRoi(roi))
    }

    fn check_branch(&self, branch: BranchId) -> Result<()> {
        if branch.owner() == self.owner {
            return Ok(());
        }
        warn!(?branch, "branch handle from another selection manager");
        Err(SelectionError::ForeignBranch(branch))
    }

    // Foreign removals are bugs in the caller.
    fn expect_own_roi(&self, roi: RoiId) -> Result<()> {
        let res = self.check_roi(roi);
        if res.is_err() && cfg!(debug_assertions) {
            panic!("ROI {roi:?} is not owned by this selection manager");
        }
        res
    }

    fn expect_own_branch(&self, branch: BranchId) -> Result<()> {
        let res = self.check_branch(branch);
        if res.is_err() && cfg!(debug_assertions) {
            panic!("branch {branch:?} is not owned by this selection manager");
        }
        res
    }

    // --- Structure ---

    /// Add `roi` to `branch`, or to a new branch when `branch` is `None`.
    ///
    /// A new branch makes `roi` its master and gets the configured default colour.
    pub fn add_roi(&self, roi: Roi, branch: Option<BranchId>) -> Result<RoiId> {
        match branch {
            Some(b) => {
                self.check_branch(b)?;
                self.insert(roi, Placement::Branch(b))
            }
            None => self.insert(roi, Placement::NewBranch),
        }
    }

    /// Add `roi` to the branch that holds `sibling`.
    pub fn add_roi_beside(&self, roi: Roi, sibling: RoiId) -> Result<RoiId> {
        self.check_roi(sibling)?;
        self.insert(roi, Placement::Beside(sibling))
    }

    fn insert(&self, roi: Roi, placement: Placement) -> Result<RoiId> {
        let id = RoiId(self.owner, self.next_serial());
        let node = SelectionNode::new(id, roi);
        let (branch, listeners) = {
            let mut inner = write(&self.inner);
            let target = match placement {
                Placement::NewBranch => None,
                Placement::Branch(b) => {
                    Some(inner.branch_pos(b).ok_or(SelectionError::StaleBranch(b))?)
                }
                Placement::Beside(r) => {
                    Some(inner.branch_pos_of(r).ok_or(SelectionError::StaleRoi(r))?)
                }
            };
            let branch = match target {
                Some(pos) => {
                    inner.branches[pos].add_node(node);
                    inner.branches[pos].id()
                }
                None => {
                    let b = BranchId(self.owner, self.next_serial());
                    inner
                        .branches
                        .push(Branch::new(b, node, self.config.default_branch_color));
                    b
                }
            };
            inner.mark_dirty();
            (branch, inner.observers.listeners(EventKind::RoiAdded))
        };
        debug!(roi = ?id, ?branch, "added ROI");
        notify(&listeners, &SelectionEvent::RoiAdded { roi: id, branch });
        Ok(id)
    }

    /// Remove `roi`. Returns `Ok(false)` if it was already removed.
    ///
    /// Removing the last ROI of a branch removes the branch too; observers hear
    /// about the branch first, then the ROI.
    ///
    /// # Panics
    ///
    /// In debug builds, if `roi` was issued by another manager.
    pub fn remove_roi(&self, roi: RoiId) -> Result<bool> {
        self.expect_own_roi(roi)?;
        let (branch, emptied, roi_listeners, branch_listeners) = {
            let mut inner = write(&self.inner);
            let Some(pos) = inner.branch_pos_of(roi) else {
                trace!(?roi, "ROI already removed");
                return Ok(false);
            };
            let branch = inner.branches[pos].id();
            let emptied = inner.branches[pos].remove_node(roi) == NodeRemoval::Emptied;
            if emptied {
                inner.branches.remove(pos);
            }
            if inner.selected == Some(roi) {
                inner.selected = None;
            }
            inner.mark_dirty();
            let branch_listeners = if emptied {
                inner.observers.listeners(EventKind::BranchRemoved)
            } else {
                Vec::new()
            };
            (
                branch,
                emptied,
                inner.observers.listeners(EventKind::RoiRemoved),
                branch_listeners,
            )
        };
        debug!(?roi, ?branch, emptied, "removed ROI");
        if emptied {
            notify(&branch_listeners, &SelectionEvent::BranchRemoved { branch });
        }
        notify(&roi_listeners, &SelectionEvent::RoiRemoved { roi, branch });
        Ok(true)
    }

    /// Remove `branch` with all its ROIs. Returns `Ok(false)` if it was already removed.
    ///
    /// Observers hear one ROI-removed event per ROI, then branch-removed.
    ///
    /// # Panics
    ///
    /// In debug builds, if `branch` was issued by another manager.
    pub fn remove_branch(&self, branch: BranchId) -> Result<bool> {
        self.expect_own_branch(branch)?;
        Ok(self.take_branch(|inner| inner.branch_pos(branch)))
    }

    /// Remove the branch holding `roi`, with all its ROIs.
    ///
    /// # Panics
    ///
    /// In debug builds, if `roi` was issued by another manager.
    pub fn remove_branch_of(&self, roi: RoiId) -> Result<bool> {
        self.expect_own_roi(roi)?;
        Ok(self.take_branch(|inner| inner.branch_pos_of(roi)))
    }

    fn take_branch(&self, locate: impl FnOnce(&Inner) -> Option<usize>) -> bool {
        let (removed, roi_listeners, branch_listeners) = {
            let mut inner = write(&self.inner);
            let Some(pos) = locate(&*inner) else {
                return false;
            };
            let removed = inner.branches.remove(pos);
            if inner.selected.is_some_and(|r| removed.contains(r)) {
                inner.selected = None;
            }
            inner.mark_dirty();
            (
                removed,
                inner.observers.listeners(EventKind::RoiRemoved),
                inner.observers.listeners(EventKind::BranchRemoved),
            )
        };
        let branch = removed.id();
        debug!(?branch, rois = removed.nodes().len(), "removed branch");
        for node in removed.nodes() {
            notify(&roi_listeners, &SelectionEvent::RoiRemoved { roi: node.id(), branch });
        }
        notify(&branch_listeners, &SelectionEvent::BranchRemoved { branch });
        true
    }

    // --- Edits ---

    /// Apply `edit` immediately. Returns whether the ROI changed.
    ///
    /// Edits for removed or foreign ROIs are ignored.
    pub fn apply_edit(&self, edit: RoiEdit) -> bool {
        let roi = edit.roi();
        if self.check_roi(roi).is_err() {
            return false;
        }
        let mut inner = write(&self.inner);
        inner.apply(edit).unwrap_or_else(|| {
            debug!(?roi, "edit for removed ROI ignored");
            false
        })
    }

    /// Apply every edit queued through [`RoiEditor`]s, in posting order.
    ///
    /// Returns the number of edits that changed something. Concurrent callers
    /// are serialized: a call returns only after every edit posted before it
    /// has been applied.
    pub fn apply_pending_edits(&self) -> usize {
        // Held until the batch is applied so batches cannot overtake each other.
        let rx = lock(&self.edits_rx);
        let pending: Vec<RoiEdit> = rx.try_iter().collect();
        if pending.is_empty() {
            return 0;
        }
        let queued = pending.len();
        let mut applied = 0;
        let mut inner = write(&self.inner);
        for edit in pending {
            let roi = edit.roi();
            if roi.owner() != self.owner {
                warn!(?roi, "queued edit for a ROI from another selection manager");
                continue;
            }
            if inner.apply(edit) == Some(true) {
                applied += 1;
            }
        }
        drop(inner);
        drop(rx);
        trace!(queued, applied, "drained edit queue");
        applied
    }

    /// Replace the shape of `roi`.
    pub fn set_shape(&self, roi: RoiId, shape: RoiShape) -> bool {
        self.apply_edit(RoiEdit::SetShape { roi, shape })
    }

    /// Move box or sphere `roi` by `offset`.
    pub fn translate_roi(&self, roi: RoiId, offset: Point3) -> bool {
        self.apply_edit(RoiEdit::Translate { roi, offset })
    }

    /// Drag one face of box `roi`.
    pub fn move_face(&self, roi: RoiId, face: BoxFace, delta: f32) -> bool {
        self.apply_edit(RoiEdit::MoveFace { roi, face, delta })
    }

    /// Resize sphere `roi`.
    pub fn set_radius(&self, roi: RoiId, radius: f32) -> bool {
        self.apply_edit(RoiEdit::SetRadius { roi, radius })
    }

    /// Change the threshold of surface `roi`.
    pub fn set_threshold(&self, roi: RoiId, threshold: f32) -> bool {
        self.apply_edit(RoiEdit::SetThreshold { roi, threshold })
    }

    /// Enable or disable `roi`.
    pub fn set_active(&self, roi: RoiId, active: bool) -> bool {
        self.apply_edit(RoiEdit::SetActive { roi, active })
    }

    /// Set whether `roi` is negated.
    pub fn set_negate(&self, roi: RoiId, negate: bool) -> bool {
        self.apply_edit(RoiEdit::SetNegate { roi, negate })
    }

    /// Set whether `branch` is negated.
    pub fn set_branch_negate(&self, branch: BranchId, negate: bool) -> bool {
        self.with_branch_mut(branch, |b| b.set_negate(negate))
    }

    /// Set the display colour of `branch`. Selection bits are unaffected.
    pub fn set_branch_color(&self, branch: BranchId, color: Color) -> bool {
        self.with_branch_mut(branch, |b| b.set_color(color))
    }

    fn with_branch_mut(&self, branch: BranchId, f: impl FnOnce(&mut Branch) -> bool) -> bool {
        if self.check_branch(branch).is_err() {
            return false;
        }
        let mut inner = write(&self.inner);
        let Some(pos) = inner.branch_pos(branch) else {
            return false;
        };
        let changed = f(&mut inner.branches[pos]);
        if changed {
            inner.mark_dirty();
        }
        changed
    }

    // --- Selected ROI ---

    /// Mark `roi` as the interactively selected ROI, or clear it with `None`.
    ///
    /// Returns `false` if `roi` is foreign or removed.
    pub fn set_selected_roi(&self, roi: Option<RoiId>) -> bool {
        let mut inner = write(&self.inner);
        if let Some(r) = roi
            && (r.owner() != self.owner || inner.branch_pos_of(r).is_none())
        {
            return false;
        }
        inner.selected = roi;
        true
    }

    /// The interactively selected ROI, if any.
    pub fn selected_roi(&self) -> Option<RoiId> {
        read(&self.inner).selected
    }

    // --- Observers ---

    /// Register `f` for events of `kind`.
    pub fn observe<F>(&self, kind: EventKind, f: F) -> ObserverHandle
    where
        F: Fn(&SelectionEvent) + Send + Sync + 'static,
    {
        let handle = write(&self.inner).observers.register(kind, Arc::new(f));
        debug!(?kind, ?handle, "registered observer");
        handle
    }

    /// Register `f` for ROI additions.
    pub fn on_add<F>(&self, f: F) -> ObserverHandle
    where
        F: Fn(&SelectionEvent) + Send + Sync + 'static,
    {
        self.observe(EventKind::RoiAdded, f)
    }

    /// Register `f` for ROI removals.
    pub fn on_remove<F>(&self, f: F) -> ObserverHandle
    where
        F: Fn(&SelectionEvent) + Send + Sync + 'static,
    {
        self.observe(EventKind::RoiRemoved, f)
    }

    /// Register `f` for branch removals.
    pub fn on_branch_remove<F>(&self, f: F) -> ObserverHandle
    where
        F: Fn(&SelectionEvent) + Send + Sync + 'static,
    {
        self.observe(EventKind::BranchRemoved, f)
    }

    /// Unregister an observer. Returns `false` if it was already gone.
    ///
    /// Safe to call from inside a callback; an in-flight notification still
    /// reaches every observer registered when it started.
    pub fn remove_observer(&self, handle: ObserverHandle) -> bool {
        let removed = write(&self.inner).observers.unregister(handle);
        if removed {
            debug!(?handle, "unregistered observer");
        }
        removed
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        read(&self.inner).observers.len()
    }

    // --- Queries ---

    /// The current selection, recomputed only along dirty paths.
    ///
    /// Drains queued edits first unless
    /// [`apply_edits_on_query`](SelectionConfig::apply_edits_on_query) is off.
    /// Repeated calls with nothing changed return the same snapshot and issue no
    /// index queries.
    pub fn selection<B: Backend>(&self, index: &SpatialIndex<B>) -> Arc<Selection> {
        if self.config.apply_edits_on_query {
            self.apply_pending_edits();
        }
        let inner = read(&self.inner);
        let mut cache = lock(&inner.cache);
        if !cache.dirty
            && cache.source == Some(index.id())
            && let Some(selection) = &cache.selection
        {
            return Arc::clone(selection);
        }
        cache.revision += 1;
        let selection = Arc::new(self.combine(&inner.branches, index, cache.revision));
        cache.selection = Some(Arc::clone(&selection));
        cache.source = Some(index.id());
        cache.dirty = false;
        selection
    }

    /// Per-fiber selection bits. Shorthand for `selection(index).shared_bits()`.
    pub fn bits<B: Backend>(&self, index: &SpatialIndex<B>) -> Arc<FiberMask> {
        self.selection(index).shared_bits()
    }

    fn combine<B: Backend>(
        &self,
        branches: &[Branch],
        index: &SpatialIndex<B>,
        revision: u64,
    ) -> Selection {
        let n = index.fiber_count();
        let mut colors = vec![self.config.base_color; n];
        let bits = if branches.is_empty() {
            FiberMask::all(n)
        } else {
            let mut acc = FiberMask::none(n);
            for branch in branches {
                let bits = branch.bits(index);
                acc.or_with(&bits);
                let color = branch.color();
                for fiber in bits.iter_ones() {
                    colors[fiber] = color;
                }
            }
            acc
        };
        trace!(
            revision,
            branches = branches.len(),
            selected = bits.count_ones(),
            "recomputed selection"
        );
        Selection {
            bits: Arc::new(bits),
            colors,
            base_color: self.config.base_color,
            revision,
        }
    }

    /// Cached bits of a single ROI, negation included. `None` if it is foreign or removed.
    pub fn roi_bits<B: Backend>(
        &self,
        roi: RoiId,
        index: &SpatialIndex<B>,
    ) -> Option<Arc<FiberMask>> {
        if roi.owner() != self.owner {
            return None;
        }
        if self.config.apply_edits_on_query {
            self.apply_pending_edits();
        }
        let inner = read(&self.inner);
        inner.node(roi).map(|(_, n)| n.bits(index))
    }

    /// Cached bits of a single branch. `None` if it is foreign or removed.
    pub fn branch_bits<B: Backend>(
        &self,
        branch: BranchId,
        index: &SpatialIndex<B>,
    ) -> Option<Arc<FiberMask>> {
        if branch.owner() != self.owner {
            return None;
        }
        if self.config.apply_edits_on_query {
            self.apply_pending_edits();
        }
        let inner = read(&self.inner);
        let pos = inner.branch_pos(branch)?;
        Some(inner.branches[pos].bits(index))
    }

    // --- Introspection ---

    /// True when there are no branches, so every fiber is selected.
    pub fn is_nothing_filtered(&self) -> bool {
        read(&self.inner).branches.is_empty()
    }

    /// Whether the next [`selection`](Self::selection) call will recompute.
    ///
    /// Edits still sitting in the queue are not counted.
    pub fn is_dirty(&self) -> bool {
        let inner = read(&self.inner);
        let cache = lock(&inner.cache);
        cache.dirty || cache.selection.is_none()
    }

    /// Number of live ROIs.
    pub fn roi_count(&self) -> usize {
        read(&self.inner).branches.iter().map(|b| b.nodes().len()).sum()
    }

    /// Number of live branches.
    pub fn branch_count(&self) -> usize {
        read(&self.inner).branches.len()
    }

    /// All live ROIs, branch by branch, in insertion order.
    pub fn rois(&self) -> Vec<RoiId> {
        read(&self.inner)
            .branches
            .iter()
            .flat_map(|b| b.nodes().iter().map(SelectionNode::id))
            .collect()
    }

    /// All live branches in creation order.
    pub fn branches(&self) -> Vec<BranchId> {
        read(&self.inner).branches.iter().map(Branch::id).collect()
    }

    /// ROIs of `branch`, master first.
    pub fn branch_rois(&self, branch: BranchId) -> Option<Vec<RoiId>> {
        let inner = read(&self.inner);
        let pos = inner.branch_pos(branch)?;
        Some(inner.branches[pos].nodes().iter().map(SelectionNode::id).collect())
    }

    /// The branch holding `roi`.
    pub fn branch_of(&self, roi: RoiId) -> Option<BranchId> {
        let inner = read(&self.inner);
        inner.branch_pos_of(roi).map(|pos| inner.branches[pos].id())
    }

    /// Whether `roi` is live in this manager.
    pub fn contains_roi(&self, roi: RoiId) -> bool {
        roi.owner() == self.owner && read(&self.inner).branch_pos_of(roi).is_some()
    }

    /// A copy of `roi`'s current state.
    pub fn roi(&self, roi: RoiId) -> Option<RoiSnapshot> {
        let inner = read(&self.inner);
        let (branch, node) = inner.node(roi)?;
        Some(RoiSnapshot {
            id: roi,
            branch: branch.id(),
            roi: node.roi().clone(),
            is_master: branch.master().is_some_and(|m| m.id() == roi),
        })
    }

    /// Whether `branch` is negated.
    pub fn branch_negated(&self, branch: BranchId) -> Option<bool> {
        let inner = read(&self.inner);
        let pos = inner.branch_pos(branch)?;
        Some(inner.branches[pos].is_negated())
    }

    /// Display colour of `branch`.
    pub fn branch_color(&self, branch: BranchId) -> Option<Color> {
        let inner = read(&self.inner);
        let pos = inner.branch_pos(branch)?;
        Some(inner.branches[pos].color())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fascicle_index::Fibers;

    // Fiber i is a single point at x = i.
    fn line_index(n: usize) -> SpatialIndex {
        SpatialIndex::new(&Fibers::from_polylines(
            (0..n).map(|i| vec![[i as f32, 0.0, 0.0]]),
        ))
    }

    fn span(lo: f32, hi: f32) -> Roi {
        Roi::aabb([lo, -1.0, -1.0], [hi, 1.0, 1.0])
    }

    fn ones(bits: &FiberMask) -> Vec<usize> {
        bits.iter_ones().collect()
    }

    #[test]
    fn no_branches_selects_everything() {
        let idx = line_index(5);
        let m = SelectionManager::new();
        assert!(m.is_nothing_filtered());
        assert!(m.bits(&idx).is_full());
        assert_eq!(idx.query_count(), 0);
    }

    #[test]
    fn branches_are_ored() {
        let idx = line_index(10);
        let m = SelectionManager::new();
        m.add_roi(span(0.0, 1.0), None).unwrap();
        m.add_roi(span(8.0, 9.0), None).unwrap();
        assert_eq!(ones(&m.bits(&idx)), vec![0, 1, 8, 9]);
    }

    #[test]
    fn repeated_queries_reuse_snapshot() {
        let idx = line_index(10);
        let m = SelectionManager::new();
        m.add_roi(span(0.0, 3.0), None).unwrap();
        let a = m.selection(&idx);
        let queries = idx.query_count();
        let b = m.selection(&idx);
        assert!(Arc::ptr_eq(&a, &b), "clean manager must return the cached snapshot");
        assert_eq!(idx.query_count(), queries);
        assert!(!m.is_dirty());
    }

    #[test]
    fn only_dirty_branch_is_recomputed() {
        let idx = line_index(10);
        let m = SelectionManager::new();
        let a = m.add_roi(span(0.0, 1.0), None).unwrap();
        m.add_roi(span(8.0, 9.0), None).unwrap();
        let _ = m.bits(&idx);
        idx.reset_query_count();
        assert!(m.translate_roi(a, [2.0, 0.0, 0.0]));
        assert_eq!(ones(&m.bits(&idx)), vec![2, 3, 8, 9]);
        assert_eq!(idx.query_count(), 1);
    }

    #[test]
    fn color_change_bumps_revision_without_queries() {
        let idx = line_index(4);
        let m = SelectionManager::new();
        let r = m.add_roi(span(1.0, 1.0), None).unwrap();
        let b = m.branch_of(r).unwrap();
        let first = m.selection(&idx);
        assert_eq!(first.color_of(1), Color::RED);
        assert_eq!(first.color_of(0), Color::WHITE);
        idx.reset_query_count();
        assert!(m.set_branch_color(b, Color::BLUE));
        let second = m.selection(&idx);
        assert_eq!(second.color_of(1), Color::BLUE);
        assert!(second.revision() > first.revision());
        assert_eq!(idx.query_count(), 0);
    }

    #[test]
    fn last_branch_wins_colour() {
        let idx = line_index(4);
        let m = SelectionManager::new();
        let a = m.add_roi(span(0.0, 2.0), None).unwrap();
        let b = m.add_roi(span(2.0, 3.0), None).unwrap();
        m.set_branch_color(m.branch_of(a).unwrap(), Color::GREEN);
        m.set_branch_color(m.branch_of(b).unwrap(), Color::BLUE);
        let s = m.selection(&idx);
        assert_eq!(s.color_of(0), Color::GREEN);
        assert_eq!(s.color_of(2), Color::BLUE);
    }

    #[test]
    fn removing_last_roi_removes_branch() {
        let m = SelectionManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        m.on_remove(move |e| sink.lock().unwrap().push(*e));
        let sink = Arc::clone(&log);
        m.on_branch_remove(move |e| sink.lock().unwrap().push(*e));

        let r = m.add_roi(span(0.0, 1.0), None).unwrap();
        let b = m.branch_of(r).unwrap();
        assert_eq!(m.remove_roi(r), Ok(true));
        assert_eq!(m.branch_count(), 0);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                SelectionEvent::BranchRemoved { branch: b },
                SelectionEvent::RoiRemoved { roi: r, branch: b },
            ]
        );
        assert_eq!(m.remove_roi(r), Ok(false), "stale removal is a no-op");
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn add_to_stale_branch_fails() {
        let m = SelectionManager::new();
        let r = m.add_roi(span(0.0, 1.0), None).unwrap();
        let b = m.branch_of(r).unwrap();
        m.remove_branch(b).unwrap();
        assert_eq!(
            m.add_roi(span(0.0, 1.0), Some(b)),
            Err(SelectionError::StaleBranch(b))
        );
        assert_eq!(
            m.add_roi_beside(span(0.0, 1.0), r),
            Err(SelectionError::StaleRoi(r))
        );
    }

    #[test]
    fn add_to_foreign_branch_fails() {
        let m1 = SelectionManager::new();
        let m2 = SelectionManager::new();
        let r = m1.add_roi(span(0.0, 1.0), None).unwrap();
        let b = m1.branch_of(r).unwrap();
        assert_eq!(
            m2.add_roi(span(0.0, 1.0), Some(b)),
            Err(SelectionError::ForeignBranch(b))
        );
        assert!(!m2.translate_roi(r, [1.0; 3]));
        assert!(!m2.contains_roi(r));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not owned by this selection manager")]
    fn foreign_removal_panics_in_debug() {
        let m1 = SelectionManager::new();
        let m2 = SelectionManager::new();
        let r = m1.add_roi(span(0.0, 1.0), None).unwrap();
        let _ = m2.remove_roi(r);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn foreign_removal_errors_in_release() {
        let m1 = SelectionManager::new();
        let m2 = SelectionManager::new();
        let r = m1.add_roi(span(0.0, 1.0), None).unwrap();
        assert_eq!(m2.remove_roi(r), Err(SelectionError::ForeignRoi(r)));
        assert!(m1.contains_roi(r));
    }

    #[test]
    fn selected_roi_is_cleared_on_removal() {
        let m = SelectionManager::new();
        let a = m.add_roi(span(0.0, 1.0), None).unwrap();
        let b = m.add_roi_beside(span(0.0, 2.0), a).unwrap();
        assert!(m.set_selected_roi(Some(b)));
        assert_eq!(m.selected_roi(), Some(b));
        m.remove_roi(b).unwrap();
        assert_eq!(m.selected_roi(), None);
        assert!(!m.set_selected_roi(Some(b)));
    }

    #[test]
    fn snapshots_report_master() {
        let m = SelectionManager::new();
        let a = m.add_roi(span(0.0, 1.0), None).unwrap();
        let b = m.add_roi_beside(Roi::sphere([0.0; 3], 1.0).negated(), a).unwrap();
        let sa = m.roi(a).unwrap();
        let sb = m.roi(b).unwrap();
        assert!(sa.is_master);
        assert!(!sb.is_master);
        assert_eq!(sa.branch, sb.branch);
        assert!(sb.roi.is_negated());
        assert_eq!(m.rois(), vec![a, b]);
        assert_eq!(m.branch_rois(sa.branch), Some(vec![a, b]));
    }

    #[test]
    fn remove_branch_of_drops_every_roi() {
        let m = SelectionManager::new();
        let a = m.add_roi(span(0.0, 1.0), None).unwrap();
        let b = m.add_roi_beside(span(0.0, 2.0), a).unwrap();
        let keep = m.add_roi(span(5.0, 6.0), None).unwrap();
        assert_eq!(m.remove_branch_of(b), Ok(true));
        assert_eq!(m.rois(), vec![keep]);
        assert!(!m.contains_roi(a));
    }

    #[test]
    fn queued_edits_apply_on_query() {
        let idx = line_index(10);
        let m = SelectionManager::new();
        let r = m.add_roi(span(0.0, 0.0), None).unwrap();
        let editor = m.editor();
        editor.translate(r, [4.0, 0.0, 0.0]);
        editor.move_face(r, BoxFace::MaxX, 1.0);
        assert_eq!(ones(&m.bits(&idx)), vec![4, 5]);
    }

    #[test]
    fn queued_edits_wait_when_auto_apply_is_off() {
        let idx = line_index(10);
        let m = SelectionManager::with_config(SelectionConfig {
            apply_edits_on_query: false,
            ..SelectionConfig::default()
        });
        let r = m.add_roi(span(0.0, 0.0), None).unwrap();
        m.editor().translate(r, [3.0, 0.0, 0.0]);
        assert_eq!(ones(&m.bits(&idx)), vec![0]);
        assert_eq!(m.apply_pending_edits(), 1);
        assert_eq!(ones(&m.bits(&idx)), vec![3]);
    }

    #[test]
    fn noop_edits_keep_cache() {
        let idx = line_index(4);
        let m = SelectionManager::new();
        let r = m.add_roi(span(0.0, 1.0), None).unwrap();
        let _ = m.bits(&idx);
        assert!(!m.set_active(r, true));
        assert!(!m.set_radius(r, 2.0), "radius does not apply to boxes");
        assert!(!m.is_dirty());
    }

    #[test]
    fn same_size_dataset_switch_recomputes() {
        let a = SpatialIndex::new(&Fibers::from_polylines([
            vec![[0.0, 0.0, 0.0]],
            vec![[9.0, 0.0, 0.0]],
        ]));
        let b = SpatialIndex::new(&Fibers::from_polylines([
            vec![[9.0, 0.0, 0.0]],
            vec![[0.0, 0.0, 0.0]],
        ]));
        let m = SelectionManager::new();
        m.add_roi(Roi::aabb([-1.0; 3], [1.0; 3]), None).unwrap();
        assert_eq!(m.bits(&a).to_bools(), vec![true, false]);
        assert_eq!(m.bits(&b).to_bools(), vec![false, true]);
        assert_eq!(m.bits(&a).to_bools(), vec![true, false]);
    }

    #[test]
    fn colour_past_the_end_is_base_colour() {
        let idx = line_index(2);
        let m = SelectionManager::with_config(SelectionConfig {
            base_color: Color::GREEN,
            ..SelectionConfig::default()
        });
        m.add_roi(span(0.0, 1.0), None).unwrap();
        let s = m.selection(&idx);
        assert_eq!(s.color_of(1), Color::RED);
        assert_eq!(s.color_of(2), Color::GREEN);
        assert_eq!(s.color_of(usize::MAX), Color::GREEN);
    }

    #[test]
    fn serials_keep_counting_past_u32() {
        let m = SelectionManager::new();
        m.serial.store(u64::from(u32::MAX), Ordering::Relaxed);
        let a = m.add_roi(span(0.0, 1.0), None).unwrap();
        let b = m.add_roi(span(0.0, 1.0), None).unwrap();
        assert_ne!(a, b);
        assert!(a.1 >= u64::from(u32::MAX) && b.1 > u64::from(u32::MAX));
        assert!(!m.contains_roi(RoiId(m.owner, 0)));
    }

    #[test]
    fn queued_shapes_last_one_wins() {
        let idx = line_index(10);
        let m = SelectionManager::new();
        let r = m.add_roi(span(0.0, 0.0), None).unwrap();
        let editor = m.editor();
        for x in [7.0, 2.0, 5.0] {
            editor.set_shape(r, span(x, x).shape);
        }
        assert_eq!(ones(&m.bits(&idx)), vec![5]);
        assert_eq!(m.roi(r).unwrap().roi.shape, span(5.0, 5.0).shape);
    }

    #[test]
    fn observer_can_unregister_itself() {
        let m = Arc::new(SelectionManager::new());
        let calls = Arc::new(AtomicU32::new(0));
        let handle = Arc::new(Mutex::new(None));
        let (m2, calls2, handle2) = (Arc::clone(&m), Arc::clone(&calls), Arc::clone(&handle));
        let h = m.on_add(move |_| {
            calls2.fetch_add(1, Ordering::Relaxed);
            if let Some(h) = handle2.lock().unwrap().take() {
                m2.remove_observer(h);
            }
        });
        *handle.lock().unwrap() = Some(h);
        m.add_roi(span(0.0, 1.0), None).unwrap();
        m.add_roi(span(0.0, 1.0), None).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(m.observer_count(), 0);
    }
}
