// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observer registry for structural selection events.
//!
//! Callbacks are stored in generational slots. Handles to unregistered slots go
//! stale and never alias a later registration.
//!
//! Notification never runs callbacks under the manager lock: the manager takes a
//! snapshot of the matching callbacks with [`Observers::listeners`], releases its
//! lock, then calls [`notify`]. A callback may therefore add or remove ROIs, or
//! unregister observers (itself included), without deadlocking.

use std::fmt::Debug;
use std::sync::Arc;

use crate::types::{BranchId, RoiId};

/// A structural change to the selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SelectionEvent {
    /// A ROI was added to `branch`.
    RoiAdded {
        /// The new ROI.
        roi: RoiId,
        /// The branch it joined (possibly newly created).
        branch: BranchId,
    },
    /// A ROI was removed from `branch`.
    RoiRemoved {
        /// The removed ROI.
        roi: RoiId,
        /// The branch it belonged to.
        branch: BranchId,
    },
    /// A branch was removed.
    BranchRemoved {
        /// The removed branch.
        branch: BranchId,
    },
}

impl SelectionEvent {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RoiAdded { .. } => EventKind::RoiAdded,
            Self::RoiRemoved { .. } => EventKind::RoiRemoved,
            Self::BranchRemoved { .. } => EventKind::BranchRemoved,
        }
    }
}

/// Event kinds an observer can subscribe to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`SelectionEvent::RoiAdded`].
    RoiAdded,
    /// [`SelectionEvent::RoiRemoved`].
    RoiRemoved,
    /// [`SelectionEvent::BranchRemoved`].
    BranchRemoved,
}

/// A registered callback.
pub type Callback = Arc<dyn Fn(&SelectionEvent) + Send + Sync>;

/// Handle to a registered observer, used to unregister it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObserverHandle(u32, u32);

impl ObserverHandle {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

struct Slot {
    generation: u32,
    // Registration sequence number; slots are reused out of order.
    seq: u64,
    entry: Option<(EventKind, Callback)>,
}

/// Generational registry of observer callbacks.
#[derive(Default)]
pub struct Observers {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    next_seq: u64,
}

impl Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("registered", &self.len())
            .field("free", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Observers {
    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// True if no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `callback` for events of `kind`.
    pub fn register(&mut self, kind: EventKind, callback: Callback) -> ObserverHandle {
        let entry = Some((kind, callback));
        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.seq = seq;
            slot.entry = entry;
            idx
        } else {
            self.slots.push(Slot {
                generation: 1,
                seq,
                entry,
            });
            self.slots.len() - 1
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Observer slots are indexed with 32-bit handles."
        )]
        let slot = idx as u32;
        ObserverHandle(slot, self.slots[idx].generation)
    }

    /// Unregister the observer behind `handle`. Returns `false` if it was stale.
    pub fn unregister(&mut self, handle: ObserverHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.idx()) else {
            return false;
        };
        if slot.generation != handle.1 || slot.entry.is_none() {
            return false;
        }
        slot.entry = None;
        self.free_list.push(handle.idx());
        true
    }

    /// Whether `handle` refers to a registered observer.
    pub fn is_registered(&self, handle: ObserverHandle) -> bool {
        self.slots
            .get(handle.idx())
            .is_some_and(|s| s.generation == handle.1 && s.entry.is_some())
    }

    /// Snapshot of the callbacks registered for `kind`, in registration order.
    pub fn listeners(&self, kind: EventKind) -> Vec<Callback> {
        let mut matching: Vec<(u64, Callback)> = self
            .slots
            .iter()
            .filter_map(|s| match &s.entry {
                Some((k, cb)) if *k == kind => Some((s.seq, Arc::clone(cb))),
                _ => None,
            })
            .collect();
        matching.sort_unstable_by_key(|(seq, _)| *seq);
        matching.into_iter().map(|(_, cb)| cb).collect()
    }
}

/// Call every callback in `listeners` with `event`.
pub fn notify(listeners: &[Callback], event: &SelectionEvent) {
    for cb in listeners {
        cb(event);
    }
}
