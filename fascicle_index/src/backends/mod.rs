// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `kdtree`: balanced, array-packed KD-tree (default); `O(log n + k)` range queries.
//! - `flatvec`: flat point array with linear scans; the reference the KD-tree is tested against.
//!
//! KD-tree note
//! ------------
//! The tree is implicit: after the build, the median of every sub-range
//! `[lo, hi)` sits at `lo + (hi - lo) / 2`, points ordered before it on the
//! level's axis sit to its left and points ordered after it to its right.
//! Levels cycle through x, y, z. Ordering uses `(coordinate, point index)`
//! so equal coordinates are split by their position in the input and the
//! build is deterministic for a fixed input order.

pub mod flatvec;
pub mod kdtree;
