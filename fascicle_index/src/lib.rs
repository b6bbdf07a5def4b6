// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fascicle Index: a static 3D spatial index over fiber (polyline) vertices.
//!
//! Fascicle Index answers the geometric half of fiber selection: which fibers
//! have at least one point inside a box, inside a sphere, or above a scalar
//! threshold.
//!
//! - Describe the data with a [`FiberDataset`] (or use the concrete [`Fibers`]).
//! - Build a [`SpatialIndex`] once; it never changes for the dataset's lifetime.
//! - Query by box or radius and get back fiber indices or a [`FiberMask`].
//!
//! It knows nothing about regions of interest, branches, or caching; higher layers
//! (see `fascicle_select`) compose its answers.
//!
//! Backends are pluggable via the [`Backend`] trait. The default is a balanced
//! [`KdTree`]; [`FlatVec`] is a linear scan useful as a reference.
//!
//! # Example
//!
//! ```rust
//! use fascicle_index::{Fibers, SpatialIndex};
//!
//! let fibers = Fibers::from_polylines([
//!     vec![[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]],
//!     vec![[3.0, 3.0, 3.0], [0.9, 0.0, 0.0]],
//!     vec![[5.0, 5.0, 5.0]],
//! ]);
//! let index = SpatialIndex::new(&fibers);
//!
//! // Any point inside selects the whole fiber.
//! assert_eq!(index.query_box([-1.0; 3], [1.0; 3]), vec![0, 1]);
//! assert_eq!(index.query_radius([5.0, 5.0, 5.0], 0.5), vec![2]);
//! ```
//!
//! ## Choosing a backend
//!
//! - `KdTree` (default): median splits cycling x, y, z; `O(n log n)` build and
//!   `O(log n + k)` range queries.
//! - `FlatVec`: no build cost, linear queries. Handy for tiny datasets and tests.
//!
//! ### Float semantics
//!
//! Box bounds are inclusive on every face. Points with NaN coordinates are indexed
//! but never reported.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod dataset;
pub mod error;
pub mod index;
pub mod mask;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::kdtree::KdTree;
pub use dataset::{FiberDataset, Fibers};
pub use error::FibersError;
pub use index::{PointSampler, SpatialIndex};
pub use mask::FiberMask;
pub use types::{Aabb3D, Axis, Point3, Sphere, distance_squared};
