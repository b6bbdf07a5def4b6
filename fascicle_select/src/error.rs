// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors for structural operations on a selection manager.

use crate::types::{BranchId, RoiId};

/// Errors returned by [`SelectionManager`](crate::SelectionManager) structure edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The ROI handle was issued by a different manager.
    #[error("ROI {0:?} is not owned by this selection manager")]
    ForeignRoi(RoiId),
    /// The branch handle was issued by a different manager.
    #[error("branch {0:?} is not owned by this selection manager")]
    ForeignBranch(BranchId),
    /// The ROI has already been removed.
    #[error("ROI {0:?} has been removed")]
    StaleRoi(RoiId),
    /// The branch has already been removed.
    #[error("branch {0:?} has been removed")]
    StaleBranch(BranchId),
}

/// Result alias for selection operations.
pub type Result<T, E = SelectionError> = std::result::Result<T, E>;
