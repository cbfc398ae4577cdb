// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for fallible tree operations.

use crate::types::NodeId;

/// Errors returned by structural edits and inverse coordinate conversions.
///
/// A failed operation leaves the tree unmodified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The handle does not refer to a live node.
    #[error("stale node handle {0:?}")]
    StaleNode(NodeId),
    /// A child index was outside the legal range.
    #[error("child index {index} out of range for {len} children")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of children at the time of the call.
        len: usize,
    },
    /// The node is not a child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Node that was looked up.
        child: NodeId,
    },
    /// A composed transform could not be inverted.
    #[error("transform is not invertible")]
    SingularTransform,
    /// Adding the child would make a node its own ancestor.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Prospective parent.
        parent: NodeId,
        /// Prospective child (an ancestor of `parent`, or `parent` itself).
        child: NodeId,
    },
    /// The display root cannot be placed under another node.
    #[error("display root {0:?} cannot become a child")]
    DisplayRoot(NodeId),
}
