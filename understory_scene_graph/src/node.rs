// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node storage and its read-only accessors.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use peniko::Color;

use crate::behavior::{NodeBehavior, PlainNode};
use crate::event::{InputHandler, ListenerId, PropertyListener};
use crate::types::{Invalidation, NodeFlags, NodeId, PropertyMask, Tag};

static PLAIN: PlainNode = PlainNode;

/// A node of the scene graph.
///
/// Nodes are owned by a [`Tree`](crate::Tree) and addressed by [`NodeId`].
/// This type only exposes reads; all mutation goes through `Tree` so that
/// invalidation and notifications stay consistent.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) bounds: Rect,
    pub(crate) transform: Affine,
    pub(crate) full_bounds: Rect,
    pub(crate) flags: NodeFlags,
    pub(crate) invalid: Invalidation,
    pub(crate) paint: Option<Color>,
    pub(crate) tag: Option<Tag>,
    pub(crate) bubble_mask: PropertyMask,
    pub(crate) behavior: Option<Box<dyn NodeBehavior>>,
    pub(crate) listeners: Vec<PropertyListener>,
    pub(crate) input_handlers: Vec<(ListenerId, Box<dyn InputHandler>)>,
}

impl core::fmt::Debug for Node {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("bounds", &self.bounds)
            .field("transform", &self.transform)
            .field("full_bounds", &self.full_bounds)
            .field("flags", &self.flags)
            .field("invalid", &self.invalid)
            .field("paint", &self.paint)
            .field("bubble_mask", &self.bubble_mask)
            .field("behavior", &self.behavior)
            .field("listeners", &self.listeners.len())
            .field("input_handlers", &self.input_handlers.len())
            .finish_non_exhaustive()
    }
}

impl Node {
    /// A detached node: empty bounds, identity transform, no parent.
    ///
    /// Fresh nodes start with stale full bounds and paint so the first
    /// validation pass picks them up.
    pub(crate) fn new(
        id: NodeId,
        behavior: Option<Box<dyn NodeBehavior>>,
        bubble_mask: PropertyMask,
    ) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            bounds: Rect::ZERO,
            transform: Affine::IDENTITY,
            full_bounds: Rect::ZERO,
            flags: NodeFlags::default(),
            invalid: Invalidation::FULL_BOUNDS | Invalidation::PAINT,
            paint: None,
            tag: None,
            bubble_mask,
            behavior,
            listeners: Vec::new(),
            input_handlers: Vec::new(),
        }
    }

    /// Handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parent, or `None` for a root or detached node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in paint order (index 0 is painted first).
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Transform from local space to parent space.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Full bounds cache in parent space.
    ///
    /// Only meaningful when [`Invalidation::FULL_BOUNDS`] is clear; use
    /// [`Tree::full_bounds`](crate::Tree::full_bounds) to validate first.
    pub fn cached_full_bounds(&self) -> Rect {
        self.full_bounds
    }

    /// Visibility, picking, and volatility flags.
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Current invalidation state.
    pub fn invalidation(&self) -> Invalidation {
        self.invalid
    }

    /// Paint color used by the default paint routine.
    pub fn paint(&self) -> Option<Color> {
        self.paint
    }

    /// User tag, if any.
    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Which property changes are forwarded to the parent's listeners.
    pub fn bubble_mask(&self) -> PropertyMask {
        self.bubble_mask
    }

    /// Shorthand for the [`NodeFlags::VISIBLE`] bit.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Shorthand for the [`NodeFlags::PICKABLE`] bit.
    pub fn is_pickable(&self) -> bool {
        self.flags.contains(NodeFlags::PICKABLE)
    }

    /// Shorthand for the [`NodeFlags::CHILDREN_PICKABLE`] bit.
    pub fn children_pickable(&self) -> bool {
        self.flags.contains(NodeFlags::CHILDREN_PICKABLE)
    }

    /// Shorthand for the [`NodeFlags::OCCLUDED`] bit.
    pub fn is_occluded(&self) -> bool {
        self.flags.contains(NodeFlags::OCCLUDED)
    }

    /// True if bounds must be re-derived every validation pass, either because
    /// the flag is set or because the behavior says so.
    pub fn bounds_volatile(&self) -> bool {
        self.flags.contains(NodeFlags::BOUNDS_VOLATILE) || self.behavior().bounds_volatile()
    }

    /// The node's behavior; plain nodes report [`PlainNode`].
    pub fn behavior(&self) -> &dyn NodeBehavior {
        match &self.behavior {
            Some(b) => b.as_ref(),
            None => &PLAIN,
        }
    }
}
