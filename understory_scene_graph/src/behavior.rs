// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node override points.
//!
//! A node either has no behavior (a plain rectangle node) or owns a boxed
//! [`NodeBehavior`]. Every method has a default, so implementors only
//! override what their node kind needs.

use alloc::boxed::Box;
use core::any::Any;
use core::fmt::Debug;

use kurbo::Rect;

use crate::Tree;
use crate::node::Node;
use crate::paint::PaintContext;
use crate::types::NodeId;
use crate::util;

/// Override points for a kind of node.
///
/// ## Layout hazard
///
/// [`layout_children`](Self::layout_children) runs inside bounds validation.
/// Setting the bounds of a child that is not bounds-volatile from there
/// re-invalidates the subtree on every pass, so the tree never settles.
/// This is a contract violation on the implementor's side and is not
/// detected at runtime.
pub trait NodeBehavior: Debug + Any {
    /// Paint the node itself, in local coordinates.
    ///
    /// The default fills the node's bounds with its paint color, if any.
    fn paint(&self, node: &Node, cx: &mut PaintContext<'_>) {
        paint_bounds(node, cx);
    }

    /// Paint decorations on top of the children.
    fn paint_after_children(&self, _node: &Node, _cx: &mut PaintContext<'_>) {}

    /// Pick test run before the children are visited. `region` is in local space.
    ///
    /// Returning true makes this node the hit without consulting children.
    fn pick(&self, _node: &Node, _region: Rect) -> bool {
        false
    }

    /// Pick test run after no child accepted the pick. `region` is in local space.
    fn pick_after_children(&self, node: &Node, region: Rect) -> bool {
        self.intersects(node, region)
    }

    /// Whether the node's own geometry intersects `region` (local space).
    fn intersects(&self, node: &Node, region: Rect) -> bool {
        util::intersects(node.bounds(), region)
    }

    /// Position children once they are geometry-valid, before this node's
    /// full bounds are recomputed. Called exactly once per validation pass.
    fn layout_children(&mut self, _tree: &mut Tree, _node: NodeId) {}

    /// True if bounds derive from an external model and must be re-checked every pass.
    fn bounds_volatile(&self) -> bool {
        false
    }

    /// Bounds derived from the behavior's own model, if it has one.
    fn compute_bounds(&self, _node: &Node) -> Option<Rect> {
        None
    }

    /// Called after the bounds were set explicitly.
    fn bounds_changed(&mut self, _old: Rect, _new: Rect) {}

    /// Deep copy used by [`Tree::clone_subtree`].
    fn clone_box(&self) -> Box<dyn NodeBehavior>;

    /// Typed access for [`Tree::behavior`].
    fn as_any(&self) -> &dyn Any;

    /// Typed mutable access for [`Tree::update_behavior`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Fill the node's bounds with its paint color.
pub fn paint_bounds(node: &Node, cx: &mut PaintContext<'_>) {
    if let Some(color) = node.paint() {
        if !util::is_empty(node.bounds()) {
            cx.renderer().fill_rect(node.bounds(), color);
        }
    }
}

/// Behavior of a node without an explicit one: every hook is the default.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainNode;

impl NodeBehavior for PlainNode {
    fn clone_box(&self) -> Box<dyn NodeBehavior> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
