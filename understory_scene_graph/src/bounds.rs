// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy full-bounds cache.
//!
//! Invalidation is cheap and monotone: a node marks its own cache stale and
//! flags its ancestors until it reaches one that is already flagged.
//! Validation runs children first, then the layout hook, then recomputes the
//! node's own cache in parent space.

use kurbo::Rect;

use crate::Tree;
use crate::types::{Invalidation, NodeId, Property, PropertyValue};
use crate::util;

impl Tree {
    /// Mark the full bounds of `id` stale and flag its ancestors.
    ///
    /// Repeated invalidation before validation stops at the first already
    /// flagged ancestor, so it does no further work.
    pub fn invalidate_full_bounds(&mut self, id: NodeId) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        n.invalid |= Invalidation::FULL_BOUNDS;
        let mut cur = n.parent;
        while let Some(p) = cur {
            let n = self.node_mut(p);
            if n.invalid.contains(Invalidation::CHILD_BOUNDS) {
                break;
            }
            n.invalid |= Invalidation::CHILD_BOUNDS;
            cur = n.parent;
        }
    }

    /// Record that the bounds of `id` changed from `old` and notify.
    pub(crate) fn signal_bounds_changed(&mut self, id: NodeId, old: Rect) {
        self.invalidate_full_bounds(id);
        let n = self.node_mut(id);
        n.invalid |= Invalidation::BOUNDS_CHANGED;
        let new = n.bounds;
        self.fire_property_change(
            id,
            Property::Bounds,
            PropertyValue::Rect(old),
            PropertyValue::Rect(new),
        );
    }

    /// Bring the full-bounds cache of `id` and its subtree up to date.
    ///
    /// Returns true if this node or a descendant has volatile bounds, so the
    /// caller keeps the subtree on its list for the next pass.
    pub fn validate_full_bounds(&mut self, id: NodeId) -> bool {
        let Some(n) = self.node(id) else {
            return false;
        };
        let volatile = n.bounds_volatile();
        let pending = Invalidation::FULL_BOUNDS
            | Invalidation::CHILD_BOUNDS
            | Invalidation::CHILD_BOUNDS_VOLATILE;
        if !volatile && !n.invalid.intersects(pending) {
            return false;
        }
        tracing::trace!(?id, invalid = ?n.invalid, volatile, "validating full bounds");

        if volatile && !n.invalid.contains(Invalidation::BOUNDS_CHANGED) {
            let old = n.bounds;
            if !self.update_bounds_from_behavior(id) {
                self.signal_bounds_changed(id, old);
            }
        }

        let n = self.node_mut(id);
        if n
            .invalid
            .intersects(Invalidation::CHILD_BOUNDS | Invalidation::CHILD_BOUNDS_VOLATILE)
        {
            n.invalid.remove(Invalidation::CHILD_BOUNDS_VOLATILE);
            let mut children_volatile = false;
            let mut i = 0;
            while let Some(&c) = self.node_ref(id).children.get(i) {
                children_volatile |= self.validate_full_bounds(c);
                i += 1;
            }
            self.node_mut(id)
                .invalid
                .set(Invalidation::CHILD_BOUNDS_VOLATILE, children_volatile);
        }

        if let Some(mut behavior) = self.node_mut(id).behavior.take() {
            behavior.layout_children(self, id);
            if let Some(n) = self.node_opt_mut(id) {
                n.behavior = Some(behavior);
            } else {
                return false;
            }
        }

        if self
            .node_ref(id)
            .invalid
            .contains(Invalidation::FULL_BOUNDS)
        {
            let old = self.node_ref(id).full_bounds;
            let new = self.compute_full_bounds(id);
            let n = self.node_mut(id);
            n.full_bounds = new;
            if !same_extent(old, new) {
                let parent = n.parent;
                let paint_invalid = n.invalid.contains(Invalidation::PAINT);
                if let Some(p) = parent {
                    self.invalidate_full_bounds(p);
                }
                self.fire_property_change(
                    id,
                    Property::FullBounds,
                    PropertyValue::Rect(old),
                    PropertyValue::Rect(new),
                );
                if paint_invalid && !util::is_empty(old) {
                    self.repaint_from(id, old, id);
                }
            }
        }

        let n = self.node_mut(id);
        n.invalid.remove(
            Invalidation::FULL_BOUNDS | Invalidation::CHILD_BOUNDS | Invalidation::BOUNDS_CHANGED,
        );
        volatile || n.invalid.contains(Invalidation::CHILD_BOUNDS_VOLATILE)
    }

    fn compute_full_bounds(&mut self, id: NodeId) -> Rect {
        let children = self.union_of_children_bounds(id);
        let n = self.node_ref(id);
        util::transform_rect_bbox(n.transform, util::union_non_empty(n.bounds, children))
    }

    /// Full bounds of `id` in its parent's space, validating first.
    pub fn full_bounds(&mut self, id: NodeId) -> Option<Rect> {
        if !self.is_alive(id) {
            return None;
        }
        self.validate_full_bounds(id);
        Some(self.node_ref(id).full_bounds)
    }

    /// Union of the full bounds of the children of `id`, in its local space.
    ///
    /// Empty if there are no children or none has extent.
    pub fn union_of_children_bounds(&mut self, id: NodeId) -> Rect {
        let mut acc = Rect::ZERO;
        let mut i = 0;
        while let Some(&c) = self.node(id).and_then(|n| n.children.get(i)) {
            if let Some(fb) = self.full_bounds(c) {
                acc = util::union_non_empty(acc, fb);
            }
            i += 1;
        }
        acc
    }

    /// True if the full bounds of `id` intersect `region`, given in parent space.
    pub fn full_intersects(&mut self, id: NodeId, region: Rect) -> bool {
        self.full_bounds(id)
            .is_some_and(|fb| util::intersects(fb, region))
    }
}

fn same_extent(a: Rect, b: Rect) -> bool {
    match (util::is_empty(a), util::is_empty(b)) {
        (true, true) => true,
        (false, false) => a == b,
        _ => false,
    }
}
