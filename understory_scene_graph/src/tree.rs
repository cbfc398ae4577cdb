// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: storage, structure edits, and property setters.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Vec2};
use peniko::Color;

use crate::activity::ActivityScheduler;
use crate::behavior::NodeBehavior;
use crate::damage::Damage;
use crate::error::SceneError;
use crate::event::ListenerId;
use crate::node::Node;
use crate::types::{
    Invalidation, NodeFlags, NodeId, Property, PropertyMask, PropertyValue, Tag, TreeConfig,
};

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// A retained scene graph.
///
/// The tree owns every node, a designated [root](Self::root) that terminates
/// damage propagation, the pending damage, and the activity scheduler.
pub struct Tree {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    root: NodeId,
    pub(crate) config: TreeConfig,
    pub(crate) view_transform: Affine,
    pub(crate) damage: Damage,
    pub(crate) scheduler: ActivityScheduler,
    pub(crate) next_listener: u64,
    pub(crate) dispatch_depth: u32,
    pub(crate) dispatch_removals: Vec<ListenerId>,
    pub(crate) dispatch_checked_out: Vec<(NodeId, ListenerId)>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("root", &self.root)
            .field("config", &self.config)
            .field("damage", &self.damage)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

/// Selects nodes during [`Tree::all_nodes_filtered`].
///
/// Both control points are independent: a node may be rejected while its
/// children are still visited, or accepted while its children are skipped.
pub trait NodeFilter {
    /// Whether `node` itself is included in the result.
    fn accept(&self, node: &Node) -> bool;

    /// Whether traversal descends into the children of `node`.
    fn accept_children_of(&self, _node: &Node) -> bool {
        true
    }
}

impl<F: Fn(&Node) -> bool> NodeFilter for F {
    fn accept(&self, node: &Node) -> bool {
        self(node)
    }
}

impl Tree {
    /// Create a tree with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create a tree with an explicit configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 1),
            config,
            view_transform: Affine::IDENTITY,
            damage: Damage::default(),
            scheduler: ActivityScheduler::default(),
            next_listener: 0,
            dispatch_depth: 0,
            dispatch_removals: Vec::new(),
            dispatch_checked_out: Vec::new(),
        };
        tree.root = tree.alloc(None);
        tree
    }

    /// The configuration this tree was built with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The display root. Damage reaching it is reported to the host surface.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, behavior: Option<Box<dyn NodeBehavior>>) -> NodeId {
        let mask = self.config.default_bubble_mask;
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores 32-bit slot indices."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(None);
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores 32-bit slot indices."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        self.nodes[id.idx()] = Some(Node::new(id, behavior, mask));
        id
    }

    /// Create a detached plain node.
    pub fn create_node(&mut self) -> NodeId {
        self.alloc(None)
    }

    /// Create a detached node with a behavior.
    ///
    /// If the behavior can derive bounds from its own model, they are applied immediately.
    pub fn create_node_with(&mut self, behavior: impl NodeBehavior) -> NodeId {
        let id = self.alloc(Some(Box::new(behavior)));
        self.update_bounds_from_behavior(id);
        id
    }

    /// Free a node and its whole subtree.
    ///
    /// The node is first removed from its parent (repainting its old region).
    /// Activities targeting destroyed nodes become no-ops. The display root
    /// cannot be destroyed, and since it never has a parent it is never part
    /// of another node's subtree.
    pub fn destroy(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if id == self.root {
            tracing::warn!(?id, "refusing to destroy the display root");
            return;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(index) = self.index_of(parent, id) {
                self.detach(parent, index);
            }
        }
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(n.idx());
            }
        }
        tracing::debug!(?id, "destroyed subtree");
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.id.1 == id.1)
            .unwrap_or(false)
    }

    /// Read access to a live node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.id.1 == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.id.1 != id.1 {
            return None;
        }
        Some(n)
    }

    /// Access a node mutably; panics if `id` is stale. Callers check liveness first.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_opt_mut(id).expect("dangling NodeId")
    }

    /// Access a node; panics if `id` is stale. Callers check liveness first.
    pub(crate) fn node_ref(&self, id: NodeId) -> &Node {
        self.node(id).expect("dangling NodeId")
    }

    fn live(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.node(id).ok_or(SceneError::StaleNode(id))
    }

    // --- structure queries ---

    /// Parent of `id`, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of `id` in paint order; empty for stale handles.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Number of children of `id`.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Position of `child` in the child list of `parent`.
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Topmost ancestor of `id` (itself if it has no parent).
    pub fn root_of(&self, mut id: NodeId) -> NodeId {
        while let Some(p) = self.parent(id) {
            id = p;
        }
        id
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// True if `id` is a strict descendant of `ancestor`.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.is_ancestor_of(ancestor, id)
    }

    /// Root→`id` path (inclusive).
    pub fn path_to_root(&self, mut id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        loop {
            out.push(id);
            match self.parent(id) {
                Some(p) => id = p,
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Every node of the subtree at `id`, pre-order (self, then children in order).
    pub fn all_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.all_nodes_filtered(id, &|_: &Node| true)
    }

    /// Pre-order traversal restricted by `filter`.
    pub fn all_nodes_filtered(&self, id: NodeId, filter: &dyn NodeFilter) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.node(n) else {
                continue;
            };
            if filter.accept(node) {
                out.push(n);
            }
            if filter.accept_children_of(node) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    // --- structure edits ---

    /// Append `child` to `parent`.
    ///
    /// If `child` is already a child of `parent` it moves to the end, so
    /// re-adding the last child is a no-op for order and count.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let p = self.live(parent)?;
        let mut index = p.children.len();
        if self.parent(child) == Some(parent) {
            index -= 1;
        }
        self.insert_child(parent, index, child)
    }

    /// Append several children in order.
    pub fn add_children(
        &mut self,
        parent: NodeId,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), SceneError> {
        for c in children {
            self.add_child(parent, c)?;
        }
        Ok(())
    }

    /// Insert `child` at `index` in the child list of `parent`.
    ///
    /// `index` is interpreted after `child` has been detached from any previous
    /// parent, and must be at most the resulting child count. The display root
    /// cannot be inserted anywhere.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), SceneError> {
        let p = self.live(parent)?;
        let c = self.live(child)?;
        if child == self.root {
            return Err(SceneError::DisplayRoot(child));
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(SceneError::WouldCreateCycle { parent, child });
        }
        let len = p.children.len() - usize::from(c.parent == Some(parent));
        if index > len {
            return Err(SceneError::IndexOutOfRange { index, len });
        }

        if c.parent.is_some() {
            self.remove_from_parent(child)?;
        }
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        self.invalidate_paint(child);
        self.invalidate_full_bounds(child);
        self.invalidate_full_bounds(parent);
        tracing::debug!(?parent, ?child, index, "added child");
        self.fire_property_change(
            child,
            Property::Parent,
            PropertyValue::Node(None),
            PropertyValue::Node(Some(parent)),
        );
        self.fire_property_change(
            parent,
            Property::Children,
            PropertyValue::None,
            PropertyValue::None,
        );
        Ok(())
    }

    /// Remove and return the child at `index`.
    ///
    /// The child's old region is repainted; the child stays alive, detached.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<NodeId, SceneError> {
        let len = self.live(parent)?.children.len();
        if index >= len {
            return Err(SceneError::IndexOutOfRange { index, len });
        }
        Ok(self.detach(parent, index))
    }

    /// Unlink the child at a known-valid `index` of live `parent`.
    fn detach(&mut self, parent: NodeId, index: usize) -> NodeId {
        let child = self.node_ref(parent).children[index];
        self.repaint(child);
        self.node_mut(parent).children.remove(index);
        self.node_mut(child).parent = None;
        self.invalidate_full_bounds(parent);
        tracing::debug!(?parent, ?child, index, "removed child");
        self.fire_property_change(
            child,
            Property::Parent,
            PropertyValue::Node(Some(parent)),
            PropertyValue::Node(None),
        );
        self.fire_property_change(
            parent,
            Property::Children,
            PropertyValue::None,
            PropertyValue::None,
        );
        child
    }

    /// Remove `child` from `parent` by identity.
    pub fn remove_child_node(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.live(parent)?;
        let index = self
            .index_of(parent, child)
            .ok_or(SceneError::NotAChild { parent, child })?;
        self.remove_child(parent, index).map(|_| ())
    }

    /// Detach `id` from its parent, if it has one.
    pub fn remove_from_parent(&mut self, id: NodeId) -> Result<(), SceneError> {
        match self.live(id)?.parent {
            Some(p) => self.remove_child_node(p, id),
            None => Ok(()),
        }
    }

    /// Detach every child of `parent` with a single invalidation pass.
    pub fn remove_all_children(&mut self, parent: NodeId) -> Result<Vec<NodeId>, SceneError> {
        self.live(parent)?;
        let children = core::mem::take(&mut self.node_mut(parent).children);
        if children.is_empty() {
            return Ok(children);
        }
        // Children are still reachable through their parent link here, so
        // their stale regions resolve to the right place on screen.
        for &c in &children {
            if let Some(full) = self.full_bounds(c) {
                self.repaint_from(parent, full, c);
            }
        }
        for &c in &children {
            self.node_mut(c).parent = None;
        }
        self.invalidate_full_bounds(parent);
        tracing::debug!(?parent, count = children.len(), "removed all children");
        for &c in &children {
            self.fire_property_change(
                c,
                Property::Parent,
                PropertyValue::Node(Some(parent)),
                PropertyValue::Node(None),
            );
        }
        self.fire_property_change(
            parent,
            Property::Children,
            PropertyValue::None,
            PropertyValue::None,
        );
        Ok(children)
    }

    /// Move `id` under `new_parent` while keeping its global position.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        self.live(id)?;
        self.live(new_parent)?;
        if id == self.root {
            return Err(SceneError::DisplayRoot(id));
        }
        if id == new_parent || self.is_ancestor_of(id, new_parent) {
            return Err(SceneError::WouldCreateCycle {
                parent: new_parent,
                child: id,
            });
        }
        let to_global = self.local_to_global_matrix(id);
        let from_global = self.global_to_local_matrix(new_parent)?;
        self.remove_from_parent(id)?;
        self.set_transform(id, from_global * to_global);
        self.add_child(new_parent, id)
    }

    /// Put `other` in place of `id` in its parent's child list.
    ///
    /// `id` is left detached and alive. Does nothing if `id` has no parent.
    pub fn replace_with(&mut self, id: NodeId, other: NodeId) -> Result<(), SceneError> {
        self.live(other)?;
        let Some(parent) = self.live(id)?.parent else {
            return Ok(());
        };
        if other == self.root {
            return Err(SceneError::DisplayRoot(other));
        }
        if other == parent || self.is_ancestor_of(other, parent) {
            return Err(SceneError::WouldCreateCycle {
                parent,
                child: other,
            });
        }
        let index = self
            .index_of(parent, id)
            .ok_or(SceneError::NotAChild { parent, child: id })?;
        self.remove_child(parent, index)?;
        // Detaching `other` from the same parent may shift the slot.
        let index = match self.index_of(parent, other) {
            Some(i) if i < index => index - 1,
            _ => index,
        };
        self.insert_child(parent, index, other)
    }

    /// Move `id` to the top of its siblings (painted last, picked first).
    pub fn move_to_front(&mut self, id: NodeId) -> Result<(), SceneError> {
        match self.live(id)?.parent {
            Some(p) => {
                self.remove_child_node(p, id)?;
                self.add_child(p, id)
            }
            None => Ok(()),
        }
    }

    /// Move `id` to the bottom of its siblings.
    pub fn move_to_back(&mut self, id: NodeId) -> Result<(), SceneError> {
        match self.live(id)?.parent {
            Some(p) => {
                self.remove_child_node(p, id)?;
                self.insert_child(p, 0, id)
            }
            None => Ok(()),
        }
    }

    /// Place `id` directly above `sibling`.
    pub fn move_in_front_of(&mut self, id: NodeId, sibling: NodeId) -> Result<(), SceneError> {
        let parent = self.sibling_parent(id, sibling)?;
        if id == sibling {
            return Ok(());
        }
        self.remove_child_node(parent, id)?;
        let index = self
            .index_of(parent, sibling)
            .ok_or(SceneError::NotAChild { parent, child: sibling })?;
        self.insert_child(parent, index + 1, id)
    }

    /// Place `id` directly below `sibling`.
    pub fn move_in_back_of(&mut self, id: NodeId, sibling: NodeId) -> Result<(), SceneError> {
        let parent = self.sibling_parent(id, sibling)?;
        if id == sibling {
            return Ok(());
        }
        self.remove_child_node(parent, id)?;
        let index = self
            .index_of(parent, sibling)
            .ok_or(SceneError::NotAChild { parent, child: sibling })?;
        self.insert_child(parent, index, id)
    }

    fn sibling_parent(&self, id: NodeId, sibling: NodeId) -> Result<NodeId, SceneError> {
        let sibling_parent = self.live(sibling)?.parent;
        match (self.live(id)?.parent, sibling_parent) {
            (Some(p), Some(q)) if p == q => Ok(p),
            (Some(p), _) => Err(SceneError::NotAChild {
                parent: p,
                child: sibling,
            }),
            (None, q) => Err(SceneError::NotAChild {
                parent: q.unwrap_or(sibling),
                child: id,
            }),
        }
    }

    // --- property setters ---

    /// Set local bounds.
    ///
    /// Invalidates paint and full bounds and notifies [`Property::Bounds`].
    /// No-op if unchanged or if `id` is stale.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        let Some(n) = self.node_opt_mut(id) else {
            tracing::warn!(?id, "set_bounds on stale node");
            return;
        };
        let old = n.bounds;
        if old == bounds {
            return;
        }
        n.bounds = bounds;
        n.invalid |= Invalidation::BOUNDS_CHANGED;
        if let Some(mut b) = n.behavior.take() {
            b.bounds_changed(old, bounds);
            self.node_mut(id).behavior = Some(b);
        }
        self.invalidate_paint(id);
        self.signal_bounds_changed(id, old);
    }

    /// Reset bounds to empty.
    pub fn reset_bounds(&mut self, id: NodeId) {
        self.set_bounds(id, Rect::ZERO);
    }

    /// Set the local-to-parent transform.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) {
        let Some(n) = self.node_opt_mut(id) else {
            tracing::warn!(?id, "set_transform on stale node");
            return;
        };
        let old = n.transform;
        if old == transform {
            return;
        }
        n.transform = transform;
        self.invalidate_paint(id);
        self.invalidate_full_bounds(id);
        self.fire_property_change(
            id,
            Property::Transform,
            PropertyValue::Transform(old),
            PropertyValue::Transform(transform),
        );
    }

    /// Translate in local space.
    pub fn translate_by(&mut self, id: NodeId, dx: f64, dy: f64) {
        if let Some(t) = self.node(id).map(Node::transform) {
            self.set_transform(id, t * Affine::translate(Vec2::new(dx, dy)));
        }
    }

    /// Uniformly scale in local space (about the local origin).
    pub fn scale_by(&mut self, id: NodeId, s: f64) {
        if let Some(t) = self.node(id).map(Node::transform) {
            self.set_transform(id, t * Affine::scale(s));
        }
    }

    /// Rotate in local space (about the local origin), in radians.
    pub fn rotate_by(&mut self, id: NodeId, theta: f64) {
        if let Some(t) = self.node(id).map(Node::transform) {
            self.set_transform(id, t * Affine::rotate(theta));
        }
    }

    /// Uniformly scale about a point given in local space.
    pub fn scale_about_point(&mut self, id: NodeId, s: f64, point: Point) {
        if let Some(t) = self.node(id).map(Node::transform) {
            let about = Affine::translate(point.to_vec2())
                * Affine::scale(s)
                * Affine::translate(-point.to_vec2());
            self.set_transform(id, t * about);
        }
    }

    /// Set the translation component of the transform (the node's offset in parent space).
    pub fn set_offset(&mut self, id: NodeId, x: f64, y: f64) {
        if let Some(t) = self.node(id).map(Node::transform) {
            self.set_transform(id, t.with_translation(Vec2::new(x, y)));
        }
    }

    /// Translate so that the center of the local bounds lands on `point` (local space).
    ///
    /// Returns false if the node has empty bounds.
    pub fn center_bounds_on_point(&mut self, id: NodeId, point: Point) -> bool {
        let Some(bounds) = self.node(id).map(Node::bounds) else {
            return false;
        };
        if crate::util::is_empty(bounds) {
            return false;
        }
        let d = point - bounds.center();
        self.translate_by(id, d.x, d.y);
        true
    }

    fn set_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool, property: Property) {
        let Some(n) = self.node_opt_mut(id) else {
            tracing::warn!(?id, ?property, "flag update on stale node");
            return;
        };
        if n.flags.contains(flag) == on {
            return;
        }
        n.flags.set(flag, on);
        self.fire_property_change(
            id,
            property,
            PropertyValue::Bool(!on),
            PropertyValue::Bool(on),
        );
    }

    /// Show or hide the node and its subtree.
    ///
    /// Hiding repaints the region the node occupied while it was still visible.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        let Some(was) = self.node(id).map(Node::is_visible) else {
            return;
        };
        if was == visible {
            return;
        }
        if !visible {
            self.repaint(id);
        }
        self.set_flag(id, NodeFlags::VISIBLE, visible, Property::Visible);
        self.invalidate_paint(id);
    }

    /// Set whether the node itself can be picked.
    pub fn set_pickable(&mut self, id: NodeId, pickable: bool) {
        self.set_flag(id, NodeFlags::PICKABLE, pickable, Property::Pickable);
    }

    /// Set whether picking descends into the children.
    pub fn set_children_pickable(&mut self, id: NodeId, pickable: bool) {
        self.set_flag(
            id,
            NodeFlags::CHILDREN_PICKABLE,
            pickable,
            Property::ChildrenPickable,
        );
    }

    /// Set whether the node skips painting itself.
    pub fn set_occluded(&mut self, id: NodeId, occluded: bool) {
        self.set_flag(id, NodeFlags::OCCLUDED, occluded, Property::Occluded);
        self.invalidate_paint(id);
    }

    /// Mark bounds as volatile (re-derived every validation pass).
    pub fn set_bounds_volatile(&mut self, id: NodeId, volatile: bool) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        n.flags.set(NodeFlags::BOUNDS_VOLATILE, volatile);
        if volatile {
            self.invalidate_full_bounds(id);
        }
    }

    /// Set the paint color used by the default paint routine.
    pub fn set_paint(&mut self, id: NodeId, paint: Option<Color>) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        let old = n.paint;
        if old == paint {
            return;
        }
        n.paint = paint;
        self.invalidate_paint(id);
        self.fire_property_change(
            id,
            Property::Paint,
            PropertyValue::Paint(old),
            PropertyValue::Paint(paint),
        );
    }

    /// Attach an opaque user payload.
    pub fn set_tag(&mut self, id: NodeId, tag: Option<Tag>) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        n.tag = tag;
        self.fire_property_change(id, Property::Tag, PropertyValue::None, PropertyValue::None);
    }

    /// Choose which property changes bubble to the parent's listeners.
    pub fn set_bubble_mask(&mut self, id: NodeId, mask: PropertyMask) {
        if let Some(n) = self.node_opt_mut(id) {
            n.bubble_mask = mask;
        }
    }

    // --- behaviors ---

    /// Typed access to a node's behavior.
    pub fn behavior<T: NodeBehavior>(&self, id: NodeId) -> Option<&T> {
        self.node(id)?.behavior.as_deref()?.as_any().downcast_ref()
    }

    /// Mutate a node's behavior, then re-derive bounds from it and repaint.
    pub fn update_behavior<T: NodeBehavior, R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let b = self.node_opt_mut(id)?.behavior.as_deref_mut()?;
        let out = f(b.as_any_mut().downcast_mut()?);
        self.update_bounds_from_behavior(id);
        self.invalidate_paint(id);
        Some(out)
    }

    /// Apply bounds derived by the behavior without feeding them back to
    /// [`NodeBehavior::bounds_changed`]. Returns true if the bounds changed.
    pub(crate) fn update_bounds_from_behavior(&mut self, id: NodeId) -> bool {
        let Some(n) = self.node_opt_mut(id) else {
            return false;
        };
        let Some(derived) = n.behavior().compute_bounds(n) else {
            return false;
        };
        let old = n.bounds;
        if old == derived {
            return false;
        }
        n.bounds = derived;
        self.invalidate_paint(id);
        self.signal_bounds_changed(id, old);
        true
    }

    // --- deep copy ---

    /// Deep-copy the subtree at `id` into a new detached subtree.
    ///
    /// Structure, bounds, transforms, flags, paint, tags, bubble masks, and
    /// behaviors are copied. Listeners and input handlers are not.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, SceneError> {
        let src = self.live(id)?;
        let behavior = src.behavior.as_ref().map(|b| b.clone_box());
        let (bounds, transform, flags, paint, tag, mask) = (
            src.bounds,
            src.transform,
            src.flags,
            src.paint,
            src.tag.clone(),
            src.bubble_mask,
        );
        let children = src.children.clone();

        let copy = self.alloc(behavior);
        let n = self.node_mut(copy);
        n.bounds = bounds;
        n.transform = transform;
        n.flags = flags;
        n.paint = paint;
        n.tag = tag;
        n.bubble_mask = mask;
        for c in children {
            let c2 = self.clone_subtree(c)?;
            self.node_mut(copy).children.push(c2);
            self.node_mut(c2).parent = Some(copy);
        }
        self.node_mut(copy).invalid |= Invalidation::CHILD_BOUNDS | Invalidation::CHILD_PAINT;
        Ok(copy)
    }
}
