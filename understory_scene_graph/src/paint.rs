// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint invalidation, damage reporting, and the paint traversal.
//!
//! Paint invalidation mirrors bounds invalidation: a node marks itself and
//! flags ancestors until one is already flagged. [`Tree::validate_full_paint`]
//! turns those flags into damage by repainting each invalid node's full
//! bounds, which travel up the parent chain to the display root.

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Rect, Stroke};
use peniko::Color;

use crate::Tree;
use crate::types::{Invalidation, NodeId};
use crate::util;

/// Drawing capability consumed by the paint traversal.
///
/// Geometry is given in the current local space; implementations apply the
/// accumulated transform themselves.
pub trait Renderer {
    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color);
    /// Fill the interior of a path (non-zero winding).
    fn fill_path(&mut self, path: &BezPath, color: Color);
    /// Stroke the outline of a path.
    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke, color: Color);
    /// Concatenate `transform` onto the current transform.
    fn push_transform(&mut self, transform: Affine);
    /// Restore the transform in effect before the matching push.
    fn pop_transform(&mut self);
    /// Current clip in device space.
    fn clip_bounds(&self) -> Rect;
}

/// State threaded through a paint traversal.
pub struct PaintContext<'a> {
    renderer: &'a mut dyn Renderer,
    stack: Vec<Affine>,
}

impl core::fmt::Debug for PaintContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaintContext")
            .field("depth", &self.stack.len())
            .field("transform", &self.transform())
            .finish_non_exhaustive()
    }
}

impl<'a> PaintContext<'a> {
    /// Wrap a renderer. The accumulated transform starts at identity.
    pub fn new(renderer: &'a mut dyn Renderer) -> Self {
        Self {
            renderer,
            stack: Vec::new(),
        }
    }

    /// The wrapped renderer.
    pub fn renderer(&mut self) -> &mut dyn Renderer {
        &mut *self.renderer
    }

    /// Accumulated transform from the current local space to device space.
    pub fn transform(&self) -> Affine {
        self.stack.last().copied().unwrap_or(Affine::IDENTITY)
    }

    /// Enter a child space.
    pub fn push_transform(&mut self, transform: Affine) {
        let next = self.transform() * transform;
        self.stack.push(next);
        self.renderer.push_transform(transform);
    }

    /// Leave the innermost space.
    pub fn pop_transform(&mut self) {
        if self.stack.pop().is_some() {
            self.renderer.pop_transform();
        }
    }

    /// The device clip mapped into the current local space.
    ///
    /// Empty if the current space is collapsed.
    pub fn local_clip_bounds(&self) -> Rect {
        match util::checked_inverse(self.transform()) {
            Ok(inv) => util::transform_rect_bbox(inv, self.renderer.clip_bounds()),
            Err(_) => Rect::ZERO,
        }
    }
}

/// A drawing command captured by [`RecordingRenderer`].
#[derive(Clone, Debug)]
pub enum RenderOp {
    /// [`Renderer::fill_rect`].
    FillRect(Rect, Color),
    /// [`Renderer::fill_path`].
    FillPath(BezPath, Color),
    /// [`Renderer::stroke_path`].
    StrokePath(BezPath, Stroke, Color),
    /// [`Renderer::push_transform`].
    PushTransform(Affine),
    /// [`Renderer::pop_transform`].
    PopTransform,
}

/// Renderer that records commands instead of drawing them.
#[derive(Clone, Debug)]
pub struct RecordingRenderer {
    /// Device clip reported to the traversal.
    pub clip: Rect,
    /// Commands in submission order.
    pub ops: Vec<RenderOp>,
}

impl RecordingRenderer {
    /// Recorder with the given device clip.
    pub fn new(clip: Rect) -> Self {
        Self {
            clip,
            ops: Vec::new(),
        }
    }

    /// Only the fill commands, as `(rect, color)` pairs.
    pub fn filled_rects(&self) -> Vec<(Rect, Color)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::FillRect(r, c) => Some((*r, *c)),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(RenderOp::FillRect(rect, color));
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.ops.push(RenderOp::FillPath(path.clone(), color));
    }

    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke, color: Color) {
        self.ops
            .push(RenderOp::StrokePath(path.clone(), stroke.clone(), color));
    }

    fn push_transform(&mut self, transform: Affine) {
        self.ops.push(RenderOp::PushTransform(transform));
    }

    fn pop_transform(&mut self) {
        self.ops.push(RenderOp::PopTransform);
    }

    fn clip_bounds(&self) -> Rect {
        self.clip
    }
}

impl Tree {
    /// Mark `id` as needing a repaint and flag its ancestors.
    pub fn invalidate_paint(&mut self, id: NodeId) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        n.invalid |= Invalidation::PAINT;
        let mut cur = n.parent;
        while let Some(p) = cur {
            let n = self.node_mut(p);
            if n.invalid.contains(Invalidation::CHILD_PAINT) {
                break;
            }
            n.invalid |= Invalidation::CHILD_PAINT;
            cur = n.parent;
        }
    }

    /// Turn pending paint invalidation in the subtree at `id` into damage.
    pub fn validate_full_paint(&mut self, id: NodeId) {
        let Some(n) = self.node(id) else {
            return;
        };
        let invalid = n.invalid;
        if invalid.contains(Invalidation::PAINT) {
            self.repaint(id);
        }
        if invalid.contains(Invalidation::CHILD_PAINT) {
            let dirty = Invalidation::PAINT | Invalidation::CHILD_PAINT;
            let mut i = 0;
            while let Some(&c) = self.node_ref(id).children.get(i) {
                if self.node(c).is_some_and(|n| n.invalid.intersects(dirty)) {
                    self.validate_full_paint(c);
                }
                i += 1;
            }
        }
        self.node_mut(id)
            .invalid
            .remove(Invalidation::PAINT | Invalidation::CHILD_PAINT);
    }

    /// Report the full bounds of `id` as damaged.
    pub fn repaint(&mut self, id: NodeId) {
        if let Some(full) = self.full_bounds(id) {
            self.repaint_from(id, full, id);
        }
    }

    /// Report `rect` as damaged, walking up from `id`.
    ///
    /// If `source` is `id`, `rect` is in the parent space of `id` (like full
    /// bounds). Otherwise `source` is a child of `id` and `rect` is in the
    /// local space of `id`. Damage is dropped if any node on the way is
    /// invisible or if the chain does not end at the display root.
    pub fn repaint_from(&mut self, id: NodeId, rect: Rect, source: NodeId) {
        if util::is_empty(rect) || !self.node(source).is_some_and(|n| n.is_visible()) {
            return;
        }
        let mut rect = rect;
        let mut cur = id;
        let mut from = source;
        loop {
            let Some(n) = self.node(cur) else {
                return;
            };
            if !n.is_visible() {
                return;
            }
            if from != cur {
                rect = util::transform_rect_bbox(n.transform, rect);
            }
            match n.parent {
                Some(p) => {
                    from = cur;
                    cur = p;
                }
                None => break,
            }
        }
        if cur != self.root() {
            return;
        }
        let rect = util::transform_rect_bbox(self.view_transform, rect);
        self.damage.push(rect);
    }

    /// Paint the display root through `cx`, starting with the view transform.
    pub fn full_paint(&mut self, cx: &mut PaintContext<'_>) {
        let root = self.root();
        let view = self.view_transform;
        cx.push_transform(view);
        self.full_paint_from(root, cx);
        cx.pop_transform();
    }

    /// Paint the subtree at `id`. `cx` must be positioned in the parent space of `id`.
    pub fn full_paint_from(&mut self, id: NodeId, cx: &mut PaintContext<'_>) {
        if !self.is_alive(id) {
            return;
        }
        self.validate_full_bounds(id);
        self.paint_subtree(id, cx);
    }

    fn paint_subtree(&self, id: NodeId, cx: &mut PaintContext<'_>) {
        let Some(n) = self.node(id) else {
            return;
        };
        if !n.is_visible() || !util::intersects(n.full_bounds, cx.local_clip_bounds()) {
            return;
        }
        cx.push_transform(n.transform);
        if !n.is_occluded() {
            n.behavior().paint(n, cx);
        }
        for &c in &n.children {
            self.paint_subtree(c, cx);
        }
        n.behavior().paint_after_children(n, cx);
        cx.pop_transform();
    }
}
