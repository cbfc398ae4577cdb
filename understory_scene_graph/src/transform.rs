// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate conversions between local, parent, and global space.
//!
//! Global space is the frame above the topmost ancestor, so the topmost
//! ancestor's own transform is part of every global conversion. Nothing here
//! is cached: global conversions walk the parent chain on each call.
//!
//! Rectangles map through their corners and come back as axis-aligned
//! bounding boxes, which over-approximates under rotation or skew.

use kurbo::{Affine, Point, Rect, Size};

use crate::Tree;
use crate::error::SceneError;
use crate::types::NodeId;
use crate::util;

impl Tree {
    fn transform_of(&self, id: NodeId) -> Affine {
        self.node(id).map_or(Affine::IDENTITY, |n| n.transform)
    }

    /// Map a point from the local space of `id` to its parent's space.
    pub fn local_to_parent_point(&self, id: NodeId, p: Point) -> Point {
        self.transform_of(id) * p
    }

    /// Map a size (a delta, unaffected by translation) to parent space.
    pub fn local_to_parent_size(&self, id: NodeId, s: Size) -> Size {
        util::transform_size(self.transform_of(id), s)
    }

    /// Map a rectangle to parent space as an axis-aligned bounding box.
    pub fn local_to_parent_rect(&self, id: NodeId, r: Rect) -> Rect {
        util::transform_rect_bbox(self.transform_of(id), r)
    }

    /// Map a point from the parent's space into the local space of `id`.
    pub fn parent_to_local_point(&self, id: NodeId, p: Point) -> Result<Point, SceneError> {
        Ok(util::checked_inverse(self.transform_of(id))? * p)
    }

    /// Map a size from the parent's space into the local space of `id`.
    pub fn parent_to_local_size(&self, id: NodeId, s: Size) -> Result<Size, SceneError> {
        Ok(util::transform_size(
            util::checked_inverse(self.transform_of(id))?,
            s,
        ))
    }

    /// Map a rectangle from the parent's space into the local space of `id`.
    pub fn parent_to_local_rect(&self, id: NodeId, r: Rect) -> Result<Rect, SceneError> {
        Ok(util::transform_rect_bbox(
            util::checked_inverse(self.transform_of(id))?,
            r,
        ))
    }

    /// Composition of every transform from `id` up to and including its topmost ancestor.
    ///
    /// Identity for a stale handle.
    pub fn local_to_global_matrix(&self, id: NodeId) -> Affine {
        let mut m = Affine::IDENTITY;
        let mut cur = self.node(id);
        while let Some(n) = cur {
            m = n.transform * m;
            cur = n.parent.and_then(|p| self.node(p));
        }
        m
    }

    /// Inverse of [`local_to_global_matrix`](Self::local_to_global_matrix).
    ///
    /// Fails with [`SceneError::SingularTransform`] if any transform on the chain
    /// collapses space.
    pub fn global_to_local_matrix(&self, id: NodeId) -> Result<Affine, SceneError> {
        util::checked_inverse(self.local_to_global_matrix(id))
    }

    /// Map a point from the local space of `id` to global space.
    pub fn local_to_global_point(&self, id: NodeId, p: Point) -> Point {
        self.local_to_global_matrix(id) * p
    }

    /// Map a size from the local space of `id` to global space.
    pub fn local_to_global_size(&self, id: NodeId, s: Size) -> Size {
        util::transform_size(self.local_to_global_matrix(id), s)
    }

    /// Map a rectangle from the local space of `id` to global space.
    pub fn local_to_global_rect(&self, id: NodeId, r: Rect) -> Rect {
        util::transform_rect_bbox(self.local_to_global_matrix(id), r)
    }

    /// Map a point from global space into the local space of `id`.
    pub fn global_to_local_point(&self, id: NodeId, p: Point) -> Result<Point, SceneError> {
        Ok(self.global_to_local_matrix(id)? * p)
    }

    /// Map a size from global space into the local space of `id`.
    pub fn global_to_local_size(&self, id: NodeId, s: Size) -> Result<Size, SceneError> {
        Ok(util::transform_size(self.global_to_local_matrix(id)?, s))
    }

    /// Map a rectangle from global space into the local space of `id`.
    pub fn global_to_local_rect(&self, id: NodeId, r: Rect) -> Result<Rect, SceneError> {
        Ok(util::transform_rect_bbox(self.global_to_local_matrix(id)?, r))
    }

    /// Local bounds of `id` in global space.
    pub fn global_bounds(&self, id: NodeId) -> Option<Rect> {
        let n = self.node(id)?;
        Some(self.local_to_global_rect(id, n.bounds))
    }

    /// Full bounds of `id` in global space, validating first.
    pub fn global_full_bounds(&mut self, id: NodeId) -> Option<Rect> {
        let full = self.full_bounds(id)?;
        Some(match self.parent(id) {
            Some(p) => self.local_to_global_rect(p, full),
            None => full,
        })
    }
}
