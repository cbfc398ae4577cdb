// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage accumulation and the per-frame driver.

use alloc::vec::Vec;
use core::time::Duration;

use kurbo::{Affine, Rect};

use crate::Tree;
use crate::util;

/// The host display surface that receives damage.
pub trait DisplaySurface {
    /// Request a redraw of `rect`, given in surface space.
    fn invalidate(&mut self, rect: Rect);
}

/// Surface-space rectangles reported since the last flush.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Damage {
    /// Rectangles that should be repainted, in report order.
    pub dirty_rects: Vec<Rect>,
}

impl Damage {
    /// Returns the union of all damage rects.
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.dirty_rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, util::union_non_empty))
    }

    /// True if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty()
    }

    pub(crate) fn push(&mut self, rect: Rect) {
        if !util::is_empty(rect) {
            self.dirty_rects.push(rect);
        }
    }
}

impl Tree {
    /// Drain the damage reported so far.
    pub fn take_damage(&mut self) -> Damage {
        core::mem::take(&mut self.damage)
    }

    /// Send pending damage to `surface` as a single rectangle.
    ///
    /// Returns the rectangle sent, or `None` if there was nothing to report.
    pub fn flush_damage(&mut self, surface: &mut dyn DisplaySurface) -> Option<Rect> {
        let damage = self.take_damage();
        let rect = damage.union_rect()?;
        tracing::debug!(?rect, count = damage.dirty_rects.len(), "flushing damage");
        surface.invalidate(rect);
        Some(rect)
    }

    /// Transform from the display root's parent space to surface space.
    pub fn view_transform(&self) -> Affine {
        self.view_transform
    }

    /// Change the view transform, damaging the old and new screen regions.
    pub fn set_view_transform(&mut self, transform: Affine) {
        if self.view_transform == transform {
            return;
        }
        let root = self.root();
        self.repaint(root);
        self.view_transform = transform;
        self.repaint(root);
    }

    /// Run one frame: step activities, validate bounds then paint from the
    /// display root, and flush the resulting damage to `surface`.
    pub fn process_frame(
        &mut self,
        now: Duration,
        surface: &mut dyn DisplaySurface,
    ) -> Option<Rect> {
        self.process_activities(now);
        let root = self.root();
        self.validate_full_bounds(root);
        self.validate_full_paint(root);
        self.flush_damage(surface)
    }
}
