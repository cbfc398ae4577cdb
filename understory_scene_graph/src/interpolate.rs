// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property animation built on the activity scheduler.
//!
//! A [`PropertyAccessor`] reads and writes one property of one node. An
//! [`InterpolatingActivity`] captures the source value when it starts and
//! blends toward a destination component by component.

use core::fmt::Debug;
use core::time::Duration;

use kurbo::{Affine, Rect, Vec2};
use peniko::Color;

use crate::Tree;
use crate::activity::{Activity, ActivityId, ActivityTiming};
use crate::types::NodeId;

/// Component-wise linear blending.
pub trait Interpolate: Clone + Debug + 'static {
    /// Blend from `self` (at `t = 0`) to `to` (at `t = 1`).
    fn lerp(&self, to: &Self, t: f64) -> Self;
}

fn mix(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl Interpolate for f64 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        mix(*self, *to, t)
    }
}

impl Interpolate for Rect {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self::new(
            mix(self.x0, to.x0, t),
            mix(self.y0, to.y0, t),
            mix(self.x1, to.x1, t),
            mix(self.y1, to.y1, t),
        )
    }
}

impl Interpolate for Affine {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        let a = self.as_coeffs();
        let b = to.as_coeffs();
        Self::new(core::array::from_fn(|i| mix(a[i], b[i], t)))
    }
}

impl Interpolate for Color {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Color components are stored as f32."
    )]
    fn lerp(&self, to: &Self, t: f64) -> Self {
        let t = t as f32;
        let a = self.components;
        let b = to.components;
        Self::new(core::array::from_fn(|i| a[i] + (b[i] - a[i]) * t))
    }
}

/// Get/set access to one property of one node.
pub trait PropertyAccessor: Debug + 'static {
    /// Type of the property.
    type Value: Interpolate;

    /// Current value, or `None` if the node is gone.
    fn get(&self, tree: &Tree) -> Option<Self::Value>;

    /// Apply a value through the regular setter.
    fn set(&self, tree: &mut Tree, value: Self::Value);
}

/// Accessor for [`Tree::set_bounds`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundsAccessor(pub NodeId);

impl PropertyAccessor for BoundsAccessor {
    type Value = Rect;

    fn get(&self, tree: &Tree) -> Option<Rect> {
        tree.node(self.0).map(|n| n.bounds())
    }

    fn set(&self, tree: &mut Tree, value: Rect) {
        tree.set_bounds(self.0, value);
    }
}

/// Accessor for [`Tree::set_transform`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransformAccessor(pub NodeId);

impl PropertyAccessor for TransformAccessor {
    type Value = Affine;

    fn get(&self, tree: &Tree) -> Option<Affine> {
        tree.node(self.0).map(|n| n.transform())
    }

    fn set(&self, tree: &mut Tree, value: Affine) {
        tree.set_transform(self.0, value);
    }
}

/// Accessor for [`Tree::set_paint`]. A node without paint reads as transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaintAccessor(pub NodeId);

impl PropertyAccessor for PaintAccessor {
    type Value = Color;

    fn get(&self, tree: &Tree) -> Option<Color> {
        tree.node(self.0)
            .map(|n| n.paint().unwrap_or(Color::TRANSPARENT))
    }

    fn set(&self, tree: &mut Tree, value: Color) {
        tree.set_paint(self.0, Some(value));
    }
}

/// Activity that blends a property from its value at start to `destination`.
#[derive(Debug)]
pub struct InterpolatingActivity<A: PropertyAccessor> {
    accessor: A,
    source: Option<A::Value>,
    destination: A::Value,
}

impl<A: PropertyAccessor> InterpolatingActivity<A> {
    /// Blend the property behind `accessor` to `destination`.
    pub fn new(accessor: A, destination: A::Value) -> Self {
        Self {
            accessor,
            source: None,
            destination,
        }
    }

    /// Value captured when the activity started.
    pub fn source(&self) -> Option<&A::Value> {
        self.source.as_ref()
    }
}

impl<A: PropertyAccessor> Activity for InterpolatingActivity<A> {
    fn started(&mut self, tree: &mut Tree) {
        self.source = self.accessor.get(tree);
    }

    fn step(&mut self, tree: &mut Tree, t: f64) {
        if let Some(source) = &self.source {
            let value = source.lerp(&self.destination, t);
            self.accessor.set(tree, value);
        }
    }
}

impl Tree {
    /// Animate any property.
    ///
    /// With a zero duration and no dependency the destination is applied
    /// immediately and nothing is scheduled.
    pub fn animate<A: PropertyAccessor>(
        &mut self,
        accessor: A,
        destination: A::Value,
        timing: ActivityTiming,
    ) -> Option<ActivityId> {
        if timing.duration.is_zero() && timing.after.is_none() {
            accessor.set(self, destination);
            return None;
        }
        Some(self.schedule(InterpolatingActivity::new(accessor, destination), timing))
    }

    /// Animate the bounds of `id`.
    pub fn animate_to_bounds(
        &mut self,
        id: NodeId,
        bounds: Rect,
        duration: Duration,
    ) -> Option<ActivityId> {
        if !self.is_alive(id) {
            return None;
        }
        self.animate(BoundsAccessor(id), bounds, ActivityTiming::new(duration))
    }

    /// Animate the transform of `id`.
    pub fn animate_to_transform(
        &mut self,
        id: NodeId,
        transform: Affine,
        duration: Duration,
    ) -> Option<ActivityId> {
        if !self.is_alive(id) {
            return None;
        }
        self.animate(TransformAccessor(id), transform, ActivityTiming::new(duration))
    }

    /// Animate the paint color of `id`.
    pub fn animate_to_color(
        &mut self,
        id: NodeId,
        color: Color,
        duration: Duration,
    ) -> Option<ActivityId> {
        if !self.is_alive(id) {
            return None;
        }
        self.animate(PaintAccessor(id), color, ActivityTiming::new(duration))
    }

    /// Animate the transform of `id` to an offset, uniform scale and rotation (radians).
    pub fn animate_to_position_scale_rotation(
        &mut self,
        id: NodeId,
        x: f64,
        y: f64,
        scale: f64,
        theta: f64,
        duration: Duration,
    ) -> Option<ActivityId> {
        let target =
            Affine::translate(Vec2::new(x, y)) * Affine::rotate(theta) * Affine::scale(scale);
        self.animate_to_transform(id, target, duration)
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use kurbo::{Affine, Rect, Vec2};
    use peniko::Color;

    use super::Interpolate;
    use crate::Tree;
    use crate::activity::ActivityTiming;
    use crate::interpolate::{BoundsAccessor, TransformAccessor};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn component_wise_blending() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 20.0, 30.0, 50.0);
        assert_eq!(a.lerp(&b, 0.5), Rect::new(5.0, 10.0, 20.0, 30.0));
        let m = Affine::IDENTITY.lerp(&Affine::scale(3.0), 0.5);
        assert_eq!(m, Affine::scale(2.0));
        let from = Color::new([0.0, 0.0, 0.0, 1.0]);
        let c = Interpolate::lerp(&from, &Color::new([1.0, 0.5, 0.0, 1.0]), 0.5);
        assert_eq!(c.components, [0.5, 0.25, 0.0, 1.0]);
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let mut tree = Tree::new();
        let a = tree.create_node();
        let target = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(tree.animate_to_bounds(a, target, Duration::ZERO), None);
        assert_eq!(tree.node(a).unwrap().bounds(), target);
        assert!(tree.scheduler().is_empty());
    }

    #[test]
    fn bounds_animation_reaches_destination() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.create_node();
        tree.add_child(root, a).unwrap();
        tree.set_bounds(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        let id = tree.animate(
            BoundsAccessor(a),
            Rect::new(0.0, 0.0, 20.0, 30.0),
            ActivityTiming::new(ms(100)).linear().starting_at(ms(0)),
        );
        assert!(id.is_some());
        tree.process_activities(ms(50));
        assert_eq!(tree.node(a).unwrap().bounds(), Rect::new(0.0, 0.0, 15.0, 20.0));
        assert_eq!(tree.full_bounds(a), Some(Rect::new(0.0, 0.0, 15.0, 20.0)));
        tree.process_activities(ms(400));
        assert_eq!(tree.node(a).unwrap().bounds(), Rect::new(0.0, 0.0, 20.0, 30.0));
        assert!(tree.scheduler().is_empty());
    }

    #[test]
    fn source_is_captured_at_start_not_at_schedule() {
        let mut tree = Tree::new();
        let a = tree.create_node();
        let _ = tree.animate(
            TransformAccessor(a),
            Affine::translate(Vec2::new(100.0, 0.0)),
            ActivityTiming::new(ms(100)).linear().starting_at(ms(100)),
        );
        tree.set_transform(a, Affine::translate(Vec2::new(50.0, 0.0)));
        tree.process_activities(ms(150));
        assert_eq!(
            tree.node(a).unwrap().transform(),
            Affine::translate(Vec2::new(75.0, 0.0))
        );
    }

    #[test]
    fn color_and_composite_helpers() {
        let mut tree = Tree::new();
        let a = tree.create_node();
        tree.set_paint(a, Some(Color::BLACK));
        tree.animate_to_color(a, Color::WHITE, ms(100)).unwrap();
        tree.animate_to_position_scale_rotation(a, 10.0, 20.0, 2.0, 0.0, ms(100))
            .unwrap();
        tree.process_activities(ms(0));
        tree.process_activities(ms(100));
        let n = tree.node(a).unwrap();
        assert_eq!(n.paint(), Some(Color::WHITE));
        assert_eq!(
            n.transform(),
            Affine::translate(Vec2::new(10.0, 20.0)) * Affine::scale(2.0)
        );
    }

    #[test]
    fn stale_nodes_are_not_animated() {
        let mut tree = Tree::new();
        let a = tree.create_node();
        tree.destroy(a);
        assert_eq!(tree.animate_to_color(a, Color::WHITE, ms(100)), None);
        assert!(tree.scheduler().is_empty());
    }
}
