// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scene Graph: a Kurbo-native retained-mode 2D scene graph.
//!
//! Nodes form a single-parent tree. Each node carries local bounds, an affine
//! transform into its parent, flags for visibility and picking, an optional
//! paint color, and a [`NodeBehavior`] that supplies paint, pick and layout.
//!
//! - Full bounds (a node's own bounds plus its descendants', in parent space)
//!   are cached and revalidated lazily. Invalidation marks only the path up to
//!   the display root, so a validation pass visits just the dirty subtrees.
//! - Picking walks the tree front to back and returns the topmost node together
//!   with its path from the root.
//! - Paint invalidation turns into surface-space damage. [`Tree::process_frame`]
//!   coalesces a frame's damage into one rectangle for the [`DisplaySurface`].
//! - Activities are time-based tasks stepped each frame. [`Tree::animate`] and
//!   its helpers interpolate node properties with optional easing.
//!
//! ## API overview
//!
//! - [`Tree`]: arena owning all nodes, the display root, damage and activities.
//! - [`Node`]: per-node state, read through [`Tree::node`].
//! - [`NodeBehavior`]: hooks for custom paint, pick, layout and derived bounds.
//! - [`PathShape`]: a behavior drawing a [`kurbo::BezPath`].
//! - [`Hit`]: pick result with the path from the root.
//! - [`ActivityTiming`] and [`Activity`]: scheduling primitives.
//!
//! ## Not a renderer
//!
//! Painting goes through the [`Renderer`] trait. [`RecordingRenderer`]
//! captures operations for inspection; hosts plug in their own backend.
//!
//! ### Minimal usage
//!
//! ```
//! use understory_scene_graph::{RecordingRenderer, PaintContext, Tree};
//! use kurbo::{Point, Rect};
//! use peniko::Color;
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//!
//! let a = tree.create_node();
//! tree.set_bounds(a, Rect::new(0.0, 0.0, 100.0, 80.0));
//! tree.set_paint(a, Some(Color::WHITE));
//! tree.add_child(root, a).unwrap();
//!
//! let b = tree.create_node();
//! tree.set_bounds(b, Rect::new(0.0, 0.0, 50.0, 50.0));
//! tree.translate_by(b, 60.0, 40.0);
//! tree.add_child(root, b).unwrap();
//!
//! // Full bounds of the root cover both children.
//! assert_eq!(tree.full_bounds(root), Some(Rect::new(0.0, 0.0, 110.0, 90.0)));
//!
//! // The later sibling is on top.
//! assert_eq!(tree.pick_point(Point::new(70.0, 50.0)).unwrap().node, b);
//!
//! let mut out = RecordingRenderer::new(Rect::new(0.0, 0.0, 200.0, 200.0));
//! tree.full_paint(&mut PaintContext::new(&mut out));
//! assert_eq!(out.filled_rects().len(), 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod activity;
mod behavior;
mod bounds;
mod damage;
mod error;
mod event;
mod interpolate;
mod node;
mod paint;
mod pick;
mod shape;
mod transform;
mod tree;
mod types;
mod util;

pub use activity::{Activity, ActivityId, ActivityScheduler, ActivityTiming, InterpolationMode};
pub use behavior::{NodeBehavior, PlainNode, paint_bounds};
pub use damage::{Damage, DisplaySurface};
pub use error::SceneError;
pub use event::{
    EventContext, InputEvent, InputHandler, InputKind, ListenerId, Outcome, PropertyChange,
};
pub use interpolate::{
    BoundsAccessor, Interpolate, InterpolatingActivity, PaintAccessor, PropertyAccessor,
    TransformAccessor,
};
pub use node::Node;
pub use paint::{PaintContext, RecordingRenderer, RenderOp, Renderer};
pub use pick::Hit;
pub use shape::PathShape;
pub use tree::{NodeFilter, Tree};
pub use types::{
    Invalidation, NodeFlags, NodeId, Property, PropertyMask, PropertyValue, Tag, TreeConfig,
};

pub use kurbo;
pub use peniko;
