// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers, flags, notification kinds, and config.

use alloc::rc::Rc;
use core::any::Any;

use kurbo::{Affine, Rect};
use peniko::Color;

/// Identifier for a node in the tree.
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On create, a fresh slot is allocated with generation `1`.
/// - On destroy, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Use [`Tree::is_alive`](crate::Tree::is_alive) to check whether a `NodeId` still
/// refers to a live node.
/// Stale `NodeId`s never alias a different live node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility, picking, and bounds volatility.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible. Invisible nodes neither paint nor report damage.
        const VISIBLE           = 0b0000_0001;
        /// Node itself may be the result of a pick.
        const PICKABLE          = 0b0000_0010;
        /// Pick traversal descends into the children of this node.
        const CHILDREN_PICKABLE = 0b0000_0100;
        /// Node does not paint itself (its children still paint).
        const OCCLUDED          = 0b0000_1000;
        /// Bounds are re-derived on every validation pass.
        const BOUNDS_VOLATILE   = 0b0001_0000;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE | Self::CHILDREN_PICKABLE
    }
}

bitflags::bitflags! {
    /// Cached-state invalidation bits of a node.
    ///
    /// These are maintained by the tree; they are exposed read-only through
    /// [`Node::invalidation`](crate::Node::invalidation) for inspection.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Invalidation: u8 {
        /// The node itself must be repainted.
        const PAINT                 = 0b0000_0001;
        /// Some descendant must be repainted.
        const CHILD_PAINT           = 0b0000_0010;
        /// The full bounds cache of this node is stale.
        const FULL_BOUNDS           = 0b0000_0100;
        /// Some descendant has a stale full bounds cache.
        const CHILD_BOUNDS          = 0b0000_1000;
        /// Some descendant has volatile bounds.
        const CHILD_BOUNDS_VOLATILE = 0b0001_0000;
        /// Bounds were set explicitly since the last validation pass.
        const BOUNDS_CHANGED        = 0b0010_0000;
    }
}

/// Kinds of property-change notifications emitted by the tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Property {
    /// Local bounds changed.
    Bounds,
    /// Cached full bounds changed during validation.
    FullBounds,
    /// Local transform changed.
    Transform,
    /// Visibility changed.
    Visible,
    /// Pickability changed.
    Pickable,
    /// Children pickability changed.
    ChildrenPickable,
    /// Occlusion changed.
    Occluded,
    /// Paint color changed.
    Paint,
    /// Children were added, removed, or reordered.
    Children,
    /// Parent link changed.
    Parent,
    /// User tag changed.
    Tag,
}

impl Property {
    /// Mask bit for this property.
    pub const fn mask(self) -> PropertyMask {
        match self {
            Self::Bounds => PropertyMask::BOUNDS,
            Self::FullBounds => PropertyMask::FULL_BOUNDS,
            Self::Transform => PropertyMask::TRANSFORM,
            Self::Visible => PropertyMask::VISIBLE,
            Self::Pickable => PropertyMask::PICKABLE,
            Self::ChildrenPickable => PropertyMask::CHILDREN_PICKABLE,
            Self::Occluded => PropertyMask::OCCLUDED,
            Self::Paint => PropertyMask::PAINT,
            Self::Children => PropertyMask::CHILDREN,
            Self::Parent => PropertyMask::PARENT,
            Self::Tag => PropertyMask::TAG,
        }
    }
}

bitflags::bitflags! {
    /// Selects which property-change notifications a node forwards to its parent's listeners.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PropertyMask: u16 {
        /// See [`Property::Bounds`].
        const BOUNDS            = 1 << 0;
        /// See [`Property::FullBounds`].
        const FULL_BOUNDS       = 1 << 1;
        /// See [`Property::Transform`].
        const TRANSFORM         = 1 << 2;
        /// See [`Property::Visible`].
        const VISIBLE           = 1 << 3;
        /// See [`Property::Pickable`].
        const PICKABLE          = 1 << 4;
        /// See [`Property::ChildrenPickable`].
        const CHILDREN_PICKABLE = 1 << 5;
        /// See [`Property::Occluded`].
        const OCCLUDED          = 1 << 6;
        /// See [`Property::Paint`].
        const PAINT             = 1 << 7;
        /// See [`Property::Children`].
        const CHILDREN          = 1 << 8;
        /// See [`Property::Parent`].
        const PARENT            = 1 << 9;
        /// See [`Property::Tag`].
        const TAG               = 1 << 10;
    }
}

/// Old or new value carried by a [`PropertyChange`](crate::PropertyChange).
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// No value is attached (for example, children lists).
    None,
    /// A rectangle (bounds or full bounds).
    Rect(Rect),
    /// An affine transform.
    Transform(Affine),
    /// A boolean flag.
    Bool(bool),
    /// A paint color.
    Paint(Option<Color>),
    /// A node link (parent).
    Node(Option<NodeId>),
}

/// Opaque user payload attached to a node.
///
/// The tree never inspects it; clones of a node share the same payload.
pub type Tag = Rc<dyn Any>;

/// Runtime configuration for a [`Tree`](crate::Tree).
#[derive(Clone, Copy, Debug)]
pub struct TreeConfig {
    /// Edge length of the square region used by [`Tree::pick_point`](crate::Tree::pick_point).
    pub pick_halo: f64,
    /// Bubble mask given to newly created nodes.
    pub default_bubble_mask: PropertyMask,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            pick_halo: 1.0,
            default_bubble_mask: PropertyMask::empty(),
        }
    }
}
