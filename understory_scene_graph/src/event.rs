// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-change notifications and input event bubbling.
//!
//! ## Property changes
//!
//! Observers register per node and per [`Property`] kind. A change on a node is
//! delivered to that node's observers of the same kind in registration order,
//! then forwarded to the parent while the forwarding node's
//! [bubble mask](crate::Node::bubble_mask) contains the kind.
//!
//! ## Input
//!
//! [`Tree::dispatch_input`] takes the result of a pick and walks from the
//! picked node toward the root. Each node's [`InputHandler`]s run in
//! registration order if they [accept](InputHandler::accepts) the event.
//! The handler's [`Outcome`] decides whether propagation continues.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::{Point, Vec2};

use crate::Tree;
use crate::error::SceneError;
use crate::pick::Hit;
use crate::types::{NodeId, Property, PropertyValue};

/// Handle for a registered property listener or input handler.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A property-change notification.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    /// Node whose property changed.
    pub node: NodeId,
    /// Which property changed.
    pub property: Property,
    /// Value before the change.
    pub old: PropertyValue,
    /// Value after the change.
    pub new: PropertyValue,
}

pub(crate) struct PropertyListener {
    pub(crate) id: ListenerId,
    pub(crate) property: Property,
    pub(crate) callback: Box<dyn FnMut(&PropertyChange)>,
}

impl Debug for PropertyListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyListener")
            .field("id", &self.id)
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

/// Handler outcome controlling propagation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Continue toward the root.
    Continue,
    /// Finish the current node's handlers, then stop.
    Stop,
    /// Mark the event handled and stop immediately.
    StopAndConsume,
}

/// Kind of input event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputKind {
    /// A pointer button was pressed.
    PointerDown,
    /// A pointer button was released.
    PointerUp,
    /// The pointer moved.
    PointerMove,
    /// Scroll wheel or trackpad delta.
    Wheel(Vec2),
}

/// An input event routed through the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct InputEvent {
    /// What happened.
    pub kind: InputKind,
    /// Position in global space.
    pub position: Point,
    /// Set once a handler consumed the event.
    pub handled: bool,
}

impl InputEvent {
    /// A fresh, unhandled event.
    pub fn new(kind: InputKind, position: Point) -> Self {
        Self {
            kind,
            position,
            handled: false,
        }
    }
}

/// Where in the propagation an input handler is being invoked.
#[derive(Clone, Copy, Debug)]
pub struct EventContext<'a> {
    /// Node whose handler is running.
    pub node: NodeId,
    /// Node returned by the pick.
    pub target: NodeId,
    /// Root→target path of the pick.
    pub path: &'a [NodeId],
}

/// A node-scoped input listener.
pub trait InputHandler: Debug {
    /// Whether this handler wants the event. By default, only unhandled events are accepted.
    fn accepts(&self, event: &InputEvent) -> bool {
        !event.handled
    }

    /// Handle the event. The handler may edit the tree.
    fn handle(&mut self, tree: &mut Tree, cx: &EventContext<'_>, event: &mut InputEvent) -> Outcome;
}

impl Tree {
    fn next_listener_id(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }

    /// Register a property-change observer on `node`.
    pub fn add_property_listener(
        &mut self,
        node: NodeId,
        property: Property,
        callback: impl FnMut(&PropertyChange) + 'static,
    ) -> Result<ListenerId, SceneError> {
        if !self.is_alive(node) {
            return Err(SceneError::StaleNode(node));
        }
        let id = self.next_listener_id();
        self.node_mut(node).listeners.push(PropertyListener {
            id,
            property,
            callback: Box::new(callback),
        });
        Ok(id)
    }

    /// Register an input handler on `node`.
    pub fn add_input_handler(
        &mut self,
        node: NodeId,
        handler: impl InputHandler + 'static,
    ) -> Result<ListenerId, SceneError> {
        if !self.is_alive(node) {
            return Err(SceneError::StaleNode(node));
        }
        let id = self.next_listener_id();
        self.node_mut(node)
            .input_handlers
            .push((id, Box::new(handler)));
        Ok(id)
    }

    /// Unregister a property listener or input handler. Returns false if it was not found.
    pub fn remove_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(n) = self.node_opt_mut(node) else {
            return false;
        };
        let before = n.listeners.len() + n.input_handlers.len();
        n.listeners.retain(|l| l.id != id);
        n.input_handlers.retain(|(h, _)| *h != id);
        if before != n.listeners.len() + n.input_handlers.len() {
            return true;
        }
        // Handlers of nodes being dispatched to are held by `dispatch_input`.
        if self.dispatch_checked_out.contains(&(node, id))
            && !self.dispatch_removals.contains(&id)
        {
            self.dispatch_removals.push(id);
            return true;
        }
        false
    }

    /// Deliver a property change to `node` and bubble it per the bubble masks.
    pub(crate) fn fire_property_change(
        &mut self,
        node: NodeId,
        property: Property,
        old: PropertyValue,
        new: PropertyValue,
    ) {
        let change = PropertyChange {
            node,
            property,
            old,
            new,
        };
        let mask = property.mask();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = self.node_opt_mut(id) else {
                break;
            };
            for l in n.listeners.iter_mut().filter(|l| l.property == property) {
                (l.callback)(&change);
            }
            if !n.bubble_mask.contains(mask) {
                break;
            }
            current = n.parent;
        }
    }

    /// Bubble `event` from the picked node toward the root.
    ///
    /// Returns true if the event ended up handled.
    pub fn dispatch_input(&mut self, hit: &Hit, event: &mut InputEvent) -> bool {
        self.dispatch_depth += 1;
        for &node in hit.path.iter().rev() {
            let Some(n) = self.node_opt_mut(node) else {
                continue;
            };
            let mut handlers = core::mem::take(&mut n.input_handlers);
            self.dispatch_checked_out
                .extend(handlers.iter().map(|(id, _)| (node, *id)));
            let cx = EventContext {
                node,
                target: hit.node,
                path: &hit.path,
            };
            let mut stop = false;
            for (id, handler) in handlers.iter_mut() {
                if self.dispatch_removals.contains(id) || !handler.accepts(event) {
                    continue;
                }
                match handler.handle(self, &cx, event) {
                    Outcome::Continue => {}
                    Outcome::Stop => stop = true,
                    Outcome::StopAndConsume => {
                        event.handled = true;
                        stop = true;
                        break;
                    }
                }
            }
            self.restore_handlers(node, handlers);
            if stop {
                break;
            }
        }
        self.dispatch_depth -= 1;
        if self.dispatch_depth == 0 {
            self.dispatch_removals.clear();
        }
        event.handled
    }

    fn restore_handlers(
        &mut self,
        node: NodeId,
        mut handlers: Vec<(ListenerId, Box<dyn InputHandler>)>,
    ) {
        self.dispatch_checked_out
            .retain(|(n, id)| *n != node || handlers.iter().all(|(h, _)| h != id));
        let removals = core::mem::take(&mut self.dispatch_removals);
        handlers.retain(|(id, _)| !removals.contains(id));
        self.dispatch_removals = removals;
        if let Some(n) = self.node_opt_mut(node) {
            // Handlers registered while dispatching go after the existing ones.
            handlers.append(&mut n.input_handlers);
            n.input_handlers = handlers;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;
    use kurbo::Rect;

    use crate::types::PropertyMask;

    #[derive(Debug)]
    struct Record {
        log: Rc<RefCell<Vec<(&'static str, NodeId)>>>,
        name: &'static str,
        outcome: Outcome,
    }

    impl InputHandler for Record {
        fn handle(
            &mut self,
            _tree: &mut Tree,
            cx: &EventContext<'_>,
            _event: &mut InputEvent,
        ) -> Outcome {
            self.log.borrow_mut().push((self.name, cx.node));
            self.outcome
        }
    }

    fn two_level() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let child = tree.create_node();
        tree.set_bounds(child, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.add_child(root, child).unwrap();
        (tree, root, child)
    }

    #[test]
    fn listeners_fire_in_order_for_matching_kind() {
        let (mut tree, _root, child) = two_level();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s1 = seen.clone();
        tree.add_property_listener(child, Property::Bounds, move |c| {
            s1.borrow_mut().push((1, c.new.clone()));
        })
        .unwrap();
        let s2 = seen.clone();
        tree.add_property_listener(child, Property::Bounds, move |c| {
            s2.borrow_mut().push((2, c.new.clone()));
        })
        .unwrap();
        let s3 = seen.clone();
        tree.add_property_listener(child, Property::Visible, move |_| {
            s3.borrow_mut().push((3, PropertyValue::None));
        })
        .unwrap();

        let r = Rect::new(0.0, 0.0, 20.0, 20.0);
        tree.set_bounds(child, r);
        assert_eq!(
            *seen.borrow(),
            vec![(1, PropertyValue::Rect(r)), (2, PropertyValue::Rect(r))]
        );
    }

    #[test]
    fn bubbling_respects_the_mask_of_the_forwarding_node() {
        let (mut tree, root, child) = two_level();
        let count = Rc::new(RefCell::new(0_u32));
        let c = count.clone();
        tree.add_property_listener(root, Property::Transform, move |change| {
            assert_eq!(change.property, Property::Transform);
            *c.borrow_mut() += 1;
        })
        .unwrap();

        tree.translate_by(child, 5.0, 0.0);
        assert_eq!(*count.borrow(), 0, "empty mask does not forward");

        tree.set_bubble_mask(child, PropertyMask::TRANSFORM);
        tree.translate_by(child, 5.0, 0.0);
        assert_eq!(*count.borrow(), 1);

        tree.set_bubble_mask(child, PropertyMask::BOUNDS);
        tree.translate_by(child, 5.0, 0.0);
        assert_eq!(*count.borrow(), 1, "other kinds are not forwarded");
    }

    #[test]
    fn removed_listener_no_longer_fires() {
        let (mut tree, _root, child) = two_level();
        let count = Rc::new(RefCell::new(0_u32));
        let c = count.clone();
        let id = tree
            .add_property_listener(child, Property::Paint, move |_| *c.borrow_mut() += 1)
            .unwrap();
        tree.set_paint(child, Some(peniko::Color::WHITE));
        assert!(tree.remove_listener(child, id));
        tree.set_paint(child, None);
        assert_eq!(*count.borrow(), 1);
        assert!(!tree.remove_listener(child, id));
    }

    #[test]
    fn input_bubbles_target_to_root_until_stopped() {
        let (mut tree, root, child) = two_level();
        let log = Rc::new(RefCell::new(Vec::new()));
        tree.add_input_handler(
            root,
            Record {
                log: log.clone(),
                name: "root",
                outcome: Outcome::Continue,
            },
        )
        .unwrap();
        tree.add_input_handler(
            child,
            Record {
                log: log.clone(),
                name: "child",
                outcome: Outcome::Continue,
            },
        )
        .unwrap();

        let hit = tree.pick_point(Point::new(5.0, 5.0)).expect("child is hit");
        assert_eq!(hit.node, child);
        let mut ev = InputEvent::new(InputKind::PointerDown, Point::new(5.0, 5.0));
        assert!(!tree.dispatch_input(&hit, &mut ev));
        assert_eq!(*log.borrow(), vec![("child", child), ("root", root)]);

        log.borrow_mut().clear();
        tree.add_input_handler(
            child,
            Record {
                log: log.clone(),
                name: "consumer",
                outcome: Outcome::StopAndConsume,
            },
        )
        .unwrap();
        let mut ev = InputEvent::new(InputKind::PointerUp, Point::new(5.0, 5.0));
        assert!(tree.dispatch_input(&hit, &mut ev));
        assert_eq!(
            *log.borrow(),
            vec![("child", child), ("consumer", child)],
            "root must not see a consumed event"
        );
    }

    #[derive(Debug)]
    struct MoveOnDrag;

    impl InputHandler for MoveOnDrag {
        fn accepts(&self, event: &InputEvent) -> bool {
            matches!(event.kind, InputKind::PointerMove)
        }

        fn handle(
            &mut self,
            tree: &mut Tree,
            cx: &EventContext<'_>,
            _event: &mut InputEvent,
        ) -> Outcome {
            tree.translate_by(cx.node, 10.0, 0.0);
            Outcome::Stop
        }
    }

    #[test]
    fn handlers_can_edit_the_tree() {
        let (mut tree, _root, child) = two_level();
        tree.add_input_handler(child, MoveOnDrag).unwrap();
        let hit = tree.pick_point(Point::new(5.0, 5.0)).unwrap();

        let mut down = InputEvent::new(InputKind::PointerDown, Point::new(5.0, 5.0));
        tree.dispatch_input(&hit, &mut down);
        assert_eq!(tree.node(child).unwrap().transform().translation().x, 0.0);

        let mut mv = InputEvent::new(InputKind::PointerMove, Point::new(6.0, 5.0));
        tree.dispatch_input(&hit, &mut mv);
        assert_eq!(tree.node(child).unwrap().transform().translation().x, 10.0);
    }

    type Removals = Rc<RefCell<Vec<(NodeId, ListenerId)>>>;

    #[derive(Debug)]
    struct Remover {
        targets: Removals,
        results: Rc<RefCell<Vec<bool>>>,
    }

    impl InputHandler for Remover {
        fn handle(
            &mut self,
            tree: &mut Tree,
            _cx: &EventContext<'_>,
            _event: &mut InputEvent,
        ) -> Outcome {
            for (node, id) in self.targets.borrow_mut().drain(..) {
                let removed = tree.remove_listener(node, id);
                self.results.borrow_mut().push(removed);
            }
            Outcome::Continue
        }
    }

    #[test]
    fn removal_during_dispatch_reports_only_known_handlers() {
        let (mut tree, root, child) = two_level();
        let log = Rc::new(RefCell::new(Vec::new()));
        let targets = Removals::default();
        let results = Rc::new(RefCell::new(Vec::new()));
        tree.add_input_handler(
            child,
            Remover {
                targets: targets.clone(),
                results: results.clone(),
            },
        )
        .unwrap();
        let later = tree
            .add_input_handler(
                child,
                Record {
                    log: log.clone(),
                    name: "later",
                    outcome: Outcome::Continue,
                },
            )
            .unwrap();
        let gone = tree.add_property_listener(child, Property::Paint, |_| {}).unwrap();
        assert!(tree.remove_listener(child, gone));

        targets.borrow_mut().extend([(child, later), (child, gone), (root, later)]);
        let hit = tree.pick_point(Point::new(5.0, 5.0)).unwrap();
        let mut ev = InputEvent::new(InputKind::PointerDown, Point::new(5.0, 5.0));
        tree.dispatch_input(&hit, &mut ev);

        assert_eq!(*results.borrow(), vec![true, false, false]);
        assert!(log.borrow().is_empty(), "removed handler must not run");
        assert!(!tree.remove_listener(child, later));
    }
}
