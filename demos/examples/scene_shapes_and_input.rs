// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path shapes, geometric picking, and input bubbling.
//!
//! Run:
//! - `cargo run -p understory_scene_graph_demos --example scene_shapes_and_input`

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Point, Rect, Stroke};
use peniko::Color;
use understory_scene_graph::{
    EventContext, InputEvent, InputHandler, InputKind, Outcome, PathShape, Property, Tree,
};

/// Drags the node it is attached to by the pointer delta.
#[derive(Debug, Default)]
struct Drag {
    last: Option<Point>,
}

impl InputHandler for Drag {
    fn accepts(&self, _event: &InputEvent) -> bool {
        true
    }

    fn handle(
        &mut self,
        tree: &mut Tree,
        cx: &EventContext<'_>,
        event: &mut InputEvent,
    ) -> Outcome {
        match event.kind {
            InputKind::PointerDown => self.last = Some(event.position),
            InputKind::PointerMove => {
                if let Some(last) = self.last {
                    let d = event.position - last;
                    tree.translate_by(cx.node, d.x, d.y);
                    self.last = Some(event.position);
                }
            }
            InputKind::PointerUp => self.last = None,
            InputKind::Wheel(_) => return Outcome::Continue,
        }
        Outcome::StopAndConsume
    }
}

fn main() {
    tracing_subscriber::fmt().with_target(false).without_time().init();

    let mut tree = Tree::new();
    let root = tree.root();

    let ring = tree.create_node_with(
        PathShape::ellipse(Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_stroke(Stroke::new(6.0), Color::BLACK),
    );
    tree.add_child(root, ring).unwrap();
    println!("ring bounds: {:?}", tree.node(ring).unwrap().bounds());

    // Unfilled: the middle of the ring is not part of the shape.
    println!("pick centre: {:?}", tree.pick_point(Point::new(50.0, 50.0)));
    println!("pick rim: {:?}", tree.pick_point(Point::new(1.0, 50.0)).map(|h| h.node));

    let moves = Rc::new(Cell::new(0_u32));
    let counter = moves.clone();
    tree.add_property_listener(ring, Property::Transform, move |change| {
        counter.set(counter.get() + 1);
        println!("transform {:?} -> {:?}", change.old, change.new);
    })
    .unwrap();
    tree.add_input_handler(ring, Drag::default()).unwrap();

    let mut pointer = Point::new(1.0, 50.0);
    let hit = tree.pick_point(pointer).unwrap();
    let mut down = InputEvent::new(InputKind::PointerDown, pointer);
    tree.dispatch_input(&hit, &mut down);
    for _ in 0..3 {
        pointer.x += 10.0;
        let mut mv = InputEvent::new(InputKind::PointerMove, pointer);
        tree.dispatch_input(&hit, &mut mv);
    }
    let mut up = InputEvent::new(InputKind::PointerUp, pointer);
    tree.dispatch_input(&hit, &mut up);

    println!(
        "{} transform notifications; ring now at {:?}",
        moves.get(),
        tree.global_bounds(ring)
    );

    // Resizing a shape scales its path to fit.
    tree.set_bounds(ring, Rect::new(0.0, 0.0, 206.0, 56.0));
    let shape = tree.behavior::<PathShape>(ring).unwrap();
    println!("path bounds after resize: {:?}", shape.path_bounds());
}
