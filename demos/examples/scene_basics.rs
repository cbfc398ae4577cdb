// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph basics.
//!
//! Build a small scene, query full bounds, pick, reorder, and paint.
//!
//! Run:
//! - `cargo run -p understory_scene_graph_demos --example scene_basics`

use kurbo::{Point, Rect};
use peniko::Color;
use understory_scene_graph::{PaintContext, RecordingRenderer, Tree};

fn main() {
    tracing_subscriber::fmt().with_target(false).without_time().init();

    let mut tree = Tree::new();
    let root = tree.root();

    let a = tree.create_node();
    tree.set_bounds(a, Rect::new(0.0, 0.0, 100.0, 80.0));
    tree.set_paint(a, Some(Color::from_rgb8(0xd0, 0x40, 0x40)));
    tree.add_child(root, a).unwrap();

    let b = tree.create_node();
    tree.set_bounds(b, Rect::new(0.0, 0.0, 100.0, 80.0));
    tree.set_paint(b, Some(Color::from_rgb8(0x40, 0x40, 0xd0)));
    tree.translate_by(b, 200.0, 200.0);
    tree.add_child(root, b).unwrap();

    println!("root full bounds: {:?}", tree.full_bounds(root));
    tree.scale_by(a, 1.5);
    println!("after scaling A: {:?}", tree.full_bounds(root));

    // Overlap B with A, then let A come to the front.
    tree.set_offset(b, 50.0, 50.0);
    let p = Point::new(60.0, 60.0);
    println!("pick {p:?}: {:?}", tree.pick_point(p).map(|h| h.node));
    tree.move_to_front(a).unwrap();
    let hit = tree.pick_point(p).unwrap();
    println!("after move_to_front: {:?} via {:?}", hit.node, hit.path);
    assert_eq!(hit.node, a, "A should be on top after move_to_front");

    let mut out = RecordingRenderer::new(Rect::new(0.0, 0.0, 400.0, 400.0));
    tree.full_paint(&mut PaintContext::new(&mut out));
    for (rect, color) in out.filled_rects() {
        println!("fill {rect:?} with {color:?}");
    }
    println!("damage so far: {:?}", tree.take_damage().union_rect());
}
