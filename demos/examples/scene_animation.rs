// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Activities and frame damage.
//!
//! Chain two animations and drive a simulated 60 Hz frame loop, printing the
//! rectangle each frame asks the display to repaint.
//!
//! Run:
//! - `cargo run -p understory_scene_graph_demos --example scene_animation`

use std::time::Duration;

use kurbo::{Affine, Rect, Vec2};
use peniko::Color;
use tracing_subscriber::filter::LevelFilter;
use understory_scene_graph::{
    ActivityTiming, DisplaySurface, PaintAccessor, TransformAccessor, Tree,
};

#[derive(Debug, Default)]
struct Console {
    frames: usize,
}

impl DisplaySurface for Console {
    fn invalidate(&mut self, rect: Rect) {
        self.frames += 1;
        println!("  repaint {rect:?}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_target(false)
        .without_time()
        .init();

    let mut tree = Tree::new();
    let root = tree.root();
    let dot = tree.create_node();
    tree.set_bounds(dot, Rect::new(0.0, 0.0, 20.0, 20.0));
    tree.set_paint(dot, Some(Color::BLACK));
    tree.add_child(root, dot).unwrap();

    let slide = tree
        .animate(
            TransformAccessor(dot),
            Affine::translate(Vec2::new(200.0, 0.0)),
            ActivityTiming::new(Duration::from_millis(250)),
        )
        .unwrap();
    let _fade = tree.animate(
        PaintAccessor(dot),
        Color::WHITE,
        ActivityTiming::new(Duration::from_millis(100)).after(slide),
    );

    let mut console = Console::default();
    let frame = Duration::from_micros(16_667);
    let mut now = Duration::ZERO;
    while !tree.scheduler().is_empty() {
        println!("frame at {now:?}");
        let _ = tree.process_frame(now, &mut console);
        now += frame;
    }
    println!(
        "{} frames repainted; dot ends at {:?}",
        console.frames,
        tree.global_bounds(dot)
    );
}
