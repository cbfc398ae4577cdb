// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};
use understory_scene_graph::peniko::Color;
use understory_scene_graph::{NodeId, PaintContext, RecordingRenderer, Tree};

/// `rows` row nodes under the root, each holding `cols` cells.
fn build_grid(rows: usize, cols: usize, cell: f64) -> (Tree, Vec<NodeId>) {
    let mut tree = Tree::new();
    let root = tree.root();
    let mut leaves = Vec::with_capacity(rows * cols);
    for y in 0..rows {
        let row = tree.create_node();
        tree.translate_by(row, 0.0, y as f64 * cell);
        tree.add_child(root, row).unwrap();
        for x in 0..cols {
            let c = tree.create_node();
            tree.set_bounds(c, Rect::new(0.0, 0.0, cell * 0.9, cell * 0.9));
            tree.translate_by(c, x as f64 * cell, 0.0);
            tree.set_paint(c, Some(Color::BLACK));
            tree.add_child(row, c).unwrap();
            leaves.push(c);
        }
    }
    let _ = tree.full_bounds(root);
    (tree, leaves)
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_f64(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1_u64 << 53) as f64
    }
}

fn bench_revalidate(c: &mut Criterion) {
    let mut group = c.benchmark_group("revalidate_one_leaf");
    for n in [32_usize, 64, 128] {
        let (mut tree, leaves) = build_grid(n, n, 10.0);
        let root = tree.root();
        let mid = leaves[leaves.len() / 2];
        let mut flip = 1.0;
        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("{n}x{n}"), |b| {
            b.iter(|| {
                tree.translate_by(mid, flip, 0.0);
                flip = -flip;
                black_box(tree.full_bounds(root));
                black_box(tree.take_damage());
            });
        });
    }
    group.finish();
}

fn bench_pick(c: &mut Criterion) {
    let mut group = c.benchmark_group("pick_point");
    for n in [32_usize, 64, 128] {
        let (mut tree, _) = build_grid(n, n, 10.0);
        let extent = n as f64 * 10.0;
        let mut rng = Rng::new(0x9E37_79B9_7F4A_7C15);
        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("{n}x{n}"), |b| {
            b.iter(|| {
                let p = Point::new(rng.next_f64() * extent, rng.next_f64() * extent);
                black_box(tree.pick_point(p));
            });
        });
    }
    group.finish();
}

fn bench_paint(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_paint_viewport");
    for n in [32_usize, 128] {
        let (mut tree, _) = build_grid(n, n, 10.0);
        group.bench_function(format!("{n}x{n}"), |b| {
            b.iter(|| {
                let mut out = RecordingRenderer::new(Rect::new(0.0, 0.0, 320.0, 240.0));
                tree.full_paint(&mut PaintContext::new(&mut out));
                black_box(out.ops.len());
            });
        });
    }
    group.finish();
}

fn bench_activities(c: &mut Criterion) {
    let mut group = c.benchmark_group("animate_leaves");
    let n = 32_usize;
    let (mut tree, leaves) = build_grid(n, n, 10.0);
    for &leaf in &leaves {
        let _ = tree.animate_to_bounds(
            leaf,
            Rect::new(0.0, 0.0, 5.0, 5.0),
            Duration::from_secs(3600),
        );
    }
    let mut now = Duration::ZERO;
    group.throughput(Throughput::Elements(leaves.len() as u64));
    group.bench_function(format!("{n}x{n}"), |b| {
        b.iter(|| {
            now += Duration::from_millis(16);
            tree.process_activities(now);
            let root = tree.root();
            black_box(tree.full_bounds(root));
            black_box(tree.take_damage());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_revalidate,
    bench_pick,
    bench_paint,
    bench_activities
);
criterion_main!(benches);
