// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector path nodes.

use alloc::boxed::Box;
use core::any::Any;

use kurbo::{Affine, BezPath, Line, ParamCurve, PathSeg, Point, Rect, Shape, Stroke, Vec2};
use peniko::Color;

use crate::behavior::NodeBehavior;
use crate::node::Node;
use crate::paint::PaintContext;
use crate::util;

/// A node drawn from a [`BezPath`].
///
/// The fill color is the node's paint ([`Tree::set_paint`](crate::Tree::set_paint)),
/// so color animations apply to shapes too. The stroke is optional.
///
/// Bounds follow the geometry: they are the path's bounding box widened by
/// half the stroke width. Setting bounds explicitly scales the path to fit.
#[derive(Clone, Debug)]
pub struct PathShape {
    path: BezPath,
    stroke: Option<(Stroke, Color)>,
    volatile: bool,
}

impl PathShape {
    /// Shape for `path` with no stroke.
    pub fn new(path: BezPath) -> Self {
        Self {
            path,
            stroke: None,
            volatile: false,
        }
    }

    /// Shape from any kurbo shape, flattened to a path.
    pub fn from_shape(shape: &impl Shape) -> Self {
        Self::new(shape.to_path(0.1))
    }

    /// Axis-aligned rectangle.
    pub fn rect(rect: Rect) -> Self {
        Self::from_shape(&rect)
    }

    /// Ellipse inscribed in `rect`.
    pub fn ellipse(rect: Rect) -> Self {
        Self::from_shape(&kurbo::Ellipse::from_rect(rect))
    }

    /// Open polyline through `points`.
    pub fn polyline(points: &[Point]) -> Self {
        let mut path = BezPath::new();
        if let Some((first, rest)) = points.split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
        }
        Self::new(path)
    }

    /// Add a stroke.
    pub fn with_stroke(mut self, stroke: Stroke, color: Color) -> Self {
        self.stroke = Some((stroke, color));
        self
    }

    /// Re-derive bounds from the path on every validation pass.
    ///
    /// Use this when the path is edited through [`path_mut`](Self::path_mut)
    /// from code that cannot go through [`Tree::update_behavior`](crate::Tree::update_behavior).
    pub fn with_volatile_bounds(mut self, volatile: bool) -> Self {
        self.volatile = volatile;
        self
    }

    /// The path in local coordinates.
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// Mutable access to the path.
    pub fn path_mut(&mut self) -> &mut BezPath {
        &mut self.path
    }

    /// Replace the path.
    pub fn set_path(&mut self, path: BezPath) {
        self.path = path;
    }

    /// Stroke style and color, if stroked.
    pub fn stroke(&self) -> Option<&(Stroke, Color)> {
        self.stroke.as_ref()
    }

    /// Replace or remove the stroke.
    pub fn set_stroke(&mut self, stroke: Option<(Stroke, Color)>) {
        self.stroke = stroke;
    }

    fn half_width(&self) -> f64 {
        self.stroke.as_ref().map_or(0.0, |(s, _)| s.width * 0.5)
    }

    /// Bounding box of the path alone.
    pub fn path_bounds(&self) -> Rect {
        self.path.bounding_box()
    }

    /// Bounding box of the path widened by the stroke.
    pub fn stroked_bounds(&self) -> Rect {
        let hw = self.half_width();
        self.path_bounds().inflate(hw, hw)
    }

    /// Scale and move the path so that its stroked bounds fill `bounds`.
    ///
    /// A zero extent (of the path or of the target) keeps a scale factor of 1
    /// on that axis. Results that are not finite leave the path unchanged.
    fn fit_to(&mut self, bounds: Rect) {
        let path_bounds = self.path_bounds();
        let stroked = self.stroked_bounds();
        let outset = (stroked.width() - path_bounds.width())
            .max(stroked.height() - path_bounds.height());
        let x = bounds.x0 + outset / 2.0;
        let y = bounds.y0 + outset / 2.0;
        let w = bounds.width() - outset;
        let h = bounds.height() - outset;
        let sx = if w == 0.0 || path_bounds.width() == 0.0 {
            1.0
        } else {
            w / path_bounds.width()
        };
        let sy = if h == 0.0 || path_bounds.height() == 0.0 {
            1.0
        } else {
            h / path_bounds.height()
        };
        let fit = Affine::translate(Vec2::new(x, y))
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate(-path_bounds.origin().to_vec2());
        if !fit.is_finite() {
            tracing::debug!(?bounds, ?path_bounds, "skipping non-finite path fit");
            return;
        }
        self.path.apply_affine(fit);
    }

    fn fill_touches(&self, region: Rect) -> bool {
        self.path.contains(region.center())
            || self.path.segments().any(|seg| touches(seg, region))
    }

    fn stroke_touches(&self, region: Rect) -> bool {
        let hw = self.half_width();
        let grown = region.inflate(hw, hw);
        self.path.segments().any(|seg| touches(seg, grown))
    }
}

/// True if `seg` has a point inside `r` or crosses one of its edges.
fn touches(seg: PathSeg, r: Rect) -> bool {
    if r.contains(seg.start()) || r.contains(seg.end()) {
        return true;
    }
    let edges = [
        Line::new((r.x0, r.y0), (r.x1, r.y0)),
        Line::new((r.x1, r.y0), (r.x1, r.y1)),
        Line::new((r.x1, r.y1), (r.x0, r.y1)),
        Line::new((r.x0, r.y1), (r.x0, r.y0)),
    ];
    edges.iter().any(|e| !seg.intersect_line(*e).is_empty())
}

impl NodeBehavior for PathShape {
    fn paint(&self, node: &Node, cx: &mut PaintContext<'_>) {
        if let Some(color) = node.paint() {
            cx.renderer().fill_path(&self.path, color);
        }
        if let Some((stroke, color)) = &self.stroke {
            cx.renderer().stroke_path(&self.path, stroke, *color);
        }
    }

    fn pick(&self, node: &Node, region: Rect) -> bool {
        self.intersects(node, region)
    }

    fn intersects(&self, node: &Node, region: Rect) -> bool {
        if !util::intersects(node.bounds(), region) {
            return false;
        }
        (node.paint().is_some() && self.fill_touches(region))
            || (self.stroke.is_some() && self.stroke_touches(region))
    }

    fn bounds_volatile(&self) -> bool {
        self.volatile
    }

    fn compute_bounds(&self, _node: &Node) -> Option<Rect> {
        Some(self.stroked_bounds())
    }

    fn bounds_changed(&mut self, _old: Rect, new: Rect) {
        self.fit_to(new);
    }

    fn clone_box(&self) -> Box<dyn NodeBehavior> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{BezPath, Point, Rect, Shape, Stroke};
    use peniko::Color;

    use super::PathShape;
    use crate::Tree;
    use crate::paint::{PaintContext, RecordingRenderer, RenderOp};

    fn close(a: Rect, b: Rect) -> bool {
        let d = [a.x0 - b.x0, a.y0 - b.y0, a.x1 - b.x1, a.y1 - b.y1];
        d.iter().all(|v| *v < 1e-6 && *v > -1e-6)
    }

    #[test]
    fn bounds_follow_path_and_stroke() {
        let mut tree = Tree::new();
        let plain = tree.create_node_with(PathShape::rect(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(
            tree.node(plain).unwrap().bounds(),
            Rect::new(0.0, 0.0, 10.0, 10.0)
        );
        let stroked = tree.create_node_with(
            PathShape::rect(Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_stroke(Stroke::new(2.0), Color::BLACK),
        );
        assert_eq!(
            tree.node(stroked).unwrap().bounds(),
            Rect::new(-1.0, -1.0, 11.0, 11.0)
        );
    }

    #[test]
    fn editing_the_path_rederives_bounds() {
        let mut tree = Tree::new();
        let id = tree.create_node_with(PathShape::rect(Rect::new(0.0, 0.0, 10.0, 10.0)));
        tree.update_behavior::<PathShape, _>(id, |s| {
            s.set_path(Rect::new(5.0, 5.0, 50.0, 20.0).to_path(0.1));
        })
        .unwrap();
        assert_eq!(tree.node(id).unwrap().bounds(), Rect::new(5.0, 5.0, 50.0, 20.0));
    }

    #[test]
    fn setting_bounds_fits_the_path() {
        let mut tree = Tree::new();
        let id = tree.create_node_with(PathShape::rect(Rect::new(0.0, 0.0, 10.0, 10.0)));
        tree.set_bounds(id, Rect::new(10.0, 10.0, 30.0, 50.0));
        let shape = tree.behavior::<PathShape>(id).unwrap();
        assert!(close(shape.path_bounds(), Rect::new(10.0, 10.0, 30.0, 50.0)));
    }

    #[test]
    fn fitting_accounts_for_stroke_outset() {
        let mut tree = Tree::new();
        let id = tree.create_node_with(
            PathShape::rect(Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_stroke(Stroke::new(2.0), Color::BLACK),
        );
        tree.set_bounds(id, Rect::new(0.0, 0.0, 22.0, 22.0));
        let shape = tree.behavior::<PathShape>(id).unwrap();
        assert!(close(shape.path_bounds(), Rect::new(1.0, 1.0, 21.0, 21.0)));
        assert!(close(shape.stroked_bounds(), Rect::new(0.0, 0.0, 22.0, 22.0)));
    }

    #[test]
    fn flat_path_keeps_unit_scale_on_flat_axis() {
        let mut tree = Tree::new();
        let line = PathShape::polyline(&[Point::new(0.0, 5.0), Point::new(10.0, 5.0)]);
        let id = tree.create_node_with(line);
        tree.set_bounds(id, Rect::new(0.0, 0.0, 20.0, 20.0));
        let shape = tree.behavior::<PathShape>(id).unwrap();
        let b = shape.path_bounds();
        assert!(b.x0.is_finite() && b.y0.is_finite());
        assert!(close(b, Rect::new(0.0, 0.0, 20.0, 0.0)));
    }

    #[test]
    fn non_finite_fit_is_skipped() {
        let mut tree = Tree::new();
        let id = tree.create_node_with(PathShape::rect(Rect::new(0.0, 0.0, 10.0, 10.0)));
        tree.set_bounds(id, Rect::new(0.0, 0.0, f64::INFINITY, 10.0));
        let shape = tree.behavior::<PathShape>(id).unwrap();
        assert_eq!(shape.path_bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn picks_by_geometry() {
        let mut tree = Tree::new();
        let root = tree.root();
        let mut tri = BezPath::new();
        tri.move_to((0.0, 0.0));
        tri.line_to((100.0, 0.0));
        tri.line_to((0.0, 100.0));
        tri.close_path();
        let id = tree.create_node_with(PathShape::new(tri));
        tree.set_paint(id, Some(Color::BLACK));
        tree.add_child(root, id).unwrap();

        assert_eq!(tree.pick_point(Point::new(10.0, 10.0)).unwrap().node, id);
        // Inside the bounding box, outside the triangle.
        assert!(tree.pick_point(Point::new(90.0, 90.0)).is_none());
    }

    #[test]
    fn unfilled_outline_picks_only_near_the_stroke() {
        let mut tree = Tree::new();
        let root = tree.root();
        let ring = PathShape::ellipse(Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_stroke(Stroke::new(4.0), Color::BLACK);
        let id = tree.create_node_with(ring);
        tree.add_child(root, id).unwrap();

        assert!(tree.pick_point(Point::new(50.0, 50.0)).is_none());
        assert_eq!(tree.pick_point(Point::new(0.5, 50.0)).unwrap().node, id);
    }

    #[test]
    fn paints_fill_then_stroke() {
        let mut tree = Tree::new();
        let root = tree.root();
        let id = tree.create_node_with(
            PathShape::rect(Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_stroke(Stroke::new(1.0), Color::BLACK),
        );
        tree.set_paint(id, Some(Color::WHITE));
        tree.add_child(root, id).unwrap();

        let mut rec = RecordingRenderer::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.full_paint(&mut PaintContext::new(&mut rec));
        let draws: alloc::vec::Vec<_> = rec
            .ops
            .iter()
            .filter(|op| matches!(op, RenderOp::FillPath(..) | RenderOp::StrokePath(..)))
            .collect();
        assert_eq!(draws.len(), 2);
        assert!(matches!(draws[0], RenderOp::FillPath(_, c) if *c == Color::WHITE));
        assert!(matches!(draws[1], RenderOp::StrokePath(_, s, _) if s.width == 1.0));
    }
}
