// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit testing.
//!
//! Picking walks the tree depth first, testing children from the top of the
//! paint order down, so the first accepted node is the visually topmost one.
//! Full bounds are validated before the walk; the walk itself is read-only.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::Tree;
use crate::node::Node;
use crate::types::NodeId;
use crate::util;

/// Result of a successful pick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    /// The picked node.
    pub node: NodeId,
    /// Every node from the topmost ancestor down to [`node`](Self::node), inclusive.
    pub path: Vec<NodeId>,
}

impl Tree {
    /// Pick the topmost node under `region`, searching from the display root.
    ///
    /// `region` is in global space.
    pub fn pick(&mut self, region: Rect) -> Option<Hit> {
        self.full_pick(self.root(), region, &|_: &Node| true)
    }

    /// Pick the topmost node under a point in global space.
    ///
    /// The query is a square of edge [`TreeConfig::pick_halo`](crate::TreeConfig::pick_halo)
    /// centered on `pt`.
    pub fn pick_point(&mut self, pt: Point) -> Option<Hit> {
        let h = self.config.pick_halo * 0.5;
        self.pick(Rect::new(pt.x - h, pt.y - h, pt.x + h, pt.y + h))
    }

    /// Pick within the subtree at `id`. `region` is in the parent space of `id`.
    ///
    /// `filter` is consulted for nodes that are themselves pickable; a
    /// rejected node can still have picked children.
    pub fn full_pick(
        &mut self,
        id: NodeId,
        region: Rect,
        filter: &dyn Fn(&Node) -> bool,
    ) -> Option<Hit> {
        if !self.is_alive(id) {
            return None;
        }
        self.validate_full_bounds(id);
        let mut path = match self.parent(id) {
            Some(p) => self.path_to_root(p),
            None => Vec::new(),
        };
        if self.pick_subtree(id, region, filter, &mut path) {
            let node = *path.last()?;
            tracing::trace!(?node, depth = path.len(), "picked");
            Some(Hit { node, path })
        } else {
            None
        }
    }

    fn pick_subtree(
        &self,
        id: NodeId,
        region: Rect,
        filter: &dyn Fn(&Node) -> bool,
        path: &mut Vec<NodeId>,
    ) -> bool {
        let Some(n) = self.node(id) else {
            return false;
        };
        if !(n.is_pickable() || n.children_pickable()) || !util::intersects(n.full_bounds, region)
        {
            return false;
        }
        // A collapsed node occupies no area, so nothing below it can be hit.
        let Ok(inverse) = util::checked_inverse(n.transform) else {
            return false;
        };
        let local = util::transform_rect_bbox(inverse, region);
        path.push(id);

        let this_pickable = n.is_pickable() && filter(n);
        if this_pickable && n.behavior().pick(n, local) {
            return true;
        }
        if n.children_pickable() {
            for &c in n.children.iter().rev() {
                if self.pick_subtree(c, local, filter, path) {
                    return true;
                }
            }
        }
        if this_pickable && n.behavior().pick_after_children(n, local) {
            return true;
        }
        path.pop();
        false
    }

    /// Every node in the subtree at `id` whose own geometry intersects `region`.
    ///
    /// `region` is in the parent space of `id`. Results are in pre-order.
    /// Pickability flags are not consulted.
    pub fn find_intersecting_nodes(&mut self, id: NodeId, region: Rect) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.is_alive(id) {
            self.validate_full_bounds(id);
            self.collect_intersecting(id, region, &mut out);
        }
        out
    }

    fn collect_intersecting(&self, id: NodeId, region: Rect, out: &mut Vec<NodeId>) {
        let Some(n) = self.node(id) else {
            return;
        };
        if !util::intersects(n.full_bounds, region) {
            return;
        }
        let Ok(inverse) = util::checked_inverse(n.transform) else {
            return;
        };
        let local = util::transform_rect_bbox(inverse, region);
        if n.behavior().intersects(n, local) {
            out.push(id);
        }
        for &c in &n.children {
            self.collect_intersecting(c, local, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;
    use core::any::Any;

    use kurbo::{Affine, Point, Rect, Vec2};

    use super::Hit;
    use crate::Tree;
    use crate::behavior::NodeBehavior;
    use crate::node::Node;
    use crate::types::{NodeId, TreeConfig};

    fn rect_child(tree: &mut Tree, parent: NodeId, r: Rect) -> NodeId {
        let id = tree.create_node();
        tree.set_bounds(id, r);
        tree.add_child(parent, id).unwrap();
        id
    }

    #[test]
    fn topmost_sibling_wins_and_z_order_changes_it() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = rect_child(&mut tree, root, Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = rect_child(&mut tree, root, Rect::new(0.0, 0.0, 50.0, 50.0));
        let hit = tree.pick_point(Point::new(10.0, 10.0)).unwrap();
        assert_eq!(hit, Hit { node: b, path: vec![root, b] });

        tree.move_to_front(a).unwrap();
        assert_eq!(tree.pick_point(Point::new(10.0, 10.0)).unwrap().node, a);
    }

    #[test]
    fn picks_through_transforms() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = rect_child(&mut tree, root, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.set_transform(a, Affine::translate(Vec2::new(100.0, 100.0)) * Affine::scale(2.0));
        assert!(tree.pick_point(Point::new(5.0, 5.0)).is_none());
        assert_eq!(tree.pick_point(Point::new(115.0, 115.0)).unwrap().node, a);
        assert!(tree.pick_point(Point::new(125.0, 125.0)).is_none());
    }

    #[test]
    fn pickability_flags_are_independent() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = rect_child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let c = rect_child(&mut tree, p, Rect::new(0.0, 0.0, 10.0, 10.0));

        assert_eq!(tree.pick_point(Point::new(5.0, 5.0)).unwrap().node, c);
        tree.set_pickable(c, false);
        assert_eq!(tree.pick_point(Point::new(5.0, 5.0)).unwrap().node, p);
        tree.set_pickable(c, true);
        tree.set_children_pickable(p, false);
        assert_eq!(tree.pick_point(Point::new(5.0, 5.0)).unwrap().node, p);
        tree.set_children_pickable(p, true);
        tree.set_pickable(p, false);
        assert_eq!(tree.pick_point(Point::new(5.0, 5.0)).unwrap().node, c);
        assert!(tree.pick_point(Point::new(50.0, 50.0)).is_none());
    }

    #[test]
    fn filter_rejects_node_but_not_children() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = rect_child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let c = rect_child(&mut tree, p, Rect::new(0.0, 0.0, 10.0, 10.0));
        let region = Rect::new(4.0, 4.0, 6.0, 6.0);
        let not_c = |n: &Node| n.id() != c;
        assert_eq!(tree.full_pick(root, region, &not_c).unwrap().node, p);
        let not_p = |n: &Node| n.id() != p;
        assert_eq!(tree.full_pick(root, region, &not_p).unwrap().node, c);
    }

    #[test]
    fn singular_transform_skips_subtree() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = rect_child(&mut tree, root, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.set_transform(a, Affine::scale_non_uniform(0.0, 1.0));
        assert!(tree.pick(Rect::new(-1.0, -1.0, 1.0, 11.0)).is_none());
    }

    #[derive(Debug, Clone)]
    struct Frame;

    impl NodeBehavior for Frame {
        // Only the 2px border is hit before children.
        fn pick(&self, node: &Node, region: Rect) -> bool {
            let b = node.bounds();
            let inner = Rect::new(b.x0 + 2.0, b.y0 + 2.0, b.x1 - 2.0, b.y1 - 2.0);
            crate::util::intersects(node.bounds(), region)
                && !(inner.contains(Point::new(region.x0, region.y0))
                    && inner.contains(Point::new(region.x1, region.y1)))
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

    #[test]
    fn pre_children_hook_wins_over_children() {
        let mut tree = Tree::new();
        let root = tree.root();
        let f = tree.create_node_with(Frame);
        tree.set_bounds(f, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.add_child(root, f).unwrap();
        let c = rect_child(&mut tree, f, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(tree.pick_point(Point::new(1.0, 50.0)).unwrap().node, f);
        assert_eq!(tree.pick_point(Point::new(50.0, 50.0)).unwrap().node, c);
    }

    #[derive(Debug, Clone)]
    struct Strip;

    impl NodeBehavior for Strip {
        // A 20px strip along the left edge, hit only where no child is.
        fn pick_after_children(&self, node: &Node, region: Rect) -> bool {
            let b = node.bounds();
            crate::util::intersects(Rect::new(b.x0, b.y0, b.x0 + 20.0, b.y1), region)
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

    #[test]
    fn post_children_hook_runs_only_when_no_child_accepts() {
        let mut tree = Tree::new();
        let root = tree.root();
        let s = tree.create_node_with(Strip);
        tree.set_bounds(s, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.add_child(root, s).unwrap();
        let c = rect_child(&mut tree, s, Rect::new(0.0, 0.0, 50.0, 50.0));

        assert_eq!(tree.pick_point(Point::new(10.0, 10.0)).unwrap().node, c);
        let hit = tree.pick_point(Point::new(10.0, 80.0)).unwrap();
        assert_eq!(hit.node, s);
        assert_eq!(hit.path, vec![root, s]);
        assert!(tree.pick_point(Point::new(80.0, 80.0)).is_none());
    }

    #[test]
    fn halo_comes_from_config() {
        let mut tree = Tree::with_config(TreeConfig {
            pick_halo: 10.0,
            ..TreeConfig::default()
        });
        let root = tree.root();
        let a = rect_child(&mut tree, root, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(tree.pick_point(Point::new(13.0, 5.0)).unwrap().node, a);
        assert!(Tree::new().pick_point(Point::new(13.0, 5.0)).is_none());
    }

    #[test]
    fn find_intersecting_collects_every_match() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = rect_child(&mut tree, root, Rect::new(0.0, 0.0, 50.0, 50.0));
        let a1 = rect_child(&mut tree, a, Rect::new(10.0, 10.0, 20.0, 20.0));
        let b = rect_child(&mut tree, root, Rect::new(40.0, 40.0, 60.0, 60.0));
        let _far = rect_child(&mut tree, root, Rect::new(500.0, 0.0, 510.0, 10.0));
        tree.set_pickable(b, false);

        let found = tree.find_intersecting_nodes(root, Rect::new(15.0, 15.0, 45.0, 45.0));
        assert_eq!(found, vec![a, a1, b]);
    }
}
