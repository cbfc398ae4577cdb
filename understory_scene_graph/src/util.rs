// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Rect, Size};

use crate::error::SceneError;

/// True if `r` has no area. Empty rectangles never intersect and are skipped by unions.
pub(crate) fn is_empty(r: Rect) -> bool {
    !(r.width() > 0.0 && r.height() > 0.0)
}

/// Union that ignores empty operands. The canonical empty value is [`Rect::ZERO`].
pub(crate) fn union_non_empty(a: Rect, b: Rect) -> Rect {
    match (is_empty(a), is_empty(b)) {
        (true, true) => Rect::ZERO,
        (true, false) => b,
        (false, true) => a,
        (false, false) => a.union(b),
    }
}

/// Positive-area overlap test.
pub(crate) fn intersects(a: Rect, b: Rect) -> bool {
    !is_empty(a)
        && !is_empty(b)
        && a.x0 < b.x1
        && b.x0 < a.x1
        && a.y0 < b.y1
        && b.y0 < a.y1
}

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box. Empty input stays empty.
pub(crate) fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    if is_empty(rect) {
        return Rect::ZERO;
    }
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let min_x = (a * rect.x0).min(a * rect.x1) + (c * rect.y0).min(c * rect.y1);
    let max_x = (a * rect.x0).max(a * rect.x1) + (c * rect.y0).max(c * rect.y1);
    let min_y = (b * rect.x0).min(b * rect.x1) + (d * rect.y0).min(d * rect.y1);
    let max_y = (b * rect.x0).max(b * rect.x1) + (d * rect.y0).max(d * rect.y1);
    Rect::new(min_x + e, min_y + f, max_x + e, max_y + f)
}

/// Apply only the linear part of `affine` to a size (a delta vector).
pub(crate) fn transform_size(affine: Affine, size: Size) -> Size {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    Size::new(a * size.width + c * size.height, b * size.width + d * size.height)
}

/// Inverse of `affine`, or [`SceneError::SingularTransform`] if it has none.
pub(crate) fn checked_inverse(affine: Affine) -> Result<Affine, SceneError> {
    let det = affine.determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(SceneError::SingularTransform);
    }
    Ok(affine.inverse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_4;
    use kurbo::Vec2;

    #[test]
    fn empty_rects_do_not_intersect() {
        let zero = Rect::ZERO;
        let query = Rect::new(-0.5, -0.5, 0.5, 0.5);
        assert!(!intersects(zero, query), "degenerate rect must not intersect");
        assert!(intersects(query, Rect::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn union_skips_empty() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert_eq!(union_non_empty(Rect::ZERO, r), r);
        assert_eq!(union_non_empty(r, Rect::new(5.0, 5.0, 5.0, 9.0)), r);
        assert_eq!(union_non_empty(Rect::ZERO, Rect::ZERO), Rect::ZERO);
    }

    #[test]
    fn rotated_bbox_is_conservative() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let bb = transform_rect_bbox(Affine::rotate(FRAC_PI_4), r);
        assert!(bb.width() > r.width());
        assert!(bb.height() > r.height());
        let moved = transform_rect_bbox(Affine::translate(Vec2::new(5.0, 0.0)), r);
        assert_eq!(moved, Rect::new(5.0, 0.0, 15.0, 10.0));
    }

    #[test]
    fn singular_inverse_is_an_error() {
        assert_eq!(
            checked_inverse(Affine::scale(0.0)),
            Err(SceneError::SingularTransform)
        );
        assert!(checked_inverse(Affine::scale(2.0)).is_ok());
    }

    #[test]
    fn size_ignores_translation() {
        let s = transform_size(
            Affine::translate(Vec2::new(100.0, 100.0)) * Affine::scale(2.0),
            Size::new(3.0, 4.0),
        );
        assert_eq!(s, Size::new(6.0, 8.0));
    }
}
