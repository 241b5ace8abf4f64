// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry primitives.
//!
//! Vectors, matrices and rectangles are kurbo's [`Vec2`]/[`Point`],
//! [`Affine`] and [`Rect`]. They are `Copy` values, so most scratch math lives
//! on the stack; heap-backed scratch space goes through [`Pool`].
//!
//! The helpers here pin down the semantics the scene relies on:
//!
//! - [`transform_rect`] returns the axis-aligned box around all four
//!   transformed corners, so rotation enlarges the result.
//! - [`union`] treats zero-area rectangles as the identity.
//! - [`contains`] is inclusive on every edge.
//! - [`local_matrix`] builds a node's local transform from its components.

mod pool;

pub use kurbo::{Affine, Point, Rect, Size, Vec2};
pub use pool::{Pool, PoolStats, Reusable};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Transforms all four corners of `rect` by `m` and returns their bounding box.
#[inline]
#[must_use]
pub fn transform_rect(m: Affine, rect: Rect) -> Rect {
    m.transform_rect_bbox(rect)
}

/// Returns `true` if `rect` covers no area.
#[inline]
#[must_use]
pub fn is_zero_area(rect: Rect) -> bool {
    rect.width() == 0.0 || rect.height() == 0.0
}

/// Extends `target` in place so it covers `other` as well.
///
/// A zero-area rectangle on either side acts as the identity: uniting with
/// one leaves the other side unchanged, and uniting into one replaces it.
#[inline]
pub fn union(target: &mut Rect, other: Rect) {
    if is_zero_area(other) {
        return;
    }
    if is_zero_area(*target) {
        *target = other;
        return;
    }
    *target = target.union(other);
}

/// Inclusive containment test: points on any edge are inside.
#[inline]
#[must_use]
pub fn contains(rect: Rect, p: Point) -> bool {
    let r = rect.abs();
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

/// Builds the local transform of a node.
///
/// The pivot `(pivot_x, pivot_y)` is the point in the node's own space that
/// lands on `(x, y)` in parent space; rotation (radians) and scale are applied
/// about it.
#[must_use]
pub fn local_matrix(
    x: f64,
    y: f64,
    rotation: f64,
    scale_x: f64,
    scale_y: f64,
    pivot_x: f64,
    pivot_y: f64,
) -> Affine {
    if rotation == 0.0 {
        return Affine::new([
            scale_x,
            0.0,
            0.0,
            scale_y,
            x - pivot_x * scale_x,
            y - pivot_y * scale_y,
        ]);
    }
    let (sin, cos) = (rotation.sin(), rotation.cos());
    let a = scale_x * cos;
    let b = scale_x * sin;
    let c = scale_y * -sin;
    let d = scale_y * cos;
    Affine::new([
        a,
        b,
        c,
        d,
        x - pivot_x * a - pivot_y * c,
        y - pivot_x * b - pivot_y * d,
    ])
}

/// Rounds half-way cases toward positive infinity (`-0.5` → `0`, `0.5` → `1`).
///
/// This is the pixel-snapping rule for published stage geometry.
#[inline]
#[must_use]
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Replaces the translation of `m`, keeping its linear part.
#[inline]
#[must_use]
pub fn with_translation(m: Affine, tx: f64, ty: f64) -> Affine {
    let c = m.as_coeffs();
    Affine::new([c[0], c[1], c[2], c[3], tx, ty])
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        let d = a - b;
        d > -EPS && d < EPS
    }

    fn rect_approx(a: Rect, b: Rect) -> bool {
        close(a.x0, b.x0) && close(a.y0, b.y0) && close(a.x1, b.x1) && close(a.y1, b.y1)
    }

    #[test]
    fn transform_rect_rotation_enlarges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let m = Affine::rotate(core::f64::consts::FRAC_PI_4);
        let out = transform_rect(m, r);
        let diag = 10.0 * core::f64::consts::SQRT_2;
        assert!(close(out.width(), diag), "width {}", out.width());
        assert!(close(out.height(), diag), "height {}", out.height());
    }

    #[test]
    fn transform_rect_quarter_turn() {
        let r = Rect::new(0.0, 0.0, 20.0, 10.0);
        let out = transform_rect(Affine::rotate(FRAC_PI_2), r);
        assert!(
            rect_approx(out, Rect::new(-10.0, 0.0, 0.0, 20.0)),
            "got {out:?}"
        );
    }

    #[test]
    fn union_zero_area_is_identity() {
        let mut a = Rect::new(5.0, 5.0, 5.0, 5.0);
        union(&mut a, Rect::new(0.0, 0.0, 10.0, 20.0));
        assert_eq!(a, Rect::new(0.0, 0.0, 10.0, 20.0));

        let mut b = Rect::new(0.0, 0.0, 10.0, 20.0);
        union(&mut b, Rect::new(100.0, 100.0, 100.0, 300.0));
        assert_eq!(b, Rect::new(0.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn union_extends() {
        let mut a = Rect::new(0.0, 0.0, 10.0, 10.0);
        union(&mut a, Rect::new(-5.0, 5.0, 3.0, 30.0));
        assert_eq!(a, Rect::new(-5.0, 0.0, 10.0, 30.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(contains(r, Point::new(10.0, 10.0)));
        assert!(contains(r, Point::new(0.0, 0.0)));
        assert!(!contains(r, Point::new(10.01, 5.0)));
    }

    #[test]
    fn local_matrix_maps_pivot_to_position() {
        let m = local_matrix(100.0, 50.0, 0.7, 2.0, 3.0, 4.0, 5.0);
        let p = m * Point::new(4.0, 5.0);
        assert!(close(p.x, 100.0), "x {}", p.x);
        assert!(close(p.y, 50.0), "y {}", p.y);
    }

    #[test]
    fn local_matrix_matches_kurbo_composition() {
        let m = local_matrix(10.0, 20.0, 0.3, 2.0, 0.5, 1.0, 2.0);
        let expected = Affine::translate((10.0, 20.0))
            * Affine::rotate(0.3)
            * Affine::scale_non_uniform(2.0, 0.5)
            * Affine::translate((-1.0, -2.0));
        for (a, b) in m.as_coeffs().iter().zip(expected.as_coeffs()) {
            assert!(close(*a, b), "{m:?} vs {expected:?}");
        }
    }

    #[test]
    fn round_half_up_rule() {
        assert_eq!(round_half_up(-100.5), -100.0);
        assert_eq!(round_half_up(133.5), 134.0);
        assert_eq!(round_half_up(133.33), 133.0);
        assert_eq!(round_half_up(-0.4), 0.0);
    }
}
