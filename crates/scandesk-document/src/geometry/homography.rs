// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Four-point homography solver.
//
// Builds the standard 8x8 linear system (two rows per correspondence) and
// solves it by Gaussian elimination with partial pivoting. The trailing
// coefficient is fixed at 1, so the result has 8 degrees of freedom.

use scandesk_core::Point;
use scandesk_core::error::{Result, ScanError};
use tracing::{debug, instrument};

/// Pivots smaller than this (relative to the largest coefficient) mean the
/// system is singular.
const PIVOT_EPSILON: f64 = 1e-10;

/// Triangles with twice-area below this fraction of their squared longest
/// side count as collinear.
const COLLINEAR_EPSILON: f64 = 1e-9;

/// A 3x3 projective matrix stored row-major with `h[8] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    h: [f64; 9],
}

impl Homography {
    /// Compute the matrix mapping each `src[i]` onto `dst[i]`.
    ///
    /// Fails with `InvalidGeometry` when any three points of either
    /// quadrilateral are (nearly) collinear, or when elimination meets a
    /// vanishing pivot.
    #[instrument(level = "debug", skip_all)]
    pub fn solve(src: &[Point; 4], dst: &[Point; 4]) -> Result<Self> {
        check_general_position(src, "source")?;
        check_general_position(dst, "destination")?;

        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (sx, sy) = (src[i].x, src[i].y);
            let (dx, dy) = (dst[i].x, dst[i].y);
            a[2 * i] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -sx * dx, -sy * dx, dx];
            a[2 * i + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -sx * dy, -sy * dy, dy];
        }

        let scale = a
            .iter()
            .flat_map(|row| row[..8].iter())
            .fold(0.0f64, |m, v| m.max(v.abs()));
        let min_pivot = PIVOT_EPSILON * scale.max(1.0);

        for col in 0..8 {
            let (pivot_row, pivot_abs) = (col..8)
                .map(|row| (row, a[row][col].abs()))
                .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
            if pivot_abs < min_pivot {
                return Err(ScanError::InvalidGeometry(format!(
                    "singular homography system (pivot {pivot_abs:e} in column {col})"
                )));
            }
            a.swap(col, pivot_row);

            let pivot = a[col][col];
            for row in (col + 1)..8 {
                let factor = a[row][col] / pivot;
                if factor == 0.0 {
                    continue;
                }
                for c in col..9 {
                    a[row][c] -= factor * a[col][c];
                }
            }
        }

        let mut h = [0.0f64; 9];
        h[8] = 1.0;
        for row in (0..8).rev() {
            let mut sum = a[row][8];
            for c in (row + 1)..8 {
                sum -= a[row][c] * h[c];
            }
            h[row] = sum / a[row][row];
        }

        if h.iter().any(|v| !v.is_finite()) {
            return Err(ScanError::InvalidGeometry(
                "homography has non-finite coefficients".into(),
            ));
        }

        debug!(?h, "Homography solved");
        Ok(Self { h })
    }

    /// Row-major coefficients.
    pub fn coefficients(&self) -> [f64; 9] {
        self.h
    }

    /// Map `(x, y)` through the matrix with perspective divide.
    ///
    /// Returns `None` when the point maps to infinity.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> Option<Point> {
        let h = &self.h;
        let w = h[6] * x + h[7] * y + h[8];
        if w.abs() < f64::EPSILON {
            return None;
        }
        Some(Point::new(
            (h[0] * x + h[1] * y + h[2]) / w,
            (h[3] * x + h[4] * y + h[5]) / w,
        ))
    }

    pub fn apply_point(&self, p: Point) -> Option<Point> {
        self.apply(p.x, p.y)
    }
}

/// Reject quadrilaterals where any three vertices are collinear.
fn check_general_position(points: &[Point; 4], label: &str) -> Result<()> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(ScanError::InvalidGeometry(format!(
            "{label} corners are not finite"
        )));
    }
    for skip in 0..4 {
        let tri: Vec<Point> = (0..4).filter(|&i| i != skip).map(|i| points[i]).collect();
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let twice_area = ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs();
        let longest = a.distance(&b).max(b.distance(&c)).max(a.distance(&c));
        if twice_area <= COLLINEAR_EPSILON * longest * longest {
            return Err(ScanError::InvalidGeometry(format!(
                "three {label} corners are collinear"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(points: [(f64, f64); 4]) -> [Point; 4] {
        points.map(|(x, y)| Point::new(x, y))
    }

    fn assert_close(a: Point, b: Point, tol: f64) {
        assert!(
            (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol,
            "expected {b:?}, got {a:?}"
        );
    }

    #[test]
    fn maps_every_correspondence() {
        let src = quad([(0.0, 0.0), (800.0, 0.0), (800.0, 800.0), (0.0, 800.0)]);
        let dst = quad([(100.0, 100.0), (900.0, 150.0), (880.0, 950.0), (120.0, 900.0)]);
        let h = Homography::solve(&src, &dst).unwrap();

        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(h.apply_point(*s).unwrap(), *d, 1e-6);
        }
        assert_eq!(h.coefficients()[8], 1.0);
    }

    #[test]
    fn forward_then_reverse_returns_rectangle_corners() {
        let rect = quad([(0.0, 0.0), (640.0, 0.0), (640.0, 480.0), (0.0, 480.0)]);
        let quads = [
            quad([(12.0, 30.0), (600.0, 5.0), (630.0, 470.0), (25.0, 440.0)]),
            quad([(200.0, 100.0), (420.0, 120.0), (400.0, 300.0), (180.0, 330.0)]),
            quad([(0.5, 0.5), (1000.0, 40.0), (950.0, 1200.0), (-30.0, 900.0)]),
        ];
        for q in quads {
            let forward = Homography::solve(&rect, &q).unwrap();
            let reverse = Homography::solve(&q, &rect).unwrap();
            for corner in rect {
                let there = forward.apply_point(corner).unwrap();
                let back = reverse.apply_point(there).unwrap();
                assert_close(back, corner, 1e-6);
            }
        }
    }

    #[test]
    fn identity_for_equal_quads() {
        let rect = quad([(0.0, 0.0), (300.0, 0.0), (300.0, 200.0), (0.0, 200.0)]);
        let h = Homography::solve(&rect, &rect).unwrap();
        assert_close(h.apply(123.0, 45.0).unwrap(), Point::new(123.0, 45.0), 1e-9);
    }

    #[test]
    fn collinear_destination_is_invalid_geometry() {
        let rect = quad([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let flat = quad([(0.0, 0.0), (5.0, 5.0), (10.0, 10.0), (0.0, 10.0)]);
        let err = Homography::solve(&rect, &flat).unwrap_err();
        assert!(matches!(err, ScanError::InvalidGeometry(_)), "{err}");
    }

    #[test]
    fn coincident_points_are_invalid_geometry() {
        let rect = quad([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let squashed = quad([(3.0, 3.0), (3.0, 3.0), (10.0, 10.0), (0.0, 10.0)]);
        assert!(Homography::solve(&squashed, &rect).is_err());
    }

    #[test]
    fn non_finite_corners_are_rejected() {
        let rect = quad([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let bad = quad([(f64::NAN, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert!(Homography::solve(&rect, &bad).is_err());
    }
}
