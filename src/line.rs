//! Polar line primitive.
//!
//! A [`Line`] is stored in normal form `x·cos θ + y·sin θ = ρ` with
//! `θ ∈ [0, π)` and a signed `ρ`, so each line has exactly one stored form.
//! It is a value type: every transformation returns a new line.
//!
//! Positions are compared as offsets along a shared reference direction
//! ([`Line::offset_along`]): a neck tilted so that some strings lean past
//! vertical keeps a consistent order that raw `ρ` would not give. Sorting by
//! that offset is the positional identity used for strings and frets
//! (smallest offset is index 0).

use crate::angle::{direction_delta, mean_direction, wrap_half_turn};
use crate::homography::project;
use nalgebra::{Matrix2, Matrix3, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::OnceLock;

const EPS: f64 = 1e-9;

/// Default distance from the foot point to each endpoint.
pub const DEFAULT_EXTENT: f64 = 2000.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Line {
    rho: f64,
    theta: f64,
    #[serde(skip, default = "default_extent")]
    extent: f64,
    #[serde(skip)]
    endpoints: OnceLock<([f64; 2], [f64; 2])>,
}

fn default_extent() -> f64 {
    DEFAULT_EXTENT
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.rho == other.rho && self.theta == other.theta
    }
}

impl Line {
    /// Builds a line from raw normal-form parameters. `theta` is wrapped into
    /// `[0, π)`; each half turn taken off flips the sign of `rho`.
    pub fn new(rho: f64, theta: f64) -> Self {
        let wrapped = wrap_half_turn(theta);
        let rho = if half_turns(theta - wrapped) % 2 == 0 { rho } else { -rho };
        Self {
            rho,
            theta: wrapped,
            extent: DEFAULT_EXTENT,
            endpoints: OnceLock::new(),
        }
    }

    /// Same line with a different endpoint extent.
    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent.abs().max(1.0);
        self.endpoints = OnceLock::new();
        self
    }

    /// Line through two points. `None` when the points coincide or are not finite.
    pub fn through_points(p0: [f64; 2], p1: [f64; 2]) -> Option<Self> {
        let dx = p1[0] - p0[0];
        let dy = p1[1] - p0[1];
        let len = (dx * dx + dy * dy).sqrt();
        if !len.is_finite() || len <= EPS {
            return None;
        }
        let nx = -dy / len;
        let ny = dx / len;
        let rho = nx * p0[0] + ny * p0[1];
        Some(Self::new(rho, ny.atan2(nx)))
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Unit normal `(cos θ, sin θ)`.
    pub fn normal(&self) -> [f64; 2] {
        [self.theta.cos(), self.theta.sin()]
    }

    /// Two points at `±extent` along the line from the foot of the
    /// perpendicular through the origin.
    pub fn endpoints(&self) -> ([f64; 2], [f64; 2]) {
        *self.endpoints.get_or_init(|| {
            let (sin_t, cos_t) = self.theta.sin_cos();
            let x0 = self.rho * cos_t;
            let y0 = self.rho * sin_t;
            let l = self.extent;
            (
                [x0 - l * sin_t, y0 + l * cos_t],
                [x0 + l * sin_t, y0 - l * cos_t],
            )
        })
    }

    /// Slope `dy/dx` of the line. `None` for vertical lines.
    pub fn gradient(&self) -> Option<f64> {
        let (sin_t, cos_t) = self.theta.sin_cos();
        (sin_t.abs() > EPS).then(|| -cos_t / sin_t)
    }

    /// `y` where the line crosses `x = 0`. `None` for vertical lines.
    pub fn y_intercept(&self) -> Option<f64> {
        let sin_t = self.theta.sin();
        (sin_t.abs() > EPS).then(|| self.rho / sin_t)
    }

    /// `x` where the line crosses `y = 0`. `None` for horizontal lines.
    pub fn x_intercept(&self) -> Option<f64> {
        let cos_t = self.theta.cos();
        (cos_t.abs() > EPS).then(|| self.rho / cos_t)
    }

    /// `y` at column `x`. `None` for vertical lines.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        let sin_t = self.theta.sin();
        (sin_t.abs() > EPS).then(|| (self.rho - x * self.theta.cos()) / sin_t)
    }

    /// Intersection point with `other`.
    ///
    /// Solves the 2×2 normal-form system; parallel (or identical) lines have a
    /// vanishing determinant and yield `None`. Axis-aligned lines need no
    /// special handling since nothing divides by `sin θ` or `cos θ`.
    pub fn collision(&self, other: &Line) -> Option<[f64; 2]> {
        let (s1, c1) = self.theta.sin_cos();
        let (s2, c2) = other.theta.sin_cos();
        let det = c1 * s2 - s1 * c2;
        if det.abs() <= EPS {
            return None;
        }
        let m = Matrix2::new(c1, s1, c2, s2);
        let sol = m.try_inverse()? * Vector2::new(self.rho, other.rho);
        (sol[0].is_finite() && sol[1].is_finite()).then(|| [sol[0], sol[1]])
    }

    /// Maps the line through a projective transform by transforming both
    /// endpoints with a homogeneous divide and re-deriving `ρ`/`θ`.
    pub fn apply_homography(&self, h: &Matrix3<f64>) -> Option<Line> {
        let (p0, p1) = self.endpoints();
        let q0 = project(h, p0)?;
        let q1 = project(h, p1)?;
        Line::through_points(q0, q1).map(|l| l.with_extent(self.extent))
    }

    /// The same line written with its normal angle within π/2 of
    /// `reference`, as `(ρ, θ)`. `θ` may leave `[0, π)`.
    pub fn aligned_to(&self, reference: f64) -> (f64, f64) {
        let theta = reference + direction_delta(reference, self.theta);
        let rho = if half_turns(theta - self.theta) % 2 == 0 {
            self.rho
        } else {
            -self.rho
        };
        (rho, theta)
    }

    /// Signed distance from the origin along the normal at `reference`.
    /// Lines sharing a reference direction order by this value.
    pub fn offset_along(&self, reference: f64) -> f64 {
        self.aligned_to(reference).0
    }

    /// Exponential blend toward `current`: `α·current + (1-α)·self` for both
    /// parameters, with `current` first written in the frame of `self` so
    /// lines on either side of vertical blend through the small rotation.
    pub fn blend_toward(&self, current: &Line, alpha: f64) -> Line {
        let (cur_rho, cur_theta) = current.aligned_to(self.theta);
        let rho = alpha * cur_rho + (1.0 - alpha) * self.rho;
        let theta = alpha * cur_theta + (1.0 - alpha) * self.theta;
        Line::new(rho, theta).with_extent(self.extent)
    }
}

fn half_turns(angle: f64) -> i64 {
    (angle / PI).round() as i64
}

/// Anything that is positioned by a line and can be re-positioned.
///
/// Strings and frets share sorting, gap repair and temporal smoothing through
/// this trait.
pub trait TrackedLine: Clone {
    fn line(&self) -> &Line;

    /// Copy of `self` placed on `line`.
    fn with_line(&self, line: Line) -> Self;

    /// A new element synthesised at `line` where no detection exists.
    fn synthetic(line: Line) -> Self;
}

impl TrackedLine for Line {
    fn line(&self) -> &Line {
        self
    }

    fn with_line(&self, line: Line) -> Self {
        line
    }

    fn synthetic(line: Line) -> Self {
        line
    }
}

/// Mean direction of the items' lines, see [`mean_direction`].
pub fn reference_direction<T: TrackedLine>(items: &[T]) -> Option<f64> {
    mean_direction(items.iter().map(|i| i.line().theta()))
}

/// Sorts ascending by offset along `reference`.
pub fn sort_along<T: TrackedLine>(items: &mut [T], reference: f64) {
    items.sort_by(|a, b| {
        a.line()
            .offset_along(reference)
            .total_cmp(&b.line().offset_along(reference))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn collision_with_itself_is_none() {
        let l = Line::new(40.0, 1.1);
        assert!(l.collision(&l).is_none());
        let parallel = Line::new(55.0, 1.1);
        assert!(l.collision(&parallel).is_none());
    }

    #[test]
    fn collision_of_axis_lines() {
        // x = 30 and y = 70
        let vertical = Line::new(30.0, 0.0);
        let horizontal = Line::new(70.0, FRAC_PI_2);
        let p = vertical.collision(&horizontal).unwrap();
        assert!(approx_eq(p[0], 30.0));
        assert!(approx_eq(p[1], 70.0));
    }

    #[test]
    fn collision_matches_closed_form() {
        // x + y = 10·√2 (θ = π/4, ρ = 10) meets y = 4 (θ = π/2) at x = 10·√2 - 4
        let diagonal = Line::new(10.0, FRAC_PI_4);
        let horizontal = Line::new(4.0, FRAC_PI_2);
        let p = diagonal.collision(&horizontal).unwrap();
        assert!(approx_eq(p[1], 4.0));
        assert!(approx_eq(p[0], 10.0 * 2f64.sqrt() - 4.0));
    }

    #[test]
    fn angle_is_wrapped_into_half_turn_with_signed_rho() {
        let l = Line::new(-12.0, 0.5);
        assert!(approx_eq(l.rho(), -12.0));
        assert!(approx_eq(l.theta(), 0.5));
        let same = Line::new(12.0, 0.5 + PI);
        assert!(approx_eq(same.rho(), -12.0));
        assert!(approx_eq(same.theta(), 0.5));
        let back = Line::new(7.0, 0.5 - 2.0 * PI);
        assert!(approx_eq(back.rho(), 7.0));
        assert!(approx_eq(back.theta(), 0.5));
    }

    #[test]
    fn offsets_order_lines_leaning_across_vertical() {
        // x = 100 leaning slightly right and slightly left of vertical
        let right = Line::through_points([100.0, 0.0], [99.0, 100.0]).unwrap();
        let left = Line::through_points([120.0, 0.0], [121.0, 100.0]).unwrap();
        assert!(right.theta() < 0.1);
        assert!(left.theta() > PI - 0.1);
        assert!(approx_eq(right.offset_along(0.0), right.rho()));
        assert!(approx_eq(left.offset_along(0.0), -left.rho()));
        let mut lines = vec![left.clone(), right.clone()];
        sort_along(&mut lines, 0.0);
        assert_eq!(lines, vec![right, left]);
    }

    #[test]
    fn tilted_strings_sort_by_height() {
        // y = 0.2x + c for c crossing zero: raw ρ changes sign along the list
        let lines: Vec<Line> = [30.0, -10.0, 10.0, -30.0]
            .iter()
            .map(|&c| Line::through_points([0.0, c], [100.0, c + 20.0]).unwrap())
            .collect();
        let reference = reference_direction(&lines).unwrap();
        let mut sorted = lines.clone();
        sort_along(&mut sorted, reference);
        let ys: Vec<f64> = sorted.iter().map(|l| l.y_intercept().unwrap()).collect();
        for (y, c) in ys.iter().zip([-30.0, -10.0, 10.0, 30.0]) {
            assert!(approx_eq(*y, c));
        }
    }

    #[test]
    fn intercepts_and_gradient() {
        // y = -x + 10 -> normal (1,1)/√2, ρ = 10/√2
        let l = Line::new(10.0 / 2f64.sqrt(), FRAC_PI_4);
        assert!(approx_eq(l.y_intercept().unwrap(), 10.0));
        assert!(approx_eq(l.x_intercept().unwrap(), 10.0));
        assert!(approx_eq(l.gradient().unwrap(), -1.0));
        assert!(approx_eq(l.y_at(4.0).unwrap(), 6.0));
    }

    #[test]
    fn vertical_line_has_no_gradient_or_y_intercept() {
        let l = Line::new(25.0, 0.0);
        assert!(l.gradient().is_none());
        assert!(l.y_intercept().is_none());
        assert!(approx_eq(l.x_intercept().unwrap(), 25.0));
    }

    #[test]
    fn endpoints_lie_on_line() {
        let l = Line::new(33.0, 1.3).with_extent(100.0);
        let (p0, p1) = l.endpoints();
        for p in [p0, p1] {
            let r = p[0] * l.theta().cos() + p[1] * l.theta().sin();
            assert!(approx_eq(r, 33.0));
        }
    }

    #[test]
    fn through_points_round_trips_parameters() {
        let l = Line::new(18.0, 2.0);
        let (p0, p1) = l.endpoints();
        let back = Line::through_points(p0, p1).unwrap();
        assert!(approx_eq(back.rho(), 18.0));
        assert!(approx_eq(back.theta(), 2.0));
    }

    #[test]
    fn apply_translation_homography_moves_vertical_line() {
        let h = Matrix3::new(1.0, 0.0, 5.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let moved = Line::new(20.0, 0.0).apply_homography(&h).unwrap();
        assert!(approx_eq(moved.x_intercept().unwrap(), 25.0));
    }

    #[test]
    fn blend_toward_interpolates_across_vertical() {
        // the same near-vertical family on both sides of θ = 0
        let prev = Line::new(10.0, 0.02);
        let cur = Line::new(20.0, -0.02);
        assert!(cur.theta() > PI - 0.1);
        let out = prev.blend_toward(&cur, 0.5);
        assert!(approx_eq(out.offset_along(0.0), 15.0));
        assert!(direction_delta(0.0, out.theta()).abs() < 1e-9);
    }

    #[test]
    fn blend_toward_keeps_tilted_string_in_place() {
        let prev = Line::through_points([0.0, -5.0], [100.0, 15.0]).unwrap();
        let cur = Line::through_points([0.0, -3.0], [100.0, 17.0]).unwrap();
        let out = prev.blend_toward(&cur, 0.5);
        assert!(approx_eq(out.y_intercept().unwrap(), -4.0));
        assert!(approx_eq(out.gradient().unwrap(), 0.2));
    }
}
