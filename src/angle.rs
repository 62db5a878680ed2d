//! Angle utilities shared by the line primitive and the detectors.
//!
//! A line's direction is only defined modulo π. Lines are stored with
//! `theta` in `[0, π)` and a signed `rho`, so a near-vertical line sits just
//! above `0` or just below `π` depending on which way it leans. Directions are
//! compared through [`direction_delta`], and a list of lines is ordered along
//! the normal of its [`mean_direction`].

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Wraps an angle into `[0, π)`.
#[inline]
pub fn wrap_half_turn(angle: f64) -> f64 {
    let norm = angle.rem_euclid(PI);
    if norm >= PI - 1e-12 {
        0.0
    } else {
        norm
    }
}

/// Signed rotation taking direction `from` onto direction `to` modulo π, in
/// `[-π/2, π/2)`.
#[inline]
pub fn direction_delta(from: f64, to: f64) -> f64 {
    (to - from + FRAC_PI_2).rem_euclid(PI) - FRAC_PI_2
}

/// Mean of a set of line directions: half the circular mean of the doubled
/// angles, so `θ` and `θ + π` count as the same direction.
///
/// The result lies in `[-π/4, 3π/4)`. In that chart the normal of a
/// near-horizontal line points down the image and the normal of a
/// near-vertical line points right, which keeps offsets along it growing with
/// `y` and `x` respectively. `None` for an empty input.
pub fn mean_direction(angles: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (mut c, mut s) = (0.0, 0.0);
    let mut count = 0usize;
    for a in angles {
        c += (2.0 * a).cos();
        s += (2.0 * a).sin();
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let mean = 0.5 * s.atan2(c);
    Some(if mean < -FRAC_PI_4 { mean + PI } else { mean })
}
