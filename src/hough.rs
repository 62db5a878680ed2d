//! Line extraction: the [`LineExtractor`] seam plus a default Hough transform.
//!
//! The default extractor runs a Canny-style edge map (see [`crate::edges`])
//! and votes every edge pixel into a `(θ, ρ)` accumulator with `θ` stepping by
//! π/360 over `[0, π)` and `ρ` by one pixel. Peaks above the vote threshold
//! that are local maxima in their 3×3 neighbourhood become lines, strongest
//! first.
use crate::edges::canny;
use crate::image::{ImageF32, Mask};
use crate::line::Line;
use crate::params::HoughParams;
use std::f64::consts::PI;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const THETA_BINS: usize = 360;

/// Source of raw candidate lines for a frame.
pub trait LineExtractor {
    fn extract(&self, img: &ImageF32) -> Vec<Line>;
}

#[derive(Clone, Debug, Default)]
pub struct HoughLineExtractor {
    pub params: HoughParams,
}

impl HoughLineExtractor {
    pub fn new(params: HoughParams) -> Self {
        Self { params }
    }
}

impl LineExtractor for HoughLineExtractor {
    fn extract(&self, img: &ImageF32) -> Vec<Line> {
        let edges = canny(img, self.params.low_threshold, self.params.high_threshold);
        let lines = hough_lines(&edges, self.params.vote_threshold, self.params.max_lines);
        log::debug!(
            "HoughLineExtractor::extract edges={} lines={}",
            edges.count_on(),
            lines.len()
        );
        lines
    }
}

struct Accumulator {
    votes: Vec<u32>,
    rho_bins: usize,
    max_rho: f64,
}

impl Accumulator {
    #[inline]
    fn get(&self, theta: usize, rho: usize) -> u32 {
        self.votes[theta * self.rho_bins + rho]
    }
}

fn vote(edges: &Mask) -> Accumulator {
    let max_rho = ((edges.w * edges.w + edges.h * edges.h) as f64).sqrt().ceil();
    let rho_bins = 2 * max_rho as usize + 1;
    let points: Vec<(f64, f64)> = (0..edges.h)
        .flat_map(|y| (0..edges.w).map(move |x| (x, y)))
        .filter(|&(x, y)| edges.get(x, y))
        .map(|(x, y)| (x as f64, y as f64))
        .collect();

    let column = |t: usize| -> Vec<u32> {
        let theta = t as f64 * PI / THETA_BINS as f64;
        let (sin_t, cos_t) = theta.sin_cos();
        let mut col = vec![0u32; rho_bins];
        for &(x, y) in &points {
            let rho = x * cos_t + y * sin_t;
            let bin = (rho + max_rho).round() as usize;
            if bin < rho_bins {
                col[bin] += 1;
            }
        }
        col
    };

    #[cfg(feature = "parallel")]
    let columns: Vec<Vec<u32>> = (0..THETA_BINS).into_par_iter().map(column).collect();
    #[cfg(not(feature = "parallel"))]
    let columns: Vec<Vec<u32>> = (0..THETA_BINS).map(column).collect();

    Accumulator {
        votes: columns.concat(),
        rho_bins,
        max_rho,
    }
}

/// Hough lines of a binary edge map, strongest first.
pub fn hough_lines(edges: &Mask, vote_threshold: u32, max_lines: usize) -> Vec<Line> {
    if edges.w == 0 || edges.h == 0 {
        return Vec::new();
    }
    let acc = vote(edges);
    let mut peaks: Vec<(u32, usize, usize)> = Vec::new();
    for t in 0..THETA_BINS {
        for r in 0..acc.rho_bins {
            let v = acc.get(t, r);
            if v < vote_threshold.max(1) || !is_local_max(&acc, t, r, v) {
                continue;
            }
            peaks.push((v, t, r));
        }
    }
    peaks.sort_by(|a, b| b.0.cmp(&a.0));
    peaks.truncate(max_lines);
    peaks
        .into_iter()
        .map(|(_, t, r)| {
            let theta = t as f64 * PI / THETA_BINS as f64;
            Line::new(r as f64 - acc.max_rho, theta)
        })
        .collect()
}

// Ties are resolved toward the first bin in scan order so a flat peak yields one line.
// The θ axis wraps: bin -1 is bin THETA_BINS-1 with ρ mirrored.
fn is_local_max(acc: &Accumulator, t: usize, r: usize, v: u32) -> bool {
    let last = acc.rho_bins as isize - 1;
    for dt in -1isize..=1 {
        let raw_t = t as isize + dt;
        let (nt, mirrored) = if raw_t < 0 {
            (THETA_BINS - 1, true)
        } else if raw_t >= THETA_BINS as isize {
            (0, true)
        } else {
            (raw_t as usize, false)
        };
        for dr in -1isize..=1 {
            if dt == 0 && dr == 0 {
                continue;
            }
            let mut nr = r as isize + dr;
            if mirrored {
                nr = last - nr;
            }
            if nr < 0 || nr > last {
                continue;
            }
            let nr = nr as usize;
            let other = acc.get(nt, nr);
            let earlier = (nt, nr) < (t, r);
            if other > v || (earlier && other == v) {
                return false;
            }
        }
    }
    true
}
