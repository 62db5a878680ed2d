//! Line-list operations shared by the string and fret stages.
//!
//! Positions are offsets along the list's mean direction
//! ([`reference_direction`]) rather than raw `ρ`, so a tilted neck whose
//! lines straddle `θ = 0` or cross the origin keeps one consistent order.
//! Nothing mutates a line in place: repaired and smoothed lists are built
//! from new values.
//!
//! - [`filter_by_mean_angle`]: keep candidates near the mean direction.
//! - [`median_representatives`]: one line per cluster plus the cluster spread.
//! - [`repair_to_count`]: bring a noisy string list to exactly `count` lines.
//! - [`reconstruct_frets`]: gap-ratio insertion and trimming for frets.
//! - [`smooth`]: exponential blend with the previous frame.
use crate::angle::direction_delta;
use crate::line::{reference_direction, sort_along, Line, TrackedLine};
use crate::params::FretDetectorParams;

const EPS: f64 = 1e-9;

/// Offset of `item` along `reference`.
fn pos<T: TrackedLine>(item: &T, reference: f64) -> f64 {
    item.line().offset_along(reference)
}

/// Sorts by offset along the list's own mean direction and returns that
/// direction.
fn sorted<T: TrackedLine>(items: &mut [T]) -> f64 {
    let reference = reference_direction(items).unwrap_or(0.0);
    sort_along(items, reference);
    reference
}

/// Keeps lines whose direction lies within `tolerance` of the mean direction.
pub fn filter_by_mean_angle<T: TrackedLine>(lines: Vec<T>, tolerance: f64) -> Vec<T> {
    let Some(mean) = reference_direction(&lines) else {
        return lines;
    };
    lines
        .into_iter()
        .filter(|l| direction_delta(mean, l.line().theta()).abs() <= tolerance)
        .collect()
}

/// For each cluster, the member at the median offset (index `⌊n/2⌋` after
/// sorting) and the cluster's offset spread (`max - min`). Empty clusters
/// are skipped.
pub fn median_representatives<T: TrackedLine>(groups: Vec<Vec<T>>) -> Vec<(T, f64)> {
    groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|mut group| {
            let reference = sorted(&mut group);
            let spread = pos(&group[group.len() - 1], reference) - pos(&group[0], reference);
            let mid = group.swap_remove(group.len() / 2);
            (mid, spread)
        })
        .collect()
}

fn median_gap<T: TrackedLine>(sorted: &[T], reference: f64) -> Option<f64> {
    let mut gaps: Vec<f64> = sorted
        .windows(2)
        .map(|w| pos(&w[1], reference) - pos(&w[0], reference))
        .collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_by(f64::total_cmp);
    let median = gaps[gaps.len() / 2];
    (median > EPS).then_some(median)
}

/// New element parallel to `neighbour` at `offset` along `reference`.
fn synthetic_near<T: TrackedLine>(neighbour: &T, offset: f64, reference: f64) -> T {
    let (_, theta) = neighbour.line().aligned_to(reference);
    T::synthetic(Line::new(offset, theta))
}

/// Repairs a candidate list to exactly `count` lines.
///
/// 1. Sort by offset and take the median neighbour gap `m`.
/// 2. Keep only lines that take part in a pair whose gap lies in
///    `[m/2, 2m]`.
/// 3. While more than `count` remain, drop the first line of the closest pair.
/// 4. Fill interior gaps spanning `k ≈ gap/m` spacings with `k-1` evenly
///    spaced lines.
/// 5. Extend outward by `m` (below first, up to half of what is missing,
///    then above) until `count` lines exist.
///
/// Fewer than two inputs, or coincident inputs, give an empty list.
pub fn repair_to_count<T: TrackedLine>(mut lines: Vec<T>, count: usize) -> Vec<T> {
    let reference = sorted(&mut lines);
    if lines.len() < 2 || count == 0 {
        return Vec::new();
    }
    let at = |item: &T| pos(item, reference);
    let Some(median) = median_gap(&lines, reference) else {
        return Vec::new();
    };

    let mut kept: Vec<T> = Vec::with_capacity(lines.len());
    let mut prev_added_both = false;
    for pair in lines.windows(2) {
        let gap = at(&pair[1]) - at(&pair[0]);
        if gap >= median / 2.0 && gap <= median * 2.0 {
            if !prev_added_both {
                kept.push(pair[0].clone());
            }
            kept.push(pair[1].clone());
            prev_added_both = true;
        } else {
            prev_added_both = false;
        }
    }
    if kept.is_empty() {
        return Vec::new();
    }

    while kept.len() > count {
        let closest = kept
            .windows(2)
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (at(&a[1]) - at(&a[0])).total_cmp(&(at(&b[1]) - at(&b[0])))
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        kept.remove(closest);
    }

    let mut filled: Vec<T> = Vec::with_capacity(count);
    for (i, item) in kept.iter().enumerate() {
        filled.push(item.clone());
        let Some(next) = kept.get(i + 1) else {
            break;
        };
        let gap = at(next) - at(item);
        let missing = ((gap / median).round() as usize).saturating_sub(1);
        for j in 1..=missing {
            let remaining = kept.len() - i - 1;
            if filled.len() + remaining >= count {
                break;
            }
            let r = at(item) + gap * j as f64 / (missing + 1) as f64;
            filled.push(synthetic_near(item, r, reference));
        }
    }

    let below_quota = count.saturating_sub(filled.len()) / 2;
    let mut added_below = 0;
    while filled.len() < count {
        let first = &filled[0];
        let below = at(first) - median;
        if added_below < below_quota && below > 0.0 {
            let line = synthetic_near(first, below, reference);
            filled.insert(0, line);
            added_below += 1;
        } else {
            let last = &filled[filled.len() - 1];
            let line = synthetic_near(last, at(last) + median, reference);
            filled.push(line);
        }
    }
    filled
}

/// Reconstructs a fret list of exactly `count` lines.
///
/// 1. Sort by offset; drop lines closer than `min_separation` to the last kept.
/// 2. Walk the gaps: a gap above 3.4×, 2.4× or 1.4× the last accepted gap
///    hides 3, 2 or 1 frets, inserted evenly.
/// 3. Drop leading lines while their gap exceeds 1.9× the following one.
/// 4. Truncate from the high-offset end to `count`.
/// 5. If short, extrapolate past the last line, each gap shrinking by
///    `spacing_ratio`.
///
/// Fewer than two usable lines give an empty list.
pub fn reconstruct_frets<T: TrackedLine>(
    mut lines: Vec<T>,
    count: usize,
    params: &FretDetectorParams,
) -> Vec<T> {
    let reference = sorted(&mut lines);
    let at = |item: &T| pos(item, reference);
    let mut deduped: Vec<T> = Vec::with_capacity(lines.len());
    for line in lines {
        match deduped.last() {
            Some(last) if at(&line) - at(last) < params.min_separation => {}
            _ => deduped.push(line),
        }
    }
    if deduped.len() < 2 || count == 0 {
        return Vec::new();
    }

    let mut walked: Vec<T> = Vec::with_capacity(deduped.len() + 8);
    walked.push(deduped[0].clone());
    let mut prev_gap = f64::INFINITY;
    for pair in deduped.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let gap = at(b) - at(a);
        let inserts = if gap > params.insert_three_ratio * prev_gap {
            3
        } else if gap > params.insert_two_ratio * prev_gap {
            2
        } else if gap > params.insert_one_ratio * prev_gap {
            1
        } else {
            0
        };
        let step = gap / (inserts + 1) as f64;
        for j in 1..=inserts {
            walked.push(synthetic_near(a, at(a) + step * j as f64, reference));
        }
        walked.push(b.clone());
        prev_gap = step;
    }

    while walked.len() >= 3 {
        let g0 = at(&walked[1]) - at(&walked[0]);
        let g1 = at(&walked[2]) - at(&walked[1]);
        if g0 > params.leading_trim_ratio * g1 {
            walked.remove(0);
        } else {
            break;
        }
    }

    walked.truncate(count);
    if walked.len() < 2 {
        return Vec::new();
    }
    let ratio = params.spacing_ratio.max(1.0);
    while walked.len() < count {
        let n = walked.len();
        let gap = (at(&walked[n - 1]) - at(&walked[n - 2])) / ratio;
        if gap <= EPS {
            break;
        }
        let last = &walked[n - 1];
        let line = synthetic_near(last, at(last) + gap, reference);
        walked.push(line);
    }
    if walked.len() < count {
        return Vec::new();
    }
    walked
}

/// Blends `current` toward `previous` index-wise after sorting both along the
/// current list's mean direction: `α·current + (1-α)·previous`. When the
/// current list is shorter than the previous one the previous list is reused
/// unchanged.
pub fn smooth<T: TrackedLine>(mut current: Vec<T>, previous: Option<&[T]>, alpha: f64) -> Vec<T> {
    let reference = sorted(&mut current);
    let Some(previous) = previous.filter(|p| !p.is_empty()) else {
        return current;
    };
    let mut previous = previous.to_vec();
    sort_along(&mut previous, reference);
    if current.len() < previous.len() {
        return previous;
    }
    current
        .iter()
        .enumerate()
        .map(|(i, cur)| match previous.get(i) {
            Some(prev) => cur.with_line(prev.line().blend_toward(cur.line(), alpha)),
            None => cur.clone(),
        })
        .collect()
}
