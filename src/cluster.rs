//! One-dimensional clustering: the [`Clusterer`] seam and a deterministic
//! k-means.
use crate::params::KMeansParams;

/// Assigns each value one of `k` labels in `0..k`. Labels may be unused.
pub trait Clusterer {
    fn cluster(&self, values: &[f64], k: usize) -> Vec<usize>;
}

/// Lloyd's k-means on scalars, seeded at evenly spaced quantiles so that
/// repeated runs on the same input agree.
#[derive(Clone, Debug, Default)]
pub struct KMeans1d {
    pub params: KMeansParams,
}

impl KMeans1d {
    pub fn new(params: KMeansParams) -> Self {
        Self { params }
    }
}

impl Clusterer for KMeans1d {
    fn cluster(&self, values: &[f64], k: usize) -> Vec<usize> {
        let n = values.len();
        if n == 0 || k == 0 {
            return vec![0; n];
        }
        let k = k.min(n);
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mut centers: Vec<f64> = (0..k)
            .map(|j| sorted[((2 * j + 1) * n / (2 * k)).min(n - 1)])
            .collect();

        let mut labels = vec![usize::MAX; n];
        for iter in 0..self.params.max_iterations.max(1) {
            let mut changed = false;
            for (label, &v) in labels.iter_mut().zip(values) {
                let nearest = nearest_center(&centers, v);
                if *label != nearest {
                    *label = nearest;
                    changed = true;
                }
            }
            if !changed {
                log::trace!("KMeans1d converged after {iter} iterations");
                break;
            }
            let mut sums = vec![0.0; k];
            let mut counts = vec![0usize; k];
            for (&label, &v) in labels.iter().zip(values) {
                sums[label] += v;
                counts[label] += 1;
            }
            for ((c, s), &cnt) in centers.iter_mut().zip(&sums).zip(&counts) {
                if cnt > 0 {
                    *c = s / cnt as f64;
                }
            }
        }
        labels
    }
}

fn nearest_center(centers: &[f64], v: f64) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, &c) in centers.iter().enumerate() {
        let d = (v - c).abs();
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

/// Members of each non-empty cluster, in label order.
pub fn group_by_label<T: Clone>(items: &[T], labels: &[usize]) -> Vec<Vec<T>> {
    let k = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut groups: Vec<Vec<T>> = vec![Vec::new(); k];
    for (item, &label) in items.iter().zip(labels) {
        groups[label].push(item.clone());
    }
    groups.retain(|g| !g.is_empty());
    groups
}
