//! Planar homographies: DLT estimation with Hartley normalisation, point
//! projection and perspective warping of float images.
use crate::image::ImageF32;
use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const EPS: f64 = 1e-12;

/// A forward projective map together with its inverse.
#[derive(Clone, Debug, PartialEq)]
pub struct Homography {
    pub forward: Matrix3<f64>,
    pub inverse: Matrix3<f64>,
}

impl Homography {
    pub fn from_matrix(forward: Matrix3<f64>) -> Option<Self> {
        let inverse = forward.try_inverse()?;
        (inverse.iter().all(|v| v.is_finite())).then_some(Self { forward, inverse })
    }

    pub fn map(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        project(&self.forward, p)
    }

    pub fn unmap(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        project(&self.inverse, p)
    }
}

/// `H · [x, y, 1]ᵀ` with the homogeneous divide. `None` at infinity.
pub fn project(h: &Matrix3<f64>, p: [f64; 2]) -> Option<[f64; 2]> {
    let v = h * Vector3::new(p[0], p[1], 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
        return None;
    }
    Some([v[0] / w, v[1] / w])
}

// Translate the centroid to the origin and scale to mean distance √2.
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > EPS {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    (t, normalized)
}

fn has_collinear_triple(pts: &[[f64; 2]]) -> bool {
    let spread = pts
        .iter()
        .flat_map(|a| pts.iter().map(move |b| (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)))
        .fold(0.0, f64::max);
    let tol = 1e-9 * spread.max(EPS);
    let n = pts.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let (a, b, c) = (pts[i], pts[j], pts[k]);
                let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
                if cross.abs() <= tol {
                    return true;
                }
            }
        }
    }
    false
}

/// Homography mapping `src[i]` onto `dst[i]` from at least four
/// correspondences. `None` when the configuration is degenerate.
pub fn solve_homography(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Homography> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return None;
    }
    if src.iter().chain(dst).any(|p| !p[0].is_finite() || !p[1].is_finite()) {
        return None;
    }
    if n == 4 && (has_collinear_triple(src) || has_collinear_triple(dst)) {
        return None;
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // Null vector of A = eigenvector of AᵀA with the smallest eigenvalue.
    let eig = SymmetricEigen::new(a.transpose() * &a);
    let min_idx = (0..9).min_by(|&i, &j| {
        eig.eigenvalues[i]
            .abs()
            .total_cmp(&eig.eigenvalues[j].abs())
    })?;
    let h = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let forward = t_dst.try_inverse()? * h_norm * t_src;
    let scale = forward[(2, 2)];
    let forward = if scale.abs() > EPS {
        forward / scale
    } else {
        forward
    };
    if forward.determinant().abs() <= EPS {
        return None;
    }
    Homography::from_matrix(forward)
}

/// Resamples `src` into a `w × h` image such that output pixel `p` takes the
/// value at `inverse(p)` in `src`. Pixels mapping outside `src` are zero.
pub fn warp_perspective(src: &ImageF32, homography: &Homography, w: usize, h: usize) -> ImageF32 {
    let mut out = ImageF32::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    let fill_row = |y: usize, row: &mut [f32]| {
        for (x, px) in row.iter_mut().enumerate() {
            *px = homography
                .unmap([x as f64, y as f64])
                .and_then(|[sx, sy]| src.sample_bilinear(sx, sy))
                .unwrap_or(0.0);
        }
    };

    #[cfg(feature = "parallel")]
    out.data
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| fill_row(y, row));
    #[cfg(not(feature = "parallel"))]
    out.data
        .chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| fill_row(y, row));

    out
}
