//! Non‑maximum suppression on gradient magnitude with direction alignment.
//!
//! Each pixel is compared with its two neighbours along the gradient
//! direction quantized to 0°, 45°, 90° or 135°. The comparison is
//! asymmetric (`>=` against the first neighbour, `>` against the second) so a
//! two-pixel plateau keeps exactly one pixel instead of losing both.
//!
//! The outermost 1‑pixel frame is always suppressed.
use crate::edges::grad::Grad;
use crate::image::ImageF32;

const TAN_22_5_DEG: f32 = 0.41421356237;

/// Thinned magnitude image: suppressed pixels are zero.
pub fn run_nms(grad: &Grad) -> ImageF32 {
    let w = grad.mag.w;
    let h = grad.mag.h;
    let mut out = ImageF32::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        let mag_prev = grad.mag.row(y - 1);
        let mag_row = grad.mag.row(y);
        let mag_next = grad.mag.row(y + 1);
        let gx_row = grad.gx.row(y);
        let gy_row = grad.gy.row(y);
        let out_row = out.row_mut(y);

        for x in 1..w - 1 {
            let mag = mag_row[x];
            if mag <= 0.0 {
                continue;
            }

            let gx = gx_row[x];
            let gy = gy_row[x];
            let abs_gx = gx.abs();
            let abs_gy = gy.abs();
            let same_sign = (gx >= 0.0 && gy >= 0.0) || (gx <= 0.0 && gy <= 0.0);

            let (neighbor1, neighbor2) = if abs_gx >= abs_gy {
                if abs_gy <= abs_gx * TAN_22_5_DEG {
                    (mag_row[x - 1], mag_row[x + 1])
                } else if same_sign {
                    (mag_prev[x - 1], mag_next[x + 1])
                } else {
                    (mag_prev[x + 1], mag_next[x - 1])
                }
            } else if abs_gx <= abs_gy * TAN_22_5_DEG {
                (mag_prev[x], mag_next[x])
            } else if same_sign {
                (mag_prev[x - 1], mag_next[x + 1])
            } else {
                (mag_prev[x + 1], mag_next[x - 1])
            };

            if mag < neighbor1 || mag <= neighbor2 {
                continue;
            }
            out_row[x] = mag;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::grad::sobel_gradients;

    #[test]
    fn step_edge_thins_to_single_row() {
        let mut img = ImageF32::new(8, 8);
        for y in 4..8 {
            img.row_mut(y).iter_mut().for_each(|v| *v = 1.0);
        }
        let thin = run_nms(&sobel_gradients(&img));
        let on_rows: Vec<usize> = (0..8).filter(|&y| thin.get(4, y) > 0.0).collect();
        assert_eq!(on_rows.len(), 1);
    }
}
