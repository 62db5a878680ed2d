//! Sobel image gradients with magnitude.
//!
//! - Convolves a 3×3 kernel pair (`X` and `Y`) with border clamping.
//! - Outputs per‑pixel `gx`, `gy`, `mag = sqrt(gx^2+gy^2)`.
//!
//! Complexity: O(W·H) per pass; memory: three float buffers.
use crate::image::ImageF32;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Per‑pixel gradient buffers.
#[derive(Clone, Debug)]
pub struct Grad {
    /// Horizontal derivative (convolution with kernel X)
    pub gx: ImageF32,
    /// Vertical derivative (convolution with kernel Y)
    pub gy: ImageF32,
    /// Euclidean magnitude per pixel: `sqrt(gx^2 + gy^2)`
    pub mag: ImageF32,
}

fn gradients_with_kernels(l: &ImageF32, kernel_x: &Kernel3, kernel_y: &Kernel3) -> Grad {
    let w = l.w;
    let h = l.h;
    let mut gx = ImageF32::new(w, h);
    let mut gy = ImageF32::new(w, h);
    let mut mag = ImageF32::new(w, h);

    if w == 0 || h == 0 {
        return Grad { gx, gy, mag };
    }

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        let rows = [l.row(y_idx[0]), l.row(y_idx[1]), l.row(y_idx[2])];
        let out_gx = gx.row_mut(y);
        let out_gy = gy.row_mut(y);
        let out_mag = mag.row_mut(y);
        for x in 0..w {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, yy_row) in rows.iter().enumerate() {
                let kx_row = &kernel_x[ky];
                let ky_row = &kernel_y[ky];
                sum_x += yy_row[x_idx[0]] * kx_row[0]
                    + yy_row[x_idx[1]] * kx_row[1]
                    + yy_row[x_idx[2]] * kx_row[2];
                sum_y += yy_row[x_idx[0]] * ky_row[0]
                    + yy_row[x_idx[1]] * ky_row[1]
                    + yy_row[x_idx[2]] * ky_row[2];
            }

            out_gx[x] = sum_x;
            out_gy[x] = sum_y;
            out_mag[x] = (sum_x * sum_x + sum_y * sum_y).sqrt();
        }
    }

    Grad { gx, gy, mag }
}

/// Compute Sobel gradients on a single‑channel float image.
pub fn sobel_gradients(l: &ImageF32) -> Grad {
    gradients_with_kernels(l, &SOBEL_KERNEL_X, &SOBEL_KERNEL_Y)
}

/// Absolute vertical derivative `|gy|`; horizontal structures light up.
pub fn vertical_gradient_abs(l: &ImageF32) -> ImageF32 {
    let mut gy = sobel_gradients(l).gy;
    gy.data.iter_mut().for_each(|v| *v = v.abs());
    gy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_step_has_only_vertical_gradient() {
        let mut img = ImageF32::new(5, 6);
        for y in 3..6 {
            img.row_mut(y).iter_mut().for_each(|v| *v = 1.0);
        }
        let g = sobel_gradients(&img);
        assert!((g.gy.get(2, 2) - 4.0).abs() < 1e-6);
        assert!(g.gx.data.iter().all(|v| v.abs() < 1e-6));
        assert!(vertical_gradient_abs(&img).get(2, 0).abs() < 1e-6);
    }
}
