//! Edge processing: Sobel gradients, non‑maximum suppression and hysteresis,
//! combined into a Canny-style binary edge map.
//!
//! - Borders are handled by clamping indices (replicate).
//! - Thresholds are in units of Sobel magnitude on `[0, 1]` intensities.

pub mod grad;
pub mod hysteresis;
pub mod nms;

pub use grad::{sobel_gradients, vertical_gradient_abs, Grad};
pub use hysteresis::hysteresis;
pub use nms::run_nms;

use crate::image::{ImageF32, Mask};

/// Blur, Sobel, NMS and hysteresis in one call.
pub fn canny(l: &ImageF32, low: f32, high: f32) -> Mask {
    let grad = sobel_gradients(&l.blur3());
    let thin = run_nms(&grad);
    hysteresis(&thin, low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canny_finds_thin_bright_line() {
        let mut img = ImageF32::new(32, 16);
        for y in 7..9 {
            img.row_mut(y).iter_mut().for_each(|v| *v = 0.8);
        }
        let edges = canny(&img, 0.3, 0.8);
        let col: Vec<usize> = (0..16).filter(|&y| edges.get(16, y)).collect();
        assert!(!col.is_empty());
        assert!(col.iter().all(|&y| (5..=10).contains(&y)));
        assert!(!edges.get(16, 0));
    }
}
