//! Hand segmentation: the [`HandSegmenter`] seam and a colour-rule default.
//!
//! The default segmenter applies the Garcia–Tziritas HSV skin region
//! (hue in degrees folded to `(-180, 180]`, saturation and value in percent),
//! then opens the mask with a small erosion and a larger dilation.
use crate::image::Mask;
use crate::params::SkinParams;
use image::RgbImage;

/// Produces a binary mask of hand pixels for a frame.
pub trait HandSegmenter {
    fn segment(&self, frame: &RgbImage) -> Mask;
}

#[derive(Clone, Debug, Default)]
pub struct SkinSegmenter {
    pub params: SkinParams,
}

impl SkinSegmenter {
    pub fn new(params: SkinParams) -> Self {
        Self { params }
    }

    fn is_skin(&self, rgb: [u8; 3]) -> bool {
        let (h, s, v) = hsv_degrees_percent(rgb);
        let h = if h > 180.0 { h - 360.0 } else { h };
        if s < self.params.min_saturation || v < self.params.min_value {
            return false;
        }
        if s > -h - 0.1 * v + 110.0 || h > -0.4 * v + 75.0 {
            return false;
        }
        (h >= 0.0 && s <= 0.08 * (100.0 - v) * h + 0.5 * v) || (h <= 0.0 && s <= 0.5 * h + 35.0)
    }
}

impl HandSegmenter for SkinSegmenter {
    fn segment(&self, frame: &RgbImage) -> Mask {
        let mut mask = Mask::new(frame.width() as usize, frame.height() as usize);
        for (x, y, px) in frame.enumerate_pixels() {
            if self.is_skin(px.0) {
                mask.set(x as usize, y as usize, true);
            }
        }
        let raw = mask.count_on();
        let cleaned = mask
            .erode(self.params.erode_radius)
            .dilate(self.params.dilate_radius);
        log::debug!(
            "SkinSegmenter::segment raw={} cleaned={}",
            raw,
            cleaned.count_on()
        );
        cleaned
    }
}

// Hue in [0, 360), saturation and value in [0, 100].
fn hsv_degrees_percent([r, g, b]: [u8; 3]) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    (h, s * 100.0, max * 100.0)
}
