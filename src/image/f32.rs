//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Intensities live in `[0, 1]`. Every frame is converted to this format once
//! and shared by the string, fret and pluck stages.
use image::RgbImage;

const BLUR_TAPS: [f32; 3] = [0.25, 0.5, 0.25];

#[derive(Clone, Debug)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Luma conversion of an RGB frame (BT.601 weights).
    pub fn from_rgb(frame: &RgbImage) -> Self {
        let w = frame.width() as usize;
        let h = frame.height() as usize;
        let data = frame
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
            })
            .collect();
        Self { w, h, data }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }

    /// Bilinear sample at a sub-pixel location; `None` outside the image.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> Option<f32> {
        if self.w == 0 || self.h == 0 || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let max_x = (self.w - 1) as f64;
        let max_y = (self.h - 1) as f64;
        if x < 0.0 || y < 0.0 || x > max_x || y > max_y {
            return None;
        }
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.w - 1);
        let y1 = (y0 + 1).min(self.h - 1);
        let fx = (x - x0 as f64) as f32;
        let fy = (y - y0 as f64) as f32;
        let top = self.get(x0, y0) * (1.0 - fx) + self.get(x1, y0) * fx;
        let bottom = self.get(x0, y1) * (1.0 - fx) + self.get(x1, y1) * fx;
        Some(top * (1.0 - fy) + bottom * fy)
    }

    /// 3×3 binomial blur with replicated borders.
    pub fn blur3(&self) -> ImageF32 {
        let (w, h) = (self.w, self.h);
        if w == 0 || h == 0 {
            return self.clone();
        }
        let mut tmp = ImageF32::new(w, h);
        for y in 0..h {
            let src = self.row(y);
            let dst = tmp.row_mut(y);
            for (x, out) in dst.iter_mut().enumerate() {
                let l = src[x.saturating_sub(1)];
                let r = src[(x + 1).min(w - 1)];
                *out = BLUR_TAPS[0] * l + BLUR_TAPS[1] * src[x] + BLUR_TAPS[2] * r;
            }
        }
        let mut out = ImageF32::new(w, h);
        for y in 0..h {
            let up = tmp.row(y.saturating_sub(1));
            let mid = tmp.row(y);
            let down = tmp.row((y + 1).min(h - 1));
            let dst = out.row_mut(y);
            for x in 0..w {
                dst[x] = BLUR_TAPS[0] * up[x] + BLUR_TAPS[1] * mid[x] + BLUR_TAPS[2] * down[x];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn from_rgb_converts_white_to_one() {
        let frame = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        let img = ImageF32::from_rgb(&frame);
        assert_eq!((img.w, img.h), (3, 2));
        assert!(img.data.iter().all(|&v| (v - 1.0).abs() < 1e-4));
    }

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let mut img = ImageF32::new(2, 1);
        img.set(1, 0, 1.0);
        assert!((img.sample_bilinear(0.25, 0.0).unwrap() - 0.25).abs() < 1e-6);
        assert!(img.sample_bilinear(1.5, 0.0).is_none());
    }

    #[test]
    fn blur_preserves_constant_image() {
        let mut img = ImageF32::new(4, 4);
        img.data.iter_mut().for_each(|v| *v = 0.6);
        let blurred = img.blur3();
        assert!(blurred.data.iter().all(|&v| (v - 0.6).abs() < 1e-6));
    }
}
