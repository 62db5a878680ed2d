//! Binary mask with the handful of morphology and labelling operations the
//! pluck and note stages need. Morphology and labelling run through
//! imageproc on an 8-bit view of the mask.
use super::ImageF32;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::HashMap;

// imageproc takes the structuring radius as a byte.
fn window(radius: usize) -> u8 {
    radius.min(u8::MAX as usize) as u8
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub w: usize,
    pub h: usize,
    pub data: Vec<bool>,
}

/// One 8-connected region of `on` pixels.
#[derive(Clone, Debug, Default)]
pub struct Component {
    pub pixels: Vec<(usize, usize)>,
}

impl Component {
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// Mean vertical extent (`max_y - min_y`) over the columns the region
    /// occupies. Zero for an empty region.
    pub fn mean_column_extent(&self) -> f64 {
        use std::collections::BTreeMap;
        let mut spans: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
        for &(x, y) in &self.pixels {
            spans
                .entry(x)
                .and_modify(|(lo, hi)| {
                    *lo = (*lo).min(y);
                    *hi = (*hi).max(y);
                })
                .or_insert((y, y));
        }
        if spans.is_empty() {
            return 0.0;
        }
        let total: usize = spans.values().map(|(lo, hi)| hi - lo).sum();
        total as f64 / spans.len() as f64
    }
}

impl Mask {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![false; w * h],
        }
    }

    /// `on` wherever `img` is at least `threshold`.
    pub fn threshold(img: &ImageF32, threshold: f32) -> Self {
        Self {
            w: img.w,
            h: img.h,
            data: img.data.iter().map(|&v| v >= threshold).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        let i = y * self.w + x;
        self.data[i] = on;
    }

    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }

    /// Number of distinct `on` pixels along the rasterised segment `p0 → p1`.
    /// Samples outside the mask are ignored.
    pub fn count_on_segment(&self, p0: [f64; 2], p1: [f64; 2]) -> usize {
        if self.w == 0 || self.h == 0 {
            return 0;
        }
        let dx = p1[0] - p0[0];
        let dy = p1[1] - p0[1];
        if !dx.is_finite() || !dy.is_finite() {
            return 0;
        }
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        let mut last: Option<(i64, i64)> = None;
        let mut count = 0;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let px = (p0[0] + t * dx).round() as i64;
            let py = (p0[1] + t * dy).round() as i64;
            if last == Some((px, py)) {
                continue;
            }
            last = Some((px, py));
            if px < 0 || py < 0 || px >= self.w as i64 || py >= self.h as i64 {
                continue;
            }
            if self.get(px as usize, py as usize) {
                count += 1;
            }
        }
        count
    }

    /// 8-bit view with `on` pixels at 255, the layout imageproc works on.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.w as u32, self.h as u32, |x, y| {
            Luma([if self.get(x as usize, y as usize) { 255 } else { 0 }])
        })
    }

    /// Non-zero pixels of `img` are `on`.
    pub fn from_gray(img: &GrayImage) -> Self {
        Self {
            w: img.width() as usize,
            h: img.height() as usize,
            data: img.pixels().map(|p| p[0] != 0).collect(),
        }
    }

    /// Square-window dilation with half-size `radius`.
    pub fn dilate(&self, radius: usize) -> Mask {
        if radius == 0 || self.data.is_empty() {
            return self.clone();
        }
        Mask::from_gray(&morphology::dilate(&self.to_gray(), Norm::LInf, window(radius)))
    }

    /// Square-window erosion with half-size `radius`. Pixels outside the mask
    /// do not erode the border.
    pub fn erode(&self, radius: usize) -> Mask {
        if radius == 0 || self.data.is_empty() {
            return self.clone();
        }
        Mask::from_gray(&morphology::erode(&self.to_gray(), Norm::LInf, window(radius)))
    }

    /// All 8-connected components, in scan order of their first pixel.
    pub fn components(&self) -> Vec<Component> {
        if self.data.is_empty() {
            return Vec::new();
        }
        let labels = connected_components(&self.to_gray(), Connectivity::Eight, Luma([0u8]));
        let mut slots: HashMap<u32, usize> = HashMap::new();
        let mut out: Vec<Component> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            if label[0] == 0 {
                continue;
            }
            let slot = *slots.entry(label[0]).or_insert_with(|| {
                out.push(Component::default());
                out.len() - 1
            });
            out[slot].pixels.push((x as usize, y as usize));
        }
        out
    }

    /// The component with the largest area; the first one found wins ties.
    pub fn largest_component(&self) -> Option<Component> {
        self.components()
            .into_iter()
            .fold(None, |best: Option<Component>, c| match best {
                Some(b) if b.area() >= c.area() => Some(b),
                _ => Some(c),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> Mask {
        let h = rows.len();
        let w = rows[0].len();
        let mut m = Mask::new(w, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                m.set(x, y, c == '#');
            }
        }
        m
    }

    #[test]
    fn dilate_then_erode_closes_gap() {
        let m = mask_from_rows(&["......", ".##.#.", "......"]);
        let closed = m.dilate(1).erode(1);
        assert!(closed.get(3, 1));
    }

    #[test]
    fn dilate_grows_by_a_square_window() {
        let m = mask_from_rows(&[".....", ".....", "..#..", ".....", "....."]);
        let grown = m.dilate(1);
        assert_eq!(grown.count_on(), 9);
        assert!(grown.get(1, 1) && grown.get(3, 3));
        assert!(!grown.get(0, 2));
    }

    #[test]
    fn erode_keeps_blob_touching_the_border() {
        let m = mask_from_rows(&["###..", "###..", "###.."]);
        let eroded = m.erode(1);
        assert!(eroded.get(0, 1));
        assert!(!eroded.get(2, 1));
    }

    #[test]
    fn gray_view_round_trips() {
        let m = mask_from_rows(&["#..", ".#.", "..#"]);
        let gray = m.to_gray();
        assert_eq!(gray.get_pixel(1, 1)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
        assert_eq!(Mask::from_gray(&gray), m);
    }

    #[test]
    fn components_follow_scan_order() {
        let m = mask_from_rows(&["...#", "#...", "#..."]);
        let comps = m.components();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].pixels, vec![(3, 0)]);
        assert_eq!(comps[1].area(), 2);
    }

    #[test]
    fn erode_removes_isolated_pixel() {
        let m = mask_from_rows(&[".....", "..#..", "....."]);
        assert_eq!(m.erode(1).count_on(), 0);
    }

    #[test]
    fn largest_component_picks_biggest_blob() {
        let m = mask_from_rows(&["##....", "##..#.", "......", "...###"]);
        let comps = m.components();
        assert_eq!(comps.len(), 2);
        let best = m.largest_component().unwrap();
        assert_eq!(best.area(), 5);
    }

    #[test]
    fn mean_column_extent_averages_spans() {
        let m = mask_from_rows(&["#..", "##.", "###"]);
        let comp = m.largest_component().unwrap();
        // spans: x0 = 2, x1 = 1, x2 = 0
        assert!((comp.mean_column_extent() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn count_on_segment_counts_each_pixel_once() {
        let m = mask_from_rows(&["......", ".####.", "......"]);
        assert_eq!(m.count_on_segment([0.0, 1.0], [5.0, 1.0]), 4);
        assert_eq!(m.count_on_segment([0.0, 0.0], [5.0, 0.0]), 0);
        assert_eq!(m.count_on_segment([-10.0, 1.0], [2.0, 1.0]), 2);
    }
}
