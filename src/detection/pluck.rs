//! String vibration from apparent thickness.
//!
//! A vibrating string sweeps a wider blurred band during one exposure than a
//! resting one. Each string is cut out as a small rectangle (half the
//! distance to its neighbour on either side, the middle third of the fret
//! span along it), warped to a canonical patch, and measured as the mean
//! vertical extent of the largest edge blob. The first valid frame seeds a
//! per-string baseline; later frames compare against it.
use crate::edges::vertical_gradient_abs;
use crate::homography::{solve_homography, warp_perspective};
use crate::image::{ImageF32, Mask};
use crate::line::Line;
use crate::params::PluckParams;
use crate::types::{Fret, GuitarString, PerStringState};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// `current > baseline × factor`, with an unmeasurable reading (0) on either
/// side never counting as vibration.
pub fn is_vibrating(current: f64, baseline: f64, factor: f64) -> bool {
    current != 0.0 && baseline != 0.0 && current > baseline * factor
}

#[derive(Clone, Debug)]
pub struct PluckDetector {
    pub params: PluckParams,
    pub string_count: usize,
}

impl PluckDetector {
    pub fn new(params: PluckParams, string_count: usize) -> Self {
        Self {
            params,
            string_count,
        }
    }

    /// Corners of the measurement rectangle around string `index`, ordered
    /// top-left, top-right, bottom-right, bottom-left.
    pub fn patch_corners(
        &self,
        strings: &[GuitarString],
        frets: &[Fret],
        index: usize,
        frame_w: usize,
    ) -> Option<[[f64; 2]; 4]> {
        let string = &strings.get(index)?.line;
        let neighbour = if index + 1 < strings.len() {
            &strings[index + 1].line
        } else {
            &strings.get(index.checked_sub(1)?)?.line
        };
        let half = (neighbour.offset_along(string.theta()) - string.rho()).abs() / 2.0;
        if half <= 0.0 || !half.is_finite() {
            return None;
        }

        let (start, end) = match (frets.first(), frets.last()) {
            (Some(a), Some(b)) if frets.len() >= 2 => {
                (string.collision(&a.line)?, string.collision(&b.line)?)
            }
            _ => (
                string.collision(&Line::new(0.0, 0.0))?,
                string.collision(&Line::new(frame_w as f64, 0.0))?,
            ),
        };
        let inset = self.params.span_inset.clamp(0.0, 0.49);
        let lerp = |t: f64| {
            [
                start[0] + (end[0] - start[0]) * t,
                start[1] + (end[1] - start[1]) * t,
            ]
        };
        let (p0, p1) = (lerp(inset), lerp(1.0 - inset));
        let n = string.normal();
        let shift = |p: [f64; 2], s: f64| [p[0] + n[0] * s, p[1] + n[1] * s];
        Some([
            shift(p0, -half),
            shift(p1, -half),
            shift(p1, half),
            shift(p0, half),
        ])
    }

    /// Thickness of string `index`; 0 when the patch cannot be built or holds
    /// no significant blob.
    pub fn measure_thickness(
        &self,
        img: &ImageF32,
        strings: &[GuitarString],
        frets: &[Fret],
        index: usize,
    ) -> f64 {
        let (pw, ph) = (self.params.patch_width, self.params.patch_height);
        let Some(corners) = self.patch_corners(strings, frets, index, img.w) else {
            return 0.0;
        };
        let dst = [
            [0.0, 0.0],
            [pw as f64, 0.0],
            [pw as f64, ph as f64],
            [0.0, ph as f64],
        ];
        let Some(h) = solve_homography(&corners, &dst) else {
            return 0.0;
        };
        let patch = warp_perspective(img, &h, pw, ph);
        self.measure_patch(&patch)
    }

    /// Mean column extent of the largest blob of strong vertical gradient.
    pub fn measure_patch(&self, patch: &ImageF32) -> f64 {
        let edges = vertical_gradient_abs(&patch.blur3());
        let mask = Mask::threshold(&edges, self.params.edge_threshold)
            .dilate(self.params.dilate_radius)
            .erode(self.params.erode_radius);
        let Some(blob) = mask.largest_component() else {
            return 0.0;
        };
        let min_area = self.params.min_area_fraction * (patch.w * patch.h) as f64;
        if (blob.area() as f64) < min_area {
            return 0.0;
        }
        blob.mean_column_extent()
    }

    /// Thickness of every string. Measurements are independent and only read
    /// shared data.
    pub fn measure_all(&self, img: &ImageF32, strings: &[GuitarString], frets: &[Fret]) -> Vec<f64> {
        #[cfg(feature = "parallel")]
        let out = (0..strings.len())
            .into_par_iter()
            .map(|i| self.measure_thickness(img, strings, frets, i))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let out = (0..strings.len())
            .map(|i| self.measure_thickness(img, strings, frets, i))
            .collect();
        out
    }

    /// Applies one frame of measurements to the per-string state.
    ///
    /// Returns `None` when the string count is wrong or when the frame only
    /// (re)seeds baselines; otherwise one vibration flag per string.
    pub fn update(&self, states: &mut Vec<PerStringState>, thickness: &[f64]) -> Option<Vec<bool>> {
        if thickness.len() != self.string_count {
            return None;
        }
        if states.len() < thickness.len() {
            states.resize_with(thickness.len(), PerStringState::default);
            for (state, &t) in states.iter_mut().zip(thickness) {
                state.baseline_thickness = t;
            }
            log::debug!("PluckDetector::update seeded baselines={:?}", thickness);
            return None;
        }
        Some(
            thickness
                .iter()
                .zip(states.iter())
                .map(|(&t, s)| is_vibrating(t, s.baseline_thickness, self.params.factor))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn strings_at(ys: &[f64]) -> Vec<GuitarString> {
        ys.iter()
            .enumerate()
            .map(|(i, &y)| GuitarString {
                index: i,
                ..GuitarString::new(Line::new(y, FRAC_PI_2), 0.0)
            })
            .collect()
    }

    #[test]
    fn thickness_sequence_against_baseline() {
        let flags: Vec<bool> = [5.0, 5.0, 12.0]
            .iter()
            .map(|&t| is_vibrating(t, 5.0, 1.2))
            .collect();
        assert_eq!(flags, vec![false, false, true]);
        assert!(!is_vibrating(12.0, 0.0, 1.2));
        assert!(!is_vibrating(0.0, 5.0, 0.5));
    }

    #[test]
    fn first_frame_seeds_then_compares() {
        let detector = PluckDetector::new(
            PluckParams {
                factor: 1.2,
                ..PluckParams::default()
            },
            3,
        );
        let mut states = Vec::new();
        assert!(detector.update(&mut states, &[5.0, 5.0, 5.0]).is_none());
        assert_eq!(states.len(), 3);
        let flags = detector.update(&mut states, &[5.0, 6.5, 12.0]).unwrap();
        assert_eq!(flags, vec![false, true, true]);
        assert!(detector.update(&mut states, &[5.0, 5.0]).is_none());
    }

    #[test]
    fn patch_spans_middle_third_between_neighbours() {
        let detector = PluckDetector::new(PluckParams::default(), 6);
        let strings = strings_at(&[40.0, 50.0, 60.0, 70.0, 80.0, 90.0]);
        let frets = vec![Fret::new(Line::new(30.0, 0.0)), Fret::new(Line::new(120.0, 0.0))];
        let c = detector.patch_corners(&strings, &frets, 2, 200).unwrap();
        assert!((c[0][0] - 60.0).abs() < 1e-6);
        assert!((c[1][0] - 90.0).abs() < 1e-6);
        assert!((c[0][1] - 55.0).abs() < 1e-6);
        assert!((c[2][1] - 65.0).abs() < 1e-6);
        // last string borrows its lower neighbour's spacing
        let last = detector.patch_corners(&strings, &frets, 5, 200).unwrap();
        assert!((last[3][1] - last[0][1] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn blurred_band_reads_thicker_than_sharp_line() {
        let detector = PluckDetector::new(PluckParams::default(), 6);
        let mut sharp = ImageF32::new(120, 40);
        for y in 18..22 {
            sharp.row_mut(y).iter_mut().for_each(|v| *v = 0.9);
        }
        let mut wide = ImageF32::new(120, 40);
        for y in 8..32 {
            let v = 0.9 * (1.0 - (y as f32 - 19.5).abs() / 12.0);
            wide.row_mut(y).iter_mut().for_each(|p| *p = v);
        }
        let thin = detector.measure_patch(&sharp);
        let thick = detector.measure_patch(&wide);
        assert!(thin > 0.0);
        assert!(thick > thin * 1.5, "thin={thin} thick={thick}");
        assert_eq!(detector.measure_patch(&ImageF32::new(120, 40)), 0.0);
    }
}
