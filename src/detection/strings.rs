//! Per-frame string estimation with temporal smoothing.
//!
//! Pipeline per frame:
//! 1. extract raw lines from the whole frame,
//! 2. keep the dominant direction (strings are near-parallel),
//! 3. cluster by y-intercept and take each cluster's median member,
//! 4. repair the list to exactly `string_count` lines,
//! 5. blend with the previous frame's strings.
use super::spacing::{filter_by_mean_angle, median_representatives, repair_to_count, smooth};
use crate::cluster::{group_by_label, Clusterer, KMeans1d};
use crate::hough::{HoughLineExtractor, LineExtractor};
use crate::image::ImageF32;
use crate::params::{HoughParams, KMeansParams, StringDetectorParams};
use crate::types::GuitarString;

pub struct StringDetector {
    pub params: StringDetectorParams,
    extractor: Box<dyn LineExtractor + Send + Sync>,
    clusterer: Box<dyn Clusterer + Send + Sync>,
}

impl StringDetector {
    pub fn new(
        params: StringDetectorParams,
        extractor: Box<dyn LineExtractor + Send + Sync>,
        clusterer: Box<dyn Clusterer + Send + Sync>,
    ) -> Self {
        Self {
            params,
            extractor,
            clusterer,
        }
    }

    /// Detector using the Hough extractor and 1-D k-means.
    pub fn with_defaults(params: StringDetectorParams, hough: HoughParams, kmeans: KMeansParams) -> Self {
        Self::new(
            params,
            Box::new(HoughLineExtractor::new(hough)),
            Box::new(KMeans1d::new(kmeans)),
        )
    }

    /// Strings of `img`, ordered down the image and indexed from 0. Empty when
    /// the frame holds no usable candidates.
    pub fn detect(&self, img: &ImageF32, previous: Option<&[GuitarString]>) -> Vec<GuitarString> {
        let raw = self.extractor.extract(img);
        let raw_count = raw.len();
        let parallel = filter_by_mean_angle(raw, self.params.angle_tolerance);

        let (lines, intercepts): (Vec<_>, Vec<f64>) = parallel
            .into_iter()
            .filter_map(|l| l.y_intercept().map(|y| (l, y)))
            .unzip();
        if lines.is_empty() {
            log::debug!("StringDetector::detect raw={} no candidates", raw_count);
            return Vec::new();
        }

        let k = self.params.initial_clusters.min(lines.len());
        let labels = self.clusterer.cluster(&intercepts, k);
        let candidates: Vec<GuitarString> = median_representatives(group_by_label(&lines, &labels))
            .into_iter()
            .map(|(line, spread)| GuitarString::new(line, spread))
            .collect();

        let repaired = repair_to_count(candidates, self.params.string_count);
        log::debug!(
            "StringDetector::detect raw={} kept={} strings={}",
            raw_count,
            lines.len(),
            repaired.len()
        );
        if repaired.is_empty() {
            return Vec::new();
        }

        smooth(repaired, previous, self.params.blend_alpha)
            .into_iter()
            .enumerate()
            .map(|(index, s)| GuitarString { index, ..s })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::Line;
    use std::f64::consts::FRAC_PI_2;

    struct FixedLines(Vec<Line>);

    impl LineExtractor for FixedLines {
        fn extract(&self, _img: &ImageF32) -> Vec<Line> {
            self.0.clone()
        }
    }

    fn detector(lines: Vec<Line>) -> StringDetector {
        StringDetector::new(
            StringDetectorParams::default(),
            Box::new(FixedLines(lines)),
            Box::new(KMeans1d::default()),
        )
    }

    #[test]
    fn paired_edges_collapse_to_six_strings() {
        // two edge lines per string, strings every 20 px
        let lines: Vec<Line> = (0..6)
            .flat_map(|i| {
                let y = 50.0 + 20.0 * i as f64;
                [Line::new(y - 1.0, FRAC_PI_2), Line::new(y + 1.0, FRAC_PI_2)]
            })
            .chain(std::iter::once(Line::new(80.0, 0.0)))
            .collect();
        let strings = detector(lines).detect(&ImageF32::new(4, 4), None);
        assert_eq!(strings.len(), 6);
        for (i, s) in strings.iter().enumerate() {
            assert_eq!(s.index, i);
            assert!((s.line.theta() - FRAC_PI_2).abs() < 1e-9);
        }
        let rhos: Vec<f64> = strings.iter().map(|s| s.line.rho()).collect();
        assert!(rhos.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn tilted_neck_keeps_every_string_in_order() {
        // y = 0.2x + c: the normal leans past π/2 and ρ changes sign mid-neck
        let cs = [20.0, -25.0, 50.0, 5.0, -10.0, 35.0];
        let lines: Vec<Line> = cs
            .iter()
            .map(|&c| Line::through_points([0.0, c], [100.0, c + 20.0]).unwrap())
            .collect();
        let strings = detector(lines).detect(&ImageF32::new(4, 4), None);
        assert_eq!(strings.len(), 6);
        let expected = [-25.0, -10.0, 5.0, 20.0, 35.0, 50.0];
        for (s, c) in strings.iter().zip(expected) {
            let y = s.line.y_intercept().unwrap();
            assert!((y - c).abs() < 1e-6, "string {} at {y}, expected {c}", s.index);
            assert!((s.line.gradient().unwrap() - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn no_candidates_gives_empty() {
        let strings = detector(Vec::new()).detect(&ImageF32::new(4, 4), None);
        assert!(strings.is_empty());
    }

    #[test]
    fn history_dominates_smoothed_output() {
        let previous: Vec<GuitarString> = (0..6)
            .map(|i| GuitarString {
                index: i,
                ..GuitarString::new(Line::new(100.0 + 10.0 * i as f64, FRAC_PI_2), 0.0)
            })
            .collect();
        let lines: Vec<Line> = (0..6)
            .map(|i| Line::new(120.0 + 10.0 * i as f64, FRAC_PI_2))
            .collect();
        let strings = detector(lines).detect(&ImageF32::new(4, 4), Some(&previous));
        assert_eq!(strings.len(), 6);
        assert!((strings[0].line.rho() - 101.0).abs() < 1e-6);
    }
}
