//! Fret estimation on a perspective-rectified view of the neck.
//!
//! The outermost strings, cut by the left and right image borders, bound a
//! quadrilateral that is warped onto the full frame rectangle. Frets are
//! perpendicular to the strings on the instrument, so in the rectified view
//! they are close to vertical and a tight angle filter separates them from
//! everything else. Reconstructed frets are mapped back with the inverse
//! homography and blended with the previous frame.
use super::spacing::{filter_by_mean_angle, median_representatives, reconstruct_frets, smooth};
use crate::angle::direction_delta;
use crate::cluster::{group_by_label, Clusterer, KMeans1d};
use crate::homography::{solve_homography, warp_perspective, Homography};
use crate::hough::{HoughLineExtractor, LineExtractor};
use crate::image::ImageF32;
use crate::line::{Line, DEFAULT_EXTENT};
use crate::params::{FretDetectorParams, HoughParams, KMeansParams};
use crate::types::{Fret, GuitarString};

pub struct FretDetector {
    pub params: FretDetectorParams,
    extractor: Box<dyn LineExtractor + Send + Sync>,
    clusterer: Box<dyn Clusterer + Send + Sync>,
}

/// Homography taking the neck quadrilateral of a `w × h` frame onto the
/// rectangle `(0,0)–(w,h)`. `None` with fewer than two strings or when the
/// outer strings do not cross the image borders.
pub fn neck_homography(strings: &[GuitarString], w: usize, h: usize) -> Option<Homography> {
    if strings.len() < 2 {
        return None;
    }
    let (w, h) = (w as f64, h as f64);
    let left = Line::new(0.0, 0.0);
    let right = Line::new(w, 0.0);
    let first = &strings[0].line;
    let last = &strings[strings.len() - 1].line;
    let src = [
        first.collision(&left)?,
        first.collision(&right)?,
        last.collision(&right)?,
        last.collision(&left)?,
    ];
    let dst = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
    solve_homography(&src, &dst)
}

impl FretDetector {
    pub fn new(
        params: FretDetectorParams,
        extractor: Box<dyn LineExtractor + Send + Sync>,
        clusterer: Box<dyn Clusterer + Send + Sync>,
    ) -> Self {
        Self {
            params,
            extractor,
            clusterer,
        }
    }

    pub fn with_defaults(params: FretDetectorParams, hough: HoughParams, kmeans: KMeansParams) -> Self {
        Self::new(
            params,
            Box::new(HoughLineExtractor::new(hough)),
            Box::new(KMeans1d::new(kmeans)),
        )
    }

    /// Frets of `img` in frame coordinates, in order along the neck. Empty when the
    /// neck cannot be rectified or too few frets are found.
    pub fn detect(
        &self,
        img: &ImageF32,
        strings: &[GuitarString],
        previous: Option<&[Fret]>,
    ) -> Vec<Fret> {
        let Some(neck) = neck_homography(strings, img.w, img.h) else {
            log::debug!("FretDetector::detect strings={} neck unresolved", strings.len());
            return Vec::new();
        };
        let rectified = warp_perspective(img, &neck, img.w, img.h);
        let lines = self.rectified_frets(&rectified);
        if lines.is_empty() {
            return Vec::new();
        }

        // Endpoints within one frame size keep the mapping clear of the horizon.
        let extent = img.w.max(img.h) as f64;
        let mapped: Option<Vec<Fret>> = lines
            .iter()
            .map(|l| {
                l.clone()
                    .with_extent(extent)
                    .apply_homography(&neck.inverse)
                    .map(|m| Fret::new(m.with_extent(DEFAULT_EXTENT)))
            })
            .collect();
        let Some(mapped) = mapped else {
            log::debug!("FretDetector::detect inverse mapping failed");
            return Vec::new();
        };
        smooth(mapped, previous, self.params.blend_alpha)
    }

    /// Reconstructed fret lines in rectified coordinates.
    pub fn rectified_frets(&self, rectified: &ImageF32) -> Vec<Line> {
        let raw = self.extractor.extract(rectified);
        let raw_count = raw.len();
        let vertical: Vec<Line> = raw
            .into_iter()
            .filter(|l| direction_delta(0.0, l.theta()).abs() <= self.params.vertical_tolerance)
            .collect();
        let aligned = filter_by_mean_angle(vertical, self.params.angle_tolerance);
        if aligned.is_empty() {
            log::debug!("FretDetector::detect raw={} no vertical candidates", raw_count);
            return Vec::new();
        }

        // frets lean either side of vertical, so cluster on offsets along x
        let offsets: Vec<f64> = aligned.iter().map(|l| l.offset_along(0.0)).collect();
        let k = self.params.initial_clusters.min(aligned.len());
        let labels = self.clusterer.cluster(&offsets, k);
        let candidates: Vec<Line> = median_representatives(group_by_label(&aligned, &labels))
            .into_iter()
            .map(|(line, _)| line)
            .collect();
        let frets = reconstruct_frets(candidates, self.params.fret_count, &self.params);
        log::debug!(
            "FretDetector::detect raw={} aligned={} frets={}",
            raw_count,
            aligned.len(),
            frets.len()
        );
        frets
    }
}
