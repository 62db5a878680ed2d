//! Parameter types configuring the transcription stages.
//!
//! [`TranscriberParams`] is the single context object handed to the
//! orchestrator; every stage reads its own nested struct. All structs
//! deserialize with `#[serde(default)]`, so a JSON file may override any
//! subset of fields.
//!
//! Defaults target a 640-pixel-wide frame with the neck running roughly
//! horizontally across the image. For tuning, start with the Hough vote
//! thresholds and the pluck factor.

use serde::{Deserialize, Serialize};

/// Top-level context shared by all stages of a run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberParams {
    pub strings: StringDetectorParams,
    pub frets: FretDetectorParams,
    pub pluck: PluckParams,
    pub note: NoteParams,
    pub tracker: TrackerParams,
    pub midi: MidiParams,
    /// Line extraction on the raw frame (strings).
    pub string_hough: HoughParams,
    /// Line extraction on the rectified neck (frets).
    pub fret_hough: HoughParams,
    pub kmeans: KMeansParams,
    pub skin: SkinParams,
}

/// Canny thresholds and accumulator settings for the Hough line extractor.
///
/// - `low_threshold`/`high_threshold`: hysteresis bounds on the Sobel
///   magnitude of `[0, 1]` intensities.
/// - `vote_threshold`: minimum accumulator votes for a line.
/// - `max_lines`: strongest lines kept.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub vote_threshold: u32,
    pub max_lines: usize,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            low_threshold: 0.3,
            high_threshold: 0.8,
            vote_threshold: 150,
            max_lines: 64,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StringDetectorParams {
    /// Strings on the instrument.
    pub string_count: usize,
    /// Maximum deviation (radians) from the mean candidate angle.
    pub angle_tolerance: f64,
    /// k for the y-intercept clustering; larger than `string_count`.
    pub initial_clusters: usize,
    /// Weight of the current frame when blending with the previous one.
    pub blend_alpha: f64,
}

impl Default for StringDetectorParams {
    fn default() -> Self {
        Self {
            string_count: 6,
            angle_tolerance: 0.35,
            initial_clusters: 8,
            blend_alpha: 0.05,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FretDetectorParams {
    /// Frets reported per frame.
    pub fret_count: usize,
    /// k for the rho clustering; larger than `fret_count`.
    pub initial_clusters: usize,
    /// Maximum |angle| (radians) from vertical in the rectified neck.
    pub vertical_tolerance: f64,
    /// Maximum deviation (radians) from the mean near-vertical angle.
    pub angle_tolerance: f64,
    pub blend_alpha: f64,
    /// Lines closer than this (pixels) are duplicates.
    pub min_separation: f64,
    /// A gap larger than `ratio × previous gap` hides 1, 2 or 3 frets.
    pub insert_one_ratio: f64,
    pub insert_two_ratio: f64,
    pub insert_three_ratio: f64,
    /// Leading lines are dropped while their gap exceeds this multiple of the next.
    pub leading_trim_ratio: f64,
    /// Ratio between successive fret gaps used to extrapolate missing frets.
    pub spacing_ratio: f64,
}

impl Default for FretDetectorParams {
    fn default() -> Self {
        Self {
            fret_count: 20,
            initial_clusters: 24,
            vertical_tolerance: 0.35,
            angle_tolerance: 0.05,
            blend_alpha: 0.1,
            min_separation: 10.0,
            insert_one_ratio: 1.4,
            insert_two_ratio: 2.4,
            insert_three_ratio: 3.4,
            leading_trim_ratio: 1.9,
            spacing_ratio: 2f64.powf(1.0 / 12.0),
        }
    }
}

/// Thickness measurement and vibration decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PluckParams {
    /// Vibrating when thickness exceeds `baseline × factor`.
    pub factor: f64,
    pub patch_width: usize,
    pub patch_height: usize,
    /// Fraction of the fret span skipped at each end of the patch.
    pub span_inset: f64,
    /// Threshold on `|∂y|` of the blurred patch.
    pub edge_threshold: f32,
    pub dilate_radius: usize,
    pub erode_radius: usize,
    /// Largest component smaller than this fraction of the patch reads as 0.
    pub min_area_fraction: f64,
}

impl Default for PluckParams {
    fn default() -> Self {
        Self {
            factor: 1.5,
            patch_width: 120,
            patch_height: 40,
            span_inset: 1.0 / 3.0,
            edge_threshold: 0.2,
            dilate_radius: 2,
            erode_radius: 1,
            min_area_fraction: 0.05,
        }
    }
}

/// Pitch of an open string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenString {
    pub pitch_class: u8,
    pub octave: u8,
}

impl OpenString {
    pub const fn new(pitch_class: u8, octave: u8) -> Self {
        Self {
            pitch_class,
            octave,
        }
    }
}

/// Standard tuning, lowest string first.
pub const STANDARD_TUNING: [OpenString; 6] = [
    OpenString::new(4, 4),
    OpenString::new(9, 4),
    OpenString::new(2, 5),
    OpenString::new(7, 5),
    OpenString::new(11, 5),
    OpenString::new(4, 6),
];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteParams {
    /// Hand pixels on a fret segment needed to count as covered.
    pub overlap_threshold: usize,
    /// Open pitch per string index.
    pub tuning: Vec<OpenString>,
}

impl Default for NoteParams {
    fn default() -> Self {
        Self {
            overlap_threshold: 3,
            tuning: STANDARD_TUNING.to_vec(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// Musical length (ticks) assigned to the first closed note; calibrates
    /// frames per tick.
    pub ticks_for_first_note: u32,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            ticks_for_first_note: 4,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiParams {
    pub ticks_per_beat: u16,
    pub velocity: u8,
    pub channel: u8,
}

impl Default for MidiParams {
    fn default() -> Self {
        Self {
            ticks_per_beat: 4,
            velocity: 127,
            channel: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansParams {
    pub max_iterations: usize,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self { max_iterations: 50 }
    }
}

/// Skin colour rule limits (percent) and mask clean-up radii.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinParams {
    pub min_saturation: f64,
    pub min_value: f64,
    pub erode_radius: usize,
    pub dilate_radius: usize,
}

impl Default for SkinParams {
    fn default() -> Self {
        Self {
            min_saturation: 10.0,
            min_value: 40.0,
            erode_radius: 2,
            dilate_radius: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{ "pluck": { "factor": 1.2 }, "frets": { "fret_count": 12 } }"#;
        let params: TranscriberParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.pluck.factor, 1.2);
        assert_eq!(params.pluck.patch_width, 120);
        assert_eq!(params.frets.fret_count, 12);
        assert_eq!(params.strings.string_count, 6);
        assert_eq!(params.note.tuning[5], OpenString::new(4, 6));
    }
}
