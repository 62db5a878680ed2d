//! Frame-by-frame transcription.
//!
//! [`Transcriber`] owns every stage together with the state carried between
//! frames (previous strings and frets, per-string baselines and held notes).
//! Each call to [`Transcriber::process_frame`] runs the whole chain for one
//! frame before returning:
//!
//! strings → frets → thickness → vibration → note transitions
//!
//! A frame without usable strings is skipped: no state changes except the
//! frame counter.
use crate::detection::{FretDetector, NoteDetector, PluckDetector, StringDetector};
use crate::diagnostics::{FrameReport, TimingBreakdown};
use crate::error::Result;
use crate::image::ImageF32;
use crate::params::TranscriberParams;
use crate::skin::{HandSegmenter, SkinSegmenter};
use crate::tracker::NoteEventTracker;
use crate::types::{Fret, GuitarString, NoteEvent, PerStringState, TimeBase};
use image::RgbImage;
use serde::Serialize;
use std::time::Instant;

/// Notes of a finished run, ordered by start frame, with the time base used
/// to place them on a musical grid.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub notes: Vec<NoteEvent>,
    pub time_base: TimeBase,
}

impl Transcription {
    pub fn midi_keys(&self) -> Vec<u8> {
        self.notes.iter().map(NoteEvent::midi_key).collect()
    }
}

pub struct Transcriber {
    params: TranscriberParams,
    strings: StringDetector,
    frets: FretDetector,
    pluck: PluckDetector,
    notes: NoteDetector,
    hands: Box<dyn HandSegmenter>,
    tracker: NoteEventTracker,
    states: Vec<PerStringState>,
    prev_strings: Option<Vec<GuitarString>>,
    prev_frets: Option<Vec<Fret>>,
    frame: u64,
    closed: Vec<NoteEvent>,
}

impl Transcriber {
    /// Transcriber with the default line extractor, clusterer and skin
    /// segmenter, all configured from `params`.
    pub fn new(params: TranscriberParams) -> Self {
        let strings = StringDetector::with_defaults(
            params.strings.clone(),
            params.string_hough.clone(),
            params.kmeans.clone(),
        );
        let frets = FretDetector::with_defaults(
            params.frets.clone(),
            params.fret_hough.clone(),
            params.kmeans.clone(),
        );
        let hands = Box::new(SkinSegmenter::new(params.skin.clone()));
        Self::with_components(params, strings, frets, hands)
    }

    pub fn with_components(
        params: TranscriberParams,
        strings: StringDetector,
        frets: FretDetector,
        hands: Box<dyn HandSegmenter>,
    ) -> Self {
        Self {
            pluck: PluckDetector::new(params.pluck.clone(), params.strings.string_count),
            notes: NoteDetector::new(params.note.clone()),
            tracker: NoteEventTracker::new(params.tracker.clone()),
            params,
            strings,
            frets,
            hands,
            states: Vec::new(),
            prev_strings: None,
            prev_frets: None,
            frame: 0,
            closed: Vec::new(),
        }
    }

    pub fn params(&self) -> &TranscriberParams {
        &self.params
    }

    /// Index the next processed frame will get.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn states(&self) -> &[PerStringState] {
        &self.states
    }

    /// Notes closed so far.
    pub fn closed_notes(&self) -> &[NoteEvent] {
        &self.closed
    }

    pub fn process_frame(&mut self, frame: &RgbImage) -> FrameReport {
        let total_start = Instant::now();
        let index = self.frame;
        self.frame += 1;
        let mut timings = TimingBreakdown::default();

        let gray = ImageF32::from_rgb(frame);
        let strings = timings.time("strings", || {
            self.strings.detect(&gray, self.prev_strings.as_deref())
        });
        if strings.is_empty() {
            log::debug!("Transcriber::process_frame frame={} skipped: no strings", index);
            timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
            return FrameReport {
                frame: index,
                strings,
                frets: Vec::new(),
                vibrating: Vec::new(),
                closed_notes: Vec::new(),
                timings,
            };
        }
        self.prev_strings = Some(strings.clone());

        let frets = timings.time("frets", || {
            self.frets.detect(&gray, &strings, self.prev_frets.as_deref())
        });
        if !frets.is_empty() {
            self.prev_frets = Some(frets.clone());
        }

        let thickness = timings.time("pluck", || self.pluck.measure_all(&gray, &strings, &frets));
        let vibrating = self.pluck.update(&mut self.states, &thickness);

        let closed_notes = match &vibrating {
            Some(flags) => {
                let notes = &self.notes;
                let hands = &self.hands;
                let tracker = &mut self.tracker;
                let states = &mut self.states;
                timings.time("notes", || {
                    // a note can only start where the fret position resolves
                    let starting = frets.len() >= 2
                        && flags
                            .iter()
                            .zip(states.iter())
                            .any(|(&v, s)| v && s.held_note.is_none());
                    let hand = starting.then(|| hands.segment(frame));
                    tracker.step(states, flags, index, |i| {
                        let hand = hand.as_ref()?;
                        notes.get_note(i, &strings, &frets, hand, index)
                    })
                })
            }
            None => Vec::new(),
        };
        self.closed.extend(closed_notes.iter().cloned());

        timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "Transcriber::process_frame frame={} strings={} frets={} vibrating={:?} closed={} ms={:.2}",
            index,
            strings.len(),
            frets.len(),
            vibrating,
            closed_notes.len(),
            timings.total_ms
        );
        FrameReport {
            frame: index,
            strings,
            frets,
            vibrating: vibrating.unwrap_or_default(),
            closed_notes,
            timings,
        }
    }

    /// Processes frames in order, stopping after `max_frames` when given.
    /// The first frame error aborts the run.
    pub fn run<I>(&mut self, frames: I, max_frames: Option<usize>) -> Result<Vec<FrameReport>>
    where
        I: IntoIterator<Item = Result<RgbImage>>,
    {
        self.run_with(frames, max_frames, |_, _| Ok(()))
    }

    /// [`run`](Self::run) that hands each frame and its report to
    /// `on_frame` before moving on. An error from `on_frame` aborts the run.
    pub fn run_with<I, F>(
        &mut self,
        frames: I,
        max_frames: Option<usize>,
        mut on_frame: F,
    ) -> Result<Vec<FrameReport>>
    where
        I: IntoIterator<Item = Result<RgbImage>>,
        F: FnMut(&RgbImage, &FrameReport) -> Result<()>,
    {
        let limit = max_frames.unwrap_or(usize::MAX);
        let mut reports = Vec::new();
        for frame in frames.into_iter().take(limit) {
            let frame = frame?;
            let report = self.process_frame(&frame);
            on_frame(&frame, &report)?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Closes notes still sounding one frame after the last processed frame
    /// and returns every note of the run.
    pub fn finish(&mut self) -> Transcription {
        let flushed = self.tracker.flush(&mut self.states, self.frame);
        self.closed.extend(flushed);
        let mut notes = self.closed.clone();
        notes.sort_by_key(|n| (n.start_frame, n.string_index));
        let time_base = self.tracker.time_base().unwrap_or_else(|| {
            log::warn!("Transcriber::finish no note closed; using 1 frame per tick");
            TimeBase::default()
        });
        Transcription { notes, time_base }
    }
}
