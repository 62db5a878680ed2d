use crate::line::{Line, TrackedLine};
use serde::{Deserialize, Serialize};

/// A detected string: its centre line, the spread of the detections that
/// formed it, and its position counted from the top of the neck.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuitarString {
    pub line: Line,
    pub thickness: f64,
    pub index: usize,
}

impl GuitarString {
    pub fn new(line: Line, thickness: f64) -> Self {
        Self {
            line,
            thickness,
            index: 0,
        }
    }
}

impl TrackedLine for GuitarString {
    fn line(&self) -> &Line {
        &self.line
    }

    fn with_line(&self, line: Line) -> Self {
        Self {
            line,
            thickness: self.thickness,
            index: self.index,
        }
    }

    fn synthetic(line: Line) -> Self {
        Self::new(line, 0.0)
    }
}

/// A fret in original-frame coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fret {
    pub line: Line,
}

impl Fret {
    pub fn new(line: Line) -> Self {
        Self { line }
    }
}

impl TrackedLine for Fret {
    fn line(&self) -> &Line {
        &self.line
    }

    fn with_line(&self, line: Line) -> Self {
        Self { line }
    }

    fn synthetic(line: Line) -> Self {
        Self { line }
    }
}

/// A note on one string. Open while `end_frame` is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub pitch_class: u8,
    pub octave: u8,
    pub string_index: usize,
    pub start_frame: u64,
    pub end_frame: Option<u64>,
}

impl NoteEvent {
    pub fn new(pitch_class: u8, octave: u8, string_index: usize, start_frame: u64) -> Self {
        Self {
            pitch_class,
            octave,
            string_index,
            start_frame,
            end_frame: None,
        }
    }

    /// MIDI key number, `pitch_class + 12 · octave`, clamped to the MIDI range.
    pub fn midi_key(&self) -> u8 {
        (self.pitch_class as u32 + 12 * self.octave as u32).min(127) as u8
    }

    pub fn is_closed(&self) -> bool {
        self.end_frame.is_some()
    }

    /// Closed copy ending at `frame` (never before the start).
    pub fn closed_at(&self, frame: u64) -> NoteEvent {
        NoteEvent {
            end_frame: Some(frame.max(self.start_frame)),
            ..self.clone()
        }
    }

    /// Length in frames; zero while open.
    pub fn duration_frames(&self) -> u64 {
        self.end_frame
            .map_or(0, |end| end.saturating_sub(self.start_frame))
    }
}

/// Per-string state carried across the whole video.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerStringState {
    /// Resting thickness; `0` means unknown or unmeasurable.
    pub baseline_thickness: f64,
    pub held_note: Option<NoteEvent>,
}

/// Mapping from frame indices to musical ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBase {
    pub frames_per_tick: u64,
    pub start_frame_offset: u64,
}

impl Default for TimeBase {
    fn default() -> Self {
        Self {
            frames_per_tick: 1,
            start_frame_offset: 0,
        }
    }
}

impl TimeBase {
    /// Tick at which `frame` falls; frames before the offset map to 0.
    pub fn tick_of(&self, frame: u64) -> u64 {
        let frames = frame.saturating_sub(self.start_frame_offset) as f64;
        (frames / self.frames_per_tick.max(1) as f64).round() as u64
    }

    /// Length in ticks of a span of frames, at least one tick.
    pub fn ticks_for(&self, frames: u64) -> u64 {
        ((frames as f64 / self.frames_per_tick.max(1) as f64).round() as u64).max(1)
    }
}
