use super::timing::TimingBreakdown;
use crate::types::{Fret, GuitarString, NoteEvent, TimeBase};
use serde::Serialize;

/// Everything the transcriber produced for one frame.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub frame: u64,
    pub strings: Vec<GuitarString>,
    pub frets: Vec<Fret>,
    /// One flag per string; empty when the vibration test did not run.
    pub vibrating: Vec<bool>,
    pub closed_notes: Vec<NoteEvent>,
    pub timings: TimingBreakdown,
}

impl FrameReport {
    /// Frame without usable strings: prior state was kept unchanged.
    pub fn skipped(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Compact per-frame line kept in the run report.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSummary {
    pub frame: u64,
    pub string_count: usize,
    pub fret_count: usize,
    pub vibrating: Vec<bool>,
    pub total_ms: f64,
}

impl From<&FrameReport> for FrameSummary {
    fn from(r: &FrameReport) -> Self {
        Self {
            frame: r.frame,
            string_count: r.strings.len(),
            fret_count: r.frets.len(),
            vibrating: r.vibrating.clone(),
            total_ms: r.timings.total_ms,
        }
    }
}

/// Run-level report written by the CLI.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionReport {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub time_base: TimeBase,
    pub notes: Vec<NoteEvent>,
    pub frames: Vec<FrameSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_score: Option<i64>,
}

fn format_optional(val: Option<i64>) -> String {
    val.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl TranscriptionReport {
    pub fn summary_line(&self) -> String {
        format!(
            "frames={} skipped={} notes={} framesPerTick={} offset={} score={}",
            self.frames_processed,
            self.frames_skipped,
            self.notes.len(),
            self.time_base.frames_per_tick,
            self.time_base.start_frame_offset,
            format_optional(self.alignment_score)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_marks_missing_score() {
        let report = TranscriptionReport {
            frames_processed: 10,
            frames_skipped: 2,
            time_base: TimeBase::default(),
            notes: vec![NoteEvent::new(4, 4, 0, 1).closed_at(3)],
            frames: Vec::new(),
            alignment_score: None,
        };
        let line = report.summary_line();
        assert!(line.contains("notes=1"));
        assert!(line.ends_with("score=-"));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"framesSkipped\":2"));
        assert!(!json.contains("alignmentScore"));
    }
}
