#![doc = include_str!("../README.md")]

// Core value types and geometry
pub mod angle;
pub mod line;
pub mod types;

// Image processing building blocks
pub mod cluster;
pub mod edges;
pub mod homography;
pub mod hough;
pub mod image;
pub mod skin;

// Stages and orchestration
pub mod detection;
pub mod pipeline;
pub mod tracker;

// Output, evaluation and configuration
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod midi;
pub mod params;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{Result, TranscribeError};
pub use crate::line::{Line, TrackedLine};
pub use crate::params::TranscriberParams;
pub use crate::pipeline::{Transcriber, Transcription};
pub use crate::types::{Fret, GuitarString, NoteEvent, PerStringState, TimeBase};

pub use crate::diagnostics::{FrameReport, TranscriptionReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use fret_tracker::prelude::*;
///
/// # fn main() -> fret_tracker::Result<()> {
/// let frames = list_frames(std::path::Path::new("frames"))?;
/// let mut transcriber = Transcriber::new(TranscriberParams::default());
/// transcriber.run(frames.iter().map(|p| load_frame(p)), None)?;
/// let take = transcriber.finish();
/// let midi = write_sequence(&take.notes, take.time_base, &transcriber.params().midi)?;
/// println!("notes={} bytes={}", take.notes.len(), midi.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::io::{list_frames, load_frame};
    pub use crate::midi::write_sequence;
    pub use crate::{Transcriber, TranscriberParams, Transcription};
}
