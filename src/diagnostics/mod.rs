//! Reports emitted by the transcriber: per-frame outputs with stage timings,
//! and the run-level summary written by the CLI.

pub mod report;
pub mod timing;

pub use report::{FrameReport, FrameSummary, TranscriptionReport};
pub use timing::{StageTiming, TimingBreakdown};
