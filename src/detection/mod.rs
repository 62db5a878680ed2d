//! Per-frame geometric detection stages: strings, frets, vibration and
//! fretted pitch, plus the shared line-list repair they build on.

pub mod frets;
pub mod note;
pub mod pluck;
pub mod spacing;
pub mod strings;

pub use frets::{neck_homography, FretDetector};
pub use note::{pitch_for, NoteDetector};
pub use pluck::{is_vibrating, PluckDetector};
pub use strings::StringDetector;
