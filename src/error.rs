//! Crate error type for the fallible edges of the pipeline: frame I/O,
//! configuration and MIDI serialisation. Detection stages never fail; they
//! return empty results instead.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("No frames found in {0}")]
    NoFrames(PathBuf),
}

impl TranscribeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TranscribeError>;
