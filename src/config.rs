//! JSON configuration for the `transcribe` tool.
use crate::error::{Result, TranscribeError};
use crate::params::TranscriberParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    pub midi: PathBuf,
    pub report_json: Option<PathBuf>,
    /// One overlay PNG per frame (strings green, frets red).
    pub overlay_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Directory of PNG/JPEG frames, processed in file-name order.
    pub frames_dir: PathBuf,
    /// Stop after this many frames.
    #[serde(default)]
    pub max_frames: Option<usize>,
    pub output: OutputConfig,
    /// MIDI file to score the transcription against.
    #[serde(default)]
    pub reference_midi: Option<PathBuf>,
    #[serde(default)]
    pub params: TranscriberParams,
}

impl RuntimeConfig {
    /// Rejects parameter combinations the stages cannot work with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.params;
        if p.strings.string_count < 2 {
            return Err(TranscribeError::Config(format!(
                "strings.string_count must be at least 2, got {}",
                p.strings.string_count
            )));
        }
        if p.note.tuning.len() < p.strings.string_count {
            return Err(TranscribeError::Config(format!(
                "note.tuning has {} entries for {} strings",
                p.note.tuning.len(),
                p.strings.string_count
            )));
        }
        if p.frets.fret_count < 2 {
            return Err(TranscribeError::Config(
                "frets.fret_count must be at least 2".to_string(),
            ));
        }
        if p.pluck.factor.is_nan() || p.pluck.factor <= 0.0 {
            return Err(TranscribeError::Config(format!(
                "pluck.factor must be positive, got {}",
                p.pluck.factor
            )));
        }
        if p.midi.ticks_per_beat == 0 {
            return Err(TranscribeError::Config(
                "midi.ticks_per_beat must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let contents = fs::read_to_string(path).map_err(|e| TranscribeError::io(path, e))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(
            &path,
            r#"{ "frames_dir": "frames", "output": { "midi": "out.mid" },
                 "params": { "pluck": { "factor": 1.3 } } }"#,
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.frames_dir, PathBuf::from("frames"));
        assert!(cfg.max_frames.is_none());
        assert!(cfg.output.report_json.is_none());
        assert_eq!(cfg.params.pluck.factor, 1.3);
        assert_eq!(cfg.params.strings.string_count, 6);
    }

    #[test]
    fn short_tuning_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(
            &path,
            r#"{ "frames_dir": "f", "output": { "midi": "o.mid" },
                 "params": { "note": { "tuning": [ { "pitch_class": 4, "octave": 4 } ] } } }"#,
        )
        .unwrap();
        assert!(matches!(load_config(&path), Err(TranscribeError::Config(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/cfg.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cfg.json"));
    }
}
