//! I/O helpers for frames, debug overlays and JSON.
//!
//! - `list_frames`: collect PNG/JPEG frames of a directory in file-name order.
//! - `load_frame`: decode one frame into an owned RGB buffer.
//! - `save_overlay`: draw strings and frets over a frame and write it as PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use crate::error::{Result, TranscribeError};
use crate::line::Line;
use image::{Rgb, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const STRING_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const FRET_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);

/// Frame files in `dir`, sorted by file name.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| TranscribeError::io(dir, e))?;
    let mut frames = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TranscribeError::io(dir, e))?.path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_frame && path.is_file() {
            frames.push(path);
        }
    }
    if frames.is_empty() {
        return Err(TranscribeError::NoFrames(dir.to_path_buf()));
    }
    frames.sort();
    Ok(frames)
}

/// Load an image from disk and convert to 8-bit RGB.
pub fn load_frame(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| TranscribeError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.into_rgb8())
}

/// Copy of `frame` with strings drawn in green and frets in red.
pub fn draw_overlay(frame: &RgbImage, strings: &[&Line], frets: &[&Line]) -> RgbImage {
    let mut out = frame.clone();
    for line in strings {
        draw_line(&mut out, line, STRING_COLOUR);
    }
    for line in frets {
        draw_line(&mut out, line, FRET_COLOUR);
    }
    out
}

/// Write the overlay of `strings` and `frets` on `frame` to `path`.
pub fn save_overlay(frame: &RgbImage, strings: &[&Line], frets: &[&Line], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    draw_overlay(frame, strings, frets)
        .save(path)
        .map_err(|source| TranscribeError::Image {
            path: path.to_path_buf(),
            source,
        })
}

// Steps along whichever axis the line spans more steeply so it stays connected.
fn draw_line(img: &mut RgbImage, line: &Line, colour: Rgb<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let (sin_t, cos_t) = line.theta().sin_cos();
    let mut put = |x: f64, y: f64| {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let (px, py) = (x.round() as i64, y.round() as i64);
        if px >= 0 && py >= 0 && px < w && py < h {
            img.put_pixel(px as u32, py as u32, colour);
        }
    };
    if sin_t.abs() >= cos_t.abs() {
        for x in 0..w {
            let xf = x as f64;
            put(xf, (line.rho() - xf * cos_t) / sin_t);
        }
    } else {
        for y in 0..h {
            let yf = y as f64;
            put((line.rho() - yf * sin_t) / cos_t, yf);
        }
    }
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| TranscribeError::io(path, e))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| TranscribeError::io(parent, e))?;
        }
    }
    Ok(())
}
