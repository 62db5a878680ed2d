use fret_tracker::config::{self, RuntimeConfig};
use fret_tracker::diagnostics::{FrameSummary, TranscriptionReport};
use fret_tracker::evaluation::{alignment_score, AlignmentScoring};
use fret_tracker::image::io::{list_frames, load_frame, save_overlay, write_json_file};
use fret_tracker::midi::{read_midi_file, write_midi_file};
use fret_tracker::{Line, Transcriber};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = config::load_config(Path::new(&config_path))?;
    let report = transcribe(&config)?;

    println!("{}", report.summary_line());
    for note in &report.notes {
        println!(
            "  string={} key={} frames={}..{}",
            note.string_index,
            note.midi_key(),
            note.start_frame,
            note.end_frame.unwrap_or(note.start_frame)
        );
    }
    println!("Saved MIDI to {}", config.output.midi.display());
    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
        println!("Saved report to {}", path.display());
    }
    Ok(())
}

fn transcribe(config: &RuntimeConfig) -> fret_tracker::Result<TranscriptionReport> {
    let paths = list_frames(&config.frames_dir)?;
    let mut transcriber = Transcriber::new(config.params.clone());
    let frames = paths.iter().map(|p| load_frame(p));
    let reports = transcriber.run_with(frames, config.max_frames, |frame, report| {
        let Some(dir) = &config.output.overlay_dir else {
            return Ok(());
        };
        let strings: Vec<&Line> = report.strings.iter().map(|s| &s.line).collect();
        let frets: Vec<&Line> = report.frets.iter().map(|f| &f.line).collect();
        let name = format!("frame_{:05}.png", report.frame);
        save_overlay(frame, &strings, &frets, &dir.join(name))
    })?;
    let skipped = reports.iter().filter(|r| r.skipped()).count() as u64;
    let frames: Vec<FrameSummary> = reports.iter().map(FrameSummary::from).collect();

    let frames_processed = transcriber.frame_index();
    let take = transcriber.finish();
    write_midi_file(
        &config.output.midi,
        &take.notes,
        take.time_base,
        &transcriber.params().midi,
    )?;

    let alignment_score = match &config.reference_midi {
        Some(path) => {
            let reference = read_midi_file(path)?;
            Some(alignment_score(
                &take.midi_keys(),
                &reference,
                AlignmentScoring::default(),
            ))
        }
        None => None,
    };

    Ok(TranscriptionReport {
        frames_processed,
        frames_skipped: skipped,
        time_base: take.time_base,
        notes: take.notes,
        frames,
        alignment_score,
    })
}

fn usage() -> String {
    "Usage: transcribe <config.json>".to_string()
}
