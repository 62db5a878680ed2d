//! Standard MIDI File output for transcribed notes.
//!
//! One track, metrical timing with `ticks_per_beat` pulses per quarter note.
//! Frame indices become ticks through the [`TimeBase`] fixed by the tracker.
use crate::error::{Result, TranscribeError};
use crate::image::io::ensure_parent_dir;
use crate::params::MidiParams;
use crate::types::{NoteEvent, TimeBase};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::path::Path;

/// Encodes closed notes as a single-track SMF. Open notes are skipped.
pub fn write_sequence(notes: &[NoteEvent], time_base: TimeBase, params: &MidiParams) -> Result<Vec<u8>> {
    // (tick, is_on, key); offs sort before ons on the same tick so repeated
    // keys retrigger
    let mut events: Vec<(u64, bool, u8)> = Vec::with_capacity(notes.len() * 2);
    for note in notes.iter().filter(|n| n.is_closed()) {
        let start = time_base.tick_of(note.start_frame);
        let length = time_base.ticks_for(note.duration_frames());
        let key = note.midi_key();
        events.push((start, true, key));
        events.push((start + length, false, key));
    }
    events.sort_by_key(|&(tick, is_on, _)| (tick, is_on));

    let channel = params.channel.min(15).into();
    let mut track = Vec::with_capacity(events.len() + 1);
    let mut last_tick = 0u64;
    for (tick, is_on, key) in events {
        let delta = u32::try_from(tick - last_tick)
            .map_err(|_| TranscribeError::Midi(format!("tick delta {} out of range", tick - last_tick)))?;
        let message = if is_on {
            MidiMessage::NoteOn {
                key: key.into(),
                vel: params.velocity.min(127).into(),
            }
        } else {
            MidiMessage::NoteOff {
                key: key.into(),
                vel: 0.into(),
            }
        };
        track.push(TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header {
            format: Format::SingleTrack,
            timing: Timing::Metrical(params.ticks_per_beat.max(1).into()),
        },
        tracks: vec![track],
    };
    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| TranscribeError::Midi(format!("Failed to write MIDI: {e}")))?;
    Ok(bytes)
}

pub fn write_midi_file(
    path: &Path,
    notes: &[NoteEvent],
    time_base: TimeBase,
    params: &MidiParams,
) -> Result<()> {
    let bytes = write_sequence(notes, time_base, params)?;
    ensure_parent_dir(path)?;
    std::fs::write(path, bytes).map_err(|e| TranscribeError::io(path, e))
}

/// Keys of every sounding note-on, in track order then time order.
pub fn read_pitches(bytes: &[u8]) -> Result<Vec<u8>> {
    let smf = Smf::parse(bytes).map_err(|e| TranscribeError::Midi(format!("MIDI parse error: {e}")))?;
    let mut keys = Vec::new();
    for track in &smf.tracks {
        for event in track {
            if let TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } = event.kind
            {
                if vel.as_int() > 0 {
                    keys.push(key.as_int());
                }
            }
        }
    }
    Ok(keys)
}

pub fn read_midi_file(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| TranscribeError::io(path, e))?;
    read_pitches(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(pc: u8, oct: u8, start: u64, end: u64) -> NoteEvent {
        NoteEvent::new(pc, oct, 0, start).closed_at(end)
    }

    #[test]
    fn pitches_survive_encoding_in_start_order() {
        let notes = vec![closed(4, 4, 10, 14), closed(9, 4, 16, 20), closed(2, 5, 22, 30)];
        let tb = TimeBase {
            frames_per_tick: 2,
            start_frame_offset: 10,
        };
        let bytes = write_sequence(&notes, tb, &MidiParams::default()).unwrap();
        assert_eq!(read_pitches(&bytes).unwrap(), vec![52, 57, 62]);
    }

    #[test]
    fn header_uses_configured_resolution() {
        let bytes = write_sequence(&[closed(0, 4, 0, 4)], TimeBase::default(), &MidiParams::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        assert!(matches!(smf.header.timing, Timing::Metrical(t) if t.as_int() == 4));
        let last = smf.tracks[0].last().unwrap();
        assert!(matches!(last.kind, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    }

    #[test]
    fn note_ticks_follow_time_base() {
        let tb = TimeBase {
            frames_per_tick: 3,
            start_frame_offset: 6,
        };
        // start tick (12-6)/3 = 2, length 9/3 = 3
        let bytes = write_sequence(&[closed(0, 5, 12, 21)], tb, &MidiParams::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let deltas: Vec<u32> = smf.tracks[0].iter().map(|e| e.delta.as_int()).collect();
        assert_eq!(deltas, vec![2, 3, 0]);
    }

    #[test]
    fn open_notes_are_skipped() {
        let notes = vec![NoteEvent::new(0, 4, 0, 3), closed(7, 4, 0, 2)];
        let bytes = write_sequence(&notes, TimeBase::default(), &MidiParams::default()).unwrap();
        assert_eq!(read_pitches(&bytes).unwrap(), vec![55]);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/take.mid");
        write_midi_file(&path, &[closed(4, 4, 0, 8)], TimeBase::default(), &MidiParams::default()).unwrap();
        assert_eq!(read_midi_file(&path).unwrap(), vec![52]);
    }

    #[test]
    fn garbage_is_a_midi_error() {
        assert!(matches!(read_pitches(b"not midi"), Err(TranscribeError::Midi(_))));
    }
}
