//! Per-string note state machine.
//!
//! Each string is either idle or holding one open note:
//!
//! | state | vibrating | next  | effect                          |
//! |-------|-----------|-------|---------------------------------|
//! | idle  | yes       | held  | open a note starting this frame |
//! | held  | no        | idle  | close the note, emit it         |
//! | held  | yes       | held  | sustain                         |
//! | idle  | no        | idle  | nothing                         |
//!
//! The first note to close also fixes the time base used for MIDI output.
use crate::params::TrackerParams;
use crate::types::{NoteEvent, PerStringState, TimeBase};

#[derive(Clone, Debug, Default)]
pub struct NoteEventTracker {
    pub params: TrackerParams,
    time_base: Option<TimeBase>,
}

impl NoteEventTracker {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            time_base: None,
        }
    }

    /// Time base fixed by the first closed note, if any note has closed.
    pub fn time_base(&self) -> Option<TimeBase> {
        self.time_base
    }

    /// Advances every string by one frame and returns the notes closed on it.
    ///
    /// `note_for(i)` supplies the note for a string that starts vibrating;
    /// returning `None` leaves the string idle.
    pub fn step(
        &mut self,
        states: &mut [PerStringState],
        vibrating: &[bool],
        frame: u64,
        mut note_for: impl FnMut(usize) -> Option<NoteEvent>,
    ) -> Vec<NoteEvent> {
        let mut closed = Vec::new();
        for (i, (state, &vib)) in states.iter_mut().zip(vibrating).enumerate() {
            match (state.held_note.take(), vib) {
                (None, true) => {
                    state.held_note = note_for(i).map(|note| NoteEvent {
                        start_frame: frame,
                        end_frame: None,
                        ..note
                    });
                }
                (Some(note), false) => {
                    let note = note.closed_at(frame);
                    self.calibrate(&note);
                    closed.push(note);
                }
                (held, _) => state.held_note = held,
            }
        }
        closed
    }

    /// Closes every held note at `frame`, in string order.
    pub fn flush(&mut self, states: &mut [PerStringState], frame: u64) -> Vec<NoteEvent> {
        let mut closed = Vec::new();
        for state in states.iter_mut() {
            if let Some(note) = state.held_note.take() {
                let note = note.closed_at(frame);
                self.calibrate(&note);
                closed.push(note);
            }
        }
        closed
    }

    fn calibrate(&mut self, note: &NoteEvent) {
        if self.time_base.is_some() {
            return;
        }
        let ticks = self.params.ticks_for_first_note.max(1) as f64;
        let frames_per_tick = ((note.duration_frames() as f64 / ticks).round() as u64).max(1);
        let tb = TimeBase {
            frames_per_tick,
            start_frame_offset: note.start_frame,
        };
        log::debug!("NoteEventTracker::calibrate {:?}", tb);
        self.time_base = Some(tb);
    }
}
