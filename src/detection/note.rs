//! Fretted position and pitch of a vibrating string.
//!
//! The hand mask is sampled along the string between each pair of
//! consecutive frets, starting at the nut. The fret index at which coverage
//! stops, after having started, is the fret being played; no coverage means
//! the open string.
use crate::image::Mask;
use crate::params::{NoteParams, OpenString};
use crate::types::{Fret, GuitarString, NoteEvent};

/// Pitch class and octave of `fret` on a string tuned to `open`.
pub fn pitch_for(open: OpenString, fret: usize) -> (u8, u8) {
    let extra_semis = (fret % 12) as u8;
    let extra_oct = (fret / 12) as u8;
    (
        (open.pitch_class + extra_semis) % 12,
        open.octave.saturating_add(extra_oct),
    )
}

#[derive(Clone, Debug, Default)]
pub struct NoteDetector {
    pub params: NoteParams,
}

impl NoteDetector {
    pub fn new(params: NoteParams) -> Self {
        Self { params }
    }

    /// Index of the fret being played on `string`.
    ///
    /// A covered run that reaches the last fret pair never ends, which is
    /// read as open (0).
    pub fn fret_playing(&self, string: &GuitarString, frets: &[Fret], hand: &Mask) -> usize {
        let mut started = false;
        for (i, pair) in frets.windows(2).enumerate() {
            let overlapping = match (
                string.line.collision(&pair[0].line),
                string.line.collision(&pair[1].line),
            ) {
                (Some(a), Some(b)) => hand.count_on_segment(a, b) >= self.params.overlap_threshold,
                _ => false,
            };
            if overlapping {
                started = true;
            } else if started {
                return i;
            }
        }
        0
    }

    /// Open note on string `string_index` starting at `frame`. `None` when
    /// the index is outside the detected strings, or when fewer than two
    /// frets bound a position so the fret cannot be resolved.
    pub fn get_note(
        &self,
        string_index: usize,
        strings: &[GuitarString],
        frets: &[Fret],
        hand: &Mask,
        frame: u64,
    ) -> Option<NoteEvent> {
        let string = strings.get(string_index)?;
        if frets.len() < 2 {
            log::debug!(
                "NoteDetector::get_note string={} frets={} position unresolved",
                string_index,
                frets.len()
            );
            return None;
        }
        let fret = self.fret_playing(string, frets, hand);
        let open = self
            .params
            .tuning
            .get(string_index)
            .copied()
            .unwrap_or(OpenString::new(0, 0));
        let (pitch_class, octave) = pitch_for(open, fret);
        log::debug!(
            "NoteDetector::get_note string={} fret={} pitch={} octave={}",
            string_index,
            fret,
            pitch_class,
            octave
        );
        Some(NoteEvent::new(pitch_class, octave, string_index, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::Line;
    use crate::params::STANDARD_TUNING;
    use std::f64::consts::FRAC_PI_2;

    fn scene() -> (Vec<GuitarString>, Vec<Fret>) {
        let strings = (0..6)
            .map(|i| GuitarString {
                index: i,
                ..GuitarString::new(Line::new(20.0 + 10.0 * i as f64, FRAC_PI_2), 0.0)
            })
            .collect();
        let frets = (0..6)
            .map(|i| Fret::new(Line::new(10.0 + 20.0 * i as f64, 0.0)))
            .collect();
        (strings, frets)
    }

    #[test]
    fn thirteenth_fret_on_low_string() {
        assert_eq!(pitch_for(STANDARD_TUNING[0], 13), (5, 5));
        assert_eq!(pitch_for(STANDARD_TUNING[4], 1), (0, 5));
        assert_eq!(pitch_for(STANDARD_TUNING[5], 0), (4, 6));
    }

    #[test]
    fn hand_over_second_pair_plays_fret_two() {
        let (strings, frets) = scene();
        let mut hand = Mask::new(140, 100);
        // covers the string between frets 1 (x=30) and 2 (x=50)
        for y in 25..45 {
            for x in 32..48 {
                hand.set(x, y, true);
            }
        }
        let detector = NoteDetector::default();
        assert_eq!(detector.fret_playing(&strings[1], &frets, &hand), 2);
        let note = detector.get_note(1, &strings, &frets, &hand, 7).unwrap();
        assert_eq!((note.pitch_class, note.octave), (11, 4));
        assert_eq!(note.start_frame, 7);
        assert!(note.end_frame.is_none());
    }

    #[test]
    fn no_hand_is_open_string() {
        let (strings, frets) = scene();
        let hand = Mask::new(140, 100);
        let detector = NoteDetector::default();
        assert_eq!(detector.fret_playing(&strings[0], &frets, &hand), 0);
    }

    #[test]
    fn unresolved_frets_give_no_note() {
        let (strings, frets) = scene();
        let hand = Mask::new(140, 100);
        let detector = NoteDetector::default();
        assert!(detector.get_note(0, &strings, &[], &hand, 3).is_none());
        assert!(detector.get_note(0, &strings, &frets[..1], &hand, 3).is_none());
        assert!(detector.get_note(0, &strings, &frets[..2], &hand, 3).is_some());
    }

    #[test]
    fn out_of_range_string_has_no_note() {
        let (strings, frets) = scene();
        let hand = Mask::new(140, 100);
        assert!(NoteDetector::default()
            .get_note(6, &strings, &frets, &hand, 0)
            .is_none());
    }
}
