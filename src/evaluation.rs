//! Transcription quality as a global alignment score between two sequences
//! (usually MIDI keys of a transcription and of a reference).
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentScoring {
    pub match_score: i64,
    pub mismatch_score: i64,
    pub insert_delete_score: i64,
}

impl Default for AlignmentScoring {
    /// Match 1, everything else 0: the score is the LCS length.
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch_score: 0,
            insert_delete_score: 0,
        }
    }
}

/// Best global alignment score of `a` against `b`.
pub fn alignment_score<T: PartialEq>(a: &[T], b: &[T], scoring: AlignmentScoring) -> i64 {
    let indel = scoring.insert_delete_score;
    // rolling row over b
    let mut prev: Vec<i64> = (0..=b.len() as i64).map(|j| j * indel).collect();
    let mut cur = vec![0i64; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        cur[0] = (i as i64 + 1) * indel;
        for (j, y) in b.iter().enumerate() {
            let diag = prev[j]
                + if x == y {
                    scoring.match_score
                } else {
                    scoring.mismatch_score
                };
            cur[j + 1] = diag.max(prev[j + 1] + indel).max(cur[j] + indel);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
