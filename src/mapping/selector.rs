use serde::{Deserialize, Serialize};

use super::diff::{report_diff, Diff};

/// The change most likely caused by a single physical control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Candidate {
    pub index: usize,
    pub xor: u8,
}

impl From<&Diff> for Candidate {
    fn from(diff: &Diff) -> Self {
        Self {
            index: diff.index,
            xor: diff.xor,
        }
    }
}

/// Pick the diff most likely produced by one digital control.
///
/// The first single-bit toggle wins since buttons usually flip exactly one
/// bit. Without one, the diff with the fewest toggled bits is chosen (first
/// one on ties). Returns `None` for an empty list.
pub fn choose_candidate(diffs: &[Diff]) -> Option<Candidate> {
    if let Some(diff) = diffs.iter().find(|d| d.is_single_bit()) {
        return Some(diff.into());
    }

    // min_by_key returns the first minimum on ties
    diffs
        .iter()
        .filter(|d| d.xor != 0)
        .min_by_key(|d| d.bit_count())
        .map(Candidate::from)
}

/// Returns the first single-bit change between two reports
pub fn find_single_bit_change(prev: &[u8], cur: &[u8]) -> Option<Candidate> {
    report_diff(prev, cur)
        .iter()
        .find(|d| d.is_single_bit())
        .map(Candidate::from)
}
