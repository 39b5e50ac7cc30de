use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A [Diff] records one byte that changed between two reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Diff {
    pub index: usize,
    pub before: u8,
    pub after: u8,
    /// Bits that toggled (`before ^ after`), never zero
    pub xor: u8,
}

impl Diff {
    /// Returns true if exactly one bit toggled
    pub fn is_single_bit(&self) -> bool {
        self.xor.is_power_of_two()
    }

    /// Number of bits that toggled
    pub fn bit_count(&self) -> u32 {
        self.xor.count_ones()
    }
}

/// Returns the byte at the given index, reading positions past the end of
/// the report as zero.
pub fn byte_at(report: &[u8], index: usize) -> u8 {
    report.get(index).copied().unwrap_or_default()
}

/// Compare two reports byte by byte and return every index whose value
/// differs, in ascending order. Reports of different lengths are compared as
/// if the shorter one was padded with zeros.
pub fn report_diff(prev: &[u8], cur: &[u8]) -> Vec<Diff> {
    let len = prev.len().max(cur.len());
    (0..len)
        .filter_map(|index| {
            let before = byte_at(prev, index);
            let after = byte_at(cur, index);
            if before == after {
                return None;
            }
            Some(Diff {
                index,
                before,
                after,
                xor: before ^ after,
            })
        })
        .collect()
}
