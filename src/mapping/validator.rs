use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{layout::Layout, sample::SamplePair};

use super::diff::byte_at;

/// Reason given when a sample references a control without a mapping
pub const REASON_NO_MAPPING: &str = "no mapping";
/// Reason given when the mapped bits did not toggle in a sample
pub const REASON_MASK_MISMATCH: &str = "mask does not match sample xor";

/// Validation outcome of a single sample pair
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelResult {
    pub label: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xor: Option<u8>,
    /// Other controls whose mapped bits also toggled in this sample
    #[serde(default)]
    pub collisions: Vec<String>,
}

/// Validation outcome of a layout against a set of samples
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True if every sample matched its mapping
    pub ok: bool,
    pub per_label: Vec<LabelResult>,
}

impl ValidationResult {
    /// Total number of collisions across all samples
    pub fn collision_count(&self) -> usize {
        self.per_label.iter().map(|r| r.collisions.len()).sum()
    }

    /// Results that did not match
    pub fn failures(&self) -> impl Iterator<Item = &LabelResult> {
        self.per_label.iter().filter(|r| !r.ok)
    }
}

/// Replay the given samples against the layout.
///
/// A sample matches if the bits of its label's mapping toggled between the
/// before and after reports. Every other mapped button whose bits also
/// toggled is recorded as a collision. Collisions are reported but do not
/// fail validation.
pub fn validate_layout(layout: &Layout, samples: &[SamplePair]) -> ValidationResult {
    let mut ok = true;
    let mut per_label = Vec::with_capacity(samples.len());

    for sample in samples {
        let Some(mapping) = layout.button(&sample.label) else {
            ok = false;
            per_label.push(LabelResult {
                label: sample.label.clone(),
                ok: false,
                reason: Some(REASON_NO_MAPPING.to_string()),
                byte_index: None,
                mask: None,
                xor: None,
                collisions: Vec::new(),
            });
            continue;
        };

        let idx = mapping.byte_index();
        let xor = byte_at(&sample.before, idx) ^ byte_at(&sample.after, idx);
        let matched = xor & mapping.mask() != 0;

        let collisions: Vec<String> = layout
            .buttons
            .iter()
            .filter(|(name, _)| name.as_str() != sample.label)
            .filter(|(_, other)| {
                let idx = other.byte_index();
                other.toggled(byte_at(&sample.before, idx), byte_at(&sample.after, idx))
            })
            .map(|(name, _)| name.clone())
            .collect();

        if !collisions.is_empty() {
            log::debug!("Sample '{}' collides with {collisions:?}", sample.label);
        }
        if !matched {
            ok = false;
        }

        per_label.push(LabelResult {
            label: sample.label.clone(),
            ok: matched,
            reason: (!matched).then(|| REASON_MASK_MISMATCH.to_string()),
            byte_index: Some(idx),
            mask: Some(mapping.mask()),
            xor: Some(xor),
            collisions,
        });
    }

    ValidationResult { ok, per_label }
}
