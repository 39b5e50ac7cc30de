use std::collections::BTreeMap;

use crate::config::{
    layout::{ButtonMapping, DpadMapping, DPAD_DEFAULT_MASK},
    sample::SamplePair,
};

use super::{
    diff::{report_diff, Diff},
    selector::choose_candidate,
};

/// Diffs observed for one control. Each entry holds the diffs of one trial.
pub type Trials = Vec<Vec<Diff>>;

/// Result of button inference. Controls that could not be resolved are
/// listed in `unresolved` and never get a default mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonInference {
    pub buttons: BTreeMap<String, ButtonMapping>,
    pub unresolved: Vec<String>,
}

/// Infer a (byte, mask) mapping for every observed button.
///
/// All diffs of all trials of a control are pooled and run through the
/// candidate selector. Trials do not have to agree: noise rarely produces the
/// same single-bit toggle repeatedly while a real button bit does.
pub fn infer_button_mappings(observed: &BTreeMap<String, Trials>) -> ButtonInference {
    let mut inference = ButtonInference::default();

    for (name, trials) in observed.iter() {
        let pool: Vec<Diff> = trials.iter().flatten().copied().collect();
        match choose_candidate(&pool) {
            Some(candidate) => {
                log::debug!(
                    "Inferred button '{name}' at byte {} mask {:#04x}",
                    candidate.index,
                    candidate.xor
                );
                inference.buttons.insert(
                    name.clone(),
                    ButtonMapping::new(candidate.index, candidate.xor),
                );
            }
            None => {
                log::debug!("No candidate for button '{name}'");
                inference.unresolved.push(name.clone());
            }
        }
    }

    inference
}

/// Group the given sample pairs by label, diff each pair and infer a button
/// mapping per label.
pub fn infer_from_labeled_pairs(pairs: &[SamplePair]) -> ButtonInference {
    let mut per_label: BTreeMap<String, Trials> = BTreeMap::new();
    for pair in pairs {
        let diffs = report_diff(&pair.before, &pair.after);
        per_label.entry(pair.label.clone()).or_default().push(diffs);
    }

    infer_button_mappings(&per_label)
}

/// Returns the byte index that changed in the most trials. On ties the lowest
/// index wins.
fn most_frequent_index(trials: &[Vec<Diff>]) -> Option<usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for diff in trials.iter().flatten() {
        *counts.entry(diff.index).or_default() += 1;
    }

    let mut best: Option<(usize, usize)> = None;
    for (index, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => (),
            _ => best = Some((index, count)),
        }
    }

    best.map(|(index, _)| index)
}

/// Infer the dpad byte from the trials of all dpad directions. The direction
/// lives in the low nibble of that byte.
pub fn infer_dpad_byte(trials: &[Vec<Diff>]) -> Option<DpadMapping> {
    most_frequent_index(trials).map(|index| DpadMapping::new(index, DPAD_DEFAULT_MASK))
}

/// Infer the byte of an analog axis from the trials where it was moved
pub fn infer_axis_byte(trials: &[Vec<Diff>]) -> Option<usize> {
    most_frequent_index(trials)
}
