//! Scripted sample collection: gather labelled before/after pairs for one
//! control, add them to the sample history and re-infer the button layout
//! from everything collected so far.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::{
    config::{
        layout::Layout,
        sample::{sanitize_label, SamplePair},
        store::LayoutStore,
    },
    mapping::{
        consensus::infer_from_labeled_pairs,
        validator::{validate_layout, ValidationResult},
    },
};

use super::{
    session::CalibrationSession, CalibrationError, CalibrationProgress, ControlKind,
    PersistOutcome,
};

pub const DEFAULT_COUNT: usize = 3;
pub const MAX_COUNT: usize = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// A validated request to collect samples for one control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectRequest {
    pub label: String,
    pub count: usize,
    pub timeout: Duration,
    /// Persist the inferred layout (or its failed record)
    pub save: bool,
}

impl CollectRequest {
    /// Sanitise the label and check the count
    pub fn new(label: &str, count: usize) -> Result<Self, CalibrationError> {
        let Some(label) = sanitize_label(label) else {
            return Err(CalibrationError::InvalidLabel(label.to_string()));
        };
        if count == 0 || count > MAX_COUNT {
            return Err(CalibrationError::InvalidCount(count));
        }
        Ok(Self {
            label,
            count,
            timeout: DEFAULT_TIMEOUT,
            save: true,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }
}

/// Result of a collection run
#[derive(Debug, Clone)]
pub struct CollectOutcome {
    /// Layout inferred from the whole sample history
    pub layout: Layout,
    /// Labels in the history that could not be located
    pub unresolved: Vec<String>,
    pub validation: ValidationResult,
    /// Number of pairs in the history, including the new ones
    pub total_samples: usize,
    pub persisted: PersistOutcome,
}

/// Observe the requested control `count` times on a live stream and return
/// the recorded pairs. Trials that time out are skipped.
pub async fn record_pairs(
    session: &mut CalibrationSession,
    request: &CollectRequest,
    progress: Option<&mpsc::Sender<CalibrationProgress>>,
) -> Result<Vec<SamplePair>, CalibrationError> {
    let mut pairs = Vec::with_capacity(request.count);
    for index in 0..request.count {
        let recorded = session.samples().len();
        session
            .observe(&request.label, ControlKind::Button, request.timeout)
            .await?;
        let Some(pair) = session.samples().get(recorded) else {
            log::warn!(
                "No change captured for '{}' (sample {}/{})",
                request.label,
                index + 1,
                request.count
            );
            continue;
        };
        pairs.push(pair.clone());
        send(
            progress,
            CalibrationProgress::Collected {
                index: index + 1,
                total: request.count,
            },
        )
        .await;
    }

    Ok(pairs)
}

/// Add the given pairs to the stored history, infer buttons from the whole
/// history and validate the result. The inferred buttons replace those of
/// the stored layout; its axes and dpad are kept. If saving was requested,
/// the layout is saved when validation passed and written to a failed
/// record otherwise.
pub async fn collect_samples(
    store: &LayoutStore,
    request: &CollectRequest,
    pairs: Vec<SamplePair>,
    progress: Option<&mpsc::Sender<CalibrationProgress>>,
) -> Result<CollectOutcome, CalibrationError> {
    let history = store.append_samples(&pairs)?;
    log::info!(
        "Collected {} pair(s) for '{}', {} in total",
        pairs.len(),
        request.label,
        history.len()
    );

    send(progress, CalibrationProgress::Inferring).await;
    let inference = infer_from_labeled_pairs(&history);
    let mut layout = store.load_layout_or_default();
    layout.buttons = inference.buttons;

    send(progress, CalibrationProgress::Validating).await;
    let validation = validate_layout(&layout, &history);
    send(
        progress,
        CalibrationProgress::ValidationResult(validation.clone()),
    )
    .await;

    let persisted = if !request.save {
        PersistOutcome::NotSaved
    } else if validation.ok {
        PersistOutcome::Saved(store.save_layout(&layout)?)
    } else {
        PersistOutcome::Failed(store.save_failed(&layout, &validation)?)
    };
    send(progress, CalibrationProgress::Done(persisted.clone())).await;

    Ok(CollectOutcome {
        layout,
        unresolved: inference.unresolved,
        validation,
        total_samples: history.len(),
        persisted,
    })
}

async fn send(progress: Option<&mpsc::Sender<CalibrationProgress>>, value: CalibrationProgress) {
    let Some(tx) = progress else {
        return;
    };
    if let Err(e) = tx.send(value).await {
        log::debug!("Progress receiver went away: {e}");
    }
}
