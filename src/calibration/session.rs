use std::{collections::BTreeMap, time::Duration};

use tokio::{sync::mpsc, time::Instant};

use crate::{
    config::{
        layout::{AxisMapping, Layout},
        sample::SamplePair,
        store::LayoutStore,
    },
    mapping::{
        consensus::{infer_axis_byte, infer_button_mappings, infer_dpad_byte, Trials},
        diff::{report_diff, Diff},
        validator::{validate_layout, ValidationResult},
    },
    sync::{ReceiveTimeoutError, TimeoutReceiver},
};

use super::{CalibrationError, CalibrationProgress, ControlKind, PersistOutcome};

/// A [CalibrationSession] records which bytes change while each control is
/// actuated. Every call to [CalibrationSession::observe] is one trial; the
/// same control can be observed several times to build a consensus.
#[derive(Debug)]
pub struct CalibrationSession {
    rx: mpsc::Receiver<Vec<u8>>,
    progress: Option<mpsc::Sender<CalibrationProgress>>,
    /// Latest report seen on the stream
    latest: Option<Vec<u8>>,
    buttons: BTreeMap<String, Trials>,
    dpad: Trials,
    axes: BTreeMap<String, Trials>,
    samples: Vec<SamplePair>,
}

/// Result of a finished session
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    pub layout: Layout,
    /// Controls that were observed but could not be located
    pub unresolved: Vec<String>,
    pub validation: ValidationResult,
    /// Sample pairs recorded for buttons during this session
    pub samples: Vec<SamplePair>,
}

impl CalibrationSession {
    pub fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            progress: None,
            latest: None,
            buttons: BTreeMap::new(),
            dpad: Vec::new(),
            axes: BTreeMap::new(),
            samples: Vec::new(),
        }
    }

    /// Report progress over the given channel
    pub fn with_progress(mut self, tx: mpsc::Sender<CalibrationProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Sample pairs recorded so far
    pub fn samples(&self) -> &[SamplePair] {
        self.samples.as_slice()
    }

    /// Wait for the given control to be actuated and record the bytes that
    /// changed. Returns `Ok(None)` if nothing changed before the timeout; the
    /// trial is still recorded so a control that never responds ends up
    /// unresolved.
    pub async fn observe(
        &mut self,
        control: &str,
        kind: ControlKind,
        timeout: Duration,
    ) -> Result<Option<Vec<Diff>>, CalibrationError> {
        let observed = self.wait_for_change(timeout).await?;
        let changed = observed.is_some();
        let diffs = match observed.as_ref() {
            Some((before, after)) => report_diff(before, after),
            None => {
                log::info!("Timed out waiting for '{control}'");
                Vec::new()
            }
        };
        log::debug!("Observed {} changed byte(s) for '{control}'", diffs.len());

        match kind {
            ControlKind::Button => {
                self.buttons
                    .entry(control.to_string())
                    .or_default()
                    .push(diffs.clone());
                if let Some((before, after)) = observed {
                    self.samples.push(SamplePair::new(control, before, after));
                }
            }
            ControlKind::Dpad => self.dpad.push(diffs.clone()),
            ControlKind::Axis => self
                .axes
                .entry(control.to_string())
                .or_default()
                .push(diffs.clone()),
        }

        if !changed {
            return Ok(None);
        }
        Ok(Some(diffs))
    }

    /// Wait for a report that differs from the latest one seen. Returns the
    /// baseline and the changed report.
    async fn wait_for_change(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, CalibrationError> {
        let deadline = Instant::now() + timeout;

        // Catch up with whatever was queued before the prompt
        match self.rx.drain_latest() {
            Ok(Some(report)) if !report.is_empty() => self.latest = Some(report),
            Ok(_) => (),
            Err(_) => return Err(CalibrationError::SourceClosed),
        }
        let mut baseline = self.latest.clone();

        loop {
            let report = match self.rx.recv_until(deadline).await {
                Ok(report) => report,
                Err(ReceiveTimeoutError::Timeout) => return Ok(None),
                Err(ReceiveTimeoutError::Closed) => return Err(CalibrationError::SourceClosed),
            };
            if report.is_empty() {
                continue;
            }
            self.latest = Some(report.clone());

            let Some(before) = baseline.as_ref() else {
                baseline = Some(report);
                continue;
            };
            if !report_diff(before, &report).is_empty() {
                return Ok(Some((before.clone(), report)));
            }
        }
    }

    /// Infer a layout from every trial of the session and validate it
    /// against the session's samples plus the given sample history.
    pub async fn finish(self, history: &[SamplePair]) -> CalibrationOutcome {
        self.report(CalibrationProgress::Inferring).await;
        let inference = infer_button_mappings(&self.buttons);
        let mut unresolved = inference.unresolved;

        let dpad = match infer_dpad_byte(&self.dpad) {
            Some(dpad) => dpad,
            None => {
                if !self.dpad.is_empty() {
                    unresolved.push("dpad".to_string());
                }
                Default::default()
            }
        };

        let mut axes = BTreeMap::new();
        for (name, trials) in self.axes.iter() {
            match infer_axis_byte(trials) {
                Some(idx) => {
                    axes.insert(name.clone(), AxisMapping::new(idx));
                }
                None => unresolved.push(name.clone()),
            }
        }

        let layout = Layout {
            axes,
            buttons: inference.buttons,
            dpad,
        };
        if !unresolved.is_empty() {
            log::warn!("Could not locate: {}", unresolved.join(", "));
        }

        self.report(CalibrationProgress::Validating).await;
        let mut samples = history.to_vec();
        samples.extend_from_slice(&self.samples);
        let validation = validate_layout(&layout, &samples);
        self.report(CalibrationProgress::ValidationResult(validation.clone()))
            .await;

        CalibrationOutcome {
            layout,
            unresolved,
            validation,
            samples: self.samples,
        }
    }

    async fn report(&self, progress: CalibrationProgress) {
        if let Some(tx) = self.progress.as_ref() {
            if let Err(e) = tx.send(progress).await {
                log::debug!("Progress receiver went away: {e}");
            }
        }
    }
}

impl CalibrationOutcome {
    /// Store the session's samples, then save the layout if validation
    /// passed or write it to a failed record otherwise.
    pub fn persist(&self, store: &LayoutStore) -> Result<PersistOutcome, CalibrationError> {
        if !self.samples.is_empty() {
            store.append_samples(&self.samples)?;
        }
        if self.validation.ok {
            let path = store.save_layout(&self.layout)?;
            return Ok(PersistOutcome::Saved(path));
        }
        let path = store.save_failed(&self.layout, &self.validation)?;
        Ok(PersistOutcome::Failed(path))
    }
}
