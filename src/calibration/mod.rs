//! Interactive and scripted calibration. A session watches a stream of raw
//! reports while a user (or a simulator) actuates one control at a time, then
//! infers a [Layout](crate::config::layout::Layout) from what changed.

pub mod collect;
pub mod session;


use std::path::PathBuf;

use thiserror::Error;

use crate::{config::store::StoreError, mapping::validator::ValidationResult};

/// Buttons prompted for during a calibration session
pub const BUTTONS: [&str; 13] = [
    "square", "cross", "circle", "triangle", "l1", "r1", "l2_btn", "r2_btn", "share", "options",
    "lstick", "rstick", "ps",
];
/// Dpad directions prompted for during a calibration session
pub const DPAD_DIRECTIONS: [&str; 4] = ["dpad_up", "dpad_right", "dpad_down", "dpad_left"];
/// Axes prompted for during a calibration session
pub const AXES: [&str; 6] = ["lstick_x", "lstick_y", "rstick_x", "rstick_y", "l2", "r2"];

/// Possible errors during calibration
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("Report source closed")]
    SourceClosed,
    #[error("Invalid label: '{0}'")]
    InvalidLabel(String),
    #[error("Sample count must be between 1 and 100, got {0}")]
    InvalidCount(usize),
    #[error("Failed to persist calibration: {0}")]
    Store(#[from] StoreError),
}

/// How a control is observed and inferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    Dpad,
    Axis,
}

/// Progress of a calibration or collection run
#[derive(Debug, Clone)]
pub enum CalibrationProgress {
    /// A sample pair was collected
    Collected { index: usize, total: usize },
    Inferring,
    Validating,
    ValidationResult(ValidationResult),
    Done(PersistOutcome),
}

/// What happened to an inferred layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Validation passed and the layout was saved to the given path
    Saved(PathBuf),
    /// Validation failed; the layout and its validation were written to the
    /// given path
    Failed(PathBuf),
    /// Nothing was written
    NotSaved,
}
