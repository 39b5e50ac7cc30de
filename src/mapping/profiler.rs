use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::diff::byte_at;

/// Variance/mean limits used to classify report bytes
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ProfilerThresholds {
    /// Bytes below this variance are steady (e.g. a battery level)
    pub steady_max_variance: f64,
    /// Steady bytes must have a mean above this value
    pub steady_min_mean: f64,
    /// Bytes above this variance are motion-like (e.g. gyro or accelerometer)
    pub variable_min_variance: f64,
}

impl Default for ProfilerThresholds {
    fn default() -> Self {
        Self {
            steady_max_variance: 4.0,
            steady_min_mean: 0.0,
            variable_min_variance: 20.0,
        }
    }
}

/// Mean and population variance of one byte position across a window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ByteStats {
    pub mean: f64,
    pub variance: f64,
}

/// Byte positions classified by how they behave across a window of reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorProfile {
    /// Slowly changing, non-zero bytes
    pub steady_candidates: BTreeSet<usize>,
    /// Highly variable bytes
    pub variable_candidates: BTreeSet<usize>,
}

/// Compute the mean and population variance of every byte position in the
/// window. Empty reports are ignored, shorter reports read as zero past their
/// end. The result has one entry per position of the longest report.
pub fn byte_statistics<R: AsRef<[u8]>>(window: &[R]) -> Vec<ByteStats> {
    let reports: Vec<&[u8]> = window
        .iter()
        .map(|r| r.as_ref())
        .filter(|r| !r.is_empty())
        .collect();
    let Some(len) = reports.iter().map(|r| r.len()).max() else {
        return Vec::new();
    };
    let count = reports.len() as f64;

    (0..len)
        .map(|index| {
            let values = reports.iter().map(|r| byte_at(r, index) as f64);
            let mean = values.clone().sum::<f64>() / count;
            let variance = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count;
            ByteStats { mean, variance }
        })
        .collect()
}

/// Classify the bytes of the window into steady and variable candidates
pub fn profile<R: AsRef<[u8]>>(window: &[R], thresholds: &ProfilerThresholds) -> SensorProfile {
    let mut profile = SensorProfile::default();
    for (index, stats) in byte_statistics(window).iter().enumerate() {
        if stats.variance < thresholds.steady_max_variance && stats.mean > thresholds.steady_min_mean
        {
            profile.steady_candidates.insert(index);
        }
        if stats.variance > thresholds.variable_min_variance {
            profile.variable_candidates.insert(index);
        }
    }

    profile
}

/// Returns the index of the byte with the highest variance across the window.
/// The first maximum wins, so a window where nothing moves yields index 0.
/// Returns `None` if the window holds no data.
pub fn most_variable_byte<R: AsRef<[u8]>>(window: &[R]) -> Option<usize> {
    let stats = byte_statistics(window);
    let mut best: Option<(usize, f64)> = None;
    for (index, s) in stats.iter().enumerate() {
        match best {
            Some((_, variance)) if s.variance <= variance => (),
            _ => best = Some((index, s.variance)),
        }
    }

    best.map(|(index, _)| index)
}
