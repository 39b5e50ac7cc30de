use std::ops::Deref;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// A single raw input report as read from the device. When loaded from a file
/// any entry that is not an integer between 0 and 255 is read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Report(pub Vec<u8>);

impl Report {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns a report of the given length with every byte set to zero
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Report {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for Report {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<Vec<u8>> for Report {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Report {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl<'de> Deserialize<'de> for Report {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
        let bytes = values
            .iter()
            .map(|value| {
                value
                    .as_u64()
                    .and_then(|v| u8::try_from(v).ok())
                    .unwrap_or_default()
            })
            .collect();
        Ok(Self(bytes))
    }
}

/// A [SamplePair] is a recorded observation of one control: the report seen
/// right before the control was actuated and the first report after it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SamplePair {
    /// Name of the control that was actuated (e.g. "cross")
    pub label: String,
    pub before: Report,
    pub after: Report,
}

impl SamplePair {
    pub fn new(label: impl Into<String>, before: impl Into<Report>, after: impl Into<Report>) -> Self {
        Self {
            label: label.into(),
            before: before.into(),
            after: after.into(),
        }
    }
}

/// Maximum length of a control label
const MAX_LABEL_LEN: usize = 50;

/// Strip a control label down to ASCII alphanumerics, '_' and '-', truncated
/// to 50 characters. Returns `None` if nothing usable remains.
pub fn sanitize_label(label: &str) -> Option<String> {
    let clean: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_LABEL_LEN)
        .collect();
    if clean.is_empty() {
        return None;
    }
    Some(clean)
}
