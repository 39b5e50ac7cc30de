//! Persistence of layouts and sample pairs

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::Serialize;
use thiserror::Error;

use crate::mapping::validator::ValidationResult;

use super::{
    layout::Layout,
    path::{get_data_path, FAILED_PREFIX, LAYOUT_FILE, SAMPLES_FILE},
    sample::SamplePair,
    LoadError,
};

/// Possible errors while writing to the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Unable to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Refusing to save invalid layout: {0}")]
    InvalidLayout(String),
}

/// Record written when a layout fails validation
#[derive(Debug, Serialize)]
struct FailedRecord<'a> {
    mapping: &'a Layout,
    validation: &'a ValidationResult,
}

/// The [LayoutStore] owns the directory where the current layout, its
/// backups, the accumulated samples and failed layouts are kept.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    dir: PathBuf,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new(get_data_path())
    }
}

impl LayoutStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory of the store
    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    /// Path of the persisted layout (e.g. "~/.local/share/hidmap/mapping.json")
    pub fn layout_path(&self) -> PathBuf {
        self.dir.join(LAYOUT_FILE)
    }

    /// Path of the accumulated sample pairs
    pub fn samples_path(&self) -> PathBuf {
        self.dir.join(SAMPLES_FILE)
    }

    /// Load the persisted layout. Returns `Ok(None)` if no layout was saved.
    pub fn load_layout(&self) -> Result<Option<Layout>, LoadError> {
        let path = self.layout_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Err(LoadError::Empty);
        }
        let layout: Layout = serde_json::from_str(content.as_str())?;
        Ok(Some(layout))
    }

    /// Load the persisted layout or fall back to the built-in default layout
    /// if it is missing or unreadable.
    pub fn load_layout_or_default(&self) -> Layout {
        match self.load_layout() {
            Ok(Some(layout)) => {
                log::info!("Loaded layout from {}", self.layout_path().display());
                layout
            }
            Ok(None) => {
                log::info!("No saved layout found. Using default layout.");
                Layout::dualshock()
            }
            Err(e) => {
                log::warn!("Failed to load saved layout: {e}. Using default layout.");
                Layout::dualshock()
            }
        }
    }

    /// Replace the persisted layout. The previous layout, if any, is first
    /// copied to "mapping.json.bak.<millis>". The new layout is written to a
    /// temporary file and renamed into place so a crash never leaves a
    /// partially written layout behind.
    pub fn save_layout(&self, layout: &Layout) -> Result<PathBuf, StoreError> {
        let errors = layout.structural_errors();
        if !errors.is_empty() {
            return Err(StoreError::InvalidLayout(errors.join(", ")));
        }

        let path = self.layout_path();
        self.ensure_dir()?;

        if path.exists() {
            let backup = PathBuf::from(format!("{}.bak.{}", path.display(), timestamp_millis()));
            match fs::copy(&path, &backup) {
                Ok(_) => log::info!("Created layout backup: {}", backup.display()),
                Err(e) => {
                    return Err(StoreError::Write {
                        path: backup,
                        source: e,
                    })
                }
            }
        }

        let json = serde_json::to_string_pretty(layout)?;
        write_atomic(&path, json.as_bytes())?;
        log::info!("Saved layout to {}", path.display());

        Ok(path)
    }

    /// Write a layout that failed validation, together with the validation
    /// result, to "mapping.failed.<millis>.json" for later inspection.
    pub fn save_failed(
        &self,
        layout: &Layout,
        validation: &ValidationResult,
    ) -> Result<PathBuf, StoreError> {
        self.ensure_dir()?;
        let path = self
            .dir
            .join(format!("{FAILED_PREFIX}.{}.json", timestamp_millis()));
        let record = FailedRecord {
            mapping: layout,
            validation,
        };
        let json = serde_json::to_string_pretty(&record)?;
        write_atomic(&path, json.as_bytes())?;
        log::warn!("Layout failed validation. Saved for inspection: {}", path.display());

        Ok(path)
    }

    /// Load all stored sample pairs. A missing file yields no samples.
    pub fn load_samples(&self) -> Result<Vec<SamplePair>, LoadError> {
        let path = self.samples_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let samples: Vec<SamplePair> = serde_json::from_str(content.as_str())?;
        Ok(samples)
    }

    /// Append the given pairs to the stored samples and return the full
    /// sample history. Samples are never removed. An unreadable sample file is
    /// treated as empty.
    pub fn append_samples(&self, pairs: &[SamplePair]) -> Result<Vec<SamplePair>, StoreError> {
        let mut samples = self.load_samples().unwrap_or_else(|e| {
            log::warn!("Failed to load existing samples: {e}, starting fresh");
            Vec::new()
        });
        samples.extend_from_slice(pairs);

        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(&samples)?;
        write_atomic(&self.samples_path(), json.as_bytes())?;
        log::debug!("Stored {} sample pair(s)", samples.len());

        Ok(samples)
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Write {
            path: self.dir.clone(),
            source: e,
        })
    }
}

/// Write the given contents to a temporary file next to `path`, flush it to
/// disk, then rename it over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    let write_err = |source| StoreError::Write {
        path: temp_path.clone(),
        source,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
