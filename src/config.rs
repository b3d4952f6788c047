//! Configuration structures for a classification run
//!
//! A run can be configured from a JSON file; every field is optional and falls
//! back to the documented default. Command-line flags override file values.

use crate::backend::ExecutionMode;
use crate::error::{ClassifierError, Result};
use crate::format::{default_weights_dir, Representation};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_IMAGES_FILE: &str = "t10k-images.idx3-ubyte";
pub const DEFAULT_LABELS_FILE: &str = "t10k-labels.idx1-ubyte";
pub const DEFAULT_REPRESENTATION: Representation = Representation::Int8;

/// Which executor classifies the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Sequential in-process loop over [`crate::classifier::predict`].
    #[default]
    Software,
    /// [`crate::backend::HostBackend`] thread pool.
    Host,
}

/// Run configuration as read from JSON.
///
/// # Example
///
/// ```json
/// {
///   "images": "data/t10k-images.idx3-ubyte",
///   "labels": "data/t10k-labels.idx1-ubyte",
///   "representation": "int4",
///   "weights_dir": "weights_fxp4",
///   "backend": "host",
///   "execution_mode": "single_task",
///   "threads": 4,
///   "n_items_limit": 1000
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// IDX image file (default `t10k-images.idx3-ubyte`)
    pub images: Option<PathBuf>,

    /// IDX label file (default `t10k-labels.idx1-ubyte`)
    pub labels: Option<PathBuf>,

    /// Weight representation: "float", "int8" or "int4" (default "int8")
    pub representation: Option<Representation>,

    /// Directory holding the per-class weight files (default depends on representation)
    pub weights_dir: Option<PathBuf>,

    /// "software" or "host" (default "software")
    pub backend: Option<BackendKind>,

    /// "per_item" or "single_task", only used by the host backend (default "per_item")
    pub execution_mode: Option<ExecutionMode>,

    /// Worker threads for the host backend
    pub threads: Option<usize>,

    /// Classify only the first N items
    pub n_items_limit: Option<usize>,
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub images: PathBuf,
    pub labels: PathBuf,
    pub representation: Representation,
    pub weights_dir: PathBuf,
    pub backend: BackendKind,
    pub execution_mode: ExecutionMode,
    pub threads: Option<usize>,
    pub n_items_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        RunConfig::default().resolve()
    }
}

impl RunConfig {
    /// Fills every missing field with its default.
    pub fn resolve(self) -> Settings {
        let representation = self.representation.unwrap_or(DEFAULT_REPRESENTATION);
        Settings {
            images: self
                .images
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_FILE)),
            labels: self
                .labels
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LABELS_FILE)),
            representation,
            weights_dir: self
                .weights_dir
                .unwrap_or_else(|| PathBuf::from(default_weights_dir(representation))),
            backend: self.backend.unwrap_or_default(),
            execution_mode: self.execution_mode.unwrap_or_default(),
            threads: self.threads,
            n_items_limit: self.n_items_limit,
        }
    }
}

/// Loads a run configuration from a JSON file.
///
/// # Returns
///
/// `Ok(RunConfig)` on success, or an error if the file cannot be read, the JSON
/// is invalid, or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use rust_linear_classifier::config::load_config;
///
/// let cfg = load_config("config/int4_host.json").unwrap();
/// assert!(cfg.representation.is_some());
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RunConfig> {
    let config = read_config(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parses a run configuration without validating its values, for callers that
/// merge other sources in first and validate the result once.
pub fn read_config(path: impl AsRef<Path>) -> Result<RunConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| ClassifierError::io(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn validate_config(config: &RunConfig) -> Result<()> {
    if config.threads == Some(0) {
        return Err(ClassifierError::precondition("threads must be positive"));
    }

    if config.n_items_limit == Some(0) {
        return Err(ClassifierError::precondition(
            "n_items_limit must be positive",
        ));
    }

    if config.execution_mode.is_some() && config.backend != Some(BackendKind::Host) {
        tracing::warn!("execution_mode only applies to the host backend");
    }

    Ok(())
}
