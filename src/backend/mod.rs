//! Compute backend abstraction
//!
//! A compute backend classifies a whole batch in one synchronous call. It
//! receives the dataset and the weight matrix (which carries its representation
//! tag) and returns one predicted class per item. Whatever the backend and the
//! execution mode, the predictions must be identical to
//! [`crate::classifier::predict`] applied item by item.
//!
//! # Available Backends
//!
//! - `HostBackend`: in-process executor on a rayon thread pool

pub mod host;

pub use host::HostBackend;

use crate::classifier::WeightMatrix;
use crate::data::Dataset;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a backend schedules the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One independent work item per dataset item.
    #[default]
    PerItem,
    /// A single task that walks the whole batch.
    SingleTask,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::PerItem => f.write_str("per-item"),
            ExecutionMode::SingleTask => f.write_str("single-task"),
        }
    }
}

/// Executor of the batch classification contract.
///
/// Implementations return the full prediction array or an error; there is no
/// partial result and the caller does not retry.
pub trait ComputeBackend {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Classifies every item of `dataset` against `weights`.
    fn submit_batch(
        &self,
        dataset: &Dataset,
        weights: &WeightMatrix,
        mode: ExecutionMode,
    ) -> Result<Vec<u8>>;
}
