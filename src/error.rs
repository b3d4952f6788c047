//! Error types for loading, classification and evaluation.
//!
//! Every failure is fatal for a run: loaders and the harness return a
//! [`ClassifierError`] and the binaries turn it into a diagnostic and a
//! non-zero exit status.

use std::collections::TryReserveError;
use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClassifierError>;

#[derive(thiserror::Error, Debug)]
pub enum ClassifierError {
    /// Malformed or truncated input file.
    #[error("format error in {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Image and label files disagree on the number of items.
    #[error("number of labels ({labels}) does not match number of images ({images})")]
    CountMismatch { images: usize, labels: usize },

    /// The input file could not be opened or read.
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A loader's output buffer could not be allocated.
    #[error("failed to allocate {what}: {source}")]
    Resource {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("backend '{backend}' failed: {reason}")]
    Backend { backend: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ClassifierError {
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClassifierError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClassifierError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        ClassifierError::Precondition(message.into())
    }

    pub(crate) fn backend(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        ClassifierError::Backend {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// True for the malformed-input family (bad header, truncation, count mismatch, I/O).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ClassifierError::Format { .. }
                | ClassifierError::CountMismatch { .. }
                | ClassifierError::Io { .. }
        )
    }
}

/// Empty vector with room for `len` elements, reporting allocation failure
/// as [`ClassifierError::Resource`] instead of aborting.
pub(crate) fn try_with_capacity<T>(len: usize, what: &'static str) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|source| ClassifierError::Resource { what, source })?;
    Ok(buffer)
}

/// Allocates a zeroed buffer of `len` elements.
pub(crate) fn try_alloc<T: Clone + Default>(len: usize, what: &'static str) -> Result<Vec<T>> {
    let mut buffer = try_with_capacity(len, what)?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
