//! In-process compute backend
//!
//! `PerItem` spreads items over a rayon thread pool. Each item is classified
//! independently and written to its own slot, so no locking is needed.
//! `SingleTask` classifies the batch sequentially inside one pool task.

use crate::backend::{ComputeBackend, ExecutionMode};
use crate::classifier::{predict, WeightMatrix};
use crate::data::Dataset;
use crate::error::{ClassifierError, Result};
use crate::format::FEATURE_COUNT;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

pub struct HostBackend {
    pool: ThreadPool,
}

impl HostBackend {
    /// Creates a backend with `threads` workers (`None` lets rayon decide).
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("classifier-{}", i));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| ClassifierError::backend("host", e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl ComputeBackend for HostBackend {
    fn name(&self) -> &str {
        "host"
    }

    fn submit_batch(
        &self,
        dataset: &Dataset,
        weights: &WeightMatrix,
        mode: ExecutionMode,
    ) -> Result<Vec<u8>> {
        debug!(
            items = dataset.len(),
            %mode,
            threads = self.num_threads(),
            "submitting batch"
        );
        self.pool.install(|| match mode {
            ExecutionMode::PerItem => dataset
                .as_bytes()
                .par_chunks_exact(FEATURE_COUNT)
                .map(|features| predict(features, weights))
                .collect(),
            ExecutionMode::SingleTask => dataset
                .iter()
                .map(|features| predict(features, weights))
                .collect(),
        })
    }
}
