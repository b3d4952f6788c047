//! Evaluation harness
//!
//! Loads every input once into a [`ClassifierContext`], classifies the whole
//! dataset (in process or through a [`ComputeBackend`]) and compares the
//! predictions with the reference labels. Timing covers the classification
//! batch only, never loading.

use crate::backend::{ComputeBackend, ExecutionMode};
use crate::classifier::{predict, WeightMatrix};
use crate::config::Settings;
use crate::data::{load_dataset, load_weight_matrix, Dataset, LabelSet};
use crate::error::{try_alloc, ClassifierError, Result};
use crate::format::NUM_DIGITS;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Everything a run needs, loaded and validated up front.
#[derive(Debug, Clone)]
pub struct ClassifierContext {
    dataset: Dataset,
    labels: LabelSet,
    weights: WeightMatrix,
}

impl ClassifierContext {
    /// Pairs a dataset with its labels and weights.
    ///
    /// Fails with a count mismatch if images and labels disagree, and with a
    /// precondition error for an empty dataset or a weight matrix without
    /// exactly `NUM_DIGITS` classes.
    pub fn new(dataset: Dataset, labels: LabelSet, weights: WeightMatrix) -> Result<Self> {
        if dataset.len() != labels.len() {
            return Err(ClassifierError::CountMismatch {
                images: dataset.len(),
                labels: labels.len(),
            });
        }
        if dataset.is_empty() {
            return Err(ClassifierError::precondition("dataset contains no items"));
        }
        if weights.num_classes() != NUM_DIGITS {
            return Err(ClassifierError::precondition(format!(
                "weight matrix has {} classes, expected {}",
                weights.num_classes(),
                NUM_DIGITS
            )));
        }
        Ok(Self {
            dataset,
            labels,
            weights,
        })
    }

    /// Loads images, labels and weights described by `settings`.
    pub fn load(settings: &Settings) -> Result<Self> {
        let (mut dataset, mut labels) = load_dataset(&settings.images, &settings.labels)?;
        info!(
            items = dataset.len(),
            images = %settings.images.display(),
            "loaded dataset"
        );

        let weights = load_weight_matrix(&settings.weights_dir, settings.representation)?;
        info!(
            representation = %settings.representation,
            dir = %settings.weights_dir.display(),
            "loaded weights"
        );

        if let Some(limit) = settings.n_items_limit {
            if limit < dataset.len() {
                debug!(limit, "limiting number of items");
                dataset.truncate(limit);
                labels.truncate(limit);
            }
        }

        Self::new(dataset, labels, weights)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyResult {
    pub n_correct: usize,
    pub n_items: usize,
    /// Percentage in `[0, 100]`.
    pub accuracy: f64,
    /// Wall-clock time of the classification batch.
    pub elapsed: Duration,
}

impl AccuracyResult {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

impl fmt::Display for AccuracyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Predicted {} correct out of {} (Accuracy: {:.2}%)",
            self.n_correct, self.n_items, self.accuracy
        )
    }
}

/// Compares predictions with reference labels. `elapsed` is left at zero.
pub fn score_predictions(predictions: &[u8], labels: &LabelSet) -> Result<AccuracyResult> {
    let n_items = labels.len();
    if n_items == 0 {
        return Err(ClassifierError::precondition(
            "cannot compute accuracy of an empty dataset",
        ));
    }
    if predictions.len() != n_items {
        return Err(ClassifierError::precondition(format!(
            "{} predictions for {} labels",
            predictions.len(),
            n_items
        )));
    }
    let n_correct = predictions
        .iter()
        .zip(labels.as_slice())
        .filter(|(guess, label)| guess == label)
        .count();
    Ok(AccuracyResult {
        n_correct,
        n_items,
        accuracy: n_correct as f64 * 100.0 / n_items as f64,
        elapsed: Duration::ZERO,
    })
}

/// Classifies every item in index order with the in-process classifier.
pub fn evaluate(ctx: &ClassifierContext) -> Result<AccuracyResult> {
    let mut predictions = try_alloc::<u8>(ctx.len(), "prediction buffer")?;

    let start = Instant::now();
    for (guess, features) in predictions.iter_mut().zip(ctx.dataset.iter()) {
        *guess = predict(features, &ctx.weights)?;
    }
    let elapsed = start.elapsed();

    let result = score_predictions(&predictions, &ctx.labels)?;
    Ok(AccuracyResult { elapsed, ..result })
}

/// Forwards the whole batch to `backend` and scores what it returns.
pub fn evaluate_with_backend(
    ctx: &ClassifierContext,
    backend: &dyn ComputeBackend,
    mode: ExecutionMode,
) -> Result<AccuracyResult> {
    let start = Instant::now();
    let predictions = backend.submit_batch(&ctx.dataset, &ctx.weights, mode)?;
    let elapsed = start.elapsed();

    if predictions.len() != ctx.len() {
        return Err(ClassifierError::backend(
            backend.name(),
            format!(
                "returned {} predictions for {} items",
                predictions.len(),
                ctx.len()
            ),
        ));
    }
    if let Some(item) = predictions.iter().position(|&p| p as usize >= NUM_DIGITS) {
        return Err(ClassifierError::backend(
            backend.name(),
            format!(
                "returned class {} for item {}, expected a digit below {}",
                predictions[item], item, NUM_DIGITS
            ),
        ));
    }

    let result = score_predictions(&predictions, &ctx.labels)?;
    Ok(AccuracyResult { elapsed, ..result })
}
