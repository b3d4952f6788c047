//! Tests for the evaluation harness and compute backends
//!
//! This file tests:
//! - Accuracy on the two-item all-ones scenario
//! - Context validation (count mismatch, empty dataset)
//! - Loading a full run from files on disk
//! - Host backend equivalence with the in-process classifier in both modes
//! - Backend failures and malformed backend responses

use approx::assert_relative_eq;
use rust_linear_classifier::backend::{ComputeBackend, ExecutionMode, HostBackend};
use rust_linear_classifier::classifier::{predict, WeightMatrix};
use rust_linear_classifier::config::{BackendKind, RunConfig};
use rust_linear_classifier::data::idx::{write_images, write_labels};
use rust_linear_classifier::data::{write_weight_matrix, Dataset, LabelSet};
use rust_linear_classifier::eval::{evaluate, evaluate_with_backend, ClassifierContext};
use rust_linear_classifier::format::{Representation, FEATURE_COUNT, NUM_DIGITS};
use rust_linear_classifier::quantize::quantize_matrix;
use rust_linear_classifier::{ClassifierError, Result};
use tempfile::tempdir;

fn class_three_weights() -> WeightMatrix {
    let mut values = vec![0.0f32; NUM_DIGITS * FEATURE_COUNT];
    values[3 * FEATURE_COUNT..4 * FEATURE_COUNT].fill(1.0);
    WeightMatrix::from_float(values).unwrap()
}

/// Weights whose winner is the brightest image quadrant (classes 0-3).
fn quadrant_weights() -> WeightMatrix {
    let mut values = vec![0.0f32; NUM_DIGITS * FEATURE_COUNT];
    for class in 0..NUM_DIGITS {
        for k in 0..FEATURE_COUNT {
            let (row, col) = (k / 28, k % 28);
            let quadrant = (row / 14) * 2 + col / 14;
            values[class * FEATURE_COUNT + k] = if quadrant == class % 4 {
                0.25 + (NUM_DIGITS - class) as f32 * 0.01
            } else {
                -0.05
            };
        }
    }
    WeightMatrix::from_float(values).unwrap()
}

fn synthetic_dataset(n_items: usize) -> Dataset {
    let mut pixels = vec![0u8; n_items * FEATURE_COUNT];
    for (item, image) in pixels.chunks_exact_mut(FEATURE_COUNT).enumerate() {
        for (k, pixel) in image.iter_mut().enumerate() {
            let (row, col) = (k / 28, k % 28);
            let quadrant = (row / 14) * 2 + col / 14;
            *pixel = if quadrant == item % 4 {
                200
            } else {
                ((item * 17 + k * 3) % 40) as u8
            };
        }
    }
    Dataset::from_pixels(pixels).unwrap()
}

fn reference_predictions(dataset: &Dataset, weights: &WeightMatrix) -> Vec<u8> {
    dataset.iter().map(|x| predict(x, weights).unwrap()).collect()
}

/// Backend that drops the last prediction.
struct ShortBackend;

impl ComputeBackend for ShortBackend {
    fn name(&self) -> &str {
        "short"
    }

    fn submit_batch(
        &self,
        dataset: &Dataset,
        weights: &WeightMatrix,
        _mode: ExecutionMode,
    ) -> Result<Vec<u8>> {
        let mut predictions = reference_predictions(dataset, weights);
        predictions.pop();
        Ok(predictions)
    }
}

/// Backend that answers with a class index no digit can have.
struct GarbageBackend;

impl ComputeBackend for GarbageBackend {
    fn name(&self) -> &str {
        "garbage"
    }

    fn submit_batch(&self, dataset: &Dataset, _: &WeightMatrix, _: ExecutionMode) -> Result<Vec<u8>> {
        Ok(vec![200; dataset.len()])
    }
}

/// Backend that cannot be reached.
struct OfflineBackend;

impl ComputeBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    fn submit_batch(&self, _: &Dataset, _: &WeightMatrix, _: ExecutionMode) -> Result<Vec<u8>> {
        Err(ClassifierError::Backend {
            backend: "offline".to_string(),
            reason: "device not found".to_string(),
        })
    }
}

// ============================================================================
// Harness Tests
// ============================================================================

mod harness_tests {
    use super::*;

    #[test]
    fn test_two_item_scenario() {
        let dataset = Dataset::from_pixels(vec![1u8; 2 * FEATURE_COUNT]).unwrap();
        let labels = LabelSet::from_labels(vec![3, 3]).unwrap();
        let ctx = ClassifierContext::new(dataset, labels, class_three_weights()).unwrap();

        let result = evaluate(&ctx).unwrap();
        assert_eq!(result.n_correct, 2);
        assert_eq!(result.n_items, 2);
        assert_relative_eq!(result.accuracy, 100.0);
    }

    #[test]
    fn test_partial_accuracy() {
        let dataset = Dataset::from_pixels(vec![1u8; 4 * FEATURE_COUNT]).unwrap();
        let labels = LabelSet::from_labels(vec![3, 0, 3, 1]).unwrap();
        let ctx = ClassifierContext::new(dataset, labels, class_three_weights()).unwrap();

        let result = evaluate(&ctx).unwrap();
        assert_eq!(result.n_correct, 2);
        assert_relative_eq!(result.accuracy, 50.0);
    }

    #[test]
    fn test_empty_dataset_is_precondition_error() {
        let dataset = Dataset::from_pixels(vec![]).unwrap();
        let labels = LabelSet::from_labels(vec![]).unwrap();
        let err = ClassifierContext::new(dataset, labels, class_three_weights()).unwrap_err();

        assert!(matches!(err, ClassifierError::Precondition(_)));
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let dataset = Dataset::from_pixels(vec![1u8; 3 * FEATURE_COUNT]).unwrap();
        let labels = LabelSet::from_labels(vec![3, 3]).unwrap();
        let err = ClassifierContext::new(dataset, labels, class_three_weights()).unwrap_err();

        assert!(err.is_format_error());
    }
}

// ============================================================================
// Backend Tests
// ============================================================================

mod backend_tests {
    use super::*;

    #[test]
    fn test_host_backend_matches_reference() {
        let dataset = synthetic_dataset(64);
        let weights = quadrant_weights();
        let expected = reference_predictions(&dataset, &weights);
        let backend = HostBackend::new(Some(4)).unwrap();

        for mode in [ExecutionMode::PerItem, ExecutionMode::SingleTask] {
            let predictions = backend.submit_batch(&dataset, &weights, mode).unwrap();
            assert_eq!(predictions, expected, "mode {}", mode);
        }
    }

    #[test]
    fn test_host_backend_matches_reference_fixed_point() {
        let dataset = synthetic_dataset(32);
        let backend = HostBackend::new(Some(2)).unwrap();

        for representation in [Representation::Int8, Representation::Int4] {
            let weights = quantize_matrix(&quadrant_weights(), representation).unwrap();
            let expected = reference_predictions(&dataset, &weights);
            let predictions = backend
                .submit_batch(&dataset, &weights, ExecutionMode::PerItem)
                .unwrap();
            assert_eq!(predictions, expected, "representation {}", representation);
        }
    }

    #[test]
    fn test_evaluate_with_backend_equals_evaluate() {
        let dataset = synthetic_dataset(40);
        let labels =
            LabelSet::from_labels((0..40).map(|i| (i % 4) as u8).collect()).unwrap();
        let ctx = ClassifierContext::new(dataset, labels, quadrant_weights()).unwrap();
        let backend = HostBackend::new(None).unwrap();

        let software = evaluate(&ctx).unwrap();
        let host = evaluate_with_backend(&ctx, &backend, ExecutionMode::PerItem).unwrap();
        assert_eq!(host.n_correct, software.n_correct);
        assert_eq!(host.n_items, 40);
        assert_relative_eq!(host.accuracy, software.accuracy);
    }

    #[test]
    fn test_short_response_is_backend_error() {
        let dataset = Dataset::from_pixels(vec![1u8; 3 * FEATURE_COUNT]).unwrap();
        let labels = LabelSet::from_labels(vec![3, 3, 3]).unwrap();
        let ctx = ClassifierContext::new(dataset, labels, class_three_weights()).unwrap();

        let err = evaluate_with_backend(&ctx, &ShortBackend, ExecutionMode::PerItem).unwrap_err();
        assert!(matches!(err, ClassifierError::Backend { .. }));
        assert!(err.to_string().contains("2 predictions for 3 items"));
    }

    #[test]
    fn test_out_of_range_class_is_backend_error() {
        let dataset = Dataset::from_pixels(vec![1u8; 2 * FEATURE_COUNT]).unwrap();
        let labels = LabelSet::from_labels(vec![3, 3]).unwrap();
        let ctx = ClassifierContext::new(dataset, labels, class_three_weights()).unwrap();

        let err =
            evaluate_with_backend(&ctx, &GarbageBackend, ExecutionMode::PerItem).unwrap_err();
        assert!(matches!(err, ClassifierError::Backend { .. }));
        assert!(err.to_string().contains("returned class 200 for item 0"));
    }

    #[test]
    fn test_backend_failure_propagates() {
        let dataset = Dataset::from_pixels(vec![1u8; FEATURE_COUNT]).unwrap();
        let labels = LabelSet::from_labels(vec![3]).unwrap();
        let ctx = ClassifierContext::new(dataset, labels, class_three_weights()).unwrap();

        let err =
            evaluate_with_backend(&ctx, &OfflineBackend, ExecutionMode::SingleTask).unwrap_err();
        assert!(err.to_string().contains("device not found"));
    }
}

// ============================================================================
// Load From Disk Tests
// ============================================================================

mod load_tests {
    use super::*;

    fn write_run(dir: &std::path::Path, n_images: usize, n_labels: usize) -> RunConfig {
        let images = dir.join("images.idx3-ubyte");
        let labels = dir.join("labels.idx1-ubyte");
        let weights_dir = dir.join("weights_fxp8");
        write_images(&images, &synthetic_dataset(n_images)).unwrap();
        write_labels(
            &labels,
            &LabelSet::from_labels((0..n_labels).map(|i| (i % 4) as u8).collect()).unwrap(),
        )
        .unwrap();
        let weights = quantize_matrix(&quadrant_weights(), Representation::Int8).unwrap();
        write_weight_matrix(&weights_dir, &weights).unwrap();

        RunConfig {
            images: Some(images),
            labels: Some(labels),
            representation: Some(Representation::Int8),
            weights_dir: Some(weights_dir),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_and_evaluate() {
        let dir = tempdir().unwrap();
        let settings = write_run(dir.path(), 20, 20).resolve();

        let ctx = ClassifierContext::load(&settings).unwrap();
        assert_eq!(ctx.len(), 20);
        assert_eq!(ctx.weights().representation(), Representation::Int8);

        let result = evaluate(&ctx).unwrap();
        assert_eq!(result.n_items, 20);
        assert_eq!(result.n_correct, 20);
    }

    #[test]
    fn test_item_limit() {
        let dir = tempdir().unwrap();
        let mut config = write_run(dir.path(), 20, 20);
        config.n_items_limit = Some(5);
        config.backend = Some(BackendKind::Host);

        let ctx = ClassifierContext::load(&config.resolve()).unwrap();
        assert_eq!(ctx.len(), 5);
        assert_eq!(ctx.labels().len(), 5);
    }

    #[test]
    fn test_mismatch_checked_before_limit() {
        let dir = tempdir().unwrap();
        let mut config = write_run(dir.path(), 100, 99);
        config.n_items_limit = Some(10);

        let err = ClassifierContext::load(&config.resolve()).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::CountMismatch {
                images: 100,
                labels: 99
            }
        ));
    }

    #[test]
    fn test_wrong_representation_directory() {
        let dir = tempdir().unwrap();
        let mut config = write_run(dir.path(), 4, 4);
        config.representation = Some(Representation::Int4);

        // weights_fxp8 holds *_fxp8 files, so the *_fxp4 names are missing.
        let err = ClassifierContext::load(&config.resolve()).unwrap_err();
        assert!(matches!(err, ClassifierError::Io { .. }));
    }
}
