//! Linear scoring and arg-max prediction
//!
//! For every class `j` the score is `Σ_k W[j][k] * X[k]`, summed in ascending
//! feature order. Float weights accumulate in `f32`. Fixed-point weights
//! accumulate in `i32`: the largest possible magnitude is
//! `784 * 128 * 255 = 25_589_760`, far below `i32::MAX`. All fixed-point classes
//! share one scale, so the arg-max is taken on the raw integer sums.

use crate::classifier::matrix::{WeightMatrix, WeightView};
use crate::error::{ClassifierError, Result};
use crate::format::{FEATURE_COUNT, NUM_DIGITS};

/// Raw scores of every class for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassScores {
    Float([f32; NUM_DIGITS]),
    Fixed([i32; NUM_DIGITS]),
}

impl ClassScores {
    /// Class with the highest score; the lowest class index wins ties.
    pub fn argmax(&self) -> u8 {
        match self {
            ClassScores::Float(scores) => first_max(scores, f32::NEG_INFINITY),
            ClassScores::Fixed(scores) => first_max(scores, i32::MIN),
        }
    }
}

// Strict `>` over ascending classes keeps the first maximum.
fn first_max<T: PartialOrd + Copy>(scores: &[T], sentinel: T) -> u8 {
    let mut max_score = sentinel;
    let mut guess = 0u8;
    for (class, &score) in scores.iter().enumerate() {
        if score > max_score {
            max_score = score;
            guess = class as u8;
        }
    }
    guess
}

fn dot_float(weights: &[f32], features: &[u8]) -> f32 {
    let mut hypothesis = 0.0f32;
    for (&w, &x) in weights.iter().zip(features) {
        hypothesis += w * x as f32;
    }
    hypothesis
}

fn dot_fixed(weights: &[i8], features: &[u8]) -> i32 {
    weights
        .iter()
        .zip(features)
        .map(|(&w, &x)| w as i32 * x as i32)
        .sum()
}

fn check_dimensions(features: &[u8], weights: &WeightMatrix) -> Result<()> {
    if features.len() != FEATURE_COUNT {
        return Err(ClassifierError::precondition(format!(
            "feature vector has {} values, expected {}",
            features.len(),
            FEATURE_COUNT
        )));
    }
    if weights.num_classes() != NUM_DIGITS {
        return Err(ClassifierError::precondition(format!(
            "weight matrix has {} classes, expected {}",
            weights.num_classes(),
            NUM_DIGITS
        )));
    }
    Ok(())
}

/// Scores `features` against every class of `weights`.
pub fn class_scores(features: &[u8], weights: &WeightMatrix) -> Result<ClassScores> {
    check_dimensions(features, weights)?;
    let scores = match weights.view() {
        WeightView::Float(values) => {
            let mut scores = [0.0f32; NUM_DIGITS];
            for (score, row) in scores.iter_mut().zip(values.chunks_exact(FEATURE_COUNT)) {
                *score = dot_float(row, features);
            }
            ClassScores::Float(scores)
        }
        WeightView::Fixed(values) => {
            let mut scores = [0i32; NUM_DIGITS];
            for (score, row) in scores.iter_mut().zip(values.chunks_exact(FEATURE_COUNT)) {
                *score = dot_fixed(row, features);
            }
            ClassScores::Fixed(scores)
        }
    };
    Ok(scores)
}

/// Predicts the digit for one feature vector.
///
/// # Example
///
/// ```
/// use rust_linear_classifier::classifier::{predict, WeightMatrix};
/// use rust_linear_classifier::format::{FEATURE_COUNT, NUM_DIGITS};
///
/// let mut values = vec![0.0f32; NUM_DIGITS * FEATURE_COUNT];
/// values[3 * FEATURE_COUNT..4 * FEATURE_COUNT].fill(1.0);
/// let weights = WeightMatrix::from_float(values).unwrap();
/// assert_eq!(predict(&[1u8; FEATURE_COUNT], &weights).unwrap(), 3);
/// ```
pub fn predict(features: &[u8], weights: &WeightMatrix) -> Result<u8> {
    Ok(class_scores(features, weights)?.argmax())
}
