//! Linear digit classifier
//!
//! This module provides the weight matrix shared by every representation and the
//! arg-max classifier that scores a feature vector against it.

pub mod linear;
pub mod matrix;

pub use linear::{class_scores, predict, ClassScores};
pub use matrix::{WeightMatrix, WeightView};
