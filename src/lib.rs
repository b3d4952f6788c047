//! Rust Linear Classifier Library
//!
//! This library classifies 28×28 MNIST digit images with one linear score per
//! digit class and an arg-max decision. Weights can be supplied as 32-bit floats
//! or as 8-bit / 4-bit fixed-point integers.
//!
//! # Modules
//!
//! - `format`: Shared numeric-format definitions (dimensions, representations, nibble packing)
//! - `error`: Error taxonomy shared by every loader and the evaluation harness
//! - `data`: IDX dataset parsing and per-class weight file I/O
//! - `quantize`: Float to fixed-point weight conversion
//! - `classifier`: Weight matrix and the linear arg-max classifier
//! - `backend`: Compute backend abstraction and the in-process thread pool backend
//! - `eval`: Evaluation harness and accuracy reporting
//! - `config`: Run configuration structures
//! - `utils`: Logging setup

pub mod backend;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod format;
pub mod quantize;
pub mod utils;

pub use error::{ClassifierError, Result};
