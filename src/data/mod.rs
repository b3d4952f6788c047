//! Input file formats
//!
//! This module parses the IDX image/label files and the per-class weight files
//! into owned, immutable buffers.

pub mod idx;
pub mod weights;

pub use idx::{load_dataset, parse_images, parse_labels, Dataset, LabelSet};
pub use weights::{load_weight_matrix, read_weights, write_weight_matrix, write_weights, WeightVector};
