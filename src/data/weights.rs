//! Per-class weight files
//!
//! Each digit class has its own raw binary file holding exactly `FEATURE_COUNT`
//! weights in the active representation's packing:
//!
//! - `Float`: 4-byte IEEE-754, little-endian
//! - `Int8`: 1 signed byte per weight
//! - `Int4`: 2 signed nibbles per byte, high nibble first
//!
//! The loader never rescales; the integer values are handed to the classifier
//! as stored.

use crate::classifier::WeightMatrix;
use crate::error::{try_alloc, ClassifierError, Result};
use crate::format::{
    pack_nibbles, unpack_nibbles, weights_file_name, Representation, FEATURE_COUNT, NUM_DIGITS,
};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Weights of a single class as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightVector {
    Float(Vec<f32>),
    /// Int8 or sign-extended Int4 values.
    Fixed(Vec<i8>),
}

impl WeightVector {
    pub fn len(&self) -> usize {
        match self {
            WeightVector::Float(values) => values.len(),
            WeightVector::Fixed(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads one class's weight file.
pub fn read_weights(path: impl AsRef<Path>, representation: Representation) -> Result<WeightVector> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| ClassifierError::io(path, e))?;
    decode_weights(&data, representation, path)
}

/// Decodes exactly `FEATURE_COUNT` weights from `data`. `path` is only used in diagnostics.
pub fn decode_weights(data: &[u8], representation: Representation, path: &Path) -> Result<WeightVector> {
    let required = representation.encoded_len(FEATURE_COUNT);
    if data.len() < required {
        return Err(ClassifierError::format(
            path,
            format!(
                "weight file too short: {} weights need {} bytes, found {}",
                representation, required, data.len()
            ),
        ));
    }
    if data.len() > required {
        warn!(
            path = %path.display(),
            extra = data.len() - required,
            "ignoring trailing bytes after weights"
        );
    }
    let data = &data[..required];

    let vector = match representation {
        Representation::Float => {
            let mut values = try_alloc::<f32>(FEATURE_COUNT, "float weights")?;
            for (dst, chunk) in values.iter_mut().zip(data.chunks_exact(4)) {
                *dst = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            WeightVector::Float(values)
        }
        Representation::Int8 => {
            let mut values = try_alloc::<i8>(FEATURE_COUNT, "int8 weights")?;
            for (dst, &byte) in values.iter_mut().zip(data) {
                *dst = byte as i8;
            }
            WeightVector::Fixed(values)
        }
        Representation::Int4 => WeightVector::Fixed(unpack_nibbles(data, FEATURE_COUNT)?),
    };
    debug!(path = %path.display(), %representation, "read weights");
    Ok(vector)
}

/// Encodes one class's weights in the on-disk packing of `representation`.
pub fn encode_weights(weights: &WeightVector, representation: Representation) -> Result<Vec<u8>> {
    if weights.len() != FEATURE_COUNT {
        return Err(ClassifierError::precondition(format!(
            "weight vector has {} values, expected {}",
            weights.len(),
            FEATURE_COUNT
        )));
    }
    match (weights, representation) {
        (WeightVector::Float(values), Representation::Float) => {
            Ok(values.iter().flat_map(|v| v.to_le_bytes()).collect())
        }
        (WeightVector::Fixed(values), Representation::Int8) => {
            Ok(values.iter().map(|&v| v as u8).collect())
        }
        (WeightVector::Fixed(values), Representation::Int4) => {
            if let Some(&bad) = values.iter().find(|&&v| !(-8..=7).contains(&v)) {
                return Err(ClassifierError::precondition(format!(
                    "value {} does not fit in a signed 4-bit weight",
                    bad
                )));
            }
            Ok(pack_nibbles(values))
        }
        _ => Err(ClassifierError::precondition(format!(
            "cannot write {} weights from a {} vector",
            representation,
            match weights {
                WeightVector::Float(_) => "float",
                WeightVector::Fixed(_) => "fixed-point",
            }
        ))),
    }
}

/// Writes one class's weight file.
pub fn write_weights(
    path: impl AsRef<Path>,
    weights: &WeightVector,
    representation: Representation,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_weights(weights, representation)?;
    fs::write(path, bytes).map_err(|e| ClassifierError::io(path, e))
}

/// Loads `weights_<i>[_<tag>]` for every class from `dir` into one matrix.
pub fn load_weight_matrix(dir: impl AsRef<Path>, representation: Representation) -> Result<WeightMatrix> {
    let dir = dir.as_ref();
    let rows = (0..NUM_DIGITS)
        .map(|class| read_weights(dir.join(weights_file_name(class, representation)), representation))
        .collect::<Result<Vec<_>>>()?;
    WeightMatrix::from_rows(representation, rows)
}

/// Writes every class of `weights` into `dir`, creating it if needed.
pub fn write_weight_matrix(dir: impl AsRef<Path>, weights: &WeightMatrix) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| ClassifierError::io(dir, e))?;
    let representation = weights.representation();
    for class in 0..weights.num_classes() {
        write_weights(
            dir.join(weights_file_name(class, representation)),
            &weights.row(class),
            representation,
        )?;
    }
    Ok(())
}
