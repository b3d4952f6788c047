//! Shared numeric-format definitions
//!
//! This module holds the constants and encodings that the loaders, the quantizer
//! and the classifier must agree on: image geometry, IDX magic numbers, the
//! weight representations and their on-disk packing.
//!
//! # Fixed-point scale
//!
//! Quantized weights are stored as plain integers; the scale is not written to
//! any file. Both sides use:
//!
//! - **Int8**: Q0.7, real value = `q / 128`
//! - **Int4**: Q0.3, real value = `q / 8`

use crate::error::{try_with_capacity, ClassifierError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// MNIST geometry (images are flat 28x28 in row-major order).
pub const IMAGE_ROWS: usize = 28;
pub const IMAGE_COLS: usize = 28;
pub const FEATURE_COUNT: usize = IMAGE_ROWS * IMAGE_COLS; // 784
pub const NUM_DIGITS: usize = 10;

/// IDX magic for unsigned-byte, 3-dimensional data (images).
pub const IMAGE_MAGIC: u32 = 0x0000_0803;
/// IDX magic for unsigned-byte, 1-dimensional data (labels).
pub const LABEL_MAGIC: u32 = 0x0000_0801;
pub const IMAGE_HEADER_LEN: usize = 16;
pub const LABEL_HEADER_LEN: usize = 8;

pub const FIXED_POINT_SCALE_INT8: f32 = 128.0;
pub const FIXED_POINT_SCALE_INT4: f32 = 8.0;

/// Numeric representation of a weight matrix.
///
/// Exactly one representation is active per run; it decides the on-disk width
/// of each weight, the file naming and the accumulator used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// IEEE-754 single precision, 4 bytes little-endian per weight.
    #[serde(alias = "fp")]
    Float,
    /// Signed 8-bit fixed point, 1 byte per weight.
    #[serde(alias = "fxp8")]
    Int8,
    /// Signed 4-bit fixed point, two weights per byte (high nibble first).
    #[serde(alias = "fxp4")]
    Int4,
}

impl Representation {
    pub const ALL: [Representation; 3] = [
        Representation::Float,
        Representation::Int8,
        Representation::Int4,
    ];

    /// Short tag used in weight file and directory names.
    pub fn tag(self) -> &'static str {
        match self {
            Representation::Float => "fp",
            Representation::Int8 => "fxp8",
            Representation::Int4 => "fxp4",
        }
    }

    pub fn is_fixed_point(self) -> bool {
        !matches!(self, Representation::Float)
    }

    /// Number of bytes needed on disk for `count` weights.
    pub fn encoded_len(self, count: usize) -> usize {
        match self {
            Representation::Float => count * 4,
            Representation::Int8 => count,
            Representation::Int4 => count.div_ceil(2),
        }
    }

    /// Scale between the stored integer and the real weight (`real = q / scale`).
    pub fn scale(self) -> f32 {
        match self {
            Representation::Float => 1.0,
            Representation::Int8 => FIXED_POINT_SCALE_INT8,
            Representation::Int4 => FIXED_POINT_SCALE_INT4,
        }
    }

    /// Inclusive integer range of a fixed-point representation.
    pub fn value_range(self) -> Option<(i8, i8)> {
        match self {
            Representation::Float => None,
            Representation::Int8 => Some((i8::MIN, i8::MAX)),
            Representation::Int4 => Some((-8, 7)),
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Representation::Float => "float",
            Representation::Int8 => "int8",
            Representation::Int4 => "int4",
        };
        f.write_str(name)
    }
}

impl FromStr for Representation {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float" | "fp" | "f32" => Ok(Representation::Float),
            "int8" | "fxp8" | "i8" => Ok(Representation::Int8),
            "int4" | "fxp4" | "i4" => Ok(Representation::Int4),
            other => Err(ClassifierError::precondition(format!(
                "unknown representation '{}'. Must be one of: float, int8, int4",
                other
            ))),
        }
    }
}

/// Swaps the byte order of a 32-bit integer.
pub fn convert_endian_4bytes(input: u32) -> u32 {
    input.swap_bytes()
}

/// Reads one big-endian `u32` header field at `offset` and converts it to host order.
pub fn read_be_u32(data: &[u8], offset: &mut usize, path: &Path) -> Result<u32> {
    let end = *offset + 4;
    let bytes = data.get(*offset..end).ok_or_else(|| {
        ClassifierError::format(
            path,
            format!("header truncated at byte {} (file is {} bytes)", *offset, data.len()),
        )
    })?;
    let raw = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    *offset = end;
    Ok(if cfg!(target_endian = "little") {
        convert_endian_4bytes(raw)
    } else {
        raw
    })
}

/// Packs signed 4-bit values two per byte, high nibble first.
///
/// An odd trailing value occupies the high nibble of the last byte and the low
/// nibble is left zero. Values must already be in `[-8, 7]`.
pub fn pack_nibbles(values: &[i8]) -> Vec<u8> {
    values
        .chunks(2)
        .map(|pair| {
            let high = (pair[0] as u8 & 0x0F) << 4;
            let low = pair.get(1).map_or(0, |&v| v as u8 & 0x0F);
            high | low
        })
        .collect()
}

/// Unpacks `count` signed 4-bit values from `bytes`, sign-extending each nibble.
///
/// The caller guarantees `bytes.len() >= count.div_ceil(2)`.
pub fn unpack_nibbles(bytes: &[u8], count: usize) -> Result<Vec<i8>> {
    let mut values = try_with_capacity(count, "int4 weights")?;
    for &byte in bytes.iter().take(count.div_ceil(2)) {
        values.push(sign_extend_nibble(byte >> 4));
        if values.len() < count {
            values.push(sign_extend_nibble(byte & 0x0F));
        }
    }
    Ok(values)
}

fn sign_extend_nibble(nibble: u8) -> i8 {
    // Shift into the top of an i8 and arithmetic-shift back down.
    ((nibble << 4) as i8) >> 4
}

/// File name for one class's weights, e.g. `weights_3` or `weights_3_fxp8`.
pub fn weights_file_name(class: usize, representation: Representation) -> String {
    match representation {
        Representation::Float => format!("weights_{}", class),
        fixed => format!("weights_{}_{}", class, fixed.tag()),
    }
}

/// Default directory holding the weight files of a representation.
pub fn default_weights_dir(representation: Representation) -> &'static str {
    match representation {
        Representation::Float => "weights_fp",
        Representation::Int8 => "weights_fxp8",
        Representation::Int4 => "weights_fxp4",
    }
}
