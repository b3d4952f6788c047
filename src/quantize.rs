//! Float to fixed-point weight conversion
//!
//! Produces the integer weights consumed by the Int8 and Int4 classifiers. A
//! weight `w` becomes `round(w * scale)` saturated to the representation's range,
//! using the scales fixed in [`crate::format`].

use crate::classifier::WeightMatrix;
use crate::error::{ClassifierError, Result};
use crate::format::Representation;

/// Quantizes one weight. NaN maps to zero; infinities saturate.
pub fn quantize_value(weight: f32, representation: Representation) -> Result<i8> {
    let (low, high) = representation.value_range().ok_or_else(|| {
        ClassifierError::precondition("cannot quantize to the float representation")
    })?;
    if weight.is_nan() {
        return Ok(0);
    }
    Ok(scaled(weight, representation).clamp(low as f32, high as f32) as i8)
}

fn scaled(weight: f32, representation: Representation) -> f32 {
    (weight * representation.scale()).round()
}

/// True if [`quantize_value`] clips `weight` to the edge of the range.
/// Always false for the float representation and for NaN.
pub fn saturates(weight: f32, representation: Representation) -> bool {
    let Some((low, high)) = representation.value_range() else {
        return false;
    };
    let scaled = scaled(weight, representation);
    scaled < low as f32 || scaled > high as f32
}

/// Real value represented by a stored fixed-point weight.
pub fn dequantize_value(value: i8, representation: Representation) -> f32 {
    value as f32 / representation.scale()
}

pub fn quantize_weights(weights: &[f32], representation: Representation) -> Result<Vec<i8>> {
    weights
        .iter()
        .map(|&w| quantize_value(w, representation))
        .collect()
}

/// Converts a float weight matrix to `representation`.
pub fn quantize_matrix(weights: &WeightMatrix, representation: Representation) -> Result<WeightMatrix> {
    let values = weights.as_float().ok_or_else(|| {
        ClassifierError::precondition(format!(
            "expected float weights to quantize, found {}",
            weights.representation()
        ))
    })?;
    WeightMatrix::from_fixed(representation, quantize_weights(values, representation)?)
}
