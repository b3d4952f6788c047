//! Weight matrix storage
//!
//! All class rows live in one contiguous buffer indexed
//! `[class * FEATURE_COUNT + feature]`. Fixed-point weights (both Int8 and Int4)
//! are held unpacked as `i8`; the representation tag records which range and
//! scale apply.

use crate::data::WeightVector;
use crate::error::{try_with_capacity, ClassifierError, Result};
use crate::format::{Representation, FEATURE_COUNT};

#[derive(Debug, Clone, PartialEq)]
enum WeightValues {
    Float(Vec<f32>),
    Fixed(Vec<i8>),
}

/// Borrowed weight buffer, class-major.
#[derive(Debug, Clone, Copy)]
pub enum WeightView<'a> {
    Float(&'a [f32]),
    Fixed(&'a [i8]),
}

/// Per-class weight vectors in a single representation.
///
/// # Example
///
/// ```
/// use rust_linear_classifier::classifier::WeightMatrix;
/// use rust_linear_classifier::format::{FEATURE_COUNT, NUM_DIGITS};
///
/// let weights = WeightMatrix::from_float(vec![0.0; NUM_DIGITS * FEATURE_COUNT]).unwrap();
/// assert_eq!(weights.num_classes(), NUM_DIGITS);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    representation: Representation,
    values: WeightValues,
}

impl WeightMatrix {
    /// Builds a float matrix from `num_classes * FEATURE_COUNT` values.
    pub fn from_float(values: Vec<f32>) -> Result<Self> {
        check_shape(values.len())?;
        Ok(Self {
            representation: Representation::Float,
            values: WeightValues::Float(values),
        })
    }

    /// Builds a fixed-point matrix, checking every value against the representation's range.
    pub fn from_fixed(representation: Representation, values: Vec<i8>) -> Result<Self> {
        let (low, high) = representation.value_range().ok_or_else(|| {
            ClassifierError::precondition("float representation needs float weights")
        })?;
        check_shape(values.len())?;
        if let Some(position) = values.iter().position(|v| !(low..=high).contains(v)) {
            return Err(ClassifierError::precondition(format!(
                "weight {} at index {} is outside the {} range [{}, {}]",
                values[position], position, representation, low, high
            )));
        }
        Ok(Self {
            representation,
            values: WeightValues::Fixed(values),
        })
    }

    /// Concatenates per-class vectors (class 0 first) into one matrix.
    pub fn from_rows(representation: Representation, rows: Vec<WeightVector>) -> Result<Self> {
        if let Some(row) = rows.iter().position(|r| r.len() != FEATURE_COUNT) {
            return Err(ClassifierError::precondition(format!(
                "class {} has {} weights, expected {}",
                row,
                rows[row].len(),
                FEATURE_COUNT
            )));
        }
        let len = rows.len() * FEATURE_COUNT;
        match representation {
            Representation::Float => {
                let mut values: Vec<f32> = try_with_capacity(len, "float weight matrix")?;
                for row in rows {
                    match row {
                        WeightVector::Float(v) => values.extend(v),
                        WeightVector::Fixed(_) => {
                            return Err(ClassifierError::precondition(
                                "mixed representations across classes",
                            ))
                        }
                    }
                }
                Self::from_float(values)
            }
            fixed => {
                let mut values: Vec<i8> = try_with_capacity(len, "fixed-point weight matrix")?;
                for row in rows {
                    match row {
                        WeightVector::Fixed(v) => values.extend(v),
                        WeightVector::Float(_) => {
                            return Err(ClassifierError::precondition(
                                "mixed representations across classes",
                            ))
                        }
                    }
                }
                Self::from_fixed(fixed, values)
            }
        }
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn num_classes(&self) -> usize {
        match &self.values {
            WeightValues::Float(v) => v.len() / FEATURE_COUNT,
            WeightValues::Fixed(v) => v.len() / FEATURE_COUNT,
        }
    }

    /// Borrowed view of the contiguous weight buffer.
    pub fn view(&self) -> WeightView<'_> {
        match &self.values {
            WeightValues::Float(v) => WeightView::Float(v),
            WeightValues::Fixed(v) => WeightView::Fixed(v),
        }
    }

    /// Contiguous float weights, if this is a float matrix.
    pub fn as_float(&self) -> Option<&[f32]> {
        match &self.values {
            WeightValues::Float(v) => Some(v),
            WeightValues::Fixed(_) => None,
        }
    }

    /// Contiguous fixed-point weights, if this is an Int8 or Int4 matrix.
    pub fn as_fixed(&self) -> Option<&[i8]> {
        match &self.values {
            WeightValues::Fixed(v) => Some(v),
            WeightValues::Float(_) => None,
        }
    }

    /// Copy of one class's weights.
    ///
    /// # Panics
    ///
    /// Panics if `class >= self.num_classes()`.
    pub fn row(&self, class: usize) -> WeightVector {
        let range = class * FEATURE_COUNT..(class + 1) * FEATURE_COUNT;
        match &self.values {
            WeightValues::Float(v) => WeightVector::Float(v[range].to_vec()),
            WeightValues::Fixed(v) => WeightVector::Fixed(v[range].to_vec()),
        }
    }
}

fn check_shape(len: usize) -> Result<()> {
    if len == 0 || len % FEATURE_COUNT != 0 {
        return Err(ClassifierError::precondition(format!(
            "{} weights is not a whole number of {}-feature rows",
            len, FEATURE_COUNT
        )));
    }
    Ok(())
}
