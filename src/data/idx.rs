//! IDX dataset loader
//!
//! Parses the MNIST image (`idx3-ubyte`) and label (`idx1-ubyte`) files.
//!
//! ```text
//! images: magic 0x00000803 | count | rows | cols | count * rows * cols pixel bytes
//! labels: magic 0x00000801 | count | count label bytes
//! ```
//!
//! All header fields are big-endian `u32`.

use crate::error::{try_alloc, ClassifierError, Result};
use crate::format::{
    read_be_u32, FEATURE_COUNT, IMAGE_COLS, IMAGE_HEADER_LEN, IMAGE_MAGIC, IMAGE_ROWS,
    LABEL_HEADER_LEN, LABEL_MAGIC, NUM_DIGITS,
};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Contiguous row-major image buffer: `pixels[item * FEATURE_COUNT + feature]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pixels: Vec<u8>,
}

impl Dataset {
    /// Wraps a flat pixel buffer; its length must be a multiple of `FEATURE_COUNT`.
    pub fn from_pixels(pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() % FEATURE_COUNT != 0 {
            return Err(ClassifierError::precondition(format!(
                "pixel buffer of {} bytes is not a whole number of {}-pixel images",
                pixels.len(),
                FEATURE_COUNT
            )));
        }
        Ok(Self { pixels })
    }

    pub fn len(&self) -> usize {
        self.pixels.len() / FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Feature vector of item `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn item(&self, index: usize) -> &[u8] {
        let start = index * FEATURE_COUNT;
        &self.pixels[start..start + FEATURE_COUNT]
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, u8> {
        self.pixels.chunks_exact(FEATURE_COUNT)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Keeps only the first `n_items` images.
    pub fn truncate(&mut self, n_items: usize) {
        self.pixels.truncate(n_items * FEATURE_COUNT);
    }
}

/// Ground-truth class per item, each in `[0, NUM_DIGITS)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<u8>,
}

impl LabelSet {
    pub fn from_labels(labels: Vec<u8>) -> Result<Self> {
        if let Some(position) = labels.iter().position(|&l| l as usize >= NUM_DIGITS) {
            return Err(ClassifierError::precondition(format!(
                "label {} at index {} is not a digit",
                labels[position], position
            )));
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.labels
    }

    pub fn truncate(&mut self, n_items: usize) {
        self.labels.truncate(n_items);
    }
}

/// Reads and decodes an IDX image file.
pub fn parse_images(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| ClassifierError::io(path, e))?;
    let dataset = decode_images(&data, path)?;
    debug!(path = %path.display(), items = dataset.len(), "parsed images");
    Ok(dataset)
}

/// Reads and decodes an IDX label file.
pub fn parse_labels(path: impl AsRef<Path>) -> Result<LabelSet> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| ClassifierError::io(path, e))?;
    let labels = decode_labels(&data, path)?;
    debug!(path = %path.display(), items = labels.len(), "parsed labels");
    Ok(labels)
}

/// Loads an image file and its label file, rejecting mismatched item counts.
pub fn load_dataset(
    images: impl AsRef<Path>,
    labels: impl AsRef<Path>,
) -> Result<(Dataset, LabelSet)> {
    let dataset = parse_images(images)?;
    let label_set = parse_labels(labels)?;
    if dataset.len() != label_set.len() {
        return Err(ClassifierError::CountMismatch {
            images: dataset.len(),
            labels: label_set.len(),
        });
    }
    Ok((dataset, label_set))
}

/// Decodes an in-memory IDX image file. `path` is only used in diagnostics.
pub fn decode_images(data: &[u8], path: &Path) -> Result<Dataset> {
    let mut offset = 0usize;
    // IDX header: magic, count, rows, cols.
    let magic = read_be_u32(data, &mut offset, path)?;
    if magic != IMAGE_MAGIC {
        return Err(ClassifierError::format(
            path,
            format!(
                "bad magic 0x{:08X}, expected 0x{:08X} (unsigned byte images)",
                magic, IMAGE_MAGIC
            ),
        ));
    }
    let n_items = read_be_u32(data, &mut offset, path)? as usize;
    let rows = read_be_u32(data, &mut offset, path)? as usize;
    let cols = read_be_u32(data, &mut offset, path)? as usize;

    if rows != IMAGE_ROWS || cols != IMAGE_COLS {
        return Err(ClassifierError::format(
            path,
            format!(
                "unexpected image shape {}x{}, expected {}x{}",
                rows, cols, IMAGE_ROWS, IMAGE_COLS
            ),
        ));
    }

    let total_bytes = n_items
        .checked_mul(FEATURE_COUNT)
        .ok_or_else(|| ClassifierError::format(path, "declared item count overflows"))?;
    let available = data.len() - IMAGE_HEADER_LEN;
    if available < total_bytes {
        return Err(ClassifierError::format(
            path,
            format!(
                "truncated: header declares {} images ({} bytes) but only {} bytes follow",
                n_items, total_bytes, available
            ),
        ));
    }
    if available > total_bytes {
        warn!(
            path = %path.display(),
            extra = available - total_bytes,
            "ignoring trailing bytes after image data"
        );
    }

    let mut pixels = try_alloc::<u8>(total_bytes, "image buffer")?;
    pixels.copy_from_slice(&data[offset..offset + total_bytes]);
    Ok(Dataset { pixels })
}

/// Decodes an in-memory IDX label file. `path` is only used in diagnostics.
pub fn decode_labels(data: &[u8], path: &Path) -> Result<LabelSet> {
    let mut offset = 0usize;
    let magic = read_be_u32(data, &mut offset, path)?;
    if magic != LABEL_MAGIC {
        return Err(ClassifierError::format(
            path,
            format!(
                "bad magic 0x{:08X}, expected 0x{:08X} (unsigned byte labels)",
                magic, LABEL_MAGIC
            ),
        ));
    }
    let n_items = read_be_u32(data, &mut offset, path)? as usize;
    let available = data.len() - LABEL_HEADER_LEN;
    if available < n_items {
        return Err(ClassifierError::format(
            path,
            format!(
                "truncated: header declares {} labels but only {} bytes follow",
                n_items, available
            ),
        ));
    }
    if available > n_items {
        warn!(
            path = %path.display(),
            extra = available - n_items,
            "ignoring trailing bytes after label data"
        );
    }

    let src = &data[offset..offset + n_items];
    if let Some(position) = src.iter().position(|&l| l as usize >= NUM_DIGITS) {
        return Err(ClassifierError::format(
            path,
            format!("label {} at index {} is not a digit", src[position], position),
        ));
    }

    let mut labels = try_alloc::<u8>(n_items, "label buffer")?;
    labels.copy_from_slice(src);
    Ok(LabelSet { labels })
}

/// Encodes a dataset as an IDX image file.
pub fn encode_images(dataset: &Dataset) -> Vec<u8> {
    let mut out = Vec::with_capacity(IMAGE_HEADER_LEN + dataset.pixels.len());
    out.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
    out.extend_from_slice(&(dataset.len() as u32).to_be_bytes());
    out.extend_from_slice(&(IMAGE_ROWS as u32).to_be_bytes());
    out.extend_from_slice(&(IMAGE_COLS as u32).to_be_bytes());
    out.extend_from_slice(&dataset.pixels);
    out
}

/// Encodes labels as an IDX label file.
pub fn encode_labels(labels: &LabelSet) -> Vec<u8> {
    let mut out = Vec::with_capacity(LABEL_HEADER_LEN + labels.len());
    out.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
    out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    out.extend_from_slice(&labels.labels);
    out
}

pub fn write_images(path: impl AsRef<Path>, dataset: &Dataset) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, encode_images(dataset)).map_err(|e| ClassifierError::io(path, e))
}

pub fn write_labels(path: impl AsRef<Path>, labels: &LabelSet) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, encode_labels(labels)).map_err(|e| ClassifierError::io(path, e))
}
