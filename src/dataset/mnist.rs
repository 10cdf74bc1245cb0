//! MNIST IDX reader.
//!
//! Images are normalized to `[0, 1]` and flattened to 784 columns; labels are
//! one-hot over the ten digits. The last `validation_size` examples become
//! the validation split.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::dataset::InMemoryDataset;
use crate::error::{NnError, Result};
use crate::nn::Tensor;

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;
const NUM_DIGITS: usize = 10;

/// Loads at most `limit` examples from a pair of IDX files.
pub fn load_mnist(
    images_path: impl AsRef<Path>,
    labels_path: impl AsRef<Path>,
    limit: usize,
    validation_size: usize,
) -> Result<InMemoryDataset> {
    let (images, pixels) = read_mnist_images(images_path.as_ref(), limit)?;
    let labels = read_mnist_labels(labels_path.as_ref(), limit)?;

    let count = labels.len();
    if images.len() != count * pixels {
        return Err(NnError::Dataset(format!(
            "{} images but {count} labels",
            images.len() / pixels.max(1)
        )));
    }

    let indices: Vec<usize> = labels.iter().map(|&l| l as usize).collect();
    let x = Tensor::new(count, pixels, images)?;
    let y = Tensor::one_hot(&indices, NUM_DIGITS)?;
    info!(count, pixels, validation_size, "loaded MNIST");

    InMemoryDataset::new(x, y)?.split_validation(validation_size)
}

fn read_be_u32(data: &[u8], offset: &mut usize) -> Result<u32> {
    let bytes = data
        .get(*offset..*offset + 4)
        .ok_or_else(|| NnError::Dataset("IDX header is truncated".into()))?;
    *offset += 4;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn check_magic(found: u32, expected: u32, path: &Path) -> Result<()> {
    if found != expected {
        return Err(NnError::Dataset(format!(
            "{}: bad magic number {found}, expected {expected}",
            path.display()
        )));
    }
    Ok(())
}

// Flattened images scaled to [0, 1], plus the pixel count of one image.
fn read_mnist_images(path: &Path, limit: usize) -> Result<(Vec<f32>, usize)> {
    let data = fs::read(path)?;

    let mut offset = 0usize;
    check_magic(read_be_u32(&data, &mut offset)?, IMAGE_MAGIC, path)?;
    let total_images = read_be_u32(&data, &mut offset)? as usize;
    let rows = read_be_u32(&data, &mut offset)? as usize;
    let cols = read_be_u32(&data, &mut offset)? as usize;
    let image_size = rows * cols;
    let total_bytes = limit.min(total_images) * image_size;

    let src = data
        .get(offset..offset + total_bytes)
        .ok_or_else(|| NnError::Dataset(format!("{}: image file is truncated", path.display())))?;
    Ok((src.iter().map(|&p| p as f32 / 255.0).collect(), image_size))
}

fn read_mnist_labels(path: &Path, limit: usize) -> Result<Vec<u8>> {
    let data = fs::read(path)?;

    let mut offset = 0usize;
    check_magic(read_be_u32(&data, &mut offset)?, LABEL_MAGIC, path)?;
    let total_labels = read_be_u32(&data, &mut offset)? as usize;
    let count = limit.min(total_labels);

    let labels = data
        .get(offset..offset + count)
        .ok_or_else(|| NnError::Dataset(format!("{}: label file is truncated", path.display())))?;
    if let Some(bad) = labels.iter().find(|&&l| l as usize >= NUM_DIGITS) {
        return Err(NnError::Dataset(format!("label {bad} is not a digit")));
    }
    Ok(labels.to_vec())
}
