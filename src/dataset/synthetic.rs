//! Seeded toy datasets.

use std::f32::consts::PI;

use crate::dataset::InMemoryDataset;
use crate::error::{NnError, Result};
use crate::nn::Tensor;
use crate::utils::SimpleRng;

const MARGIN: f32 = 0.1;

/// Points in `[-1, 1]^dims` labelled `±1` by a random hyperplane through the
/// origin. Points closer than a small margin to the plane are resampled, so
/// the set is strictly separable.
pub fn linearly_separable(
    samples: usize,
    dims: usize,
    rng: &mut SimpleRng,
) -> Result<InMemoryDataset> {
    if dims == 0 {
        return Err(NnError::Dataset("points need at least one dimension".into()));
    }
    let normal: Vec<f32> = (0..dims).map(|_| rng.gen_range_f32(-1.0, 1.0)).collect();
    let norm = normal.iter().map(|w| w * w).sum::<f32>().sqrt().max(f32::EPSILON);

    let mut x = Vec::with_capacity(samples * dims);
    let mut y = Vec::with_capacity(samples);
    while y.len() < samples {
        let point: Vec<f32> = (0..dims).map(|_| rng.gen_range_f32(-1.0, 1.0)).collect();
        let side = point.iter().zip(&normal).map(|(p, w)| p * w).sum::<f32>() / norm;
        if side.abs() < MARGIN {
            continue;
        }
        x.extend(point);
        y.push(if side > 0.0 { 1.0 } else { -1.0 });
    }

    InMemoryDataset::new(Tensor::new(samples, dims, x)?, Tensor::new(samples, 1, y)?)
}

/// `samples` evenly spaced points on `[-2π, 2π]` with `y = sin(x)`, in
/// shuffled order.
pub fn sine_wave(samples: usize, rng: &mut SimpleRng) -> Result<InMemoryDataset> {
    let step = if samples > 1 {
        4.0 * PI / (samples - 1) as f32
    } else {
        0.0
    };
    let xs: Vec<f32> = (0..samples).map(|i| -2.0 * PI + step * i as f32).collect();
    let ys: Vec<f32> = xs.iter().map(|x| x.sin()).collect();

    let mut data = InMemoryDataset::new(Tensor::new(samples, 1, xs)?, Tensor::new(samples, 1, ys)?)?;
    data.shuffle(rng);
    Ok(data)
}
