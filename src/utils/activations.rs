//! Row-wise activation kernels used by the graph operations
//!
//! All kernels work on flat row-major `f32` buffers:
//! - ReLU forward and its gradient mask
//! - Softmax and log-softmax applied row by row

/// ReLU activation function applied in-place.
///
/// Sets all negative values to 0.0, keeps positive values unchanged.
pub fn relu_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
}

/// Zeroes the entries of `grad` whose pre-activation input was not positive.
pub fn relu_backward_inplace(inputs: &[f32], grad: &mut [f32]) {
    assert_eq!(inputs.len(), grad.len(), "relu gradient length mismatch");

    for (g, &x) in grad.iter_mut().zip(inputs) {
        if x <= 0.0 {
            *g = 0.0;
        }
    }
}

/// Softmax activation function applied row-wise.
///
/// Converts logits to probabilities for each row. Uses the max-subtraction
/// trick for numerical stability to avoid overflow with large values.
///
/// # Arguments
/// * `outputs` - Flat array containing row-major matrix data
/// * `rows` - Number of rows in the matrix
/// * `cols` - Number of columns in the matrix
pub fn softmax_rows(outputs: &mut [f32], rows: usize, cols: usize) {
    if cols == 0 {
        return;
    }
    assert_eq!(outputs.len(), rows * cols, "outputs length mismatch in softmax_rows");

    for row in outputs.chunks_exact_mut(cols).take(rows) {
        let max_value = row_max(row);

        let mut sum = 0.0f32;
        for value in row.iter_mut() {
            *value = (*value - max_value).exp();
            sum += *value;
        }

        let inv_sum = 1.0f32 / sum;
        for value in row.iter_mut() {
            *value *= inv_sum;
        }
    }
}

/// Log-softmax applied row-wise: `x - logsumexp(x)` for every row.
pub fn log_softmax_rows(outputs: &mut [f32], rows: usize, cols: usize) {
    if cols == 0 {
        return;
    }
    assert_eq!(outputs.len(), rows * cols, "outputs length mismatch in log_softmax_rows");

    for row in outputs.chunks_exact_mut(cols).take(rows) {
        let max_value = row_max(row);
        let sum: f32 = row.iter().map(|&value| (value - max_value).exp()).sum();
        let log_sum = max_value + sum.ln();

        for value in row.iter_mut() {
            *value -= log_sum;
        }
    }
}

fn row_max(row: &[f32]) -> f32 {
    row.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON_F32: f32 = 1e-6;

    #[test]
    fn test_relu_mixed() {
        let mut data = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        relu_inplace(&mut data);
        assert_eq!(data, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_relu_backward_masks_non_positive_inputs() {
        let inputs = [-1.0, 0.0, 3.0];
        let mut grad = [5.0, 5.0, 5.0];
        relu_backward_inplace(&inputs, &mut grad);
        assert_eq!(grad, [0.0, 0.0, 5.0]);
    }

    #[test]
    fn test_softmax_uniform_input() {
        let mut data = vec![1.0, 1.0, 1.0];
        softmax_rows(&mut data, 1, 3);
        for &val in &data {
            assert!((val - 1.0 / 3.0).abs() < EPSILON_F32);
        }
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let mut data = vec![1000.0, 1001.0, 1002.0];
        softmax_rows(&mut data, 1, 3);
        let sum: f32 = data.iter().sum();
        assert!((sum - 1.0).abs() < EPSILON_F32);
        assert!(!data.iter().any(|&x| x.is_nan() || x.is_infinite()));
    }

    #[test]
    fn test_log_softmax_matches_softmax() {
        let mut probs = vec![0.5, -1.0, 2.0, 3.0, 3.0, 3.0];
        let mut logs = probs.clone();
        softmax_rows(&mut probs, 2, 3);
        log_softmax_rows(&mut logs, 2, 3);

        for (p, l) in probs.iter().zip(&logs) {
            assert!((p.ln() - l).abs() < 1e-5);
        }
    }
}
