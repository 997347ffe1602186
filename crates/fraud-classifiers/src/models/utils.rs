//! Input checks shared by the model implementations.
use anyhow::Result;
use ndarray::{Array1, Array2};

use crate::error::PipelineError;

/// Validate `(x, y)` for fitting: matching lengths, at least one row and
/// labels restricted to {0, 1}.
pub(crate) fn check_fit_inputs(x: &Array2<f64>, y: &Array1<i32>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::LengthMismatch {
            expected: x.nrows(),
            actual: y.len(),
        }
        .into());
    }
    if x.nrows() == 0 {
        return Err(PipelineError::EmptyInput("training data").into());
    }
    check_binary_labels(y)
}

pub(crate) fn check_binary_labels(y: &Array1<i32>) -> Result<()> {
    if let Some((row, &value)) = y.iter().enumerate().find(|(_, &v)| v != 0 && v != 1) {
        return Err(PipelineError::NonBinaryLabel {
            row,
            value: value as f64,
        }
        .into());
    }
    Ok(())
}

/// Fail unless the model was fitted with `n_features` columns matching `x`.
pub(crate) fn check_predict_inputs(
    name: &str,
    n_features: Option<usize>,
    x: &Array2<f64>,
) -> Result<usize> {
    let expected = n_features.ok_or_else(|| PipelineError::ModelNotFitted(name.to_string()))?;
    if x.ncols() != expected {
        return Err(PipelineError::FeatureMismatch {
            expected,
            actual: x.ncols(),
        }
        .into());
    }
    Ok(expected)
}

/// Threshold positive-class probabilities at 0.5 (ties go to class 0).
pub(crate) fn threshold_proba(proba: &Array1<f64>) -> Array1<i32> {
    proba.mapv(|p| if p > 0.5 { 1 } else { 0 })
}
