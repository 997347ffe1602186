//! Feature standardization fitted on training rows only.
//!
//! `StandardScaler` stores per-column mean and population standard deviation
//! computed from the matrix passed to `fit`. `scale_features` fits on the
//! training partition and reuses the same statistics for the test partition,
//! so no test information reaches the transform.

use anyhow::Result;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Standard scaler (per-column mean / std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub var: Array1<f64>,
    /// Divisor applied per column; 1.0 for constant columns.
    pub scale: Array1<f64>,
    pub n_samples_seen: usize,
}

impl StandardScaler {
    /// Columns whose std falls below this are treated as constant.
    const MIN_STD: f64 = 10.0 * f64::EPSILON;

    /// Fit from a matrix where rows are samples and columns are features.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let (nrows, ncols) = x.dim();
        if nrows == 0 || ncols == 0 {
            return Err(PipelineError::EmptyInput("scaler training data").into());
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(PipelineError::EmptyInput("scaler training data"))?;
        let var = x.var_axis(Axis(0), 0.0);
        let scale = var.mapv(|v| {
            let std = v.sqrt();
            if std < Self::MIN_STD {
                1.0
            } else {
                std
            }
        });

        Ok(StandardScaler {
            mean,
            var,
            scale,
            n_samples_seen: nrows,
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize `x` with the fitted statistics, returning a new matrix.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_features(x)?;
        Ok((x - &self.mean) / &self.scale)
    }

    /// Undo `transform`.
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_features(x)?;
        Ok(x * &self.scale + &self.mean)
    }

    /// Fit on `x` and return it transformed.
    pub fn fit_transform(x: &Array2<f64>) -> Result<(Array2<f64>, Self)> {
        let scaler = Self::fit(x)?;
        let transformed = scaler.transform(x)?;
        Ok((transformed, scaler))
    }

    fn check_features(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::FeatureMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            }
            .into());
        }
        Ok(())
    }
}

/// Standardize features using training data statistics.
///
/// # Returns
///
/// `(x_train_scaled, x_test_scaled, scaler)`; the scaler is returned so the
/// same transform can be applied to future inference data.
pub fn scale_features(
    x_train: &Array2<f64>,
    x_test: &Array2<f64>,
) -> Result<(Array2<f64>, Array2<f64>, StandardScaler)> {
    let (x_train_scaled, scaler) = StandardScaler::fit_transform(x_train)?;
    let x_test_scaled = scaler.transform(x_test)?;
    log::debug!(
        "Scaled {} train and {} test rows over {} features",
        x_train_scaled.nrows(),
        x_test_scaled.nrows(),
        scaler.n_features()
    );
    Ok((x_train_scaled, x_test_scaled, scaler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fit_computes_population_statistics() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let sc = StandardScaler::fit(&x).unwrap();
        assert!((sc.mean[0] - 2.5).abs() < 1e-12);
        assert!((sc.mean[1] - 25.0).abs() < 1e-12);
        // ddof = 0: var of 1..4 is 1.25
        assert!((sc.var[0] - 1.25).abs() < 1e-12);
        assert!((sc.scale[0] - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(sc.n_samples_seen, 4);
    }

    #[test]
    fn constant_column_keeps_unit_scale() {
        let x = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let (t, sc) = StandardScaler::fit_transform(&x).unwrap();
        assert_eq!(sc.scale[0], 1.0);
        for r in 0..3 {
            assert_eq!(t[[r, 0]], 0.0);
        }
    }

    #[test]
    fn inverse_transform_restores_input() {
        let x = array![[1.0, -3.0], [4.0, 0.5], [9.0, 2.0]];
        let (t, sc) = StandardScaler::fit_transform(&x).unwrap();
        let back = sc.inverse_transform(&t).unwrap();
        for (a, b) in back.iter().zip(x.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let sc = StandardScaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(sc.transform(&array![[1.0, 2.0, 3.0]]).is_err());
    }

    #[test]
    fn empty_training_data_is_an_error() {
        let x = Array2::<f64>::zeros((0, 3));
        assert!(StandardScaler::fit(&x).is_err());
    }
}
