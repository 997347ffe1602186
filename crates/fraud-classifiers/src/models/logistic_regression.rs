use anyhow::{anyhow, Result};
use ndarray::{concatenate, s, Array1, Array2, Axis};

use crate::config::{ModelConfig, ModelType};
use crate::error::PipelineError;
use crate::math::{cholesky_solve, sigmoid, softplus};
use crate::models::classifier_trait::{ClassifierModel, ProbabilisticModel};
use crate::models::utils::{check_fit_inputs, check_predict_inputs, threshold_proba};

const NAME: &str = "LogisticRegression";

/// L2-regularised logistic regression fitted by Newton-Raphson.
///
/// Minimises `C * sum(logloss) + 0.5 * ||w||^2`; the intercept is not
/// penalised. Each Newton step is followed by a backtracking line search on
/// the objective, so the fit is fully deterministic.
pub struct LogisticRegression {
    params: ModelConfig,
    coef: Option<Array1<f64>>,
    intercept: f64,
    n_iter: usize,
}

impl LogisticRegression {
    pub fn new(params: ModelConfig) -> Self {
        LogisticRegression {
            params,
            coef: None,
            intercept: 0.0,
            n_iter: 0,
        }
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    /// Feature weights, once fitted.
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coef.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Newton iterations used by the last fit.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Signed distance to the decision boundary, `x . w + b`.
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_predict_inputs(NAME, self.coef.as_ref().map(|c| c.len()), x)?;
        let coef = self
            .coef
            .as_ref()
            .ok_or_else(|| PipelineError::ModelNotFitted(NAME.to_string()))?;
        Ok(x.dot(coef) + self.intercept)
    }

    fn hyperparameters(&self) -> Result<(usize, f64, f64)> {
        match self.params.model_type {
            ModelType::LogisticRegression { max_iter, c, tol } => {
                if !(c > 0.0) {
                    return Err(PipelineError::InvalidParameter(format!(
                        "C must be positive, got {}",
                        c
                    ))
                    .into());
                }
                Ok((max_iter, c, tol))
            }
            ref other => Err(PipelineError::InvalidParameter(format!(
                "Expected ModelType::LogisticRegression params, got {:?}",
                other
            ))
            .into()),
        }
    }
}

/// Penalised negative log-likelihood for the augmented coefficients.
fn objective(xa: &Array2<f64>, y: &Array1<f64>, beta: &Array1<f64>, c: f64, d: usize) -> f64 {
    let z = xa.dot(beta);
    let data_term: f64 = z
        .iter()
        .zip(y.iter())
        .map(|(&z, &t)| softplus(z) - t * z)
        .sum();
    let w = beta.slice(s![..d]);
    c * data_term + 0.5 * w.dot(&w)
}

impl ClassifierModel for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<()> {
        check_fit_inputs(x, y)?;
        let (max_iter, c, tol) = self.hyperparameters()?;

        let (n, d) = x.dim();
        // Last column carries the intercept.
        let xa = concatenate(Axis(1), &[x.view(), Array2::<f64>::ones((n, 1)).view()])?;
        let yf = y.mapv(|v| v as f64);

        let mut beta = Array1::<f64>::zeros(d + 1);
        let mut f = objective(&xa, &yf, &beta, c, d);
        let mut weighted = Array2::<f64>::zeros((n, d + 1));
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..max_iter {
            let p = xa.dot(&beta).mapv(sigmoid);

            let mut grad = xa.t().dot(&(&p - &yf)) * c;
            for j in 0..d {
                grad[j] += beta[j];
            }
            let grad_max = grad.iter().fold(0.0f64, |m, g| m.max(g.abs()));
            if grad_max <= tol {
                converged = true;
                iterations = iter;
                break;
            }

            weighted.assign(&xa);
            for (mut row, &pi) in weighted.outer_iter_mut().zip(p.iter()) {
                row *= c * pi * (1.0 - pi);
            }
            let mut hessian = xa.t().dot(&weighted);
            for j in 0..d {
                hessian[[j, j]] += 1.0;
            }

            let step = cholesky_solve(&hessian, &grad)
                .ok_or_else(|| anyhow!("Newton step failed: Hessian is not positive definite"))?;
            let slope = grad.dot(&step);

            let mut t = 1.0;
            loop {
                let candidate = &beta - &(&step * t);
                let f_new = objective(&xa, &yf, &candidate, c, d);
                if f_new <= f - 1e-4 * t * slope || t < 1e-10 {
                    beta = candidate;
                    f = f_new;
                    break;
                }
                t *= 0.5;
            }
            iterations = iter + 1;

            let step_max = step.iter().fold(0.0f64, |m, s| m.max(s.abs())) * t;
            if step_max <= f64::EPSILON {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "{} failed to converge after {} iterations; consider scaling the data or raising max_iter",
                NAME,
                max_iter
            );
        }
        log::debug!(
            "{} fitted on {} samples x {} features in {} iterations",
            NAME,
            n,
            d,
            iterations
        );

        self.intercept = beta[d];
        self.coef = Some(beta.slice(s![..d]).to_owned());
        self.n_iter = iterations;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        Ok(threshold_proba(&self.predict_proba(x)?))
    }

    fn is_fitted(&self) -> bool {
        self.coef.is_some()
    }

    fn name(&self) -> &str {
        self.params.model_type.display_name()
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticModel> {
        Some(self)
    }
}

impl ProbabilisticModel for LogisticRegression {
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }
}
