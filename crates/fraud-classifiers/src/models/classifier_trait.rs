use anyhow::Result;
use ndarray::{Array1, Array2};

/// Contract shared by every binary classifier in the crate.
///
/// Labels follow the dataset convention: 0 for legitimate, 1 for fraud.
/// Models are constructed unfitted; `fit` must succeed before `predict`.
pub trait ClassifierModel: Send {
    /// Fit the model on feature rows `x` and 0/1 labels `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<()>;

    /// Predict 0/1 labels.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>>;

    fn is_fitted(&self) -> bool;

    /// Human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }

    /// Probability capability, if this model can estimate class probabilities.
    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticModel> {
        None
    }
}

/// Classifiers that can also estimate the probability of the positive class.
pub trait ProbabilisticModel: ClassifierModel {
    /// Probability of class 1 for each row of `x`, in [0, 1].
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}
