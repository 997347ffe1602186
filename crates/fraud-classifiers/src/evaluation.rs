use std::fmt;

use anyhow::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_COST_FN, DEFAULT_COST_FP};
use crate::models::ClassifierModel;
use crate::report::ClassificationReport;
use crate::stats::{confusion_matrix, roc_auc_score, ConfusionMatrix};

/// Metrics of a fitted model on held-out data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub classification_report: ClassificationReport,
    pub confusion_matrix: ConfusionMatrix,
    /// Only present for models that estimate probabilities
    pub roc_auc: Option<f64>,
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Classification Report:")?;
        writeln!(f, "{}", self.classification_report)?;
        writeln!(f, "\nConfusion Matrix:")?;
        writeln!(f, "{}", self.confusion_matrix)?;
        if let Some(auc) = self.roc_auc {
            writeln!(f, "\nROC-AUC Score: {:.4}", auc)?;
        }
        Ok(())
    }
}

/// Evaluate a fitted model on `x_test`/`y_test`.
///
/// Predicts labels to build the classification report and confusion
/// matrix. When the model exposes probabilities, the ROC AUC of the
/// positive-class probability is added as well.
pub fn evaluate_model<M: ClassifierModel + ?Sized>(
    model: &M,
    x_test: &Array2<f64>,
    y_test: &Array1<i32>,
) -> Result<EvaluationResult> {
    let y_pred = model.predict(x_test)?;
    let cm = confusion_matrix(y_test, &y_pred)?;

    let roc_auc = match model.as_probabilistic() {
        Some(probabilistic) => {
            let proba = probabilistic.predict_proba(x_test)?;
            Some(roc_auc_score(y_test, &proba)?)
        }
        None => None,
    };

    log::info!(
        "Evaluated {} on {} samples (tn={}, fp={}, fn={}, tp={})",
        model.name(),
        y_test.len(),
        cm.true_negatives,
        cm.false_positives,
        cm.false_negatives,
        cm.true_positives
    );

    Ok(EvaluationResult {
        classification_report: ClassificationReport::from_confusion_matrix(&cm),
        confusion_matrix: cm,
        roc_auc,
    })
}

/// Print the report, the confusion matrix and the ROC AUC (if any) to stdout.
pub fn print_evaluation(results: &EvaluationResult) {
    print!("{}", results);
}

/// Linear misclassification cost: `fp * cost_fp + fn * cost_fn`.
pub fn compute_business_cost(
    y_true: &Array1<i32>,
    y_pred: &Array1<i32>,
    cost_fp: f64,
    cost_fn: f64,
) -> Result<f64> {
    Ok(confusion_matrix(y_true, y_pred)?.business_cost(cost_fp, cost_fn))
}

/// [`compute_business_cost`] with a false positive costing 1 and a missed
/// fraud costing 5.
pub fn compute_default_business_cost(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> Result<f64> {
    compute_business_cost(y_true, y_pred, DEFAULT_COST_FP, DEFAULT_COST_FN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn business_cost_weights_errors() {
        let y_true = array![0, 0, 1, 1];
        let y_pred = array![0, 1, 1, 0];
        assert_eq!(compute_default_business_cost(&y_true, &y_pred).unwrap(), 6.0);
        assert_eq!(compute_business_cost(&y_true, &y_pred, 2.0, 10.0).unwrap(), 12.0);
        assert_eq!(compute_default_business_cost(&y_true, &y_true).unwrap(), 0.0);
    }

    #[test]
    fn display_follows_fixed_order() {
        let cm = ConfusionMatrix {
            true_negatives: 3,
            false_positives: 1,
            false_negatives: 0,
            true_positives: 2,
        };
        let result = EvaluationResult {
            classification_report: ClassificationReport::from_confusion_matrix(&cm),
            confusion_matrix: cm,
            roc_auc: Some(0.91234),
        };
        let text = result.to_string();

        let report_at = text.find("Classification Report:").unwrap();
        let matrix_at = text.find("\nConfusion Matrix:").unwrap();
        let auc_at = text.find("\nROC-AUC Score: 0.9123").unwrap();
        assert!(report_at < matrix_at && matrix_at < auc_at);
        assert!(text.contains("[[3 1]\n [0 2]]"));
    }

    #[test]
    fn display_omits_missing_auc() {
        let cm = ConfusionMatrix::default();
        let result = EvaluationResult {
            classification_report: ClassificationReport::from_confusion_matrix(&cm),
            confusion_matrix: cm,
            roc_auc: None,
        };
        assert!(!result.to_string().contains("ROC-AUC"));
    }
}
