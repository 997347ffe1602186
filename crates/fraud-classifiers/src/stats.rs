use std::fmt;

use anyhow::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::models::utils::check_binary_labels;

/// Binary labels in report order.
pub const LABELS: [i32; 2] = [0, 1];

/// 2x2 confusion matrix over labels `[0, 1]`; rows are true labels and
/// columns predicted labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Counts in row-major order: `[tn, fp, fn, tp]`.
    pub fn ravel(&self) -> [usize; 4] {
        [
            self.true_negatives,
            self.false_positives,
            self.false_negatives,
            self.true_positives,
        ]
    }

    pub fn total(&self) -> usize {
        self.ravel().iter().sum()
    }

    /// Number of true samples for `label`.
    pub fn support(&self, label: i32) -> usize {
        if label == 1 {
            self.false_negatives + self.true_positives
        } else {
            self.true_negatives + self.false_positives
        }
    }

    /// Weighted cost of the errors: `fp * cost_fp + fn * cost_fn`.
    pub fn business_cost(&self, cost_fp: f64, cost_fn: f64) -> f64 {
        self.false_positives as f64 * cost_fp + self.false_negatives as f64 * cost_fn
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let w = self
            .ravel()
            .iter()
            .map(|v| v.to_string().len())
            .max()
            .unwrap_or(1);
        write!(
            f,
            "[[{:>w$} {:>w$}]\n [{:>w$} {:>w$}]]",
            self.true_negatives,
            self.false_positives,
            self.false_negatives,
            self.true_positives,
            w = w
        )
    }
}

fn check_same_length(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(PipelineError::LengthMismatch { expected, actual }.into());
    }
    Ok(())
}

/// Count true/false positives and negatives of `y_pred` against `y_true`.
///
/// Both arrays must have equal length and contain only 0 and 1.
pub fn confusion_matrix(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> Result<ConfusionMatrix> {
    check_same_length(y_true.len(), y_pred.len())?;
    check_binary_labels(y_true)?;
    check_binary_labels(y_pred)?;

    let mut cm = ConfusionMatrix::default();
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        match (t, p) {
            (0, 0) => cm.true_negatives += 1,
            (0, _) => cm.false_positives += 1,
            (_, 0) => cm.false_negatives += 1,
            _ => cm.true_positives += 1,
        }
    }
    Ok(cm)
}

pub fn accuracy_score(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> Result<f64> {
    check_same_length(y_true.len(), y_pred.len())?;
    if y_true.is_empty() {
        return Err(PipelineError::EmptyInput("y_true").into());
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Per-class precision, recall, F1 and support, indexed like [`LABELS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: [f64; 2],
    pub recall: [f64; 2],
    pub f1: [f64; 2],
    pub support: [usize; 2],
}

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Precision, recall, F-score and support for both classes.
///
/// Undefined ratios (no predicted or no true samples of a class) are
/// reported as 0.0.
///
/// # Arguments
///
/// * `y_true` - Ground-truth 0/1 labels.
/// * `y_pred` - Predicted 0/1 labels, same length as `y_true`.
pub fn precision_recall_fscore_support(
    y_true: &Array1<i32>,
    y_pred: &Array1<i32>,
) -> Result<ClassMetrics> {
    let cm = confusion_matrix(y_true, y_pred)?;
    Ok(metrics_from_confusion(&cm))
}

pub(crate) fn metrics_from_confusion(cm: &ConfusionMatrix) -> ClassMetrics {
    // Class 0 treats "negative" as the positive outcome.
    let per_class = [
        (cm.true_negatives, cm.false_negatives, cm.false_positives),
        (cm.true_positives, cm.false_positives, cm.false_negatives),
    ];

    let mut metrics = ClassMetrics {
        precision: [0.0; 2],
        recall: [0.0; 2],
        f1: [0.0; 2],
        support: [0; 2],
    };
    for (k, &(tp, fp, fn_)) in per_class.iter().enumerate() {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        metrics.precision[k] = precision;
        metrics.recall[k] = recall;
        metrics.f1[k] = f1;
        metrics.support[k] = tp + fn_;
    }
    metrics
}

/// Receiver operating characteristic curve.
///
/// Points are ordered by decreasing threshold; the first point is
/// `(0, 0)` at threshold `+inf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Area under the curve by the trapezoidal rule.
    pub fn auc(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
            .sum()
    }
}

/// Compute the ROC curve of `y_score` against 0/1 labels `y_true`.
///
/// Tied scores form a single point, so their order does not matter.
///
/// # Arguments
///
/// * `y_true` - Ground-truth 0/1 labels; both classes must be present.
/// * `y_score` - Score for the positive class, higher meaning more likely fraud.
///
/// # Returns
///
/// False positive rates, true positive rates and the thresholds at which
/// they are reached.
pub fn roc_curve(y_true: &Array1<i32>, y_score: &Array1<f64>) -> Result<RocCurve> {
    check_same_length(y_true.len(), y_score.len())?;
    check_binary_labels(y_true)?;

    let positives = y_true.iter().filter(|&&v| v == 1).count();
    let negatives = y_true.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(PipelineError::SingleClass("ROC AUC score").into());
    }

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_unstable_by(|&a, &b| y_score[b].total_cmp(&y_score[a]));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];

    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_tie = order
            .get(pos + 1)
            .map_or(true, |&next| y_score[next] != y_score[i]);
        if last_of_tie {
            fpr.push(fp as f64 / negatives as f64);
            tpr.push(tp as f64 / positives as f64);
            thresholds.push(y_score[i]);
        }
    }

    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
    })
}

/// Area under the ROC curve, in [0, 1].
///
/// Fails with [`PipelineError::SingleClass`] when `y_true` holds one class.
pub fn roc_auc_score(y_true: &Array1<i32>, y_score: &Array1<f64>) -> Result<f64> {
    Ok(roc_curve(y_true, y_score)?.auc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn confusion_matrix_counts() {
        let cm = confusion_matrix(&array![0, 0, 1, 1, 1], &array![0, 1, 1, 0, 1]).unwrap();
        assert_eq!(cm.ravel(), [1, 1, 1, 2]);
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.support(1), 3);
    }

    #[test]
    fn business_cost_weights_off_diagonal() {
        let cm = confusion_matrix(&array![0, 0, 0, 1, 1], &array![1, 1, 0, 0, 1]).unwrap();
        assert_eq!(cm.business_cost(1.0, 5.0), 7.0);
        assert_eq!(cm.business_cost(0.0, 0.0), 0.0);
    }

    #[test]
    fn confusion_matrix_is_two_by_two_with_one_class() {
        let cm = confusion_matrix(&array![0, 0], &array![0, 0]).unwrap();
        assert_eq!(cm.ravel(), [2, 0, 0, 0]);
    }

    #[test]
    fn confusion_matrix_display_aligns_columns() {
        let cm = ConfusionMatrix {
            true_negatives: 56851,
            false_positives: 13,
            false_negatives: 17,
            true_positives: 81,
        };
        assert_eq!(cm.to_string(), "[[56851    13]\n [   17    81]]");
    }

    #[test]
    fn confusion_matrix_rejects_bad_input() {
        assert!(confusion_matrix(&array![0, 1], &array![0]).is_err());
        assert!(confusion_matrix(&array![0, 2], &array![0, 1]).is_err());
    }

    #[test]
    fn accuracy() {
        let acc = accuracy_score(&array![0, 1, 1, 0], &array![0, 1, 0, 0]).unwrap();
        assert_eq!(acc, 0.75);
    }

    #[test]
    fn precision_recall_per_class() {
        let m = precision_recall_fscore_support(&array![0, 0, 0, 1, 1], &array![0, 0, 1, 1, 0])
            .unwrap();
        assert!((m.precision[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.precision[1] - 0.5).abs() < 1e-12);
        assert!((m.recall[1] - 0.5).abs() < 1e-12);
        assert!((m.f1[1] - 0.5).abs() < 1e-12);
        assert_eq!(m.support, [3, 2]);
    }

    #[test]
    fn undefined_precision_is_zero() {
        let m = precision_recall_fscore_support(&array![0, 1], &array![0, 0]).unwrap();
        assert_eq!(m.precision[1], 0.0);
        assert_eq!(m.f1[1], 0.0);
    }

    #[test]
    fn roc_auc_known_value() {
        let y = array![0, 0, 1, 1];
        let scores = array![0.1, 0.4, 0.35, 0.8];
        let auc = roc_auc_score(&y, &scores).unwrap();
        assert!((auc - 0.75).abs() < 1e-12);

        let curve = roc_curve(&y, &scores).unwrap();
        assert_eq!(curve.fpr.first(), Some(&0.0));
        assert_eq!(curve.tpr.last(), Some(&1.0));
        assert!(curve.thresholds[0].is_infinite());
    }

    #[test]
    fn roc_auc_perfect_and_tied() {
        assert_eq!(
            roc_auc_score(&array![0, 0, 1, 1], &array![0.1, 0.2, 0.8, 0.9]).unwrap(),
            1.0
        );
        // All scores tied: the curve is the diagonal.
        assert_eq!(
            roc_auc_score(&array![0, 1, 0, 1], &array![0.5, 0.5, 0.5, 0.5]).unwrap(),
            0.5
        );
    }

    #[test]
    fn roc_auc_needs_both_classes() {
        let err = roc_auc_score(&array![1, 1], &array![0.2, 0.9]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::SingleClass(_))
        ));
    }
}
