use std::fmt;

use anyhow::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::stats::{confusion_matrix, metrics_from_confusion, ClassMetrics, ConfusionMatrix, LABELS};

const HEADERS: [&str; 4] = ["precision", "recall", "f1-score", "support"];
const DIGITS: usize = 2;

/// Precision, recall, F1 and support of one report row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class and averaged metrics for a binary classifier.
///
/// `Display` renders the fixed-width text table familiar from
/// scikit-learn, with two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub target_names: [String; 2],
    pub classes: [ReportRow; 2],
    pub accuracy: f64,
    pub macro_avg: ReportRow,
    pub weighted_avg: ReportRow,
}

impl ClassificationReport {
    pub fn from_confusion_matrix(cm: &ConfusionMatrix) -> Self {
        let ClassMetrics {
            precision,
            recall,
            f1,
            support,
        } = metrics_from_confusion(cm);

        let classes = [0, 1].map(|k| ReportRow {
            precision: precision[k],
            recall: recall[k],
            f1_score: f1[k],
            support: support[k],
        });

        let total = support[0] + support[1];
        let mean = |v: [f64; 2]| (v[0] + v[1]) / 2.0;
        let weighted = |v: [f64; 2]| {
            if total == 0 {
                0.0
            } else {
                (v[0] * support[0] as f64 + v[1] * support[1] as f64) / total as f64
            }
        };

        let accuracy = if total == 0 {
            0.0
        } else {
            (cm.true_negatives + cm.true_positives) as f64 / total as f64
        };

        ClassificationReport {
            target_names: LABELS.map(|l| l.to_string()),
            classes,
            accuracy,
            macro_avg: ReportRow {
                precision: mean(precision),
                recall: mean(recall),
                f1_score: mean(f1),
                support: total,
            },
            weighted_avg: ReportRow {
                precision: weighted(precision),
                recall: weighted(recall),
                f1_score: weighted(f1),
                support: total,
            },
        }
    }

    /// Replace the default "0"/"1" row labels.
    pub fn with_target_names(mut self, negative: &str, positive: &str) -> Self {
        self.target_names = [negative.to_string(), positive.to_string()];
        self
    }

    pub fn total_support(&self) -> usize {
        self.macro_avg.support
    }
}

/// Build the classification report of `y_pred` against `y_true`.
pub fn classification_report(
    y_true: &Array1<i32>,
    y_pred: &Array1<i32>,
) -> Result<ClassificationReport> {
    let cm = confusion_matrix(y_true, y_pred)?;
    Ok(ClassificationReport::from_confusion_matrix(&cm))
}

fn write_row(f: &mut fmt::Formatter, name: &str, row: &ReportRow, width: usize) -> fmt::Result {
    writeln!(
        f,
        "{:>width$}  {:>9.digits$} {:>9.digits$} {:>9.digits$} {:>9}",
        name,
        row.precision,
        row.recall,
        row.f1_score,
        row.support,
        width = width,
        digits = DIGITS
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let last_heading = "weighted avg";
        let width = self
            .target_names
            .iter()
            .map(|n| n.len())
            .chain([last_heading.len(), DIGITS])
            .max()
            .unwrap_or(last_heading.len());

        write!(f, "{:>width$} ", "", width = width)?;
        for h in HEADERS {
            write!(f, " {:>9}", h)?;
        }
        write!(f, "\n\n")?;

        for (name, row) in self.target_names.iter().zip(self.classes.iter()) {
            write_row(f, name, row, width)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.digits$} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support(),
            width = width,
            digits = DIGITS
        )?;
        write_row(f, "macro avg", &self.macro_avg, width)?;
        write_row(f, last_heading, &self.weighted_avg, width)
    }
}
