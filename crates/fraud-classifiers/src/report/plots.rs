use ndarray::Array1;
use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Histogram, Plot, Scatter};

use crate::stats::RocCurve;

/// Plot a ROC curve against the chance diagonal.
pub fn plot_roc_curve(curve: &RocCurve, label: &str, title: &str) -> Result<Plot, String> {
    if curve.fpr.len() != curve.tpr.len() {
        return Err(format!(
            "fpr and tpr must have the same length, got {} and {}",
            curve.fpr.len(),
            curve.tpr.len()
        ));
    }

    let roc_trace = Scatter::new(curve.fpr.clone(), curve.tpr.clone())
        .mode(Mode::Lines)
        .name(&format!("{} (AUC = {:.4})", label, curve.auc()));

    let chance_trace = Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Chance")
        .line(Line::new().color("gray").dash(DashType::Dash));

    let mut plot = Plot::new();
    plot.add_trace(roc_trace);
    plot.add_trace(chance_trace);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("False Positive Rate"))
            .y_axis(Axis::new().title("True Positive Rate")),
    );

    Ok(plot)
}

/// Plot the predicted fraud probability separately for legitimate and
/// fraudulent transactions.
pub fn plot_probability_histogram(
    proba: &Array1<f64>,
    labels: &Array1<i32>,
    title: &str,
) -> Result<Plot, String> {
    if proba.len() != labels.len() {
        return Err(format!(
            "Probabilities and labels must have the same length, got {} and {}",
            proba.len(),
            labels.len()
        ));
    }
    if let Some(bad) = labels.iter().find(|&&l| l != 0 && l != 1) {
        return Err(format!("Labels must be 0 or 1, found {}", bad));
    }

    let mut legit = Vec::new();
    let mut fraud = Vec::new();
    for (&p, &label) in proba.iter().zip(labels.iter()) {
        if label == 1 {
            fraud.push(p);
        } else {
            legit.push(p);
        }
    }

    let mut plot = Plot::new();
    plot.add_trace(Histogram::new(legit).name("Legitimate"));
    plot.add_trace(Histogram::new(fraud).name("Fraud"));
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Predicted fraud probability"))
            .y_axis(Axis::new().title("Count")),
    );

    Ok(plot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::roc_curve;
    use ndarray::array;

    #[test]
    fn roc_plot_has_curve_and_diagonal() {
        let curve = roc_curve(&array![0, 0, 1, 1], &array![0.1, 0.4, 0.35, 0.8]).unwrap();
        let plot = plot_roc_curve(&curve, "Logistic Regression", "ROC").unwrap();
        let html = plot.to_html();
        assert!(html.contains("AUC = 0.7500"));
        assert!(html.contains("Chance"));
    }

    #[test]
    fn histogram_rejects_mismatched_input() {
        assert!(plot_probability_histogram(&array![0.1], &array![0, 1], "t").is_err());
        assert!(plot_probability_histogram(&array![0.1], &array![3], "t").is_err());
        assert!(plot_probability_histogram(&array![0.1, 0.9], &array![0, 1], "t").is_ok());
    }
}
