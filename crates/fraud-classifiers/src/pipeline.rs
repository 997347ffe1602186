//! End-to-end orchestration: load, split, scale, rebalance, fit and score.
//!
//! Only the training partition is scaled-to-fit and oversampled; the test
//! partition is transformed with the training statistics and never resampled.
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::data_handling::{class_counts, split_features_target, train_test_split_stratified, Dataset};
use crate::evaluation::{evaluate_model, EvaluationResult};
use crate::io::load_data;
use crate::models::ClassifierModel;
use crate::preprocessing::{scale_features, StandardScaler};
use crate::sampling::Smote;

/// Model-ready train/test matrices.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Scaled and SMOTE-balanced training features
    pub x_train: Array2<f64>,
    pub y_train: Array1<i32>,
    /// Scaled test features, never resampled
    pub x_test: Array2<f64>,
    pub y_test: Array1<i32>,
    /// Scaler fitted on the training partition only
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
}

/// Load `path` and prepare it with [`prepare_dataset`].
pub fn prepare_data<P: AsRef<Path>>(path: P, config: &PipelineConfig) -> Result<PreparedData> {
    let dataset = load_data(path.as_ref())
        .with_context(|| format!("Failed to load dataset from {}", path.as_ref().display()))?;
    prepare_dataset(&dataset, config)
}

/// Split features from the label, stratify, scale and balance the training set.
pub fn prepare_dataset(dataset: &Dataset, config: &PipelineConfig) -> Result<PreparedData> {
    let (features, y) = split_features_target(dataset, &config.target_column)?;
    log::info!(
        "Features: {} rows x {} columns, class counts {:?}",
        features.nrows(),
        features.ncols(),
        class_counts(&y)
    );

    let (x_train, x_test, y_train, y_test) =
        train_test_split_stratified(&features, &y, config.test_size, config.random_state)?;

    let (x_train_scaled, x_test_scaled, scaler) =
        scale_features(&x_train.records, &x_test.records)?;

    let (x_train_balanced, y_train_balanced) = Smote::new()
        .with_k_neighbors(config.k_neighbors)
        .with_seed(config.random_state)
        .fit_resample(&x_train_scaled, &y_train)?;
    log::info!(
        "SMOTE: {} -> {} training rows, class counts {:?}",
        y_train.len(),
        y_train_balanced.len(),
        class_counts(&y_train_balanced)
    );

    Ok(PreparedData {
        x_train: x_train_balanced,
        y_train: y_train_balanced,
        x_test: x_test_scaled,
        y_test,
        scaler,
        feature_names: features.columns,
    })
}

/// Evaluation of one named model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    pub name: String,
    pub evaluation: EvaluationResult,
    pub business_cost: f64,
}

/// Fit each model on the prepared training data, then evaluate it and
/// price its errors on the test data. The models stay fitted afterwards.
pub fn train_and_evaluate(
    models: &mut [(&'static str, Box<dyn ClassifierModel>)],
    data: &PreparedData,
    config: &PipelineConfig,
) -> Result<Vec<ModelReport>> {
    let mut reports = Vec::with_capacity(models.len());
    for (name, model) in models.iter_mut() {
        let name = *name;
        log::info!("Training {}", name);
        model
            .fit(&data.x_train, &data.y_train)
            .with_context(|| format!("Failed to fit {}", name))?;

        let evaluation = evaluate_model(&**model, &data.x_test, &data.y_test)?;
        let business_cost = evaluation
            .confusion_matrix
            .business_cost(config.cost_fp, config.cost_fn);
        log::info!("{}: business cost {:.1}", name, business_cost);

        reports.push(ModelReport {
            name: name.to_string(),
            evaluation,
            business_cost,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::get_logistic_regression;

    fn synthetic_dataset() -> Dataset {
        // 40 legitimate rows near the origin, 10 fraud rows shifted by 4.
        let mut records = Vec::new();
        for i in 0..50 {
            let fraud = i >= 40;
            let shift = if fraud { 4.0 } else { 0.0 };
            let jitter = (i % 7) as f64 * 0.1;
            records.extend_from_slice(&[shift + jitter, shift - jitter, i as f64, if fraud { 1.0 } else { 0.0 }]);
        }
        Dataset::new(
            vec!["V1".into(), "V2".into(), "Amount".into(), "Class".into()],
            Array2::from_shape_vec((50, 4), records).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn prepare_balances_train_only() {
        let prepared = prepare_dataset(&synthetic_dataset(), &PipelineConfig::default()).unwrap();

        assert_eq!(prepared.feature_names, vec!["V1", "V2", "Amount"]);
        assert_eq!(prepared.x_test.nrows(), 10);
        assert_eq!(prepared.y_test.iter().filter(|&&v| v == 1).count(), 2);

        let counts = class_counts(&prepared.y_train);
        assert_eq!(counts[&0], 32);
        assert_eq!(counts[&1], 32);
        assert_eq!(prepared.x_train.nrows(), 64);
    }

    #[test]
    fn train_and_evaluate_reports_each_model() {
        let config = PipelineConfig::default();
        let prepared = prepare_dataset(&synthetic_dataset(), &config).unwrap();
        let mut models: Vec<(&'static str, Box<dyn ClassifierModel>)> =
            vec![("Logistic Regression", Box::new(get_logistic_regression()))];

        let reports = train_and_evaluate(&mut models, &prepared, &config).unwrap();
        assert!(models[0].1.is_fitted());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].name, "Logistic Regression");
        assert_eq!(reports[0].business_cost, 0.0);
        assert_eq!(reports[0].evaluation.roc_auc, Some(1.0));
    }
}
