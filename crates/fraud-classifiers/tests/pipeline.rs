//! End-to-end tests: CSV on disk through preparation, training and scoring.

use std::io::Write;

use fraud_classifiers::config::PipelineConfig;
use fraud_classifiers::data_handling::class_counts;
use fraud_classifiers::models::{get_all_models, get_decision_tree, ClassifierModel};
use fraud_classifiers::pipeline::{prepare_data, train_and_evaluate};
use fraud_classifiers::PipelineError;

/// Write a small credit-card style CSV: 200 legitimate rows and 20 fraud rows.
fn write_transactions_csv() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    writeln!(file, "Time,V1,V2,Amount,Class").unwrap();
    for i in 0..220 {
        let fraud = i % 11 == 0;
        let (v1, v2, amount) = if fraud {
            (-3.0 - (i % 5) as f64 * 0.3, 2.5 + (i % 3) as f64 * 0.2, 1.0 + (i % 4) as f64)
        } else {
            (
                0.5 + (i % 9) as f64 * 0.1,
                -0.5 + (i % 7) as f64 * 0.1,
                20.0 + (i % 50) as f64,
            )
        };
        writeln!(
            file,
            "{},{},{},{},{}",
            i,
            v1,
            v2,
            amount,
            if fraud { 1 } else { 0 }
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

#[test]
fn prepare_data_from_csv() {
    let file = write_transactions_csv();
    let prepared = prepare_data(file.path(), &PipelineConfig::default()).unwrap();

    assert_eq!(prepared.feature_names, vec!["Time", "V1", "V2", "Amount"]);
    assert_eq!(prepared.x_test.nrows(), 44);
    assert_eq!(prepared.y_test.len(), 44);
    assert_eq!(class_counts(&prepared.y_test)[&1], 4);

    // 176 training rows, 160 legitimate: SMOTE lifts fraud to 160.
    let counts = class_counts(&prepared.y_train);
    assert_eq!(counts[&0], 160);
    assert_eq!(counts[&1], 160);
    assert_eq!(prepared.x_train.nrows(), 320);
    assert_eq!(prepared.scaler.n_samples_seen, 176);
}

#[test]
fn prepare_data_is_reproducible() {
    let file = write_transactions_csv();
    let config = PipelineConfig::default();
    let a = prepare_data(file.path(), &config).unwrap();
    let b = prepare_data(file.path(), &config).unwrap();
    assert_eq!(a.x_train, b.x_train);
    assert_eq!(a.x_test, b.x_test);
    assert_eq!(a.y_train, b.y_train);
}

#[test]
fn wrong_target_column_is_reported() {
    let file = write_transactions_csv();
    let config = PipelineConfig {
        target_column: "is_fraud".to_string(),
        ..PipelineConfig::default()
    };
    let err = prepare_data(file.path(), &config).unwrap_err();
    assert_eq!(
        err.downcast_ref::<PipelineError>(),
        Some(&PipelineError::MissingColumn("is_fraud".to_string()))
    );
}

#[test]
fn missing_file_is_reported() {
    assert!(prepare_data("/nonexistent/creditcard.csv", &PipelineConfig::default()).is_err());
}

// ---------------------------------------------------------------------------
// Training and evaluation
// ---------------------------------------------------------------------------

#[test]
fn all_models_train_and_score() {
    let file = write_transactions_csv();
    let config = PipelineConfig::default();
    let prepared = prepare_data(file.path(), &config).unwrap();

    let mut models = get_all_models();
    let reports = train_and_evaluate(&mut models, &prepared, &config).unwrap();
    assert!(models.iter().all(|(_, m)| m.is_fitted()));
    let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Logistic Regression", "Decision Tree", "Random Forest"]
    );

    for report in &reports {
        let auc = report.evaluation.roc_auc.expect("all models expose probabilities");
        assert!((0.0..=1.0).contains(&auc));
        assert!(report.business_cost >= 0.0);
        assert_eq!(report.evaluation.confusion_matrix.total(), 44);
    }
}

#[test]
fn business_cost_matches_confusion_matrix() {
    let file = write_transactions_csv();
    let config = PipelineConfig {
        cost_fp: 2.0,
        cost_fn: 50.0,
        ..PipelineConfig::default()
    };
    let prepared = prepare_data(file.path(), &config).unwrap();

    let mut models: Vec<(&'static str, Box<dyn ClassifierModel>)> =
        vec![("Decision Tree", Box::new(get_decision_tree()))];
    let reports = train_and_evaluate(&mut models, &prepared, &config).unwrap();

    let cm = reports[0].evaluation.confusion_matrix;
    let expected = cm.false_positives as f64 * 2.0 + cm.false_negatives as f64 * 50.0;
    assert_eq!(reports[0].business_cost, expected);
}
