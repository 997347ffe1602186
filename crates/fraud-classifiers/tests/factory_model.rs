//! Integration tests for the model factory and the classifier contract.

use fraud_classifiers::config::{ModelConfig, ModelType};
use fraud_classifiers::models::{
    build_model, get_all_models, get_all_models_with_seed, get_decision_tree,
    get_logistic_regression, get_random_forest, ClassifierModel,
};
use ndarray::{array, Array1, Array2};

fn tiny_dataset() -> (Array2<f64>, Array1<i32>) {
    let x = Array2::from_shape_vec(
        (6, 2),
        vec![
            1.0, 0.0, // fraud
            0.0, 1.0, // legit
            1.0, 0.1, // fraud
            0.0, 0.9, // legit
            1.1, 0.0, // fraud
            0.0, 1.2, // legit
        ],
    )
    .expect("failed to create feature matrix");
    let y = array![1, 0, 1, 0, 1, 0];
    (x, y)
}

// ---------------------------------------------------------------------------
// Factory functions
// ---------------------------------------------------------------------------

#[test]
fn all_models_have_fixed_keys_in_order() {
    let models = get_all_models();
    let names: Vec<&str> = models.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec!["Logistic Regression", "Decision Tree", "Random Forest"]
    );
    for (name, model) in &models {
        assert!(!model.is_fitted(), "{} should start unfitted", name);
        assert_eq!(model.name(), *name);
    }
}

#[test]
fn all_models_are_fresh_on_every_call() {
    let (x, y) = tiny_dataset();
    let mut first = get_all_models();
    for (_, model) in first.iter_mut() {
        model.fit(&x, &y).expect("fit failed");
    }

    let second = get_all_models();
    assert!(first.iter().all(|(_, m)| m.is_fitted()));
    assert!(second.iter().all(|(_, m)| !m.is_fitted()));
}

#[test]
fn default_hyperparameters() {
    let lr = get_logistic_regression();
    assert_eq!(lr.params().random_state, 42);
    assert!(matches!(
        lr.params().model_type,
        ModelType::LogisticRegression { max_iter: 1000, .. }
    ));

    let dt = get_decision_tree();
    assert_eq!(dt.params().random_state, 42);
    assert!(matches!(
        dt.params().model_type,
        ModelType::DecisionTree { max_depth: None, .. }
    ));

    let rf = get_random_forest();
    assert_eq!(rf.params().random_state, 42);
    assert!(matches!(
        rf.params().model_type,
        ModelType::RandomForest {
            n_estimators: 100,
            n_jobs: -1,
            ..
        }
    ));
}

#[test]
fn seeded_models_carry_the_seed() {
    let models = get_all_models_with_seed(7);
    assert_eq!(models.len(), 3);
    let rf = fraud_classifiers::models::get_random_forest_with_seed(7);
    assert_eq!(rf.params().random_state, 7);
}

// ---------------------------------------------------------------------------
// Classifier contract
// ---------------------------------------------------------------------------

#[test]
fn factory_builds_and_predicts() {
    let (x, y) = tiny_dataset();

    for model_type in [
        ModelType::logistic_regression(),
        ModelType::decision_tree(),
        ModelType::RandomForest {
            n_estimators: 10,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_jobs: 2,
        },
    ] {
        let mut model = build_model(&ModelConfig::new(42, model_type));
        model.fit(&x, &y).expect("fit failed");

        let preds = model.predict(&x).expect("predict failed");
        assert_eq!(preds.len(), x.nrows());

        let proba = model
            .as_probabilistic()
            .expect("all standard models estimate probabilities")
            .predict_proba(&x)
            .expect("predict_proba failed");
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

#[test]
fn unfitted_models_refuse_to_predict() {
    let (x, _) = tiny_dataset();
    for (name, model) in get_all_models() {
        assert!(model.predict(&x).is_err(), "{} predicted before fit", name);
    }
}

#[test]
fn non_binary_labels_are_rejected() {
    let (x, _) = tiny_dataset();
    let y = array![1, -1, 1, -1, 1, -1];
    let mut model = get_decision_tree();
    assert!(model.fit(&x, &y).is_err());
}
