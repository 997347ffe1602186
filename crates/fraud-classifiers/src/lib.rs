//! fraud-classifiers: training and evaluation helpers for imbalanced
//! credit-card fraud detection.
//!
//! The crate covers leakage-safe preparation of a tabular dataset (stratified
//! split, standard scaling fitted on the training rows, SMOTE oversampling of
//! the training rows), three baseline classifiers (logistic regression, a
//! CART decision tree and a random forest) and evaluation helpers
//! (classification report, confusion matrix, ROC AUC and a linear business
//! cost of misclassifications).
//!
//! Models are plain Rust over `ndarray`; random forest trees are grown on
//! `rayon`.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod math;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod sampling;
pub mod stats;

pub use config::{ModelConfig, ModelType, PipelineConfig, DEFAULT_RANDOM_STATE};
pub use data_handling::{split_features_target, train_test_split_stratified, Dataset};
pub use error::PipelineError;
pub use evaluation::{
    compute_business_cost, compute_default_business_cost, evaluate_model, print_evaluation,
    EvaluationResult,
};
pub use io::load_data;
pub use models::{
    build_model, get_all_models, get_all_models_with_seed, get_decision_tree,
    get_logistic_regression, get_random_forest, ClassifierModel, ProbabilisticModel,
};
pub use pipeline::{prepare_data, prepare_dataset, train_and_evaluate, ModelReport, PreparedData};
pub use preprocessing::{scale_features, StandardScaler};
pub use sampling::{apply_smote, Smote};
pub use stats::ConfusionMatrix;
