use crate::config::{ModelConfig, ModelType, DEFAULT_RANDOM_STATE};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::DecisionTree;
use crate::models::logistic_regression::LogisticRegression;
use crate::models::random_forest::RandomForest;

/// Build a boxed, unfitted classifier from a `ModelConfig`.
pub fn build_model(params: &ModelConfig) -> Box<dyn ClassifierModel> {
    match params.model_type {
        ModelType::LogisticRegression { .. } => Box::new(LogisticRegression::new(params.clone())),
        ModelType::DecisionTree { .. } => Box::new(DecisionTree::new(params.clone())),
        ModelType::RandomForest { .. } => Box::new(RandomForest::new(params.clone())),
    }
}

/// Logistic regression with `max_iter = 1000` and the default seed.
pub fn get_logistic_regression() -> LogisticRegression {
    get_logistic_regression_with_seed(DEFAULT_RANDOM_STATE)
}

pub fn get_logistic_regression_with_seed(random_state: u64) -> LogisticRegression {
    LogisticRegression::new(ModelConfig::new(
        random_state,
        ModelType::logistic_regression(),
    ))
}

/// Unbounded gini decision tree with the default seed.
pub fn get_decision_tree() -> DecisionTree {
    get_decision_tree_with_seed(DEFAULT_RANDOM_STATE)
}

pub fn get_decision_tree_with_seed(random_state: u64) -> DecisionTree {
    DecisionTree::new(ModelConfig::new(random_state, ModelType::decision_tree()))
}

/// 100-tree random forest using every core, with the default seed.
pub fn get_random_forest() -> RandomForest {
    get_random_forest_with_seed(DEFAULT_RANDOM_STATE)
}

pub fn get_random_forest_with_seed(random_state: u64) -> RandomForest {
    RandomForest::new(ModelConfig::new(random_state, ModelType::random_forest()))
}

/// The three standard models keyed by display name, in a fixed order.
/// Every call returns fresh unfitted instances.
pub fn get_all_models() -> Vec<(&'static str, Box<dyn ClassifierModel>)> {
    get_all_models_with_seed(DEFAULT_RANDOM_STATE)
}

pub fn get_all_models_with_seed(random_state: u64) -> Vec<(&'static str, Box<dyn ClassifierModel>)> {
    [
        ModelType::logistic_regression(),
        ModelType::decision_tree(),
        ModelType::random_forest(),
    ]
    .into_iter()
    .map(|model_type| {
        let name = model_type.display_name();
        (name, build_model(&ModelConfig::new(random_state, model_type)))
    })
    .collect()
}
