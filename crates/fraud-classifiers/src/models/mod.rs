pub mod classifier_trait;
pub mod decision_tree;
pub mod factory;
pub mod logistic_regression;
pub mod random_forest;
pub(crate) mod utils;

pub use classifier_trait::{ClassifierModel, ProbabilisticModel};
pub use decision_tree::{DecisionTree, TreeNode};
pub use factory::{
    build_model, get_all_models, get_all_models_with_seed, get_decision_tree,
    get_decision_tree_with_seed, get_logistic_regression, get_logistic_regression_with_seed,
    get_random_forest, get_random_forest_with_seed,
};
pub use logistic_regression::LogisticRegression;
pub use random_forest::RandomForest;
