use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Seed shared by the split, SMOTE and every model unless overridden.
pub const DEFAULT_RANDOM_STATE: u64 = 42;
pub const DEFAULT_TARGET_COLUMN: &str = "Class";
pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_K_NEIGHBORS: usize = 5;
pub const DEFAULT_COST_FP: f64 = 1.0;
pub const DEFAULT_COST_FN: f64 = 5.0;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub random_state: u64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    LogisticRegression {
        max_iter: usize,
        c: f64,
        tol: f64,
    },
    DecisionTree {
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
    },
    RandomForest {
        n_estimators: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
        /// `-1` (or any value below 1) builds trees on every available core
        n_jobs: i32,
    },
}

impl ModelType {
    pub fn logistic_regression() -> Self {
        ModelType::LogisticRegression {
            max_iter: 1000,
            c: 1.0,
            tol: 1e-4,
        }
    }

    pub fn decision_tree() -> Self {
        ModelType::DecisionTree {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    pub fn random_forest() -> Self {
        ModelType::RandomForest {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_jobs: -1,
        }
    }

    /// Display name used as the key in model collections.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::LogisticRegression { .. } => "Logistic Regression",
            ModelType::DecisionTree { .. } => "Decision Tree",
            ModelType::RandomForest { .. } => "Random Forest",
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::logistic_regression()
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "logistic_regression" | "lr" => Ok(ModelType::logistic_regression()),
            "decision_tree" | "dt" => Ok(ModelType::decision_tree()),
            "random_forest" | "rf" => Ok(ModelType::random_forest()),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: logistic_regression, decision_tree, random_forest",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(random_state: u64, model_type: ModelType) -> Self {
        Self {
            random_state,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            random_state: DEFAULT_RANDOM_STATE,
            model_type: ModelType::default(),
        }
    }
}

/// Settings threaded through data preparation and evaluation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Name of the binary label column
    pub target_column: String,
    /// Fraction of rows held out for testing
    pub test_size: f64,
    pub random_state: u64,
    /// Neighbours considered by SMOTE interpolation
    pub k_neighbors: usize,
    /// Cost of flagging a legitimate transaction
    pub cost_fp: f64,
    /// Cost of missing a fraudulent transaction
    pub cost_fn: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            test_size: DEFAULT_TEST_SIZE,
            random_state: DEFAULT_RANDOM_STATE,
            k_neighbors: DEFAULT_K_NEIGHBORS,
            cost_fp: DEFAULT_COST_FP,
            cost_fn: DEFAULT_COST_FN,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config. Missing or invalid fields fall back to defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let config_json = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            )
        })?;
        Self::from_json_str(&config_json)
    }

    pub fn from_json_str(config_json: &str) -> anyhow::Result<Self> {
        let partial: serde_json::Value = serde_json::from_str(config_json)?;
        let mut config = PipelineConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                if let Some(val) = partial.get(stringify!($field)) {
                    if let Ok(parsed) = serde_json::from_value(val.clone()) {
                        config.$field = parsed;
                    } else {
                        log::warn!(
                            "Config Invalid value for '{}', using default: {:?}",
                            stringify!($field),
                            config.$field
                        );
                    }
                }
            };
        }

        load_or_default!(target_column);
        load_or_default!(test_size);
        load_or_default!(random_state);
        load_or_default!(k_neighbors);
        load_or_default!(cost_fp);
        load_or_default!(cost_fn);

        Ok(config)
    }

    /// Model configuration sharing this pipeline's seed.
    pub fn model_config(&self, model_type: ModelType) -> ModelConfig {
        ModelConfig::new(self.random_state, model_type)
    }
}
