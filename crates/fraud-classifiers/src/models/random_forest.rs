use anyhow::Result;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{ModelConfig, ModelType};
use crate::error::PipelineError;
use crate::models::classifier_trait::{ClassifierModel, ProbabilisticModel};
use crate::models::decision_tree::{grow_tree, FittedTree, TreeSettings};
use crate::models::utils::{check_fit_inputs, check_predict_inputs, threshold_proba};

const NAME: &str = "RandomForestClassifier";

/// Bagged ensemble of gini trees.
///
/// Each tree sees a bootstrap sample of the rows and considers
/// `floor(sqrt(n_features))` candidate features per split. Probabilities are
/// the mean of the per-tree leaf probabilities.
///
/// Per-tree seeds are drawn from `random_state` before any tree is grown, so
/// the fitted forest does not depend on how many threads build it.
pub struct RandomForest {
    params: ModelConfig,
    trees: Vec<FittedTree>,
    n_features: Option<usize>,
    feature_importances: Option<Array1<f64>>,
}

struct ForestSettings {
    n_estimators: usize,
    n_jobs: i32,
    tree: TreeSettings,
}

impl RandomForest {
    pub fn new(params: ModelConfig) -> Self {
        RandomForest {
            params,
            trees: Vec::new(),
            n_features: None,
            feature_importances: None,
        }
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Per-tree gini importances averaged and renormalised, once fitted.
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    fn settings(&self, n_features: usize) -> Result<ForestSettings> {
        match self.params.model_type {
            ModelType::RandomForest {
                n_estimators,
                max_depth,
                min_samples_split,
                min_samples_leaf,
                n_jobs,
            } => {
                if n_estimators == 0 {
                    return Err(PipelineError::InvalidParameter(
                        "n_estimators must be at least 1".to_string(),
                    )
                    .into());
                }
                let max_features = ((n_features as f64).sqrt().floor() as usize).max(1);
                Ok(ForestSettings {
                    n_estimators,
                    n_jobs,
                    tree: TreeSettings::new(
                        max_depth,
                        min_samples_split,
                        min_samples_leaf,
                        Some(max_features),
                    )?,
                })
            }
            ref other => Err(PipelineError::InvalidParameter(format!(
                "Expected ModelType::RandomForest params, got {:?}",
                other
            ))
            .into()),
        }
    }
}

fn grow_bootstrap_tree(
    x: &Array2<f64>,
    y: &Array1<i32>,
    settings: TreeSettings,
    seed: u64,
    tree_idx: usize,
) -> FittedTree {
    let n_samples = x.nrows();
    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<usize> = (0..n_samples)
        .map(|_| rng.gen_range(0..n_samples))
        .collect();
    let tree = grow_tree(x, y, samples, settings, &mut rng);
    log::trace!("Tree {} grown", tree_idx);
    tree
}

impl ClassifierModel for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<()> {
        check_fit_inputs(x, y)?;
        let settings = self.settings(x.ncols())?;

        let mut master = StdRng::seed_from_u64(self.params.random_state);
        let seeds: Vec<u64> = (0..settings.n_estimators).map(|_| master.gen()).collect();

        let build = || -> Vec<FittedTree> {
            seeds
                .par_iter()
                .enumerate()
                .map(|(tree_idx, &seed)| grow_bootstrap_tree(x, y, settings.tree, seed, tree_idx))
                .collect()
        };

        let trees = if settings.n_jobs > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(settings.n_jobs as usize)
                .build()?;
            pool.install(build)
        } else {
            build()
        };

        let mut importances = Array1::<f64>::zeros(x.ncols());
        for tree in &trees {
            importances += &tree.normalized_importances();
        }
        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }

        log::info!(
            "{} fitted: {} trees on {} samples x {} features",
            NAME,
            trees.len(),
            x.nrows(),
            x.ncols()
        );

        self.trees = trees;
        self.n_features = Some(x.ncols());
        self.feature_importances = Some(importances);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        Ok(threshold_proba(&self.predict_proba(x)?))
    }

    fn is_fitted(&self) -> bool {
        self.n_features.is_some()
    }

    fn name(&self) -> &str {
        self.params.model_type.display_name()
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticModel> {
        Some(self)
    }
}

impl ProbabilisticModel for RandomForest {
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_predict_inputs(NAME, self.n_features, x)?;
        let n_trees = self.trees.len() as f64;
        let proba: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees
            })
            .collect();
        Ok(Array1::from(proba))
    }
}
