use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::PipelineError;
use crate::models::classifier_trait::{ClassifierModel, ProbabilisticModel};
use crate::models::utils::{check_fit_inputs, check_predict_inputs, threshold_proba};

const NAME: &str = "DecisionTreeClassifier";

/// Values closer than this are treated as equal when placing a threshold.
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Tree node. Leaves hold the fraction of fraud samples that reached them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

impl TreeNode {
    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeSettings {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` examines all of them
    pub max_features: Option<usize>,
}

impl TreeSettings {
    /// Check the split limits shared by single trees and forests.
    pub(crate) fn new(
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
        max_features: Option<usize>,
    ) -> Result<Self> {
        if min_samples_split < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "min_samples_split must be at least 2, got {}",
                min_samples_split
            ))
            .into());
        }
        if min_samples_leaf < 1 {
            return Err(PipelineError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            )
            .into());
        }
        Ok(TreeSettings {
            max_depth,
            min_samples_split,
            min_samples_leaf,
            max_features,
        })
    }
}

/// A grown tree together with its unnormalised impurity decreases.
#[derive(Debug, Clone)]
pub(crate) struct FittedTree {
    root: TreeNode,
    importances: Array1<f64>,
}

impl FittedTree {
    pub(crate) fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub(crate) fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        x.outer_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Impurity decreases normalised to sum to one (all zeros for a stump).
    pub(crate) fn normalized_importances(&self) -> Array1<f64> {
        let total = self.importances.sum();
        if total > 0.0 {
            &self.importances / total
        } else {
            self.importances.clone()
        }
    }

    pub(crate) fn root(&self) -> &TreeNode {
        &self.root
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Weighted child impurity, the quantity minimised by the search
    child_impurity: f64,
    impurity_left: f64,
    impurity_right: f64,
}

#[inline]
fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

struct TreeGrower<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<i32>,
    settings: TreeSettings,
    rng: &'a mut StdRng,
    importances: Array1<f64>,
    column: Vec<(f64, bool)>,
}

impl<'a> TreeGrower<'a> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> TreeNode {
        let n = samples.len();
        let positives = samples.iter().filter(|&&i| self.y[i] == 1).count();
        let value = if n == 0 {
            0.0
        } else {
            positives as f64 / n as f64
        };
        let impurity = gini(positives, n);

        let depth_reached = self.settings.max_depth.map_or(false, |max| depth >= max);
        if depth_reached
            || n < self.settings.min_samples_split
            || n < 2 * self.settings.min_samples_leaf
            || impurity <= 0.0
        {
            return TreeNode::Leaf {
                value,
                n_samples: n,
            };
        }

        let best = match self.best_split(&samples, positives) {
            Some(best) => best,
            None => {
                return TreeNode::Leaf {
                    value,
                    n_samples: n,
                }
            }
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, best.feature]] <= best.threshold);

        self.importances[best.feature] += n as f64 * impurity
            - left.len() as f64 * best.impurity_left
            - right.len() as f64 * best.impurity_right;

        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);

        TreeNode::Split {
            feature_idx: best.feature,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
            n_samples: n,
            impurity,
        }
    }

    /// Sweep each candidate feature in sorted order and keep the split with
    /// the lowest weighted gini. Features are visited in a random order; the
    /// search goes past `max_features` until a valid split has been found.
    fn best_split(&mut self, samples: &[usize], positives: usize) -> Option<BestSplit> {
        let n = samples.len();
        let n_features = self.x.ncols();
        if n_features == 0 || n < 2 {
            return None;
        }
        let max_features = self
            .settings
            .max_features
            .unwrap_or(n_features)
            .max(1)
            .min(n_features);
        let min_leaf = self.settings.min_samples_leaf.max(1);

        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(&mut *self.rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0;

        for &feature in &features {
            if visited >= max_features && best.is_some() {
                break;
            }

            self.column.clear();
            let x = self.x;
            let y = self.y;
            self.column
                .extend(samples.iter().map(|&i| (x[[i, feature]], y[i] == 1)));
            self.column.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            if self.column[n - 1].0 <= self.column[0].0 + FEATURE_THRESHOLD {
                // Constant features do not count towards max_features.
                continue;
            }
            visited += 1;

            let mut left_pos = 0;
            for i in 0..n - 1 {
                if self.column[i].1 {
                    left_pos += 1;
                }
                let current = self.column[i].0;
                let next = self.column[i + 1].0;
                if next <= current + FEATURE_THRESHOLD {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let impurity_left = gini(left_pos, n_left);
                let impurity_right = gini(positives - left_pos, n_right);
                let child_impurity =
                    (n_left as f64 * impurity_left + n_right as f64 * impurity_right) / n as f64;

                if best
                    .as_ref()
                    .map_or(true, |b| child_impurity < b.child_impurity)
                {
                    let mut threshold = current / 2.0 + next / 2.0;
                    if threshold >= next || !threshold.is_finite() {
                        threshold = current;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        child_impurity,
                        impurity_left,
                        impurity_right,
                    });
                }
            }
        }

        best
    }
}

/// Grow a tree on `samples` (row indices into `x`, repeats allowed).
pub(crate) fn grow_tree(
    x: &Array2<f64>,
    y: &Array1<i32>,
    samples: Vec<usize>,
    settings: TreeSettings,
    rng: &mut StdRng,
) -> FittedTree {
    let n_samples = samples.len();
    let mut grower = TreeGrower {
        x,
        y,
        settings,
        rng,
        importances: Array1::zeros(x.ncols()),
        column: Vec::with_capacity(n_samples),
    };
    let root = grower.grow(samples, 0);
    FittedTree {
        root,
        importances: grower.importances,
    }
}

/// CART classifier using the gini criterion.
///
/// Thresholds sit halfway between consecutive distinct feature values and
/// samples with `x <= threshold` go left. `random_state` seeds the order in
/// which features are examined, which decides between equally good splits.
pub struct DecisionTree {
    params: ModelConfig,
    tree: Option<FittedTree>,
    n_features: Option<usize>,
    feature_importances: Option<Array1<f64>>,
}

impl DecisionTree {
    pub fn new(params: ModelConfig) -> Self {
        DecisionTree {
            params,
            tree: None,
            n_features: None,
            feature_importances: None,
        }
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    /// Normalised gini importance per feature, once fitted.
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.tree.as_ref().map_or(0, |t| t.root.depth())
    }

    pub fn n_leaves(&self) -> usize {
        self.tree.as_ref().map_or(0, |t| t.root.n_leaves())
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.tree.as_ref().map(FittedTree::root)
    }

    fn settings(&self) -> Result<TreeSettings> {
        match self.params.model_type {
            ModelType::DecisionTree {
                max_depth,
                min_samples_split,
                min_samples_leaf,
            } => TreeSettings::new(max_depth, min_samples_split, min_samples_leaf, None),
            ref other => Err(PipelineError::InvalidParameter(format!(
                "Expected ModelType::DecisionTree params, got {:?}",
                other
            ))
            .into()),
        }
    }
}

impl ClassifierModel for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<()> {
        check_fit_inputs(x, y)?;
        let settings = self.settings()?;

        let mut rng = StdRng::seed_from_u64(self.params.random_state);
        let tree = grow_tree(x, y, (0..x.nrows()).collect(), settings, &mut rng);

        log::debug!(
            "{} fitted: depth {}, {} leaves",
            NAME,
            tree.root.depth(),
            tree.root.n_leaves()
        );

        self.feature_importances = Some(tree.normalized_importances());
        self.n_features = Some(x.ncols());
        self.tree = Some(tree);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        Ok(threshold_proba(&self.predict_proba(x)?))
    }

    fn is_fitted(&self) -> bool {
        self.tree.is_some()
    }

    fn name(&self) -> &str {
        self.params.model_type.display_name()
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticModel> {
        Some(self)
    }
}

impl ProbabilisticModel for DecisionTree {
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_predict_inputs(NAME, self.n_features, x)?;
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| PipelineError::ModelNotFitted(NAME.to_string()))?;
        Ok(tree.predict_proba(x))
    }
}
