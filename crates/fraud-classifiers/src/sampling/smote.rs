//! SMOTE (Synthetic Minority Over-sampling Technique).
//!
//! Every class smaller than the majority class is topped up to the majority
//! count with rows interpolated between a real class member and one of its
//! nearest same-class neighbours. Originals are returned first, untouched,
//! followed by the synthetic rows.

use std::cmp::Ordering;

use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_K_NEIGHBORS, DEFAULT_RANDOM_STATE};
use crate::data_handling::{class_counts, class_indices};
use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    /// Number of nearest neighbours to interpolate towards
    k_neighbors: usize,
    /// Random seed
    seed: u64,
}

impl Smote {
    pub fn new() -> Self {
        Self {
            k_neighbors: DEFAULT_K_NEIGHBORS,
            seed: DEFAULT_RANDOM_STATE,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
    }

    /// For each row of `samples`, the indices of its `k` nearest other rows.
    ///
    /// Ties are broken by row index so the table does not depend on thread
    /// scheduling.
    fn nearest_neighbors(samples: &Array2<f64>, k: usize) -> Vec<Vec<usize>> {
        (0..samples.nrows())
            .into_par_iter()
            .map(|i| {
                let point = samples.row(i);
                let mut dists: Vec<(f64, usize)> = (0..samples.nrows())
                    .filter(|&j| j != i)
                    .map(|j| (Self::squared_distance(point, samples.row(j)), j))
                    .collect();
                dists.sort_by(|a, b| {
                    a.0.partial_cmp(&b.0)
                        .unwrap_or(Ordering::Equal)
                        .then(a.1.cmp(&b.1))
                });
                dists.into_iter().take(k).map(|(_, j)| j).collect()
            })
            .collect()
    }

    /// Oversample every minority class of `(x, y)` up to the majority count.
    pub fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i32>) -> Result<(Array2<f64>, Array1<i32>)> {
        if x.nrows() != y.len() {
            return Err(PipelineError::LengthMismatch {
                expected: x.nrows(),
                actual: y.len(),
            }
            .into());
        }
        if self.k_neighbors == 0 {
            return Err(
                PipelineError::InvalidParameter("k_neighbors must be at least 1".to_string()).into(),
            );
        }

        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(PipelineError::SingleClass("SMOTE resampling").into());
        }
        let max_count = counts.values().copied().max().unwrap_or(0);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut synthetic_rows: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<i32> = Vec::new();

        for (class, members) in class_indices(y) {
            let n_to_generate = max_count - members.len();
            if n_to_generate == 0 {
                continue;
            }
            if members.len() <= self.k_neighbors {
                return Err(PipelineError::InsufficientNeighbors {
                    class,
                    n_samples: members.len(),
                    k_neighbors: self.k_neighbors,
                }
                .into());
            }

            let class_samples = x.select(Axis(0), &members);
            let neighbors = Self::nearest_neighbors(&class_samples, self.k_neighbors);

            for _ in 0..n_to_generate {
                let row = rng.gen_range(0..class_samples.nrows());
                let nn = neighbors[row][rng.gen_range(0..self.k_neighbors)];
                let gap: f64 = rng.gen();
                let base = class_samples.row(row);
                let toward = class_samples.row(nn);
                synthetic_rows.extend(
                    base.iter()
                        .zip(toward.iter())
                        .map(|(&p, &n)| p + gap * (n - p)),
                );
            }
            synthetic_y.extend(std::iter::repeat(class).take(n_to_generate));

            log::debug!(
                "SMOTE class {}: {} original, {} synthetic",
                class,
                members.len(),
                n_to_generate
            );
        }

        let n_synthetic = synthetic_y.len();
        let synthetic_x = Array2::from_shape_vec((n_synthetic, x.ncols()), synthetic_rows)?;
        let x_resampled = ndarray::concatenate(Axis(0), &[x.view(), synthetic_x.view()])?;

        let mut all_y = y.to_vec();
        all_y.extend_from_slice(&synthetic_y);

        log::info!(
            "SMOTE generated {} synthetic rows ({} -> {} training rows)",
            n_synthetic,
            x.nrows(),
            x_resampled.nrows()
        );

        Ok((x_resampled, Array1::from_vec(all_y)))
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply SMOTE on training data only.
///
/// # Returns
///
/// `(x_resampled, y_resampled)` with the original rows first.
pub fn apply_smote(
    x_train: &Array2<f64>,
    y_train: &Array1<i32>,
    random_state: u64,
) -> Result<(Array2<f64>, Array1<i32>)> {
    Smote::new().with_seed(random_state).fit_resample(x_train, y_train)
}
