//! Data structures and helpers for holding and partitioning transaction data.
//!
//! This module defines `Dataset` and contains the feature/target split and
//! the seeded stratified train/test split used before any fitting happens.
use std::collections::BTreeMap;

use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;

/// Ordered rows of named numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Column names, in file order
    pub columns: Vec<String>,
    /// Row-major values, one column per entry of `columns`
    pub records: Array2<f64>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Array2<f64>) -> Result<Self> {
        if columns.len() != records.ncols() {
            return Err(PipelineError::LengthMismatch {
                expected: records.ncols(),
                actual: columns.len(),
            }
            .into());
        }
        Ok(Dataset { columns, records })
    }

    pub fn nrows(&self) -> usize {
        self.records.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.records.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name)
            .map(|idx| self.records.column(idx))
    }

    /// New dataset without the named column.
    pub fn drop_column(&self, name: &str) -> Result<Dataset> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))?;
        let keep: Vec<usize> = (0..self.ncols()).filter(|&c| c != idx).collect();
        Ok(Dataset {
            columns: keep.iter().map(|&c| self.columns[c].clone()).collect(),
            records: self.records.select(Axis(1), &keep),
        })
    }

    /// New dataset holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            records: self.records.select(Axis(0), indices),
        }
    }
}

/// Count rows per class label, ordered by label.
pub fn class_counts(y: &Array1<i32>) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Row indices per class label, ordered by label.
pub fn class_indices(y: &Array1<i32>) -> BTreeMap<i32, Vec<usize>> {
    let mut indices: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_default().push(i);
    }
    indices
}

/// Split a dataset into its feature columns and the binary label column.
///
/// # Arguments
///
/// * `df` - The loaded dataset
/// * `target_col` - Name of the label column (see `DEFAULT_TARGET_COLUMN`)
///
/// # Returns
///
/// The feature dataset (label column removed, row order preserved) and the
/// labels as 0/1 integers.
pub fn split_features_target(df: &Dataset, target_col: &str) -> Result<(Dataset, Array1<i32>)> {
    let labels = df
        .column(target_col)
        .ok_or_else(|| PipelineError::MissingColumn(target_col.to_string()))?;

    let mut y = Vec::with_capacity(labels.len());
    for (row, &value) in labels.iter().enumerate() {
        if value == 0.0 {
            y.push(0);
        } else if value == 1.0 {
            y.push(1);
        } else {
            return Err(PipelineError::NonBinaryLabel { row, value }.into());
        }
    }

    let x = df.drop_column(target_col)?;
    Ok((x, Array1::from_vec(y)))
}

/// Stratified shuffle split into train and test partitions.
///
/// `n_test = ceil(test_size * n)`; each class contributes to the train set in
/// proportion to its size (largest-remainder rounding) and the rest of its
/// rows go to the test set, so per-class proportions in both subsets stay
/// within one sample of the full set.
///
/// # Returns
///
/// `(x_train, x_test, y_train, y_test)`
pub fn train_test_split_stratified(
    x: &Dataset,
    y: &Array1<i32>,
    test_size: f64,
    random_state: u64,
) -> Result<(Dataset, Dataset, Array1<i32>, Array1<i32>)> {
    let n_samples = x.nrows();
    if n_samples != y.len() {
        return Err(PipelineError::LengthMismatch {
            expected: n_samples,
            actual: y.len(),
        }
        .into());
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        ))
        .into());
    }

    let by_class = class_indices(y);
    if let Some((&class, members)) = by_class.iter().min_by_key(|(_, members)| members.len()) {
        if members.len() < 2 {
            return Err(PipelineError::InsufficientClassMembers {
                class,
                count: members.len(),
            }
            .into());
        }
    } else {
        return Err(PipelineError::EmptyInput("y").into());
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples - n_test;
    let n_classes = by_class.len();
    if n_train < n_classes || n_test < n_classes {
        return Err(PipelineError::InvalidParameter(format!(
            "train size {} and test size {} must each be at least the number of classes {}",
            n_train, n_test, n_classes
        ))
        .into());
    }

    let counts: Vec<usize> = by_class.values().map(|m| m.len()).collect();
    let train_counts = apportion(&counts, n_train);

    let mut rng = StdRng::seed_from_u64(random_state);
    let mut train_idx = Vec::with_capacity(n_train);
    let mut test_idx = Vec::with_capacity(n_test);
    for ((&class, members), &n_class_train) in by_class.iter().zip(train_counts.iter()) {
        let mut members = members.clone();
        members.shuffle(&mut rng);
        log::debug!(
            "Class {}: {} train / {} test rows",
            class,
            n_class_train,
            members.len() - n_class_train
        );
        train_idx.extend_from_slice(&members[..n_class_train]);
        test_idx.extend_from_slice(&members[n_class_train..]);
    }
    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    log::info!(
        "Stratified split: {} train rows, {} test rows",
        train_idx.len(),
        test_idx.len()
    );

    Ok((
        x.select_rows(&train_idx),
        x.select_rows(&test_idx),
        y.select(Axis(0), &train_idx),
        y.select(Axis(0), &test_idx),
    ))
}

/// Distribute `n_draws` over classes proportionally to `counts`.
///
/// Floors the exact shares and hands the remaining draws to the classes with
/// the largest fractional parts (earlier classes win ties).
fn apportion(counts: &[usize], n_draws: usize) -> Vec<usize> {
    let total: usize = counts.iter().sum();
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| n_draws as f64 * c as f64 / total as f64)
        .collect();
    let mut floored: Vec<usize> = exact.iter().map(|v| v.floor() as usize).collect();

    let mut need = n_draws.saturating_sub(floored.iter().sum());
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    for &i in order.iter() {
        if need == 0 {
            break;
        }
        if floored[i] < counts[i] {
            floored[i] += 1;
            need -= 1;
        }
    }
    floored
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_dataset() -> Dataset {
        Dataset::new(
            vec!["V1".to_string(), "Amount".to_string(), "Class".to_string()],
            array![
                [0.1, 10.0, 0.0],
                [0.2, 20.0, 0.0],
                [0.3, 30.0, 1.0],
                [0.4, 40.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn split_features_target_drops_label() {
        let (x, y) = split_features_target(&toy_dataset(), "Class").unwrap();
        assert_eq!(x.columns, vec!["V1", "Amount"]);
        assert_eq!(x.nrows(), 4);
        assert_eq!(y, array![0, 0, 1, 0]);
        assert_eq!(x.records[[3, 1]], 40.0);
    }

    #[test]
    fn split_features_target_missing_column() {
        let err = split_features_target(&toy_dataset(), "Label").unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::MissingColumn("Label".to_string()))
        );
    }

    #[test]
    fn split_features_target_rejects_non_binary() {
        let mut ds = toy_dataset();
        ds.records[[2, 2]] = 2.0;
        let err = split_features_target(&ds, "Class").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NonBinaryLabel { row: 2, .. })
        ));
    }

    #[test]
    fn apportion_uses_largest_remainder() {
        // 8 * 7/10 = 5.6, 8 * 3/10 = 2.4 -> 6 / 2
        assert_eq!(apportion(&[7, 3], 8), vec![6, 2]);
        assert_eq!(apportion(&[5, 5], 5), vec![3, 2]);
        assert_eq!(apportion(&[98, 2], 80), vec![78, 2]);
    }

    #[test]
    fn stratified_split_is_seed_deterministic() {
        let n = 50;
        let x = Dataset::new(
            vec!["f".to_string()],
            Array2::from_shape_fn((n, 1), |(i, _)| i as f64),
        )
        .unwrap();
        let y = Array1::from_shape_fn(n, |i| if i % 5 == 0 { 1 } else { 0 });

        let a = train_test_split_stratified(&x, &y, 0.2, 42).unwrap();
        let b = train_test_split_stratified(&x, &y, 0.2, 42).unwrap();
        let c = train_test_split_stratified(&x, &y, 0.2, 7).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.3, b.3);
        assert_ne!(a.0.records, c.0.records);
    }

    #[test]
    fn singleton_class_cannot_be_stratified() {
        let x = Dataset::new(vec!["f".to_string()], Array2::zeros((5, 1))).unwrap();
        let y = array![0, 0, 0, 0, 1];
        let err = train_test_split_stratified(&x, &y, 0.2, 42).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::InsufficientClassMembers { class: 1, count: 1 })
        );
    }

    #[test]
    fn subsets_smaller_than_class_count_are_rejected() {
        let x = Dataset::new(vec!["f".to_string()], Array2::zeros((10, 1))).unwrap();
        let y = array![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
        // ceil(0.1 * 10) = 1 test row cannot hold both classes.
        let err = train_test_split_stratified(&x, &y, 0.1, 42).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn invalid_test_size_is_rejected() {
        let x = Dataset::new(vec!["f".to_string()], Array2::zeros((4, 1))).unwrap();
        let y = array![0, 0, 1, 1];
        assert!(train_test_split_stratified(&x, &y, 0.0, 42).is_err());
        assert!(train_test_split_stratified(&x, &y, 1.0, 42).is_err());
    }
}
