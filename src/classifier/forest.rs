//! Bagged ensemble of `linfa-trees` decision trees fit by `linfa-ensemble`.
//!
//! The fitted members are kept as a plain `Vec<DecisionTree>` so the model
//! serializes; prediction is a majority vote over members with ties going
//! to the lower class index.

use linfa::prelude::*;
use linfa_ensemble::EnsembleLearnerParams;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};

/// Fitting hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree<f64, usize>>,
}

impl TreeEnsemble {
    /// Fit on `records` (rows × features) and class indices in
    /// `0..n_classes`.
    pub fn fit(
        records: &Array2<f64>,
        targets: &Array1<usize>,
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self> {
        let n_rows = records.nrows();
        if n_rows == 0 {
            return Err(SourceError::Dataset("cannot fit on an empty dataset".into()));
        }
        if targets.len() != n_rows {
            return Err(SourceError::Dataset(format!(
                "{n_rows} records but {} targets",
                targets.len()
            )));
        }
        if let Some(bad) = targets.iter().find(|&&t| t >= n_classes) {
            return Err(SourceError::Dataset(format!(
                "class index {bad} outside 0..{n_classes}"
            )));
        }
        if params.n_trees == 0 {
            return Err(SourceError::Dataset("n_trees must be at least 1".into()));
        }

        let tree_params = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(params.max_depth)
            .min_weight_leaf(1.0);
        let dataset = Dataset::new(records.clone(), targets.clone());

        let learner = EnsembleLearnerParams::new_fixed_rng(
            tree_params,
            StdRng::seed_from_u64(params.seed),
        )
        .ensemble_size(params.n_trees)
        .bootstrap_proportion(1.0)
        .fit(&dataset)
        .map_err(|e| SourceError::Dataset(format!("fitting ensemble: {e}")))?;
        let trees = learner.models;

        log::debug!(
            "fit {} trees on {n_rows} rows × {} features",
            trees.len(),
            records.ncols()
        );

        Ok(Self {
            n_features: records.ncols(),
            n_classes,
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Majority-vote class index for every row of `records`.
    ///
    /// `EnsembleLearner`'s own aggregate breaks ties in `HashMap` order,
    /// which differs between processes, so votes are tallied here.
    pub fn predict(&self, records: &Array2<f64>) -> Result<Vec<usize>> {
        if records.ncols() != self.n_features {
            return Err(SourceError::Prediction(format!(
                "feature length mismatch: got {}, expected {}",
                records.ncols(),
                self.n_features
            )));
        }

        let mut votes = vec![vec![0usize; self.n_classes]; records.nrows()];
        for tree in &self.trees {
            let pred: Array1<usize> = tree.predict(records);
            for (row_votes, &class) in votes.iter_mut().zip(pred.iter()) {
                let slot = row_votes.get_mut(class).ok_or_else(|| {
                    SourceError::Prediction(format!("tree produced unknown class index {class}"))
                })?;
                *slot += 1;
            }
        }

        Ok(votes.iter().map(|row| argmax_first(row)).collect())
    }

    /// Class index for one feature row.
    pub fn predict_row(&self, row: &[f64]) -> Result<usize> {
        let records = Array2::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| SourceError::Prediction(e.to_string()))?;
        let mut out = self.predict(&records)?;
        out.pop()
            .ok_or_else(|| SourceError::Prediction("no prediction produced".into()))
    }
}

/// Index of the largest count; the first one wins ties.
fn argmax_first(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn separable() -> (Array2<f64>, Array1<usize>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.2],
            [0.2, 0.1],
            [5.0, 5.0],
            [5.1, 4.9],
            [4.8, 5.2],
            [10.0, 0.0],
            [10.2, 0.1],
            [9.9, 0.3],
        ];
        let y = array![0, 0, 0, 1, 1, 1, 2, 2, 2];
        (x, y)
    }

    #[test]
    fn separates_clusters() {
        let (x, y) = separable();
        let params = ForestParams {
            n_trees: 15,
            ..ForestParams::default()
        };
        let model = TreeEnsemble::fit(&x, &y, 3, &params).unwrap();
        assert_eq!(model.n_trees(), 15);
        assert_eq!(model.predict_row(&[0.05, 0.05]).unwrap(), 0);
        assert_eq!(model.predict_row(&[5.0, 5.1]).unwrap(), 1);
        assert_eq!(model.predict_row(&[10.1, 0.2]).unwrap(), 2);
    }

    #[test]
    fn same_seed_same_model() {
        let (x, y) = separable();
        let params = ForestParams {
            n_trees: 5,
            ..ForestParams::default()
        };
        let a = TreeEnsemble::fit(&x, &y, 3, &params).unwrap();
        let b = TreeEnsemble::fit(&x, &y, 3, &params).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn wrong_width_is_prediction_error() {
        let (x, y) = separable();
        let model = TreeEnsemble::fit(&x, &y, 3, &ForestParams::default()).unwrap();
        let err = model.predict_row(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, SourceError::Prediction(_)));
    }

    #[test]
    fn rejects_bad_training_input() {
        let (x, y) = separable();
        assert!(TreeEnsemble::fit(&x, &y, 2, &ForestParams::default()).is_err());

        let zero = ForestParams {
            n_trees: 0,
            ..ForestParams::default()
        };
        assert!(TreeEnsemble::fit(&x, &y, 3, &zero).is_err());

        let empty = Array2::<f64>::zeros((0, 2));
        assert!(TreeEnsemble::fit(&empty, &Array1::zeros(0), 3, &ForestParams::default()).is_err());
    }

    #[test]
    fn ties_go_to_lower_index() {
        assert_eq!(argmax_first(&[2, 2, 1]), 0);
        assert_eq!(argmax_first(&[1, 3, 3]), 1);
        assert_eq!(argmax_first(&[0, 0, 0]), 0);
    }
}
