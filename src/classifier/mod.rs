//! Pollution source classifier.
//!
//! A [`SourceClassifier`] is fit once at training time, written as JSON and
//! loaded once per process for inference. After load it is read-only, so a
//! single handle can serve any number of `predict` calls.

pub mod forest;
pub mod report;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::data::model::{FeatureVector, LabeledDataset, SourceLabel, FEATURE_COUNT, FEATURE_NAMES};
use crate::error::{Result, SourceError};

pub use forest::{ForestParams, TreeEnsemble};
pub use report::{ClassMetrics, ClassificationReport};

// ---------------------------------------------------------------------------
// SourcePredictor – the seam the request pipeline depends on
// ---------------------------------------------------------------------------

pub trait SourcePredictor {
    /// Predict from features in [`FEATURE_NAMES`] order.
    fn predict(&self, features: &[f64]) -> Result<SourceLabel>;
}

// ---------------------------------------------------------------------------
// SourceClassifier
// ---------------------------------------------------------------------------

/// On-disk model layout.
#[derive(Serialize, Deserialize)]
struct ModelFile {
    feature_names: Vec<String>,
    labels: Vec<SourceLabel>,
    params: ForestParams,
    ensemble: TreeEnsemble,
}

#[derive(Debug, Clone)]
pub struct SourceClassifier {
    params: ForestParams,
    ensemble: TreeEnsemble,
}

impl SourceClassifier {
    /// Fit a new ensemble on `train`.
    pub fn fit(train: &LabeledDataset, params: ForestParams) -> Result<Self> {
        let (records, targets) = to_arrays(train)?;
        log::info!(
            "fitting {} trees on {} rows (max_depth={:?}, seed={})",
            params.n_trees,
            train.len(),
            params.max_depth,
            params.seed
        );
        let ensemble = TreeEnsemble::fit(&records, &targets, SourceLabel::ALL.len(), &params)?;
        Ok(Self { params, ensemble })
    }

    /// Load a model written by [`SourceClassifier::save`].
    ///
    /// Fails when the file is missing or corrupt, or when it was trained on a
    /// different feature layout or label set.
    pub fn load(path: &Path) -> Result<Self> {
        let model: ModelFile = {
            let file = File::open(path).map_err(|e| SourceError::model_load(path, e))?;
            serde_json::from_reader(BufReader::new(file))
                .map_err(|e| SourceError::model_load(path, e))?
        };

        if model.feature_names != FEATURE_NAMES {
            return Err(SourceError::model_load(
                path,
                format!(
                    "feature columns {:?} do not match {:?}",
                    model.feature_names, FEATURE_NAMES
                ),
            ));
        }
        if model.labels != SourceLabel::ALL {
            return Err(SourceError::model_load(
                path,
                format!("label set {:?} does not match {:?}", model.labels, SourceLabel::ALL),
            ));
        }
        if model.ensemble.n_features() != FEATURE_COUNT
            || model.ensemble.n_classes() != SourceLabel::ALL.len()
            || model.ensemble.n_trees() == 0
        {
            return Err(SourceError::model_load(
                path,
                format!(
                    "ensemble shape {} features × {} classes × {} trees is not usable",
                    model.ensemble.n_features(),
                    model.ensemble.n_classes(),
                    model.ensemble.n_trees()
                ),
            ));
        }

        log::info!(
            "loaded model from {} ({} trees)",
            path.display(),
            model.ensemble.n_trees()
        );
        Ok(Self {
            params: model.params,
            ensemble: model.ensemble,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let model = ModelFile {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            labels: SourceLabel::ALL.to_vec(),
            params: self.params,
            ensemble: self.ensemble.clone(),
        };
        let file = File::create(path)
            .map_err(|e| SourceError::io(format!("creating {}", path.display()), e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &model).map_err(|e| {
            SourceError::io(format!("writing {}", path.display()), std::io::Error::from(e))
        })?;
        log::info!("saved model to {}", path.display());
        Ok(())
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.ensemble.n_trees()
    }

    pub fn predict_vector(&self, features: &FeatureVector) -> Result<SourceLabel> {
        self.predict(features.as_slice())
    }

    /// Predict every row of `dataset`, in order.
    pub fn predict_batch(&self, dataset: &LabeledDataset) -> Result<Vec<SourceLabel>> {
        let (records, _) = to_arrays(dataset)?;
        self.ensemble
            .predict(&records)?
            .into_iter()
            .map(label_for)
            .collect()
    }

    /// Predict `dataset` and score against its labels.
    pub fn evaluate(&self, dataset: &LabeledDataset) -> Result<ClassificationReport> {
        let predicted = self.predict_batch(dataset)?;
        let truth: Vec<SourceLabel> = dataset.examples.iter().map(|ex| ex.label).collect();
        ClassificationReport::new(&truth, &predicted)
    }
}

impl SourcePredictor for SourceClassifier {
    fn predict(&self, features: &[f64]) -> Result<SourceLabel> {
        if features.len() != FEATURE_COUNT {
            return Err(SourceError::Prediction(format!(
                "feature length mismatch: got {}, expected {FEATURE_COUNT}",
                features.len()
            )));
        }
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(SourceError::Prediction(format!(
                "feature '{}' is not finite",
                FEATURE_NAMES[i]
            )));
        }
        label_for(self.ensemble.predict_row(features)?)
    }
}

fn label_for(index: usize) -> Result<SourceLabel> {
    SourceLabel::from_index(index)
        .ok_or_else(|| SourceError::Prediction(format!("model produced unknown class {index}")))
}

fn to_arrays(dataset: &LabeledDataset) -> Result<(Array2<f64>, Array1<usize>)> {
    let flat: Vec<f64> = dataset
        .examples
        .iter()
        .flat_map(|ex| ex.features.values())
        .collect();
    let records = Array2::from_shape_vec((dataset.len(), FEATURE_COUNT), flat)
        .map_err(|e| SourceError::Dataset(e.to_string()))?;
    let targets: Array1<usize> = dataset.examples.iter().map(|ex| ex.label.index()).collect();
    Ok((records, targets))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::synth::DatasetSynthesizer;

    fn small_model() -> SourceClassifier {
        let train = DatasetSynthesizer::new(42).generate_dataset(30);
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };
        SourceClassifier::fit(&train, params).unwrap()
    }

    #[test]
    fn save_then_load_predicts_the_same() {
        let model = small_model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pollution_source_model.json");
        model.save(&path).unwrap();

        let loaded = SourceClassifier::load(&path).unwrap();
        assert_eq!(loaded.n_trees(), 10);

        let probe = DatasetSynthesizer::new(1).generate_dataset(10);
        assert_eq!(
            model.predict_batch(&probe).unwrap(),
            loaded.predict_batch(&probe).unwrap()
        );
    }

    #[test]
    fn repeated_predictions_reuse_one_handle() {
        let model = small_model();
        let v = [35.0, 60.0, 10.0, 50.0, 800.0, 300.0];
        let first = model.predict(&v).unwrap();
        for _ in 0..5 {
            assert_eq!(model.predict(&v).unwrap(), first);
        }
    }

    #[test]
    fn missing_file_is_model_load_error() {
        let err = SourceClassifier::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, SourceError::ModelLoad { .. }));
    }

    #[test]
    fn corrupt_file_is_model_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = SourceClassifier::load(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::ModelLoad { .. }));
    }

    #[test]
    fn reordered_feature_columns_are_rejected() {
        let model = small_model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        model.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
        json["feature_names"] = serde_json::json!(["no2", "pm2_5", "so2", "road", "industrial", "residential"]);
        std::fs::write(&path, json.to_string()).unwrap();

        let err = SourceClassifier::load(&path).unwrap_err();
        assert!(err.to_string().contains("feature columns"));
    }

    #[test]
    fn wrong_length_or_nan_is_prediction_error() {
        let model = small_model();
        let err = model.predict(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, SourceError::Prediction(_)));

        let err = model
            .predict(&[35.0, f64::NAN, 10.0, 50.0, 800.0, 300.0])
            .unwrap_err();
        assert!(err.to_string().contains("no2"));
    }
}
