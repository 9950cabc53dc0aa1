//! Default [`InferenceRunner`]: a binary logistic model over the difference
//! features.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{FeatureVector, InferenceRunner, Score};

const DEFAULT_THRESHOLD: f64 = 0.5;

/// Errors from loading or running a [`LogisticRunner`].
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The model file could not be read.
    #[error("failed to read model file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The model file is not valid JSON for a [`LogisticModel`].
    #[error("invalid model file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The model parameters are unusable.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The vector length does not match the weight count.
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    /// A feature value is NaN or infinite.
    #[error("feature {0} is not a finite number")]
    NonFinite(usize),
}

/// Serialized form of a [`LogisticRunner`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// One weight per feature.
    pub weights: Vec<f32>,
    /// Added to the weighted sum before the sigmoid.
    pub bias: f32,
    /// `[negative, positive]` class names.
    pub labels: [String; 2],
    /// Minimum positive probability for the positive label. Defaults to 0.5.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for LogisticModel {
    /// Built-in weights for the eight difference features.
    fn default() -> Self {
        Self {
            weights: vec![0.4, -0.4, 6.0, 3.5, 4.0, 0.0, -1.2, 2.0],
            bias: -2.5,
            labels: ["normal".to_string(), "abnormal".to_string()],
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Logistic regression scorer.
///
/// `p = sigmoid(w . x + b)`. The positive label is returned when
/// `p >= threshold`; the reported probability is always that of the returned
/// label.
#[derive(Clone, Debug, Default)]
pub struct LogisticRunner {
    model: LogisticModel,
}

impl LogisticRunner {
    /// Validates `model` and wraps it in a runner.
    pub fn new(model: LogisticModel) -> Result<Self, RunnerError> {
        if model.weights.is_empty() {
            return Err(RunnerError::InvalidModel("no weights".to_string()));
        }
        if model.weights.iter().any(|w| !w.is_finite()) || !model.bias.is_finite() {
            return Err(RunnerError::InvalidModel(
                "weights must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&model.threshold) {
            return Err(RunnerError::InvalidModel(format!(
                "threshold {} outside [0, 1]",
                model.threshold
            )));
        }
        Ok(Self { model })
    }

    /// Loads a model from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: display.clone(),
            source,
        })?;
        let model = serde_json::from_str(&raw).map_err(|source| RunnerError::Parse {
            path: display,
            source,
        })?;
        Self::new(model)
    }

    /// The loaded model parameters.
    pub fn model(&self) -> &LogisticModel {
        &self.model
    }
}

impl InferenceRunner for LogisticRunner {
    type Error = RunnerError;

    fn score(&self, features: &FeatureVector) -> Result<Score, Self::Error> {
        let values = features.as_slice();
        if values.len() != self.model.weights.len() {
            return Err(RunnerError::FeatureCount {
                expected: self.model.weights.len(),
                actual: values.len(),
            });
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(RunnerError::NonFinite(idx));
        }

        let logit = values
            .iter()
            .zip(&self.model.weights)
            .map(|(x, w)| *x as f64 * *w as f64)
            .sum::<f64>()
            + self.model.bias as f64;
        let positive = 1.0 / (1.0 + (-logit).exp());

        let [negative_label, positive_label] = &self.model.labels;
        let (probability, label) = if positive >= self.model.threshold {
            (positive, positive_label)
        } else {
            (1.0 - positive, negative_label)
        };

        Ok(Score {
            probability: probability.clamp(0.0, 1.0),
            label: label.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;
    use tempfile::tempdir;

    fn runner(weights: Vec<f32>, bias: f32) -> LogisticRunner {
        LogisticRunner::new(LogisticModel {
            weights,
            bias,
            labels: ["neg".to_string(), "pos".to_string()],
            threshold: 0.5,
        })
        .unwrap()
    }

    #[test]
    fn default_model_matches_feature_count() {
        let runner = LogisticRunner::default();
        assert_eq!(runner.model().weights.len(), FEATURE_COUNT);

        let score = runner
            .score(&FeatureVector::new(vec![0.5; FEATURE_COUNT]))
            .unwrap();
        assert!((0.0..=1.0).contains(&score.probability));
        assert!(["normal", "abnormal"].contains(&score.label.as_str()));
    }

    #[test]
    fn bundled_model_file_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/models/arm_logistic.json");
        let runner = LogisticRunner::from_path(path).unwrap();
        assert_eq!(runner.model(), &LogisticModel::default());
    }

    #[test]
    fn picks_label_and_its_probability() {
        let r = runner(vec![1.0], 0.0);

        let pos = r.score(&FeatureVector::new(vec![2.0])).unwrap();
        assert_eq!(pos.label, "pos");
        assert!((pos.probability - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-9);

        let neg = r.score(&FeatureVector::new(vec![-2.0])).unwrap();
        assert_eq!(neg.label, "neg");
        assert!((neg.probability - pos.probability).abs() < 1e-9);

        let tie = r.score(&FeatureVector::new(vec![0.0])).unwrap();
        assert_eq!(tie.label, "pos");
        assert_eq!(tie.probability, 0.5);
    }

    #[test]
    fn rejects_bad_vectors() {
        let r = runner(vec![1.0, 1.0], 0.0);

        assert!(matches!(
            r.score(&FeatureVector::new(vec![1.0])),
            Err(RunnerError::FeatureCount { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            r.score(&FeatureVector::new(vec![1.0, f32::NAN])),
            Err(RunnerError::NonFinite(1))
        ));
    }

    #[test]
    fn rejects_bad_models() {
        let mut model = LogisticModel::default();
        model.threshold = 1.5;
        assert!(matches!(
            LogisticRunner::new(model),
            Err(RunnerError::InvalidModel(_))
        ));

        let mut model = LogisticModel::default();
        model.weights.clear();
        assert!(LogisticRunner::new(model).is_err());
    }

    #[test]
    fn loads_from_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{ "weights": [2.0, -1.0], "bias": 0.5, "labels": ["ok", "flex"] }"#,
        )
        .unwrap();

        let runner = LogisticRunner::from_path(&path).unwrap();
        assert_eq!(runner.model().threshold, DEFAULT_THRESHOLD);
        assert_eq!(
            runner.score(&FeatureVector::new(vec![1.0, 0.0])).unwrap().label,
            "flex"
        );

        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            LogisticRunner::from_path(&path),
            Err(RunnerError::Parse { .. })
        ));
        assert!(matches!(
            LogisticRunner::from_path(dir.path().join("missing.json")),
            Err(RunnerError::Io { .. })
        ));
    }
}
