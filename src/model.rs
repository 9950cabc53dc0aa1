/// Numeric summary of the change between a start and an end image.
///
/// The orchestrator never inspects the values; it only hands the vector from
/// the [`FeatureExtractor`] to the [`InferenceRunner`].
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Wraps raw feature values.
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Returns the feature values.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the vector holds no features.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of an [`InferenceRunner`].
#[derive(Clone, Debug, PartialEq)]
pub struct Score {
    /// Probability of `label`, in `[0, 1]`.
    pub probability: f64,
    /// Discrete class produced by the model.
    pub label: String,
}

/// Trait for deriving a [`FeatureVector`] from a pair of encoded images.
///
/// Implementations work on the raw uploaded bytes, never on stored files.
/// They must be deterministic for identical inputs and must fail when either
/// image cannot be decoded instead of returning degenerate output.
pub trait FeatureExtractor {
    /// The error type returned when features cannot be derived.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Computes the features describing the change from `start` to `end`.
    fn extract(&self, start: &[u8], end: &[u8]) -> Result<FeatureVector, Self::Error>;
}

/// Trait for scoring a [`FeatureVector`] with a loaded model.
pub trait InferenceRunner {
    /// The error type returned when the vector cannot be scored.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the predicted label together with its probability.
    fn score(&self, features: &FeatureVector) -> Result<Score, Self::Error>;
}
