use serde::{Deserialize, Serialize};

use crate::{
    clock::RequestClock,
    error::PredictError,
    model::{FeatureExtractor, InferenceRunner},
    store::{ArtifactStore, Role, StoredArtifact},
};

/// Format of the response timestamp: ISO-8601, second precision, local time.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The two uploaded images of one prediction call.
#[derive(Clone, Debug, Default)]
pub struct PredictionRequest {
    /// Encoded "before" image, exactly as received.
    pub start_image: Vec<u8>,
    /// Encoded "after" image, exactly as received.
    pub end_image: Vec<u8>,
    /// Client-supplied names, only used to pick the stored extension.
    pub start_filename: Option<String>,
    pub end_filename: Option<String>,
}

/// Payload returned for a successful prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Request timestamp in milliseconds, for display only.
    pub id: u64,
    /// Wall-clock time at which the result was assembled.
    pub timestamp: String,
    /// Class returned by the inference runner.
    pub label: String,
    /// Probability of `label`, rounded to 6 decimals.
    pub confidence: f64,
    /// Retrieval path of the stored start image.
    pub image_start_url: String,
    /// Retrieval path of the stored end image.
    pub image_end_url: String,
}

/// Drives one prediction: validate, persist, extract, infer, respond.
///
/// The orchestrator holds no per-request state, so a single instance can be
/// shared by every in-flight request. Steps within a request run strictly in
/// order and nothing is rolled back when a later step fails: stored images
/// stay on disk even when no result is produced.
pub struct PredictionOrchestrator<E, R> {
    store: ArtifactStore,
    clock: RequestClock,
    extractor: E,
    runner: R,
}

impl<E, R> PredictionOrchestrator<E, R>
where
    E: FeatureExtractor,
    R: InferenceRunner,
{
    /// Creates an orchestrator writing through `store` and scoring with the
    /// given collaborators.
    pub fn new(store: ArtifactStore, extractor: E, runner: R) -> Self {
        Self {
            store,
            clock: RequestClock::new(),
            extractor,
            runner,
        }
    }

    /// The store uploads are persisted to.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Runs the full pipeline for one request.
    ///
    /// Fails with [`PredictError::MissingImage`] before touching the disk when
    /// either image is empty. Every other failure is fatal for the request.
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        if request.start_image.is_empty() {
            return Err(PredictError::MissingImage(Role::Start));
        }
        if request.end_image.is_empty() {
            return Err(PredictError::MissingImage(Role::End));
        }

        let request_ms = self.clock.next_ms();

        let start = self.store.store(
            Role::Start,
            request_ms,
            &request.start_image,
            request.start_filename.as_deref(),
        )?;
        let end = self.store.store(
            Role::End,
            request_ms,
            &request.end_image,
            request.end_filename.as_deref(),
        )?;

        let features = self
            .extractor
            .extract(&request.start_image, &request.end_image)
            .map_err(|e| orphaned(PredictError::Extraction(Box::new(e)), [&start, &end]))?;
        log::debug!("Extracted {} features for request {request_ms}", features.len());

        let score = self
            .runner
            .score(&features)
            .map_err(|e| orphaned(PredictError::Inference(Box::new(e)), [&start, &end]))?;
        log::debug!("Inference completed for request {request_ms}");

        let result = PredictionResult {
            id: request_ms,
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            label: score.label,
            confidence: round_confidence(score.probability),
            image_start_url: start.public_url,
            image_end_url: end.public_url,
        };

        log::info!(
            "Prediction {}: label={} confidence={}",
            result.id,
            result.label,
            result.confidence
        );

        Ok(result)
    }
}

/// Rounds a probability to 6 decimal digits.
///
/// Rounds the exact binary value, so `0.1234565` (stored slightly below the
/// tie) becomes `0.123456`.
pub fn round_confidence(probability: f64) -> f64 {
    format!("{probability:.6}").parse().unwrap_or(probability)
}

fn orphaned(err: PredictError, artifacts: [&StoredArtifact; 2]) -> PredictError {
    for artifact in artifacts {
        log::warn!(
            "Leaving {} on disk after failed prediction",
            artifact.path.display()
        );
    }
    err
}
