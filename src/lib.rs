//! Prediction service for before/after limb photographs.
//!
//! A request carries two images. [`PredictionOrchestrator`] validates them,
//! persists both through the [`ArtifactStore`], derives a [`FeatureVector`]
//! with a [`FeatureExtractor`], scores it with an [`InferenceRunner`] and
//! returns a [`PredictionResult`].
//!
//! The extractor and runner are traits so any model can be plugged in;
//! [`DiffFeatureExtractor`] and [`LogisticRunner`] are the defaults used by
//! the `arm-predict` server.

pub mod clock;
pub mod error;
pub mod features;
pub mod model;
pub mod orchestrator;
pub mod runner;
pub mod server;
pub mod store;

pub use clock::RequestClock;
pub use error::PredictError;
pub use features::{DiffFeatureExtractor, FeatureError};
pub use model::{FeatureExtractor, FeatureVector, InferenceRunner, Score};
pub use orchestrator::{PredictionOrchestrator, PredictionRequest, PredictionResult};
pub use runner::{LogisticModel, LogisticRunner, RunnerError};
pub use store::{ArtifactStore, Role, StoredArtifact};
