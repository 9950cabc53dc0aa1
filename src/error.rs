use std::path::PathBuf;

use crate::store::Role;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while serving a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// An uploaded image was absent or empty. Raised before any side effect.
    #[error("both start_file and end_file are required ({} is missing or empty)", .0.field_name())]
    MissingImage(Role),

    /// An artifact could not be written. Earlier writes are kept.
    #[error("failed to store artifact at {}", path.display())]
    Storage {
        /// The file that could not be written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The feature extractor failed; both artifacts stay on disk.
    #[error("feature extraction failed")]
    Extraction(#[source] BoxError),

    /// The inference runner failed; both artifacts stay on disk.
    #[error("inference failed")]
    Inference(#[source] BoxError),
}

impl PredictError {
    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictError::MissingImage(_))
    }
}
