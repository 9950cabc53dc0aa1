//! HTTP surface: `POST /predict/` (also without the trailing slash),
//! `GET /health` and retrieval of stored uploads under
//! `/static/uploads/{filename}`, behind a CORS layer.

use std::{error::Error as _, sync::Arc};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    error::PredictError,
    model::{FeatureExtractor, InferenceRunner},
    orchestrator::{PredictionOrchestrator, PredictionRequest},
    store::{self, DEFAULT_URL_PREFIX, Role},
};

pub mod cors;
pub mod messages;

use messages::{ErrorResponse, HealthResponse};

/// Default cap on the request body, covering both uploaded images.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

type SharedOrchestrator<E, R> = Arc<PredictionOrchestrator<E, R>>;

/// Transport settings applied around the routes.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Cap on the request body, covering both uploaded images.
    pub max_upload_bytes: usize,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: vec![cors::DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}

/// Error returned by the handlers.
///
/// Only client errors carry a message to the caller; everything else is
/// logged and answered with a generic 500.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid input, answered with 400 and the message.
    BadRequest(String),
    /// The request body was refused by the transport, e.g. 413 when it
    /// exceeds the upload limit.
    Rejected(StatusCode, String),
    /// No stored upload under the requested name.
    NotFound,
    /// Any server-side failure. The cause is only logged.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Rejected(status, msg) => (status, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        log::debug!("Rejected multipart body: {err}");
        ApiError::Rejected(err.status(), err.body_text())
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        if err.is_client_error() {
            log::debug!("Rejected prediction request: {err}");
            return ApiError::BadRequest(err.to_string());
        }

        let mut cause = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            cause.push_str(": ");
            cause.push_str(&inner.to_string());
            source = inner.source();
        }
        log::error!("Prediction failed: {cause}");
        ApiError::Internal
    }
}

/// Builds the application router around a shared orchestrator.
pub fn router<E, R>(orchestrator: SharedOrchestrator<E, R>, config: &RouterConfig) -> Router
where
    E: FeatureExtractor + Send + Sync + 'static,
    R: InferenceRunner + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/predict/", post(post_predict::<E, R>))
        .route("/predict", post(post_predict::<E, R>))
        .route(
            &format!("{DEFAULT_URL_PREFIX}/{{filename}}"),
            get(get_upload::<E, R>),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors::cors_layer(&config.cors_origins))
        .with_state(orchestrator)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn post_predict<E, R>(
    State(orchestrator): State<SharedOrchestrator<E, R>>,
    multipart: Multipart,
) -> Result<Response, ApiError>
where
    E: FeatureExtractor + Send + Sync + 'static,
    R: InferenceRunner + Send + Sync + 'static,
{
    let request = read_upload(multipart).await?;

    // extraction and inference are CPU bound and the store writes synchronously
    let result = tokio::task::spawn_blocking(move || orchestrator.predict(&request))
        .await
        .map_err(|e| {
            log::error!("Prediction task aborted: {e}");
            ApiError::Internal
        })??;

    Ok((StatusCode::OK, Json(result)).into_response())
}

async fn get_upload<E, R>(
    State(orchestrator): State<SharedOrchestrator<E, R>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError>
where
    E: FeatureExtractor + Send + Sync + 'static,
    R: InferenceRunner + Send + Sync + 'static,
{
    let lookup = filename.clone();
    let bytes = tokio::task::spawn_blocking(move || orchestrator.store().read(&lookup))
        .await
        .map_err(|e| {
            log::error!("Upload read task aborted: {e}");
            ApiError::Internal
        })?
        .map_err(|e| {
            log::error!("Failed to read upload {filename}: {e}");
            ApiError::Internal
        })?
        .ok_or(ApiError::NotFound)?;

    Ok((
        [(header::CONTENT_TYPE, store::content_type(&filename))],
        bytes,
    )
        .into_response())
}

/// Collects the two image fields. Absent fields are left empty so the
/// orchestrator reports them like empty uploads; unknown fields are skipped.
async fn read_upload(mut multipart: Multipart) -> Result<PredictionRequest, ApiError> {
    let mut request = PredictionRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let role = match field.name() {
            Some(name) if name == Role::Start.field_name() => Role::Start,
            Some(name) if name == Role::End.field_name() => Role::End,
            other => {
                log::debug!("Ignoring multipart field {other:?}");
                continue;
            }
        };

        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;

        match role {
            Role::Start => {
                request.start_image = bytes.to_vec();
                request.start_filename = filename;
            }
            Role::End => {
                request.end_image = bytes.to_vec();
                request.end_filename = filename;
            }
        }
    }

    Ok(request)
}
