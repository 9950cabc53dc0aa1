use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
}

impl HealthResponse {
    /// The fixed liveness payload, `{"status": "ok"}`.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Body of every error reply.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// The client-facing message. Server errors carry a fixed text.
    pub error: String,
}
