//! HTTP error responses.

use aoi_types::{AoiError, ErrorKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error returned by AOI middleware and handlers as a plain-text response.
#[derive(Debug)]
pub enum ApiError {
    /// No usable identity; always 401.
    Unauthenticated(String),
    /// Identity present but not permitted; always 403.
    Forbidden(String),
    /// Any other failure, classed by [`AoiError::kind`].
    Aoi(AoiError),
}

impl ApiError {
    /// A 401 for a failed authentication attempt.
    ///
    /// Internal-class failures are reported without their detail.
    pub fn unauthenticated(e: &AoiError) -> Self {
        match e.kind() {
            ErrorKind::Internal => Self::Unauthenticated("authentication failed".to_string()),
            _ => Self::Unauthenticated(e.to_string()),
        }
    }

    /// Status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Aoi(e) => match e.kind() {
                ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
                ErrorKind::Authorization => StatusCode::FORBIDDEN,
                ErrorKind::ConfigMutation => StatusCode::BAD_REQUEST,
                ErrorKind::IdentityResolution => StatusCode::NOT_FOUND,
                ErrorKind::Connection => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Plain-text body.
    pub fn message(&self) -> String {
        match self {
            Self::Unauthenticated(reason) | Self::Forbidden(reason) => reason.clone(),
            Self::Aoi(e) if e.kind() == ErrorKind::Internal => "internal server error".to_string(),
            Self::Aoi(e) => e.to_string(),
        }
    }
}

impl From<AoiError> for ApiError {
    fn from(e: AoiError) -> Self {
        Self::Aoi(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = ?self, "Request failed");
        }
        (status, self.message()).into_response()
    }
}
