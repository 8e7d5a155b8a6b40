use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors that can occur while proxying the document store
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing owner/repo configuration: {message}")]
    BadConfig { message: String },

    #[error("Server has no write credential: {message}")]
    NotConfigured { message: String },

    #[error("No file provided")]
    NoFile,

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Invalid path: {path}")]
    BadPath { path: String },

    #[error("Upstream returned status {status}")]
    Upstream { status: u16, body: String },

    #[error("Write conflict on {path}: stale content hash")]
    Conflict { path: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Wire-level error kind, stable across releases (clients branch on it)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadConfig { .. } => "BadConfig",
            Self::NotConfigured { .. } => "ServerNotConfigured",
            Self::NoFile => "NoFile",
            Self::BadRequest { .. } => "BadRequest",
            Self::BadPath { .. } => "BadPath",
            Self::Upstream { .. } => "Upstream",
            Self::Conflict { .. } => "Conflict",
            Self::Network(_) => "NetworkError",
            Self::Internal(_) => "Internal",
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadConfig { .. }
            | Self::NoFile
            | Self::BadRequest { .. }
            | Self::BadPath { .. } => StatusCode::BAD_REQUEST,
            Self::NotConfigured { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Upstream failures pass the remote body through verbatim so
        // operators see exactly what the store reported.
        if let ApiError::Upstream { body, .. } = self {
            return (status, body).into_response();
        }

        let payload = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        let err = ApiError::BadConfig {
            message: "no owner".into(),
        };
        assert_eq!(err.kind(), "BadConfig");

        let err = ApiError::NotConfigured {
            message: "no token".into(),
        };
        assert_eq!(err.kind(), "ServerNotConfigured");

        assert_eq!(ApiError::NoFile.kind(), "NoFile");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::NoFile.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict {
                path: "pdfs/a.pdf".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotConfigured {
                message: "x".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_status_passthrough() {
        let err = ApiError::Upstream {
            status: 403,
            body: "rate limited".into(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        // Unrepresentable status degrades to 502 rather than panicking
        let err = ApiError::Upstream {
            status: 99,
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
