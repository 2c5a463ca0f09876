//! Error responses for the dashboard API

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rainfall_lib::{
    predictor::ParseVariantError, ArtifactError, BatchError, FeatureError, InputError,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    UnknownModel(#[from] ParseVariantError),

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("Malformed batch file: {0}")]
    MalformedBatch(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error(transparent)]
    ArtifactUnavailable(#[from] ArtifactError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::MalformedBatch(err.to_string())
    }
}

impl From<FeatureError> for AppError {
    fn from(err: FeatureError) -> Self {
        AppError::MalformedBatch(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::from_rejection(err.status(), err.body_text())
    }
}

impl AppError {
    /// Classify a failure to read the request body
    pub fn from_rejection(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::Upload(message)
        }
    }

    /// Classify an error from a prediction call
    pub fn from_prediction(err: anyhow::Error) -> Self {
        if let Some(input) = err.downcast_ref::<InputError>() {
            return AppError::InvalidInput(input.clone());
        }
        if let Some(feature) = err.downcast_ref::<FeatureError>() {
            return AppError::MalformedBatch(feature.to_string());
        }
        AppError::Internal(err)
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnknownModel(_) => "UNKNOWN_MODEL",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::MalformedBatch(_) => "MALFORMED_BATCH",
            AppError::Upload(_) => "UPLOAD_ERROR",
            AppError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            AppError::ArtifactUnavailable(_) => "ARTIFACT_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownModel(_)
            | AppError::InvalidInput(_)
            | AppError::MalformedBatch(_)
            | AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ArtifactUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(err) => {
                error!(error = %format!("{:#}", err), "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_is_bad_request() {
        let err = AppError::from_prediction(anyhow::Error::new(InputError::OutOfRange {
            field: "TN",
            value: 60.0,
            min: 0.0,
            max: 50.0,
            unit: "°C",
        }));
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_column_is_malformed_batch() {
        let err = AppError::from_prediction(anyhow::Error::new(FeatureError::MissingColumn(
            "RH_AVG".to_string(),
        )));
        assert_eq!(err.code(), "MALFORMED_BATCH");
        assert!(err.to_string().contains("RH_AVG"));
    }

    #[test]
    fn test_artifact_failure_is_server_error() {
        let err = AppError::from(ArtifactError::NotFound {
            path: "models/random_forest_tuned.json".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "ARTIFACT_UNAVAILABLE");
    }

    #[test]
    fn test_body_rejection_classification() {
        let err = AppError::from_rejection(StatusCode::PAYLOAD_TOO_LARGE, "too big".to_string());
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let err = AppError::from_rejection(StatusCode::BAD_REQUEST, "bad boundary".to_string());
        assert_eq!(err.code(), "UPLOAD_ERROR");
        assert!(err.to_string().contains("bad boundary"));
    }
}
