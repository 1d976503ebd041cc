use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::labels::LabelError;
use crate::models::ErrorResponse;

/// Everything that can go wrong while serving `/predict`. The `Display` text
/// is what the client sees; causes stay in the logs.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("No file part")]
    MissingFile,
    #[error("No selected file")]
    EmptyFile,
    #[error("File exceeds the {limit} byte upload limit")]
    PayloadTooLarge { limit: usize },
    #[error("Malformed multipart body")]
    Multipart(String),
    #[error("Invalid image file")]
    Decode(#[from] image::ImageError),
    #[error("Inference error")]
    Classifier(#[from] ClassifierError),
    #[error("Label lookup error")]
    Label(#[from] LabelError),
    #[error("Worker pool unavailable")]
    Blocking(#[from] BlockingError),
}

impl PredictError {
    /// Internal detail for logging, without changing the client message.
    pub fn detail(&self) -> String {
        match self {
            PredictError::Multipart(cause) => cause.clone(),
            PredictError::Decode(cause) => cause.to_string(),
            PredictError::Classifier(cause) => cause.to_string(),
            PredictError::Label(cause) => cause.to_string(),
            PredictError::Blocking(cause) => cause.to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MissingFile
            | PredictError::EmptyFile
            | PredictError::Multipart(_)
            | PredictError::Decode(_) => StatusCode::BAD_REQUEST,
            PredictError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::Classifier(_) | PredictError::Label(_) | PredictError::Blocking(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: PredictError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_rt::test]
    async fn client_errors_are_bad_requests() {
        let (status, body) = body_of(PredictError::MissingFile).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "No file part"}));

        let (status, body) = body_of(PredictError::EmptyFile).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "No selected file"}));

        let decode = image::load_from_memory(b"nope").unwrap_err();
        let (status, body) = body_of(PredictError::from(decode)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "Invalid image file"}));
    }

    #[actix_rt::test]
    async fn server_errors_hide_their_cause() {
        let err = PredictError::from(ClassifierError::Inference("shape mismatch".into()));
        assert_eq!(err.detail(), "inference failed: shape mismatch");

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Inference error"}));
    }

    #[actix_rt::test]
    async fn oversized_upload() {
        let (status, body) = body_of(PredictError::PayloadTooLarge { limit: 10 }).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body,
            serde_json::json!({"error": "File exceeds the 10 byte upload limit"})
        );
    }
}
