use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WayangError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl WayangError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WayangError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WayangError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            WayangError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            WayangError::Base64(_) => StatusCode::BAD_REQUEST,
            WayangError::Json(_) => StatusCode::BAD_REQUEST,
            WayangError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            WayangError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            WayangError::ModelNotAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            WayangError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            WayangError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            WayangError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            WayangError::Inference(_) => "INFERENCE_ERROR",
            WayangError::InvalidInput(_) => "INVALID_INPUT",
            WayangError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            WayangError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            WayangError::ModelNotAvailable(_) => "MODEL_NOT_AVAILABLE",
            WayangError::Config(_) => "CONFIG_ERROR",
            WayangError::Io(_) => "IO_ERROR",
            WayangError::Json(_) => "JSON_ERROR",
            WayangError::Base64(_) => "BASE64_DECODE_ERROR",
            WayangError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            WayangError::Ort(_) => "ORT_ERROR",
            WayangError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for WayangError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        tracing::error!("Request failed: {} ({})", self, status);

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            WayangError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WayangError::FileTooLarge(100, 10).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            WayangError::UnsupportedFormat("gif".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn missing_model_is_service_unavailable() {
        let err = WayangError::ModelNotAvailable("deit_small".into());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "MODEL_NOT_AVAILABLE");
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(WayangError::Inference("x".into()).error_code(), "INFERENCE_ERROR");
        assert_eq!(WayangError::ModelLoad("x".into()).error_code(), "MODEL_LOAD_ERROR");
    }
}
