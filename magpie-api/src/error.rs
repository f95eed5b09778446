use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use magpie_core::CoreError;

use crate::upload::UploadError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError { field: Option<String>, message: String },
    NotFoundError(String),
    ConflictError(String),
    PayloadTooLarge(String),
    InternalServerError(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, field) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::ValidationError { field, message } => (StatusCode::BAD_REQUEST, message, field),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg, None),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            }
        };

        let body = match field {
            Some(field) => json!({ "error": error_message, "field": field }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError { field, message } => Self::validation(field, message),
            CoreError::NotFound { .. } => Self::NotFoundError(err.to_string()),
            CoreError::DuplicateBookingNumber(number) => {
                tracing::warn!("Booking number collision on {}", number);
                Self::ConflictError("Could not reserve a booking number, please retry".to_string())
            }
            CoreError::Unauthorized => Self::AuthenticationError("Authentication required".to_string()),
            CoreError::Forbidden => Self::AuthorizationError("Access denied".to_string()),
            CoreError::Storage(err) => Self::InternalServerError(err.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NotAnImage(_) => Self::validation("paymentScreenshot", err.to_string()),
            UploadError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            UploadError::Io(err) => Self::InternalServerError(format!("Upload write failed: {}", err)),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge("Upload exceeds the size limit".to_string())
        } else {
            Self::ValidationError {
                field: None,
                message: err.body_text(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magpie_core::StoreError;

    #[test]
    fn test_core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::validation("amount", "Amount is required"), StatusCode::BAD_REQUEST),
            (CoreError::not_found("Target", "x"), StatusCode::NOT_FOUND),
            (CoreError::DuplicateBookingNumber("MTT000001001".into()), StatusCode::CONFLICT),
            (CoreError::Unauthorized, StatusCode::UNAUTHORIZED),
            (CoreError::Forbidden, StatusCode::FORBIDDEN),
            (CoreError::Storage(StoreError::Backend("down".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_upload_errors_map_to_status_codes() {
        let not_image = AppError::from(UploadError::NotAnImage("text/plain".into()));
        assert_eq!(not_image.into_response().status(), StatusCode::BAD_REQUEST);
        let too_large = AppError::from(UploadError::TooLarge { limit: 10 });
        assert_eq!(too_large.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
