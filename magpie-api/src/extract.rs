use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;

use crate::error::AppError;

/// `Json<T>` whose rejections render through [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `Query<T>` whose rejections render through [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge("Request body exceeds the size limit".to_string());
        }
        rejected_input(&rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        rejected_input(&rejection.body_text())
    }
}

/// Turns a deserializer message such as
/// `Failed to deserialize ...: travel_info: missing field ...` into a
/// validation error naming the offending field when one is given.
fn rejected_input(text: &str) -> AppError {
    let detail = text.split_once("target type: ").map_or(text, |(_, rest)| rest);
    let detail = detail.strip_prefix("Failed to deserialize query string: ").unwrap_or(detail);

    match detail.split_once(": ") {
        Some((path, message)) if is_field_path(path) => AppError::validation(path, message),
        _ => AppError::ValidationError {
            field: None,
            message: detail.to_string(),
        },
    }
}

fn is_field_path(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_deserialize_error_names_the_field() {
        let err = rejected_input(
            "Failed to deserialize the JSON body into the target type: travel_info: missing field `number_of_travelers` at line 1 column 90",
        );
        match err {
            AppError::ValidationError { field, message } => {
                assert_eq!(field.as_deref(), Some("travel_info"));
                assert!(message.starts_with("missing field `number_of_travelers`"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_top_level_error_has_no_field() {
        let err = rejected_input("Failed to parse the request body as JSON: expected value at line 1 column 1");
        assert!(matches!(err, AppError::ValidationError { field: None, .. }));

        let err = rejected_input(
            "Failed to deserialize the JSON body into the target type: invalid type: map, expected a string",
        );
        assert!(matches!(err, AppError::ValidationError { field: None, .. }));
    }

    #[test]
    fn test_query_error_names_the_parameter() {
        let err = rejected_input("Failed to deserialize query string: since: invalid type: sequence");
        assert!(matches!(err, AppError::ValidationError { field: Some(ref f), .. } if f == "since"));
    }
}
