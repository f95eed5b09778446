use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use std::str::FromStr;
use uuid::Uuid;

use magpie_booking::requests::{ManualPaymentSubmission, TravelInfoInput};
use magpie_core::booking::CustomerInfo;
use magpie_core::identity::require_user;
use magpie_core::payment::PaymentRequest;

use crate::{
    bookings::SinceQuery,
    error::AppError,
    extract::QueryParams,
    middleware::CurrentUser,
    state::AppState,
    upload::{self, SCREENSHOT_FIELD},
};

/// Headroom for the text fields sent alongside the screenshot.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
struct ManualPaymentResponse {
    success: bool,
    request_id: Uuid,
    booking_id: Option<Uuid>,
}

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/manual-payment",
            post(submit_manual_payment).layer(DefaultBodyLimit::max(max_upload_bytes + FORM_OVERHEAD_BYTES)),
        )
        .route("/api/payment-requests", get(list_payment_requests))
        .route("/api/payment-settings", get(payment_settings))
}

#[derive(Debug)]
struct Screenshot {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn submit_manual_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ManualPaymentResponse>, AppError> {
    require_user(user.user())?;

    let mut submission = ManualPaymentSubmission::default();
    let mut screenshot = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == SCREENSHOT_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                screenshot = Some(Screenshot {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "tour_package_id" => submission.tour_package_id = value,
            "hiking_id" => submission.hiking_id = value,
            "amount" => submission.amount = value.map(|v| parse_amount(&v)).transpose()?,
            "currency" => submission.currency = value,
            "payment_method" => submission.payment_method = value,
            "transaction_id" => submission.transaction_id = value,
            "notes" => submission.notes = value,
            "customer_info" => {
                submission.customer_info = value
                    .map(|v| parse_json::<CustomerInfo>("customer_info", &v))
                    .transpose()?
            }
            "travel_info" => {
                submission.travel_info = value
                    .map(|v| parse_json::<TravelInfoInput>("travel_info", &v))
                    .transpose()?
            }
            other => tracing::debug!("Ignoring unknown manual payment field `{}`", other),
        }
    }

    if let Some(shot) = &screenshot {
        upload::check_screenshot(&state.uploads, shot.content_type.as_deref(), shot.bytes.len())?;
    } else {
        tracing::info!("Manual payment submitted without a screenshot");
    }
    // Checked again by the workflow; rejected here before the screenshot is written.
    if submission.amount.is_none() {
        return Err(AppError::validation("amount", "Amount is required"));
    }

    if let Some(shot) = screenshot {
        let url = upload::store_screenshot(
            &state.uploads,
            shot.file_name.as_deref(),
            shot.content_type.as_deref(),
            &shot.bytes,
        )
        .await?;
        submission.proof_image_url = Some(url);
    }

    let proof = submission.proof_image_url.clone();
    match state.payments.submit_manual_payment(user.user(), submission).await {
        Ok(receipt) => Ok(Json(ManualPaymentResponse {
            success: true,
            request_id: receipt.request_id,
            booking_id: receipt.booking_id,
        })),
        Err(err) => {
            if let Some(proof) = proof {
                upload::discard_screenshot(&state.uploads, &proof).await;
            }
            Err(err.into())
        }
    }
}

async fn list_payment_requests(
    State(state): State<AppState>,
    user: CurrentUser,
    QueryParams(query): QueryParams<SinceQuery>,
) -> Result<Json<Vec<PaymentRequest>>, AppError> {
    let since = query.parse()?;
    Ok(Json(state.payments.list_payment_requests(user.user(), since).await?))
}

/// `{}` until the admin panel saves bank details.
async fn payment_settings(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let settings = match state.payments.payment_settings().await? {
        Some(settings) => serde_json::to_value(settings).map_err(|e| AppError::InternalServerError(e.to_string()))?,
        None => json!({}),
    };
    Ok(Json(settings))
}

fn parse_amount(raw: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(raw).map_err(|_| AppError::validation("amount", format!("`{}` is not a valid amount", raw)))
}

fn parse_json<T: serde::de::DeserializeOwned>(field: &'static str, raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| AppError::validation(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount("250").unwrap(), Decimal::new(250, 0));
        assert_eq!(parse_amount("99.50").unwrap(), Decimal::new(9950, 2));
        assert!(parse_amount("two fifty").is_err());
    }

    #[test]
    fn test_json_field_errors_name_the_field() {
        let err = parse_json::<TravelInfoInput>("travel_info", "{\"departure_date\": 1}").unwrap_err();
        assert!(matches!(err, AppError::ValidationError { field: Some(ref f), .. } if f == "travel_info"));
    }
}
