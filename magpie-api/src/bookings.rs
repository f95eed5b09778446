use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use magpie_booking::requests::{parse_timestamp, CreateBookingRequest};
use magpie_booking::BookingWithTarget;
use magpie_catalog::{TargetSummary, TargetView};

use crate::{
    catalog::path_id,
    error::AppError,
    extract::{JsonBody, QueryParams},
    middleware::CurrentUser,
    state::AppState,
};

#[derive(Debug, Serialize)]
struct BookingResponse {
    success: bool,
    booking: BookingWithTarget<TargetView>,
}

/// `?since=` filter shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SinceQuery {
    since: Option<String>,
}

impl SinceQuery {
    pub(crate) fn parse(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        match self.since.as_deref().filter(|s| !s.trim().is_empty()) {
            None => Ok(None),
            Some(raw) => Ok(Some(parse_timestamp("since", raw)?)),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/{id}", get(get_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.bookings.create_booking(user.user(), req).await?;
    Ok(Json(BookingResponse { success: true, booking }))
}

async fn list_bookings(
    State(state): State<AppState>,
    user: CurrentUser,
    QueryParams(query): QueryParams<SinceQuery>,
) -> Result<Json<Vec<BookingWithTarget<TargetSummary>>>, AppError> {
    let since = query.parse()?;
    Ok(Json(state.bookings.list_bookings(user.user(), since).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<BookingWithTarget<TargetSummary>>, AppError> {
    let id = path_id(&id)?;
    Ok(Json(state.bookings.get_booking(user.user(), id).await?))
}
