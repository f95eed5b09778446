use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use magpie_booking::requests::NewReviewRequest;
use magpie_core::review::Review;

use crate::{error::AppError, extract::JsonBody, middleware::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
struct ReviewResponse {
    success: bool,
    review: Review,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/reviews", post(create_review))
}

async fn create_review(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<NewReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = state.ratings.submit_review(user.user(), req).await?;
    Ok(Json(ReviewResponse { success: true, review }))
}
