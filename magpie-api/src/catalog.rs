use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use magpie_catalog::resolver::LISTED_PACKAGE_LIMIT;
use magpie_catalog::TargetDetail;
use magpie_core::catalog::{HikingTrail, TourPackage};
use magpie_core::review::Review;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/targets/{id}", get(target_detail))
        .route("/api/tour-packages", get(active_tour_packages))
        .route("/api/hiking", get(active_hiking))
        .route("/api/reviews/{id}", get(target_reviews))
}

pub(crate) fn path_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation("id", format!("`{}` is not a valid id", raw)))
}

async fn target_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TargetDetail>, AppError> {
    let detail = state.catalog.detail(path_id(&id)?).await?;
    Ok(Json(detail))
}

async fn active_tour_packages(State(state): State<AppState>) -> Result<Json<Vec<TourPackage>>, AppError> {
    Ok(Json(state.catalog.active_tour_packages(LISTED_PACKAGE_LIMIT).await?))
}

async fn active_hiking(State(state): State<AppState>) -> Result<Json<Vec<HikingTrail>>, AppError> {
    Ok(Json(state.catalog.active_hiking().await?))
}

async fn target_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.ratings.reviews_for(path_id(&id)?).await?))
}
