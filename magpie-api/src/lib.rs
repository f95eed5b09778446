use axum::{http::Method, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod payments;
pub mod reviews;
pub mod state;
pub mod upload;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let mut router = Router::new()
        .route("/health", get(health))
        .merge(catalog::routes())
        .merge(reviews::routes())
        .merge(bookings::routes())
        .merge(payments::routes(state.uploads.max_bytes));

    // Serves stored payment screenshots under their public paths.
    let public_prefix = state.uploads.public_prefix.trim_end_matches('/');
    if !public_prefix.is_empty() {
        router = router.nest_service(public_prefix, ServeDir::new(&state.uploads.dir));
    }

    router
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::identity_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
