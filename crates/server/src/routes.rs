use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::openapi::ApiDoc;

pub mod auth;
pub mod bookings;
pub mod mechanics;
pub mod quotes;
pub mod requests;
pub mod reviews;
pub mod vehicles;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public routes plus the token-protected API.
pub fn build_router(cors: CorsLayer, state: auth::ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/reviews/mechanic/:mechanic_id", get(reviews::for_mechanic));

    let protected = Router::new()
        .route("/api/auth/profile", get(auth::profile).put(auth::update_profile))
        .route("/api/auth/change-password", put(auth::change_password))
        .route("/api/mechanics/profile", put(mechanics::update_profile))
        .route("/api/mechanics/:id", get(mechanics::get))
        .route("/api/vehicles", get(vehicles::list).post(vehicles::create))
        .route("/api/vehicles/:id", get(vehicles::get).put(vehicles::update).delete(vehicles::delete))
        .route("/api/requests", get(requests::list).post(requests::create))
        .route("/api/requests/:id", get(requests::get).put(requests::update).delete(requests::delete))
        .route("/api/quotes", get(quotes::list).post(quotes::create))
        .route("/api/quotes/:id", get(quotes::get).put(quotes::update).delete(quotes::delete))
        .route("/api/bookings", get(bookings::list).post(bookings::create))
        .route("/api/bookings/:id", get(bookings::get).put(bookings::update).delete(bookings::delete))
        .route("/api/reviews", post(reviews::create))
        .route("/api/reviews/my-reviews", get(reviews::my_reviews))
        .route("/api/reviews/:id", put(reviews::update).delete(reviews::delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token_state,
        ));

    public
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
