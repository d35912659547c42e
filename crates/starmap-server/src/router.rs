use axum::{Router, routing::post};
use http::{Method, header};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handler;
use crate::store::LeaderboardStore;

pub fn build_router(store: LeaderboardStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route(
            "/api/leaderboard",
            post(handler::submit_score).get(handler::list_scores),
        )
        .with_state(store)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
