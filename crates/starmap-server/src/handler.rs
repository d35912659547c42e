//! Leaderboard HTTP handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use starmap_core::leaderboard::{LeaderboardEntry, LeaderboardError, SessionStats};
use thiserror::Error;

use crate::store::{LeaderboardStore, StoredEntry};

/// Listing size when the query omits `limit`.
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
}

impl ApiError {
    fn to_status(&self) -> StatusCode {
        match self {
            ApiError::Leaderboard(LeaderboardError::InvalidName) => StatusCode::BAD_REQUEST,
            ApiError::Leaderboard(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.to_status();
        if status.is_server_error() {
            tracing::error!("[api] {self}");
        } else {
            tracing::warn!("[api] rejected: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub name: String,
    pub score: i64,
    #[serde(default)]
    pub stats: SessionStats,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

pub async fn submit_score(
    State(store): State<LeaderboardStore>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<StoredEntry>), ApiError> {
    let entry = LeaderboardEntry::new(&request.name, request.score, request.stats)?;
    tracing::info!("[api] score {} for {}", entry.score, entry.name);
    let stored = store.insert(entry);
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn list_scores(
    State(store): State<LeaderboardStore>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<StoredEntry>> {
    Json(store.top(query.limit.unwrap_or(DEFAULT_LIMIT)))
}
