use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::http::server::AppState;
use crate::resilience::BreakerSnapshot;

pub async fn get_breakers(State(state): State<AppState>) -> Json<Vec<BreakerSnapshot>> {
    Json(state.breakers.snapshots())
}

pub async fn get_breaker(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<BreakerSnapshot>, StatusCode> {
    state
        .breakers
        .get(&name)
        .map(|breaker| Json(breaker.snapshot()))
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn reset_breaker(State(state): State<AppState>, Path(name): Path<String>) -> StatusCode {
    if state.breakers.reset(&name) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
