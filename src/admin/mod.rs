//! Admin API: circuit breaker inspection and manual reset.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/breakers", get(get_breakers))
        .route("/admin/breakers/{name}", get(get_breaker))
        .route("/admin/breakers/{name}/reset", post(reset_breaker))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
