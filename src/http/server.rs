//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Build the service root: catalog, breaker registry, price service
//! - Bind server to listener and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::{AdminConfig, ServiceConfig};
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::pricing::{Catalog, PriceClient, PriceService, ProductId};
use crate::resilience::BreakerRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: PriceService,
    pub breakers: Arc<BreakerRegistry>,
    pub admin: AdminConfig,
}

impl AppState {
    /// Build the service root from configuration and a price client.
    pub fn new(config: &ServiceConfig, client: Arc<dyn PriceClient>) -> Self {
        let breakers = Arc::new(BreakerRegistry::new(config.circuit_breaker.clone()));
        let catalog = Catalog::from_products(config.products.clone());
        let service = PriceService::new(client, &breakers, catalog);

        Self {
            service,
            breakers,
            admin: config.admin.clone(),
        }
    }
}

/// HTTP server for the price service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig, client: Arc<dyn PriceClient>) -> Self {
        let state = AppState::new(&config, client);
        let router = Self::build_router(&config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/products", get(list_products))
            .route("/products/{id}/price", get(get_price))
            .merge(admin::admin_router(state.clone()))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            products = self.state.service.catalog().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_products(State(state): State<AppState>) -> Response {
    Json(state.service.catalog().list()).into_response()
}

/// Live price of a catalog product, or its stored price if the lookup fails.
async fn get_price(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = ProductId::from(id);
    match state.service.quote_by_id(&id).await {
        Some(quote) => Json(quote).into_response(),
        None => {
            tracing::debug!(product_id = %id, "Unknown product");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("unknown product '{}'", id) })),
            )
                .into_response()
        }
    }
}
