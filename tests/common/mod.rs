//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, routing::get, Router};
use price_service::config::ServiceConfig;
use price_service::pricing::{HttpPriceClient, Price, Product, ProductId};
use price_service::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// Start a programmable price backend; `f` maps a product id to (status, body).
pub async fn start_price_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let f = Arc::new(f);
    let app = Router::new().route(
        "/prices/{id}",
        get(move |Path(id): Path<String>| {
            let f = f.clone();
            async move {
                let (status, body) = f(id).await;
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    body,
                )
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Body the backend returns for a successful lookup.
pub fn price_body(id: &str, price: &str) -> String {
    format!(r#"{{"product_id":"{}","price":"{}"}}"#, id, price)
}

/// Config with one product (`sku-1`, stored price 49.90) pointed at `backend`.
pub fn service_config(backend: SocketAddr) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.price_client.base_url = format!("http://{}", backend);
    config.products.push(Product {
        id: ProductId::from("sku-1"),
        name: "Keyboard".into(),
        price: Price::from_cents(4990),
    });
    config
}

/// Start the price service on an ephemeral port.
pub async fn start_service(config: ServiceConfig) -> (SocketAddr, Shutdown) {
    let client = HttpPriceClient::new(&config.price_client).unwrap();
    let server = HttpServer::new(config, Arc::new(client));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// GET a product price and return the JSON body.
pub async fn get_price(client: &reqwest::Client, service: SocketAddr, id: &str) -> serde_json::Value {
    let res = client
        .get(format!("http://{}/products/{}/price", service, id))
        .send()
        .await
        .expect("Service unreachable");
    assert_eq!(res.status(), 200, "price lookups never fail for known products");
    res.json().await.unwrap()
}

/// State of a breaker as reported by the admin API.
pub async fn breaker_state(client: &reqwest::Client, service: SocketAddr, name: &str) -> String {
    let body: serde_json::Value = client
        .get(format!("http://{}/admin/breakers/{}", service, name))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["state"].as_str().unwrap_or_default().to_string()
}
