//! Fixture customer and inventory services.
//!
//! Small axum apps serving the deterministic catalogs, so the mesh can run
//! end to end on one machine and integration tests have real upstreams.
//!
//! # Routes
//! - `GET /customers`, `GET /customers/{id}` (customer kind)
//! - `GET /products`, `GET /products/{id}` (products kind)
//! - `GET /health` (both)

pub mod catalog;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::domain::{Customer, Product};
use crate::http::request::with_request_tracing;

pub use catalog::{demo_customers, demo_products, Catalog};

/// Which fixture service to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UpstreamKind {
    Customers,
    Products,
}

impl UpstreamKind {
    pub fn router(self) -> Router {
        match self {
            UpstreamKind::Customers => customer_router(demo_customers()),
            UpstreamKind::Products => inventory_router(demo_products()),
        }
    }
}

pub fn customer_router(catalog: Catalog<Customer>) -> Router {
    catalog_router("/customers", catalog)
}

pub fn inventory_router(catalog: Catalog<Product>) -> Router {
    catalog_router("/products", catalog)
}

fn catalog_router<T>(resource: &str, catalog: Catalog<T>) -> Router
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    let router = Router::new()
        .route(resource, get(list::<T>))
        .route(&format!("{resource}/{{id}}"), get(find::<T>))
        .route("/health", get(|| async { Json(json!({ "status": "UP" })) }))
        .with_state(Arc::new(catalog));
    with_request_tracing(router)
}

async fn list<T: Clone + Serialize>(State(catalog): State<Arc<Catalog<T>>>) -> Json<Vec<T>> {
    Json(catalog.all())
}

async fn find<T: Clone + Serialize>(
    State(catalog): State<Arc<Catalog<T>>>,
    Path(id): Path<u64>,
) -> Result<Json<T>, (StatusCode, Json<Value>)> {
    catalog.get(id).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": 404, "error": format!("no entry with id {id}") })),
        )
    })
}

/// Serve a fixture router until `shutdown` fires.
pub async fn serve(
    router: Router,
    listener: TcpListener,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Fixture upstream starting");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn fetch(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1 << 16).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_customer_routes() {
        let (status, json) = fetch(UpstreamKind::Customers.router(), "/customers/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"id": 1, "name": "Ayoub", "email": "Ayoub@gmail.com"}));

        let (_, json) = fetch(UpstreamKind::Customers.router(), "/customers").await;
        assert_eq!(json.as_array().unwrap().len(), 3);

        let (status, _) = fetch(UpstreamKind::Customers.router(), "/customers/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_product_routes() {
        let (status, json) = fetch(UpstreamKind::Products.router(), "/products/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Laptop");
        assert_eq!(json["price"], 1500.0);
        assert_eq!(json["quantity"], 3);

        let (status, _) = fetch(UpstreamKind::Products.router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }
}
