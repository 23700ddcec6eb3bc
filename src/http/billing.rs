//! Billing HTTP server.
//!
//! # Responsibilities
//! - Expose the enriched bill read path (`GET /API/bills/{id}`)
//! - Expose liveness (`GET /health`) and breaker status (`GET /admin/breakers`)
//! - Wire up middleware (tracing, request ID, timeout)
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;

use crate::aggregation::BillingService;
use crate::domain::{BillId, BillView};
use crate::http::error::ApiError;
use crate::http::request::with_request_tracing;
use crate::resilience::{BreakerRegistry, BreakerStatus};

#[derive(Clone)]
struct BillingState {
    service: Arc<BillingService>,
    breakers: Arc<BreakerRegistry>,
}

/// HTTP front of the billing service.
pub struct BillingServer {
    router: Router,
}

impl BillingServer {
    pub fn new(
        service: Arc<BillingService>,
        breakers: Arc<BreakerRegistry>,
        request_timeout: Duration,
    ) -> Self {
        let state = BillingState { service, breakers };
        Self {
            router: Self::build_router(state, request_timeout),
        }
    }

    fn build_router(state: BillingState, request_timeout: Duration) -> Router {
        let router = Router::new()
            .route("/API/bills/{id}", get(get_bill))
            .route("/health", get(health))
            .route("/admin/breakers", get(breakers))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            ));
        with_request_tracing(router)
    }

    /// The fully layered router (used directly by tests).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires; in-flight requests are drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Billing server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Billing server stopped");
        Ok(())
    }
}

async fn get_bill(
    State(state): State<BillingState>,
    id: Result<Path<BillId>, PathRejection>,
) -> Result<Json<BillView>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::debug!(bill_id = id, "Fetching enriched bill");
    let view = state.service.get_enriched_bill(id).await?;
    Ok(Json(view))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

async fn breakers(State(state): State<BillingState>) -> Json<Vec<BreakerStatus>> {
    Json(state.breakers.snapshot())
}
