//! Edge router HTTP server.
//!
//! # Responsibilities
//! - Match the inbound path against the ordered route table
//! - Resolve the route's logical service to a live instance
//! - Forward the request (method, path, query, headers, streamed body)
//! - Report passive health outcomes and request metrics
//! - Swap route table and registry on config reload
//!
//! # Design Decisions
//! - No retries: a failed forward is answered with 502/504 immediately
//! - Tables are swapped atomically; in-flight requests finish on the old ones
//! - Hop-by-hop headers never cross the proxy in either direction

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, uri::Scheme, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    routing::any,
};
use futures_util::StreamExt;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use crate::config::AppConfig;
use crate::discovery::{Instance, InstanceGuard, ServiceRegistry};
use crate::health::InstanceSource;
use crate::http::error::ApiError;
use crate::http::request::{request_id, with_request_tracing};
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::routing::Router;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Route table and instance registry, replaced together on reload.
#[derive(Debug)]
pub struct EdgeTables {
    pub router: Router,
    pub registry: Arc<ServiceRegistry>,
}

impl EdgeTables {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            router: Router::from_config(&config.routes),
            registry: Arc::new(ServiceRegistry::new(
                &config.instances,
                config.load_balancing.strategy,
                &config.health_check,
            )),
        }
    }
}

impl InstanceSource for ArcSwap<EdgeTables> {
    fn instances(&self) -> Vec<Arc<Instance>> {
        self.load().registry.all_instances()
    }
}

#[derive(Clone)]
struct EdgeState {
    tables: Arc<ArcSwap<EdgeTables>>,
    client: Client<HttpConnector, Body>,
    forward_timeout: Duration,
}

/// Path-prefix reverse proxy in front of the mesh.
pub struct EdgeServer {
    tables: Arc<ArcSwap<EdgeTables>>,
    router: axum::Router,
}

impl EdgeServer {
    pub fn new(config: &AppConfig) -> Self {
        let tables = Arc::new(ArcSwap::from_pointee(EdgeTables::from_config(config)));

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeouts.connect()));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = EdgeState {
            tables: tables.clone(),
            client,
            forward_timeout: config.timeouts.forward(),
        };

        let router = axum::Router::new()
            .route("/", any(forward))
            .route("/{*path}", any(forward))
            .with_state(state);

        Self {
            tables,
            router: with_request_tracing(router),
        }
    }

    /// Shared handle on the live tables (health monitor, reload).
    pub fn tables(&self) -> Arc<ArcSwap<EdgeTables>> {
        self.tables.clone()
    }

    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    /// Rebuild both tables from `config` and publish them.
    pub fn reload(tables: &ArcSwap<EdgeTables>, config: &AppConfig) {
        tables.store(Arc::new(EdgeTables::from_config(config)));
        tracing::info!(
            routes = config.routes.len(),
            instances = config.instances.len(),
            "Edge tables reloaded"
        );
    }

    /// Serve until `shutdown` fires, applying config updates as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        updates: Option<mpsc::UnboundedReceiver<AppConfig>>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Edge router starting");

        if let Some(mut updates) = updates {
            let tables = self.tables.clone();
            let mut stop = shutdown.resubscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(config) = updates.recv() => Self::reload(&tables, &config),
                        _ = stop.recv() => break,
                    }
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Edge router stopped");
        Ok(())
    }
}

/// Main proxy handler.
async fn forward(State(state): State<EdgeState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request_id(request.headers()).to_string();

    let tables = state.tables.load_full();
    let route = match tables.router.match_path(&path) {
        Ok(route) => route,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(&method, 404, "none", start);
            return ApiError::from(e).into_response();
        }
    };

    let Some(instance) = tables.registry.get(&route.service) else {
        tracing::warn!(request_id = %request_id, service = %route.service, "No available instance");
        metrics::record_request(&method, 503, "none", start);
        return ApiError::ServiceUnavailable(route.service.clone()).into_response();
    };

    let upstream = match upstream_request(request, instance.addr) {
        Ok(upstream) => upstream,
        Err(e) => {
            metrics::record_request(&method, 400, "none", start);
            return ApiError::BadRequest(e.to_string()).into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        route = %route.name,
        instance = %instance.name,
        path = %path,
        "Forwarding request"
    );

    let passive = tables.registry.passive_health();
    match with_deadline(state.forward_timeout, state.client.request(upstream)).await {
        Ok(Ok(response)) => {
            let status = response.status();
            if passive {
                match status {
                    StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT => instance.mark_failure(),
                    _ => instance.mark_success(),
                }
            }
            metrics::record_request(&method, status.as_u16(), &instance.name, start);
            downstream_response(response, instance)
        }
        Ok(Err(e)) => {
            tracing::error!(request_id = %request_id, instance = %instance.name, error = %e, "Upstream error");
            if passive {
                instance.mark_failure();
            }
            metrics::record_request(&method, 502, &instance.name, start);
            ApiError::BadGateway.into_response()
        }
        Err(elapsed) => {
            tracing::error!(request_id = %request_id, instance = %instance.name, error = %elapsed, "Upstream timeout");
            if passive {
                instance.mark_failure();
            }
            metrics::record_request(&method, 504, &instance.name, start);
            ApiError::GatewayTimeout.into_response()
        }
    }
}

/// Re-target `request` at `addr`, keeping method, path, query and body.
fn upstream_request(request: Request<Body>, addr: SocketAddr) -> Result<Request<Body>, axum::http::Error> {
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(addr.to_string())
        .path_and_query(path_and_query)
        .build()?;

    let original_host = parts.headers.get(header::HOST).cloned().or_else(|| {
        parts
            .uri
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
    });

    strip_hop_by_hop(&mut parts.headers);
    // the client derives Host from the new URI
    parts.headers.remove(header::HOST);
    if let Some(host) = original_host {
        parts.headers.insert(X_FORWARDED_HOST, host);
    }

    parts.uri = uri;
    parts.version = Version::HTTP_11;
    Ok(Request::from_parts(parts, body))
}

/// Stream the upstream response back without its hop-by-hop headers.
///
/// The instance stays counted as in-flight until the body is fully sent
/// (or dropped by the client).
fn downstream_response(response: hyper::Response<Incoming>, guard: InstanceGuard) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    let stream = Body::new(body).into_data_stream().map(move |chunk| {
        let _held = &guard;
        chunk
    });
    Response::from_parts(parts, Body::from_stream(stream))
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}
