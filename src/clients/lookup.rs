//! Generic breaker-guarded GET-by-id client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::clients::{LookupContext, LookupError, SnapshotLookup};
use crate::config::schema::TimeoutConfig;
use crate::discovery::ServiceResolver;
use crate::observability::metrics;
use crate::resilience::{with_deadline, Guarded};

/// Build the HTTP client shared by all lookup clients.
pub fn http_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(timeouts.connect())
        .timeout(timeouts.lookup())
        .pool_max_idle_per_host(32)
        // upstreams are internal addresses
        .no_proxy()
        .build()
}

/// Fetches `T` from `{resource}/{id}` on an instance of `service`.
pub struct RemoteLookup<T> {
    service: String,
    resource: &'static str,
    http: reqwest::Client,
    resolver: Arc<dyn ServiceResolver>,
    timeout: Duration,
    guard: Guarded<u64, T, LookupError>,
}

impl<T> RemoteLookup<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        ctx: &LookupContext,
        service: impl Into<String>,
        resource: &'static str,
        guard: Guarded<u64, T, LookupError>,
    ) -> Self {
        Self {
            service: service.into(),
            resource,
            http: ctx.http.clone(),
            resolver: ctx.resolver.clone(),
            timeout: ctx.timeout,
            guard,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    async fn fetch(&self, id: u64) -> Result<T, LookupError> {
        let instance = self
            .resolver
            .resolve(&self.service)
            .ok_or_else(|| LookupError::NoInstance(self.service.clone()))?;
        let url = instance.url_for(&format!("{}/{}", self.resource, id))?;

        let started = Instant::now();
        let result = match with_deadline(self.timeout, self.request(url)).await {
            Ok(result) => result,
            Err(elapsed) => Err(elapsed.into()),
        };
        metrics::record_lookup(&self.service, result.is_ok(), started);
        result
    }

    async fn request(&self, url: Url) -> Result<T, LookupError> {
        tracing::debug!(service = %self.service, url = %url, "Remote lookup");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(LookupError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }
        response.json::<T>().await.map_err(LookupError::Decode)
    }
}

#[async_trait]
impl<T> SnapshotLookup<T> for RemoteLookup<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: u64) -> T {
        self.guard.call(id, |id| self.fetch(id)).await
    }
}
