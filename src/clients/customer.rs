//! Customer service client.

use crate::clients::{LookupContext, LookupError, RemoteLookup};
use crate::config::UpstreamConfig;
use crate::domain::{Customer, CustomerId};

pub type CustomerClient = RemoteLookup<Customer>;

/// Client for `GET /customers/{id}`, falling back to an "unknown" customer.
pub fn customer_client(ctx: &LookupContext, upstream: &UpstreamConfig) -> CustomerClient {
    let guard = ctx.breakers.register(
        &upstream.breaker,
        |id: CustomerId, _cause: Option<&LookupError>| Customer::unknown(id),
    );
    RemoteLookup::new(ctx, upstream.service.clone(), "/customers", guard)
}
