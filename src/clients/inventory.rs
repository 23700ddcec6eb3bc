//! Inventory service client.

use crate::clients::{LookupContext, LookupError, RemoteLookup};
use crate::config::UpstreamConfig;
use crate::domain::{Product, ProductId};

pub type InventoryClient = RemoteLookup<Product>;

/// Client for `GET /products/{id}`, falling back to an "unknown" zero-priced product.
pub fn inventory_client(ctx: &LookupContext, upstream: &UpstreamConfig) -> InventoryClient {
    let guard = ctx.breakers.register(
        &upstream.breaker,
        |id: ProductId, _cause: Option<&LookupError>| Product::unknown(id),
    );
    RemoteLookup::new(ctx, upstream.service.clone(), "/products", guard)
}
