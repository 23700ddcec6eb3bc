//! End-to-end tests of the enriched bill read path.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use billing_mesh::lifecycle::Shutdown;
use billing_mesh::upstream::UpstreamKind;
use serde_json::Value;

mod common;

async fn get_json(url: String) -> (u16, Value) {
    let res = common::client().get(url).send().await.expect("server unreachable");
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_enriched_bill_with_healthy_upstreams() {
    let shutdown = Shutdown::new();
    let customers = common::spawn_upstream(UpstreamKind::Customers, &shutdown).await;
    let products = common::spawn_upstream(UpstreamKind::Products, &shutdown).await;
    let billing = common::spawn_billing(&common::mesh_config(customers, products), &shutdown).await;

    let (status, bill) = get_json(format!("http://{billing}/API/bills/1")).await;

    assert_eq!(status, 200);
    assert_eq!(bill["id"], 1);
    assert_eq!(bill["customerId"], 1);
    assert_eq!(bill["customer"]["name"], "Ayoub");
    assert_eq!(bill["customer"]["email"], "Ayoub@gmail.com");

    let items = bill["productItems"].as_array().unwrap();
    let names: Vec<&str> = items.iter().map(|i| i["product"]["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Smart Phone", "Laptop", "Washing Machine"]);
    let quantities: Vec<u64> = items.iter().map(|i| i["quantity"].as_u64().unwrap()).collect();
    assert_eq!(quantities, [1, 2, 3]);
    assert!(items.iter().all(|i| i.get("billId").is_none()));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_bill_is_404() {
    let shutdown = Shutdown::new();
    let config = common::mesh_config(common::dead_addr(), common::dead_addr());
    let billing = common::spawn_billing(&config, &shutdown).await;

    let (status, body) = get_json(format!("http://{billing}/API/bills/999")).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "bill 999 not found");

    let (status, _) = get_json(format!("http://{billing}/API/bills/not-a-number")).await;
    assert_eq!(status, 400);

    shutdown.trigger();
}

#[tokio::test]
async fn test_customer_outage_uses_placeholder() {
    let shutdown = Shutdown::new();
    let products = common::spawn_upstream(UpstreamKind::Products, &shutdown).await;
    let config = common::mesh_config(common::dead_addr(), products);
    let billing = common::spawn_billing(&config, &shutdown).await;

    let (status, bill) = get_json(format!("http://{billing}/API/bills/5")).await;

    assert_eq!(status, 200);
    assert_eq!(
        bill["customer"],
        serde_json::json!({"id": 2, "name": "unknown", "email": "unknown"})
    );
    assert_eq!(bill["productItems"][0]["product"]["name"], "Smart Phone");

    shutdown.trigger();
}

#[tokio::test]
async fn test_breaker_opens_and_stops_calling_upstream() {
    let shutdown = Shutdown::new();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let customers = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (500, r#"{"error":"boom"}"#.to_string())
        }
    })
    .await;
    let products = common::spawn_upstream(UpstreamKind::Products, &shutdown).await;

    let mut config = common::mesh_config(customers, products);
    config.breaker.sliding_window_size = 4;
    config.breaker.minimum_calls = 4;
    config.breaker.open_cooldown_ms = 60_000;
    let billing = common::spawn_billing(&config, &shutdown).await;

    for _ in 0..5 {
        let (status, bill) = get_json(format!("http://{billing}/API/bills/1")).await;
        assert_eq!(status, 200);
        assert_eq!(bill["customer"]["name"], "unknown");
        assert_eq!(bill["productItems"][1]["product"]["name"], "Laptop");
    }

    // the fifth read was short-circuited
    assert_eq!(hits.load(Ordering::SeqCst), 4);

    let (status, breakers) = get_json(format!("http://{billing}/admin/breakers")).await;
    assert_eq!(status, 200);
    assert_eq!(breakers[0]["name"], "customerService");
    assert_eq!(breakers[0]["state"], "OPEN");
    assert_eq!(breakers[1]["name"], "inventoryService");
    assert_eq!(breakers[1]["state"], "CLOSED");

    shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_reads_are_equal() {
    let shutdown = Shutdown::new();
    let customers = common::spawn_upstream(UpstreamKind::Customers, &shutdown).await;
    let products = common::spawn_upstream(UpstreamKind::Products, &shutdown).await;
    let billing = common::spawn_billing(&common::mesh_config(customers, products), &shutdown).await;

    let (_, first) = get_json(format!("http://{billing}/API/bills/9")).await;
    let (_, second) = get_json(format!("http://{billing}/API/bills/9")).await;
    assert_eq!(first, second);
    assert_eq!(first["customer"]["name"], "Amin");

    shutdown.trigger();
}
