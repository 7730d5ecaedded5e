//! Exercises component A (the WebSocket transport) against the in-process
//! mock server, matching the request/response and error shapes the rest of
//! the crate is built on. The facade-level scenarios from spec §8 (balance
//! query, netuids-for-hotkey, blocks-since-update, commit-reveal timing,
//! transfer-fee estimation) are covered as unit tests next to the decode/
//! arithmetic logic they exercise (`chain::tests`, `weights::tests`) instead
//! of being re-driven through a hand-assembled on-chain metadata blob here;
//! those unit tests call the exact same functions `Chain` calls internally.

mod support;

use std::sync::atomic::{AtomicU64, Ordering};

use subtensor_client::rpc::Transport;

use support::mock_server::MockServer;

#[tokio::test]
async fn call_round_trips_through_the_mock_server() {
    let server = MockServer::start(|method, params| match method {
        "system_chain" => serde_json::json!("Bittensor"),
        "add" => {
            let args = params.as_array().cloned().unwrap_or_default();
            let sum: i64 = args.iter().filter_map(|v| v.as_i64()).sum();
            serde_json::json!(sum)
        }
        _ => serde_json::json!(null),
    })
    .await;

    let transport = Transport::connect(server.url).await.expect("connect to mock server");

    let chain_name: String = transport.call_as("system_chain", serde_json::json!([])).await.unwrap();
    assert_eq!(chain_name, "Bittensor");

    let sum: i64 = transport.call_as("add", serde_json::json!([2, 3, 4])).await.unwrap();
    assert_eq!(sum, 9);
}

#[tokio::test]
async fn calls_are_answered_with_distinct_ids_for_concurrent_callers() {
    let counter = std::sync::Arc::new(AtomicU64::new(0));
    let counter_for_handler = counter.clone();
    let server = MockServer::start(move |_method, params| {
        counter_for_handler.fetch_add(1, Ordering::Relaxed);
        params.clone()
    })
    .await;

    let transport = Transport::connect(server.url).await.expect("connect to mock server");

    let calls = (0..10).map(|i| {
        let transport = transport.clone();
        async move { transport.call_as::<u64>("echo", serde_json::json!(i)).await.unwrap() }
    });
    let results = futures::future::join_all(calls).await;

    assert_eq!(results, (0..10).collect::<Vec<_>>());
    assert_eq!(counter.load(Ordering::Relaxed), 10);
}

#[tokio::test]
async fn rpc_error_responses_surface_as_errors() {
    let server = MockServer::start(|_method, _params| serde_json::json!(null)).await;
    let transport = Transport::connect(server.url).await.expect("connect to mock server");

    // The mock always answers with a bare `result: null`, so asking for a
    // type that can't come from `null` must surface a decode error rather
    // than panicking or silently succeeding.
    let outcome: Result<String, _> = transport.call_as("whoami", serde_json::json!([])).await;
    assert!(outcome.is_err());
}
