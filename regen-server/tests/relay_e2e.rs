use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::SinkExt;
use regen_core::config::{ConfigStore, RelayConfig};
use regen_core::processors::EventRelay;
use regen_sdk::client::{OpenOutcome, SyncClient, SyncClientConfig, SyncSink};
use regen_sdk::objects::{FundEvent, FundRecord, RelayMessage};
use regen_sdk::source::FundDataSource;
use regen_server::server::{build_router, serve};
use regen_server::state::AppState;
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

struct EchoSource;

#[async_trait]
impl FundDataSource for EchoSource {
    async fn fetch_fund_data(&self, address: &str) -> Option<FundRecord> {
        Some(FundRecord {
            address: address.to_string(),
            name: format!("Fund {address}"),
            description: String::new(),
            image: String::new(),
            goal: Decimal::from(100),
            current_balance: Decimal::ZERO,
            total_raised: Decimal::ZERO,
            progress: 0,
            owner: "0x3333333333333333333333333333333333333333".to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    toasts: Mutex<Vec<String>>,
    funds: Mutex<Vec<FundRecord>>,
}

impl SyncSink for RecordingSink {
    fn add_toast(&self, message: &str) {
        self.toasts.lock().unwrap().push(message.to_string());
    }

    fn on_event(&self, fund: FundRecord) {
        self.funds.lock().unwrap().push(fund);
    }
}

fn event(address: &str) -> FundEvent {
    FundEvent {
        owner: "0x3333333333333333333333333333333333333333".to_string(),
        address: address.to_string(),
        name: format!("Fund {address}"),
        goal: "100.0".to_string(),
    }
}

fn relay(interval: Duration) -> EventRelay {
    EventRelay::new(ConfigStore::new(RelayConfig {
        min_broadcast_interval: interval,
    }))
}

async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_client_receives_relayed_batch() {
    let relay = relay(Duration::from_millis(200));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(AppState::new(relay.clone(), shutdown_rx.clone()));
    let server = tokio::spawn(serve(listener, router, shutdown_rx));

    let client = SyncClient::new(
        SyncClientConfig::new(format!("ws://{addr}")),
        Arc::new(EchoSource),
    );
    let sink = Arc::new(RecordingSink::default());

    assert_eq!(client.open(sink.clone()).await.unwrap(), OpenOutcome::Opened);
    assert!(client.is_ws_connected());
    assert_eq!(client.open(sink.clone()).await.unwrap(), OpenOutcome::Reused);

    eventually(|| {
        let relay = relay.clone();
        async move { relay.subscriber_count().await == 1 }
    })
    .await;

    relay.on_chain_event(event("0xa")).await;
    relay.on_chain_event(event("0xb")).await;
    relay.on_chain_event(event("0xa")).await;

    eventually(|| {
        let sink = sink.clone();
        async move { sink.funds.lock().unwrap().len() == 2 }
    })
    .await;
    let names: Vec<_> = sink
        .funds
        .lock()
        .unwrap()
        .iter()
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(names, vec!["Fund 0xa", "Fund 0xb"]);
    assert_eq!(
        *sink.toasts.lock().unwrap(),
        vec!["New fund created: Fund 0xa", "New fund created: Fund 0xb"]
    );

    // Releasing without teardown keeps the channel.
    client.release(false).await;
    assert!(client.is_ws_connected());

    client.release(true).await;
    assert!(!client.is_ws_connected());
    eventually(|| {
        let relay = relay.clone();
        async move { relay.subscriber_count().await == 0 }
    })
    .await;

    shutdown_tx.send(true).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_subscribers() {
    let relay = relay(Duration::from_secs(15));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(AppState::new(relay.clone(), shutdown_rx.clone()));
    let server = tokio::spawn(serve(listener, router, shutdown_rx));

    let client = SyncClient::new(
        SyncClientConfig::new(format!("ws://{addr}")),
        Arc::new(EchoSource),
    );
    let sink: Arc<dyn SyncSink> = Arc::new(RecordingSink::default());
    client.open(sink).await.unwrap();
    let mut connected = client.watch_connected();
    eventually(|| {
        let relay = relay.clone();
        async move { relay.subscriber_count().await == 1 }
    })
    .await;

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), connected.wait_for(|c| !*c))
        .await
        .unwrap()
        .unwrap();
    server.await.unwrap().unwrap();
    assert_eq!(relay.subscriber_count().await, 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let router = build_router(AppState::new(
        relay(Duration::from_secs(15)),
        shutdown_rx,
    ));

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_malformed_frame_keeps_channel_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (drop_tx, drop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.send(Message::Text("{not json".into())).await.unwrap();
        let frame = serde_json::to_string(&RelayMessage::NewFund {
            data: event("0xc"),
        })
        .unwrap();
        ws.send(Message::Text(frame.into())).await.unwrap();
        let _ = drop_rx.await;
        // Drop the TCP stream without a close frame.
        drop(ws);
    });

    let client = SyncClient::new(
        SyncClientConfig::new(format!("ws://{addr}")),
        Arc::new(EchoSource),
    );
    let sink = Arc::new(RecordingSink::default());
    assert_eq!(client.open(sink.clone()).await.unwrap(), OpenOutcome::Opened);
    let mut connected = client.watch_connected();

    eventually(|| {
        let sink = sink.clone();
        async move { sink.funds.lock().unwrap().len() == 1 }
    })
    .await;
    assert_eq!(sink.funds.lock().unwrap()[0].address, "0xc");
    assert!(client.is_ws_connected());

    drop_tx.send(()).unwrap();
    server.await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), connected.wait_for(|c| !*c))
        .await
        .unwrap()
        .unwrap();
    assert!(!client.is_ws_connected());
}
