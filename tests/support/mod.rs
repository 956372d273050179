// Shared primitives for one-time server bootstrapping across integration tests.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    // `Arc` shares data between threads; `OnceLock` writes a value only once.
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Global `host:port` used by all tests after the server publishes its bound address.
static SERVER_ADDR: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// Ensure the test server is running and return its shared address.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_addr = Arc::new(OnceLock::<String>::new());
        let published_addr_thread = Arc::clone(&published_addr);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_addr_thread.set(addr.to_string());
                arena_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_readiness(published_addr);
    });

    SERVER_ADDR
        .get()
        .expect("server addr should be initialized")
        .as_str()
}

// Wait for address publication and then for the socket to accept TCP connections.
fn wait_for_server_readiness(published_addr: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published_addr.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_ADDR.set(addr.clone());

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

/// Opens a session and returns it with the player id assigned in `init`.
pub async fn join() -> (Ws, String, Value) {
    let url = format!("ws://{}/ws", ensure_server());
    let (mut ws, _) = connect_async(url).await.expect("websocket connect");
    let init = next_event(&mut ws, |v| v["type"] == "init").await;
    let id = init["data"]["id"]
        .as_str()
        .expect("init carries a string id")
        .to_string();
    (ws, id, init)
}

/// Reads JSON frames until one satisfies `wanted`, skipping everything else.
pub async fn next_event(ws: &mut Ws, wanted: impl Fn(&Value) -> bool) -> Value {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            let frame = ws
                .next()
                .await
                .expect("stream ended while waiting for event")
                .expect("websocket error while waiting for event");
            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(&text).expect("server sends json");
                if wanted(&value) {
                    return value;
                }
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Collects every JSON frame up to and including the first one matching `until`.
pub async fn collect_until(ws: &mut Ws, until: impl Fn(&Value) -> bool) -> Vec<Value> {
    tokio::time::timeout(RECV_TIMEOUT, async {
        let mut seen = Vec::new();
        loop {
            let frame = ws
                .next()
                .await
                .expect("stream ended while collecting events")
                .expect("websocket error while collecting events");
            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(&text).expect("server sends json");
                let done = until(&value);
                seen.push(value);
                if done {
                    return seen;
                }
            }
        }
    })
    .await
    .expect("timed out collecting events")
}

/// Waits for the server to close the connection and returns the close code.
pub async fn close_code(ws: &mut Ws) -> Option<u16> {
    tokio::time::timeout(RECV_TIMEOUT, async {
        while let Some(frame) = ws.next().await {
            match frame {
                Ok(Message::Close(frame)) => return frame.map(|f| u16::from(f.code)),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    })
    .await
    .expect("timed out waiting for close")
}

pub async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send client message");
}
