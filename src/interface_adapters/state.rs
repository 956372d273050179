use crate::use_cases::GameEvent;
use axum::extract::ws::Utf8Bytes;
use tokio::sync::{mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    // Inputs flowing from the network into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    // Latest serialized world snapshot, shared across all connections.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    // Capacity of each session's one-shot update queue.
    pub outbox_capacity: usize,
}
