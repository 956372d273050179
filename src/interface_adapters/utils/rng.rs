use crate::domain::PlayerId;
use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Returns a process-unique player id for a new connection.
///
/// A single atomic counter backs every call, so concurrent connects never share an id.
/// The counter starts at the wall clock so ids from a restarted server do not collide
/// with ids a client may still remember.
pub fn next_player_id() -> PlayerId {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_millis()));
    counter.fetch_add(1, Ordering::Relaxed)
}
