use crate::domain::tuning::InputValidation;
use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

/// Simulation tick interval; defaults to 50 ms (20 Hz).
pub fn tick_interval() -> Duration {
    let millis = env::var("TICK_INTERVAL_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(50);
    Duration::from_millis(millis)
}

/// Optional input hardening. Unset means clients are trusted for positions and
/// pickup proximity.
pub fn input_validation() -> InputValidation {
    let pickup_range = env::var("PICKUP_RANGE")
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .filter(|range| range.is_finite() && *range > 0.0);
    let clamp_moves = matches!(
        env::var("CLAMP_MOVES").as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    );
    InputValidation {
        pickup_range,
        clamp_moves,
    }
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
// Per-session queue for one-shot updates; overflowing it evicts the session.
pub const EVENT_OUTBOX_CAPACITY: usize = 256;
