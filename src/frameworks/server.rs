// Framework bootstrap for the arena server runtime.

use crate::domain::tuning::Tuning;
use crate::frameworks::config;
use crate::interface_adapters::net::{spawn_world_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Game, GameEvent, WorldSettings, WorldSnapshot, world_task};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{broadcast, mpsc, watch};

fn init_runtime() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Serves the arena on an already bound listener until the server stops.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state();

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let settings = WorldSettings {
        tick_interval: config::tick_interval(),
        tuning: Tuning {
            validation: config::input_validation(),
            ..Tuning::default()
        },
    };
    tracing::debug!(
        tick_interval_ms = settings.tick_interval.as_millis() as u64,
        pickup_range = ?settings.tuning.validation.pickup_range,
        clamp_moves = settings.tuning.validation.clamp_moves,
        "world configured"
    );

    // input_tx/rx: All client inputs go to the single world task.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);

    // world_tx/rx: End-of-tick snapshots, serialized once for every client.
    let (world_tx, world_rx) =
        broadcast::channel::<Arc<WorldSnapshot>>(config::WORLD_BROADCAST_CAPACITY);
    let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));

    spawn_world_serializer(world_rx, world_latest_tx.clone());

    // Spawn the authoritative world loop; it owns all game state.
    let game = Game::new(settings, world_tx, StdRng::from_entropy());
    tokio::spawn(world_task(input_rx, game));

    Arc::new(AppState {
        input_tx,
        world_latest_tx,
        outbox_capacity: config::EVENT_OUTBOX_CAPACITY,
    })
}
