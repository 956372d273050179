use crate::domain::PlayerId;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_player_id;
use crate::use_cases::{GameEvent, GameUpdate, WorldSnapshot};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    InitTimeout,
    // The world task refused the session (outbox dropped before init).
    JoinRejected,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const INIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Serializes each world snapshot once and publishes the shared bytes.
///
/// Connections read the `watch` side, so a slow socket only ever sees the newest
/// snapshot; superseded ones are dropped for that connection alone.
pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<Arc<WorldSnapshot>>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match world_rx.recv().await {
            Ok(snapshot) => {
                let msg = ServerMessage::from(snapshot.as_ref());
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world snapshot");
                        continue;
                    }
                };
                // Convert once and share the UTF-8 bytes with every connection.
                world_latest_tx.send_replace(Utf8Bytes::from(txt));
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest snapshot"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world snapshot channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_world_serializer(
    world_rx: broadcast::Receiver<Arc<WorldSnapshot>>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    tokio::spawn(world_update_serializer(world_rx, world_latest_tx));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    // The connection id doubles as the player id for the whole session.
    let player_id = next_player_id();
    let span = info_span!("conn", player_id);

    async move {
        let mut ctx = match bootstrap_connection(&mut socket, &state, player_id).await {
            Ok(ctx) => ctx,
            Err(NetError::JoinRejected) => {
                warn!("world task rejected join");
                let _ = send_close_with_reason(&mut socket, close_code::POLICY, "join rejected")
                    .await;
                return;
            }
            Err(e) => {
                error!(error = ?e, "failed to bootstrap connection");
                let _ =
                    send_close_with_reason(&mut socket, close_code::ERROR, "bootstrap failed")
                        .await;
                return;
            }
        };

        info!("client connected");

        // Main Client Loop
        if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
            warn!(error = ?e, "client loop exited with error");
        }
    }
    .instrument(span)
    .await
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub input_tx: mpsc::Sender<GameEvent>,
    // One-shot updates addressed to this session.
    pub updates_rx: mpsc::Receiver<Arc<GameUpdate>>,
    pub world_latest_rx: watch::Receiver<Utf8Bytes>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub snapshots_out: u64,

    pub invalid_json: u32,
    pub rejected_input: u64,

    pub last_input_full_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
    player_id: PlayerId,
) -> Result<ConnCtx, NetError> {
    // Subscribe to snapshots *before* joining so the first post-join tick is not missed.
    let world_latest_rx = state.world_latest_tx.subscribe();
    let (outbox, mut updates_rx) = mpsc::channel::<Arc<GameUpdate>>(state.outbox_capacity);

    // Tell the world task to spawn a player for this session.
    // If anything after Join fails, compensate with Leave to avoid "spawned but never
    // connected".
    state
        .input_tx
        .send(GameEvent::Join { player_id, outbox })
        .await
        .map_err(|_| NetError::InputClosed)?;

    // The first update on a fresh outbox is always the private init snapshot.
    let init = match timeout(INIT_TIMEOUT, updates_rx.recv()).await {
        Ok(Some(init)) => init,
        Ok(None) => return Err(NetError::JoinRejected),
        Err(_) => {
            leave(&state.input_tx, player_id).await?;
            return Err(NetError::InitTimeout);
        }
    };

    let bytes_out = match send_message(socket, &ServerMessage::from(init.as_ref())).await {
        Ok(bytes) => bytes as u64,
        Err(e) => {
            leave(&state.input_tx, player_id).await?; // InputClosed takes precedence
            return Err(e);
        }
    };

    let now = Instant::now()
        .checked_sub(LOG_THROTTLE)
        .unwrap_or_else(Instant::now);
    Ok(ConnCtx {
        player_id,
        input_tx: state.input_tx.clone(),
        updates_rx,
        world_latest_rx,

        msgs_in: 0,
        msgs_out: 1,
        bytes_in: 0,
        bytes_out,
        snapshots_out: 0,

        invalid_json: 0,
        rejected_input: 0,

        last_input_full_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

async fn leave(input_tx: &mpsc::Sender<GameEvent>, player_id: PlayerId) -> Result<(), NetError> {
    input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .map_err(|_| NetError::InputClosed)
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn forward_command(ctx: &mut ConnCtx, msg: ClientMessage) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    let Some(command) = msg.into_command() else {
        ctx.rejected_input += 1;
        if should_log(&mut ctx.last_invalid_input_log) {
            warn!(player_id, "invalid input values; dropping");
        }
        return Ok(LoopControl::Continue);
    };

    // Never wait on the world task from the read path; a full queue drops the input.
    match ctx.input_tx.try_send(GameEvent::Input { player_id, command }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(&mut ctx.last_input_full_log) {
                warn!(player_id, "input channel full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

// The broadcaster dropped our outbox: evicted as too slow, or replaced.
fn mark_evicted(ctx: &mut ConnCtx) {
    ctx.close_frame = Some(CloseFrame {
        code: close_code::AGAIN,
        reason: "session evicted".into(),
    });
    warn!(player_id = ctx.player_id, "session outbox closed by server");
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing one-shot update
            update = ctx.updates_rx.recv() => {
                match update {
                    Some(update) => {
                        let msg = ServerMessage::from(update.as_ref());
                        match send_message(socket, &msg).await {
                            Ok(bytes) => {
                                ctx.msgs_out += 1;
                                ctx.bytes_out += bytes as u64;
                                false
                            }
                            Err(err) => {
                                // Log unexpected send failures; disconnect will follow immediately.
                                warn!(error = ?err, "failed to send update");
                                true
                            }
                        }
                    }
                    None => {
                        mark_evicted(ctx);
                        true
                    }
                }
            }

            // Outgoing world snapshot (latest wins)
            changed = ctx.world_latest_rx.changed() => {
                match changed {
                    Ok(()) => {
                        let latest = ctx.world_latest_rx.borrow_and_update().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            match forward_world_bytes(latest, socket, ctx).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(_) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => forward_command(ctx, msg),
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket
        .send(Message::Text(world_msg))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.snapshots_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send world snapshot");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    // Despawn unconditionally; the world task ignores unknown ids.
    leave(&ctx.input_tx, player_id).await?;

    debug!(
        player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        snapshots_out = ctx.snapshots_out,
        invalid_json = ctx.invalid_json,
        rejected_input = ctx.rejected_input,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Inventory, Player};
    use crate::use_cases::broadcast::Broadcaster;

    fn snapshot(tick: u64) -> Arc<WorldSnapshot> {
        Arc::new(WorldSnapshot {
            tick,
            players: vec![Player {
                id: 1,
                x: tick as f32,
                y: 0.0,
                dir: 0.0,
                hp: 100,
                name: "Player_0001".to_string(),
                inventory: Inventory {
                    ammo: 30,
                    medkits: 0,
                },
                alive: true,
            }],
            projectiles: Vec::new(),
            pickups: Vec::new(),
        })
    }

    fn conn_ctx(
        player_id: PlayerId,
        input_tx: mpsc::Sender<GameEvent>,
        updates_rx: mpsc::Receiver<Arc<GameUpdate>>,
        world_latest_rx: watch::Receiver<Utf8Bytes>,
    ) -> ConnCtx {
        let now = Instant::now();
        ConnCtx {
            player_id,
            input_tx,
            updates_rx,
            world_latest_rx,
            msgs_in: 0,
            msgs_out: 0,
            bytes_in: 0,
            bytes_out: 0,
            snapshots_out: 0,
            invalid_json: 0,
            rejected_input: 0,
            last_input_full_log: now,
            last_invalid_input_log: now,
            close_frame: None,
        }
    }

    #[tokio::test]
    async fn serializer_keeps_only_the_newest_snapshot_and_survives_lag() {
        // Capacity 1: the serializer lags behind the first two snapshots.
        let (world_tx, world_rx) = broadcast::channel(1);
        let (latest_tx, mut latest_rx) = watch::channel(Utf8Bytes::from(""));
        for tick in 1..=3 {
            world_tx.send(snapshot(tick)).expect("serializer subscribed");
        }
        drop(world_tx);

        // Returns once the channel is closed and drained.
        world_update_serializer(world_rx, latest_tx).await;

        let latest: serde_json::Value =
            serde_json::from_str(latest_rx.borrow_and_update().as_str()).expect("valid json");
        assert_eq!(latest["type"], "worldState");
        assert_eq!(latest["data"]["tick"], 3);
        assert_eq!(latest["data"]["players"]["1"]["x"], 3.0);
    }

    #[tokio::test]
    async fn slow_reader_only_sees_the_latest_serialized_snapshot() {
        let (world_tx, world_rx) = broadcast::channel(16);
        let (latest_tx, _) = watch::channel(Utf8Bytes::from(""));
        let mut conn_rx = latest_tx.subscribe();
        let serializer = tokio::spawn(world_update_serializer(world_rx, latest_tx));

        for tick in 1..=3 {
            world_tx.send(snapshot(tick)).expect("serializer subscribed");
        }
        drop(world_tx);
        serializer.await.expect("serializer did not panic");

        // One pending change, carrying the last snapshot; the older two were superseded.
        conn_rx.changed().await.expect("one change pending");
        let latest: serde_json::Value =
            serde_json::from_str(conn_rx.borrow_and_update().as_str()).expect("valid json");
        assert_eq!(latest["data"]["tick"], 3);
        assert!(conn_rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn evicted_session_closes_with_try_again_and_leaves() {
        let (input_tx, mut input_rx) = mpsc::channel(4);
        let (outbox, updates_rx) = mpsc::channel(1);
        let (_latest_tx, latest_rx) = watch::channel(Utf8Bytes::from(""));
        let mut ctx = conn_ctx(7, input_tx, updates_rx, latest_rx);

        let (world_tx, _) = broadcast::channel(1);
        let mut broadcaster = Broadcaster::new(world_tx);
        broadcaster.register(7, outbox);
        broadcaster.multicast(GameUpdate::PlayerLeft { player_id: 1 });
        broadcaster.multicast(GameUpdate::PlayerLeft { player_id: 2 });
        assert!(!broadcaster.is_registered(7));

        // Already queued updates are still delivered before the closure shows.
        assert!(ctx.updates_rx.recv().await.is_some());
        assert!(ctx.updates_rx.recv().await.is_none());

        mark_evicted(&mut ctx);
        assert_eq!(
            ctx.close_frame.as_ref().map(|f| f.code),
            Some(close_code::AGAIN)
        );

        disconnect_cleanup(&ctx).await.expect("world task reachable");
        match input_rx.recv().await {
            Some(GameEvent::Leave { player_id }) => assert_eq!(player_id, 7),
            other => panic!("expected leave, got {other:?}"),
        }
    }
}
