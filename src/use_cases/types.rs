// Use-case level inputs/outputs for the world task.

use crate::domain::{Pickup, PickupId, Player, PlayerCommand, PlayerId, Projectile};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-session queue for one-shot updates (init, join/leave, combat, pickups).
pub type Outbox = mpsc::Sender<Arc<GameUpdate>>;

/// Everything a connection can ask of the world task.
#[derive(Debug)]
pub enum GameEvent {
    Join { player_id: PlayerId, outbox: Outbox },
    Leave { player_id: PlayerId },
    Input { player_id: PlayerId, command: PlayerCommand },
}

/// One-shot updates delivered through session outboxes.
#[derive(Debug, Clone, PartialEq)]
pub enum GameUpdate {
    // Unicast to a joining session.
    Init {
        player_id: PlayerId,
        players: Vec<Player>,
        pickups: Vec<Pickup>,
    },
    PlayerJoined(Player),
    PlayerLeft {
        player_id: PlayerId,
    },
    PlayerUpdate(Player),
    ProjectileSpawned(Projectile),
    PickupTaken {
        pickup_id: PickupId,
        player: Player,
    },
    PlayerHit {
        victim_id: PlayerId,
        hp: i32,
        attacker_id: PlayerId,
    },
    PlayerDied {
        victim_id: PlayerId,
        killer_id: PlayerId,
    },
}

/// Full copy of the world taken at the end of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub players: Vec<Player>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
}
