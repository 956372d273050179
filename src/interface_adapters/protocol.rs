// Wire protocol DTOs and conversions for the arena WebSocket.
//
// Every frame is `{"type": <event>, "data": <payload>}`. Ids travel as strings.

use crate::domain::{Inventory, Pickup, PickupKind, Player, PlayerCommand, Projectile};
use crate::use_cases::{GameUpdate, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_PICKUP_ID_LEN: usize = 64;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Private bootstrap for a freshly joined session.
    Init(InitDto),
    PlayerJoined(PlayerDto),
    // Departed player id.
    PlayerLeft(String),
    PlayerUpdate(PlayerDto),
    BulletSpawn(ProjectileDto),
    PickupTaken(PickupTakenDto),
    PlayerHit(PlayerHitDto),
    PlayerDied(PlayerDiedDto),
    // Full world copy, once per tick.
    WorldState(WorldStateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    PlayerInput(PlayerInputDto),
    Shoot(ShootDto),
    // Pickup id the client claims to be touching.
    Pickup(String),
    UseMedkit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInputDto {
    pub x: f32,
    pub y: f32,
    pub dir: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShootDto {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

impl ClientMessage {
    /// Converts to a domain command, or `None` if the payload carries unusable values
    /// (non-finite numbers, empty or oversized pickup ids).
    pub fn into_command(self) -> Option<PlayerCommand> {
        match self {
            ClientMessage::PlayerInput(PlayerInputDto { x, y, dir }) => {
                all_finite(&[x, y, dir]).then_some(PlayerCommand::Move { x, y, dir })
            }
            ClientMessage::Shoot(ShootDto { x, y, angle }) => {
                all_finite(&[x, y, angle]).then_some(PlayerCommand::Shoot { x, y, angle })
            }
            ClientMessage::Pickup(pickup_id) => {
                if pickup_id.is_empty() || pickup_id.len() > MAX_PICKUP_ID_LEN {
                    return None;
                }
                Some(PlayerCommand::Pickup { pickup_id })
            }
            ClientMessage::UseMedkit => Some(PlayerCommand::UseMedkit),
        }
    }
}

fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryDto {
    pub ammo: u32,
    pub medkit: u32,
}

impl From<Inventory> for InventoryDto {
    fn from(inventory: Inventory) -> Self {
        Self {
            ammo: inventory.ammo,
            medkit: inventory.medkits,
        }
    }
}

/// Full public player record.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub dir: f32,
    pub hp: i32,
    pub name: String,
    pub inventory: InventoryDto,
    pub alive: bool,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.to_string(),
            x: player.x,
            y: player.y,
            dir: player.dir,
            hp: player.hp,
            name: player.name.clone(),
            inventory: player.inventory.into(),
            alive: player.alive,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileDto {
    pub id: String,
    pub owner: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    // Remaining lifetime in milliseconds.
    pub life: f32,
}

impl From<&Projectile> for ProjectileDto {
    fn from(projectile: &Projectile) -> Self {
        Self {
            id: format!("b{}", projectile.id),
            owner: projectile.owner_id.to_string(),
            x: projectile.x,
            y: projectile.y,
            vx: projectile.vx,
            vy: projectile.vy,
            life: projectile.life_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub amount: i32,
    pub taken: bool,
}

impl From<&Pickup> for PickupDto {
    fn from(pickup: &Pickup) -> Self {
        Self {
            id: pickup.id.clone(),
            x: pickup.x,
            y: pickup.y,
            kind: match pickup.kind {
                PickupKind::Health => "health",
            },
            amount: pickup.amount,
            taken: pickup.taken,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitDto {
    pub id: String,
    pub players: BTreeMap<String, PlayerDto>,
    pub pickups: BTreeMap<String, PickupDto>,
}

/// Public slice of the taker's state carried by `pickupTaken`.
#[derive(Debug, Clone, Serialize)]
pub struct PickupTakerDto {
    pub id: String,
    pub hp: i32,
    pub inventory: InventoryDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupTakenDto {
    pub pickup_id: String,
    pub by: String,
    pub player: PickupTakerDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerHitDto {
    pub id: String,
    pub hp: i32,
    pub by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDiedDto {
    pub id: String,
    pub by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldStateDto {
    pub tick: u64,
    pub players: BTreeMap<String, PlayerDto>,
    pub bullets: BTreeMap<String, ProjectileDto>,
    pub pickups: BTreeMap<String, PickupDto>,
}

fn players_by_id<'a>(players: impl IntoIterator<Item = &'a Player>) -> BTreeMap<String, PlayerDto> {
    players
        .into_iter()
        .map(|p| (p.id.to_string(), PlayerDto::from(p)))
        .collect()
}

fn pickups_by_id<'a>(pickups: impl IntoIterator<Item = &'a Pickup>) -> BTreeMap<String, PickupDto> {
    pickups
        .into_iter()
        .map(|p| (p.id.clone(), PickupDto::from(p)))
        .collect()
}

impl From<&WorldSnapshot> for WorldStateDto {
    fn from(snapshot: &WorldSnapshot) -> Self {
        Self {
            tick: snapshot.tick,
            players: players_by_id(&snapshot.players),
            bullets: snapshot
                .projectiles
                .iter()
                .map(ProjectileDto::from)
                .map(|b| (b.id.clone(), b))
                .collect(),
            pickups: pickups_by_id(&snapshot.pickups),
        }
    }
}

impl From<&WorldSnapshot> for ServerMessage {
    fn from(snapshot: &WorldSnapshot) -> Self {
        ServerMessage::WorldState(snapshot.into())
    }
}

impl From<&GameUpdate> for ServerMessage {
    fn from(update: &GameUpdate) -> Self {
        match update {
            GameUpdate::Init {
                player_id,
                players,
                pickups,
            } => ServerMessage::Init(InitDto {
                id: player_id.to_string(),
                players: players_by_id(players),
                pickups: pickups_by_id(pickups),
            }),
            GameUpdate::PlayerJoined(player) => ServerMessage::PlayerJoined(player.into()),
            GameUpdate::PlayerLeft { player_id } => ServerMessage::PlayerLeft(player_id.to_string()),
            GameUpdate::PlayerUpdate(player) => ServerMessage::PlayerUpdate(player.into()),
            GameUpdate::ProjectileSpawned(projectile) => {
                ServerMessage::BulletSpawn(projectile.into())
            }
            GameUpdate::PickupTaken { pickup_id, player } => {
                ServerMessage::PickupTaken(PickupTakenDto {
                    pickup_id: pickup_id.clone(),
                    by: player.id.to_string(),
                    player: PickupTakerDto {
                        id: player.id.to_string(),
                        hp: player.hp,
                        inventory: player.inventory.into(),
                    },
                })
            }
            GameUpdate::PlayerHit {
                victim_id,
                hp,
                attacker_id,
            } => ServerMessage::PlayerHit(PlayerHitDto {
                id: victim_id.to_string(),
                hp: *hp,
                by: attacker_id.to_string(),
            }),
            GameUpdate::PlayerDied {
                victim_id,
                killer_id,
            } => ServerMessage::PlayerDied(PlayerDiedDto {
                id: victim_id.to_string(),
                by: killer_id.to_string(),
            }),
        }
    }
}
