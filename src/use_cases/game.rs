use super::broadcast::Broadcaster;
use super::input::apply_command;
use super::session::{despawn_player, spawn_player};
use super::types::{GameEvent, GameUpdate, WorldSnapshot};
use crate::domain::systems::projectiles::{self, ProjectileConfig};
use crate::domain::tuning::Tuning;
use crate::domain::{CombatEvent, World};
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Settings for a single arena world.
#[derive(Debug, Clone, Copy)]
pub struct WorldSettings {
    /// Fixed tick interval for the simulation loop.
    pub tick_interval: Duration,
    /// Gameplay tuning applied to every rule.
    pub tuning: Tuning,
}

/// The authoritative arena: world store plus the broadcaster observing it.
///
/// Only the world task touches this, so every event and every tick is applied as one
/// uninterrupted operation.
pub struct Game {
    world: World,
    broadcaster: Broadcaster,
    settings: WorldSettings,
    rng: StdRng,
    tick: u64,
}

impl Game {
    pub fn new(
        settings: WorldSettings,
        world_tx: broadcast::Sender<Arc<WorldSnapshot>>,
        mut rng: StdRng,
    ) -> Self {
        let world = World::seeded(&mut rng, &settings.tuning.world, &settings.tuning.pickup);
        Self {
            world,
            broadcaster: Broadcaster::new(world_tx),
            settings,
            rng,
            tick: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn handle_event(&mut self, ev: GameEvent) {
        match ev {
            GameEvent::Join { player_id, outbox } => {
                let tuning = &self.settings.tuning;
                let Some(player) = spawn_player(
                    &mut self.world,
                    &mut self.rng,
                    player_id,
                    &tuning.player,
                    &tuning.world,
                ) else {
                    // Dropping the outbox closes the duplicate connection.
                    warn!(player_id, "duplicate join rejected");
                    return;
                };
                info!(player_id, name = %player.name, x = player.x, y = player.y, "player joined");

                self.broadcaster.register(player_id, outbox);
                self.broadcaster.unicast(
                    player_id,
                    GameUpdate::Init {
                        player_id,
                        players: self.world.players().cloned().collect(),
                        pickups: self.world.pickups().cloned().collect(),
                    },
                );
                self.broadcaster
                    .multicast_except(player_id, GameUpdate::PlayerJoined(player));
            }
            GameEvent::Leave { player_id } => {
                self.broadcaster.deregister(player_id);
                if despawn_player(&mut self.world, player_id).is_some() {
                    info!(player_id, "player left");
                    self.broadcaster
                        .multicast(GameUpdate::PlayerLeft { player_id });
                }
            }
            GameEvent::Input { player_id, command } => {
                if let Some(update) =
                    apply_command(&mut self.world, &self.settings.tuning, player_id, command)
                {
                    self.broadcaster.multicast(update);
                }
            }
        }
    }

    /// Runs one simulation step and publishes the resulting snapshot.
    pub fn tick(&mut self) {
        let tuning = &self.settings.tuning;
        let dt = self.settings.tick_interval.as_secs_f32();

        let events = projectiles::tick_projectiles(
            &mut self.world,
            dt,
            ProjectileConfig {
                hit_radius: tuning.projectile.hit_radius,
                damage: tuning.projectile.damage,
                max_hp: tuning.player.max_hp,
            },
        );
        for event in events {
            self.broadcaster.multicast(match event {
                CombatEvent::Hit {
                    victim_id,
                    hp,
                    attacker_id,
                } => GameUpdate::PlayerHit {
                    victim_id,
                    hp,
                    attacker_id,
                },
                CombatEvent::Died {
                    victim_id,
                    killer_id,
                } => {
                    info!(victim_id, killer_id, "player died");
                    GameUpdate::PlayerDied {
                        victim_id,
                        killer_id,
                    }
                }
            });
        }

        self.tick += 1;
        self.broadcaster.publish_snapshot(self.snapshot());
    }

    fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            players: self.world.players().cloned().collect(),
            projectiles: self.world.projectiles().cloned().collect(),
            pickups: self.world.pickups().cloned().collect(),
        }
    }
}

/// Owns the game and serializes every mutation: inbound events as they arrive, and
/// one simulation step per tick. Exits when all input senders are gone.
pub async fn world_task(mut input_rx: mpsc::Receiver<GameEvent>, mut game: Game) {
    // Drive the fixed-step game loop at the configured tick rate. `Skip` keeps ticks on
    // the fixed schedule after a stall instead of bursting or drifting.
    let mut interval = tokio::time::interval(game.settings.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        tick_ms = game.settings.tick_interval.as_millis() as u64,
        pickups = game.world.pickups().count(),
        "world task started"
    );

    loop {
        tokio::select! {
            // Ticks first so an input flood cannot delay the simulation.
            biased;
            _ = interval.tick() => {
                game.tick();
                if game.tick % 200 == 0 {
                    debug!(
                        tick = game.tick,
                        players = game.world.player_count(),
                        projectiles = game.world.projectiles().count(),
                        sessions = game.broadcaster.session_count(),
                        "world status"
                    );
                }
            }
            ev = input_rx.recv() => {
                match ev {
                    Some(ev) => game.handle_event(ev),
                    None => {
                        info!("input channel closed; world task exiting");
                        break;
                    }
                }
            }
        }
    }
}
