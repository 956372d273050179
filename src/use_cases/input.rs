// Input gateway: validates player commands against the world and applies them.
//
// Every rejection is a silent no-op. Positions and pickup intent are client-reported;
// `InputValidation` can tighten that without changing what gets broadcast.

use crate::domain::tuning::Tuning;
use crate::domain::{PlayerCommand, PlayerId, Projectile, World};
use crate::use_cases::types::GameUpdate;
use tracing::debug;

/// Applies one command and returns the update to multicast, if any.
///
/// Accepted moves return `None`: they reach clients through the next world snapshot.
pub fn apply_command(
    world: &mut World,
    tuning: &Tuning,
    player_id: PlayerId,
    command: PlayerCommand,
) -> Option<GameUpdate> {
    match command {
        PlayerCommand::Move { x, y, dir } => {
            apply_move(world, tuning, player_id, x, y, dir);
            None
        }
        PlayerCommand::Shoot { x, y, angle } => apply_shoot(world, tuning, player_id, x, y, angle),
        PlayerCommand::Pickup { pickup_id } => apply_pickup(world, tuning, player_id, &pickup_id),
        PlayerCommand::UseMedkit => apply_medkit(world, tuning, player_id),
    }
}

fn apply_move(world: &mut World, tuning: &Tuning, player_id: PlayerId, x: f32, y: f32, dir: f32) {
    let Some(player) = world.player_mut(player_id).filter(|p| p.alive) else {
        return;
    };

    let (x, y) = if tuning.validation.clamp_moves {
        tuning.world.bounds().clamp(x, y)
    } else {
        (x, y)
    };
    player.x = x;
    player.y = y;
    player.dir = dir;
}

fn apply_shoot(
    world: &mut World,
    tuning: &Tuning,
    player_id: PlayerId,
    x: f32,
    y: f32,
    angle: f32,
) -> Option<GameUpdate> {
    let player = world.player_mut(player_id).filter(|p| p.alive)?;
    if player.inventory.ammo == 0 {
        debug!(player_id, "shoot rejected: out of ammo");
        return None;
    }
    player.inventory.ammo -= 1;

    let speed = tuning.projectile.speed;
    let projectile = Projectile {
        id: world.allocate_projectile_id(),
        owner_id: player_id,
        x,
        y,
        vx: angle.cos() * speed,
        vy: angle.sin() * speed,
        life_ms: tuning.projectile.life_time_ms,
    };
    world.insert_projectile(projectile.clone());
    Some(GameUpdate::ProjectileSpawned(projectile))
}

fn apply_pickup(
    world: &mut World,
    tuning: &Tuning,
    player_id: PlayerId,
    pickup_id: &str,
) -> Option<GameUpdate> {
    let (px, py) = world
        .player(player_id)
        .filter(|p| p.alive)
        .map(|p| (p.x, p.y))?;
    let pickup = world.pickup_mut(pickup_id).filter(|p| !p.taken)?;

    if let Some(range) = tuning.validation.pickup_range {
        let dx = pickup.x - px;
        let dy = pickup.y - py;
        if dx * dx + dy * dy > range * range {
            debug!(player_id, pickup_id, "pickup rejected: out of range");
            return None;
        }
    }

    pickup.taken = true;
    let amount = pickup.amount;

    let player = world.player_mut(player_id)?;
    player.heal(amount, tuning.player.max_hp);
    player.inventory.medkits += 1;

    Some(GameUpdate::PickupTaken {
        pickup_id: pickup_id.to_string(),
        player: player.clone(),
    })
}

fn apply_medkit(world: &mut World, tuning: &Tuning, player_id: PlayerId) -> Option<GameUpdate> {
    let player = world.player_mut(player_id).filter(|p| p.alive)?;
    if player.inventory.medkits == 0 {
        return None;
    }
    player.inventory.medkits -= 1;
    player.heal(tuning.player.medkit_heal, tuning.player.max_hp);
    Some(GameUpdate::PlayerUpdate(player.clone()))
}
