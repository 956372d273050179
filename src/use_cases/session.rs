// Session lifecycle: player creation on join, removal on leave.

use crate::domain::tuning::{PlayerTuning, WorldTuning};
use crate::domain::{Inventory, Player, PlayerId, World};
use rand::Rng;

/// Display name derived from the last four digits of the player id.
pub fn display_name(player_id: PlayerId) -> String {
    format!("Player_{:04}", player_id % 10_000)
}

/// Builds a fresh player at a uniformly random spawn point and inserts it.
///
/// Returns `None` (and leaves the world untouched) if the id is already live.
pub fn spawn_player<R: Rng + ?Sized>(
    world: &mut World,
    rng: &mut R,
    player_id: PlayerId,
    player_tuning: &PlayerTuning,
    world_tuning: &WorldTuning,
) -> Option<Player> {
    if world.player(player_id).is_some() {
        return None;
    }

    let (x, y) = world_tuning.spawn_area().sample(rng);
    let player = Player {
        id: player_id,
        x,
        y,
        dir: 0.0,
        hp: player_tuning.max_hp,
        name: display_name(player_id),
        inventory: Inventory {
            ammo: player_tuning.start_ammo,
            medkits: player_tuning.start_medkits,
        },
        alive: true,
    };
    world.insert_player(player.clone());
    Some(player)
}

/// Removes the player unconditionally. Projectiles it fired stay in flight.
pub fn despawn_player(world: &mut World, player_id: PlayerId) -> Option<Player> {
    world.remove_player(player_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Projectile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn spawned_player_has_default_loadout_inside_spawn_area() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(3);
        let world_tuning = WorldTuning::default();

        let player = spawn_player(
            &mut world,
            &mut rng,
            42,
            &PlayerTuning::default(),
            &world_tuning,
        )
        .expect("fresh id spawns");

        assert_eq!(player.hp, 100);
        assert!(player.alive);
        assert_eq!(player.inventory, Inventory { ammo: 30, medkits: 0 });
        assert_eq!(player.name, "Player_0042");
        assert!(world_tuning.spawn_area().contains(player.x, player.y));
        assert_eq!(world.player(42), Some(&player));
    }

    #[test]
    fn duplicate_id_does_not_overwrite_live_player() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(3);
        let tuning = PlayerTuning::default();
        let world_tuning = WorldTuning::default();

        spawn_player(&mut world, &mut rng, 1, &tuning, &world_tuning);
        if let Some(p) = world.player_mut(1) {
            p.hp = 10;
        }

        assert!(spawn_player(&mut world, &mut rng, 1, &tuning, &world_tuning).is_none());
        assert_eq!(world.player(1).map(|p| p.hp), Some(10));
    }

    #[test]
    fn despawn_keeps_owned_projectiles_in_flight() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(3);
        spawn_player(
            &mut world,
            &mut rng,
            7,
            &PlayerTuning::default(),
            &WorldTuning::default(),
        );
        world.insert_projectile(Projectile {
            id: 1,
            owner_id: 7,
            x: 0.0,
            y: 0.0,
            vx: 1.0,
            vy: 0.0,
            life_ms: 2000.0,
        });

        assert!(despawn_player(&mut world, 7).is_some());
        assert!(world.player(7).is_none());
        assert!(world.projectile(1).is_some());
        assert!(despawn_player(&mut world, 7).is_none());
    }

    #[test]
    fn display_name_uses_last_four_digits() {
        assert_eq!(display_name(1_234_567), "Player_4567");
        assert_eq!(display_name(5), "Player_0005");
    }
}
