// Authoritative store for every entity in the arena.
//
// Collections are ordered maps so iteration is deterministic (ascending id). The store
// is owned by exactly one world task; nothing else holds a mutable reference to it.

use crate::domain::state::{
    Pickup, PickupId, PickupKind, Player, PlayerId, Projectile, ProjectileId,
};
use crate::domain::tuning::{PickupTuning, WorldTuning};
use rand::Rng;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct World {
    players: BTreeMap<PlayerId, Player>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    pickups: BTreeMap<PickupId, Pickup>,
    next_projectile_id: ProjectileId,
}

impl World {
    pub fn new() -> Self {
        Self {
            next_projectile_id: 1,
            ..Self::default()
        }
    }

    /// Creates a world with `tuning.count` untaken health pickups (`p0`, `p1`, ...)
    /// placed uniformly inside the pickup area.
    pub fn seeded<R: Rng + ?Sized>(rng: &mut R, world: &WorldTuning, tuning: &PickupTuning) -> Self {
        let mut this = Self::new();
        let area = world.pickup_area();
        for i in 0..tuning.count {
            let (x, y) = area.sample(rng);
            this.insert_pickup(Pickup {
                id: format!("p{i}"),
                x,
                y,
                kind: PickupKind::Health,
                amount: tuning.health_amount,
                taken: false,
            });
        }
        this
    }

    // Players.

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Inserts a player, returning the previous record with the same id if any.
    pub fn insert_player(&mut self, player: Player) -> Option<Player> {
        self.players.insert(player.id, player)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    // Projectiles.

    /// Hands out the next projectile id; ids are never reused within a world.
    pub fn allocate_projectile_id(&mut self) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        id
    }

    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    pub fn insert_projectile(&mut self, projectile: Projectile) -> Option<Projectile> {
        self.projectiles.insert(projectile.id, projectile)
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    // Pickups.

    pub fn pickup(&self, id: &str) -> Option<&Pickup> {
        self.pickups.get(id)
    }

    pub fn pickup_mut(&mut self, id: &str) -> Option<&mut Pickup> {
        self.pickups.get_mut(id)
    }

    pub fn insert_pickup(&mut self, pickup: Pickup) -> Option<Pickup> {
        self.pickups.insert(pickup.id.clone(), pickup)
    }

    pub fn pickups(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.values()
    }

    /// Split borrow used by the tick engine to resolve hits while iterating projectiles.
    pub(crate) fn combat_parts(
        &mut self,
    ) -> (
        &mut BTreeMap<PlayerId, Player>,
        &mut BTreeMap<ProjectileId, Projectile>,
    ) {
        (&mut self.players, &mut self.projectiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Inventory;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn player(id: PlayerId) -> Player {
        Player {
            id,
            x: 0.0,
            y: 0.0,
            dir: 0.0,
            hp: 100,
            name: format!("Player_{id}"),
            inventory: Inventory { ammo: 30, medkits: 0 },
            alive: true,
        }
    }

    #[test]
    fn seeding_places_untaken_pickups_inside_the_pickup_area() {
        let mut rng = StdRng::seed_from_u64(1);
        let world_tuning = WorldTuning::default();
        let world = World::seeded(&mut rng, &world_tuning, &PickupTuning::default());

        let pickups: Vec<_> = world.pickups().collect();
        assert_eq!(pickups.len(), 12);
        let area = world_tuning.pickup_area();
        for pickup in pickups {
            assert!(!pickup.taken);
            assert_eq!(pickup.amount, 25);
            assert!(area.contains(pickup.x, pickup.y));
        }
        assert!(world.pickup("p0").is_some());
        assert!(world.pickup("p11").is_some());
        assert!(world.pickup("p12").is_none());
    }

    #[test]
    fn projectile_ids_are_monotonic() {
        let mut world = World::new();
        let a = world.allocate_projectile_id();
        let b = world.allocate_projectile_id();
        assert!(b > a);
    }

    #[test]
    fn players_iterate_in_id_order_and_remove_fully() {
        let mut world = World::new();
        world.insert_player(player(9));
        world.insert_player(player(3));
        world.insert_player(player(5));

        let ids: Vec<_> = world.players().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 5, 9]);

        assert!(world.remove_player(5).is_some());
        assert!(world.player(5).is_none());
        assert_eq!(world.player_count(), 2);
    }
}
