// Domain layer: core simulation types and rules.

pub mod state;
pub mod systems;
pub mod tuning;
pub mod world;

pub use state::{
    CombatEvent, Inventory, Pickup, PickupId, PickupKind, Player, PlayerCommand, PlayerId,
    Projectile, ProjectileId,
};
pub use world::World;
