/// Gameplay tuning for projectiles.

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Projectile speed in pixels per second.
    pub speed: f32,

    /// Lifetime in milliseconds before the projectile is despawned.
    pub life_time_ms: f32,

    /// Center-to-center distance below which a projectile hits a player.
    pub hit_radius: f32,

    /// Health removed per hit.
    pub damage: i32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 600.0,
            life_time_ms: 2000.0,
            hit_radius: 20.0,
            damage: 20,
        }
    }
}
