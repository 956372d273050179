/// Gameplay tuning for players.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Health cap and spawn health.
    pub max_hp: i32,

    /// Ammo handed out on spawn.
    pub start_ammo: u32,

    /// Medkits handed out on spawn.
    pub start_medkits: u32,

    /// Health restored by consuming one medkit.
    pub medkit_heal: i32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_hp: 100,
            start_ammo: 30,
            start_medkits: 0,
            medkit_heal: 40,
        }
    }
}
