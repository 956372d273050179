/// Gameplay tuning for world pickups.

#[derive(Debug, Clone, Copy)]
pub struct PickupTuning {
    /// Number of health pickups seeded at world creation.
    pub count: usize,

    /// Health restored by a health pickup.
    pub health_amount: i32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            count: 12,
            health_amount: 25,
        }
    }
}
