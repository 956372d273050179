// Gameplay tuning, kept separate from runtime/server configuration.

pub mod pickup;
pub mod player;
pub mod projectile;
pub mod world;

pub use pickup::PickupTuning;
pub use player::PlayerTuning;
pub use projectile::ProjectileTuning;
pub use world::{Rect, WorldTuning};

/// All gameplay knobs the world task needs, bundled for injection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub pickup: PickupTuning,
    pub world: WorldTuning,
    pub validation: InputValidation,
}

/// Optional server-side checks layered on top of the baseline trust model.
///
/// Both checks are off by default: clients self-report positions and pickup intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputValidation {
    /// Maximum player-to-pickup distance accepted for a pickup request.
    pub pickup_range: Option<f32>,
    /// Clamp reported move positions into the world rectangle.
    pub clamp_moves: bool,
}
