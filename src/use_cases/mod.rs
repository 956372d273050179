// Use cases layer: application workflows for the arena server.

pub mod broadcast;
pub mod game;
pub mod input;
pub mod session;
pub mod types;

pub use game::{Game, WorldSettings, world_task};
pub use types::{GameEvent, GameUpdate, Outbox, WorldSnapshot};
