// Network adapter for client WebSocket sessions.

pub mod client;

pub use client::{spawn_world_serializer, world_update_serializer, ws_handler};
