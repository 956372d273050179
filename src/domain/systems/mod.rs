// Pure per-tick simulation systems.

pub mod projectiles;
