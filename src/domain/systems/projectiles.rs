use crate::domain::state::CombatEvent;
use crate::domain::world::World;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct ProjectileConfig {
    pub hit_radius: f32,
    pub damage: i32,
    pub max_hp: i32,
}

/// Advances every projectile by one tick of `dt` seconds and resolves hits.
///
/// A projectile hits the first alive non-owner player (ascending id) whose center comes
/// within the hit radius anywhere along the segment it travelled this tick. Expired
/// projectiles are dropped after the hit check, so a projectile can still land a hit on
/// its final tick.
pub fn tick_projectiles(world: &mut World, dt: f32, cfg: ProjectileConfig) -> Vec<CombatEvent> {
    let (players, projectiles) = world.combat_parts();
    let dt_ms = dt * 1000.0;
    let hit_radius_sq = cfg.hit_radius * cfg.hit_radius;
    let mut events = Vec::new();

    projectiles.retain(|_, p| {
        let from = (p.x, p.y);
        p.x += p.vx * dt;
        p.y += p.vy * dt;
        p.life_ms -= dt_ms;

        // Projectile vs player collision (naive O(P*E)).
        let victim = players
            .values_mut()
            .filter(|e| e.alive && e.id != p.owner_id)
            .find(|e| segment_distance_sq(from, (p.x, p.y), (e.x, e.y)) < hit_radius_sq);

        let Some(victim) = victim else {
            if p.life_ms <= 0.0 {
                debug!(projectile_id = p.id, "projectile expired");
                return false;
            }
            return true;
        };

        let killed = victim.take_damage(cfg.damage, cfg.max_hp);
        info!(
            victim_id = victim.id,
            shooter_id = p.owner_id,
            projectile_id = p.id,
            victim_hp = victim.hp,
            killed,
            "player hit"
        );
        events.push(if killed {
            CombatEvent::Died {
                victim_id: victim.id,
                killer_id: p.owner_id,
            }
        } else {
            CombatEvent::Hit {
                victim_id: victim.id,
                hp: victim.hp,
                attacker_id: p.owner_id,
            }
        });
        false
    });

    events
}

// Squared distance from `point` to the closest point of the segment `from`..`to`.
fn segment_distance_sq(from: (f32, f32), to: (f32, f32), point: (f32, f32)) -> f32 {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((point.0 - from.0) * dx + (point.1 - from.1) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = from.0 + t * dx - point.0;
    let cy = from.1 + t * dy - point.1;
    cx * cx + cy * cy
}
