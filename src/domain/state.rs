// Domain-level simulation entities and player commands.

pub type PlayerId = u64;
pub type ProjectileId = u64;
pub type PickupId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inventory {
    pub ammo: u32,
    pub medkits: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    // Facing direction in radians.
    pub dir: f32,
    pub hp: i32,
    pub name: String,
    pub inventory: Inventory,
    pub alive: bool,
}

impl Player {
    /// Applies damage and keeps `hp == 0` iff `!alive`.
    ///
    /// Returns `true` when this damage killed the player.
    pub fn take_damage(&mut self, amount: i32, max_hp: i32) -> bool {
        self.hp -= amount;
        if self.hp <= 0 {
            self.hp = 0;
            self.alive = false;
            true
        } else {
            self.hp = self.hp.clamp(0, max_hp);
            false
        }
    }

    /// Restores health up to `max_hp`. Dead players are never healed back to life.
    pub fn heal(&mut self, amount: i32, max_hp: i32) {
        if !self.alive {
            return;
        }
        self.hp = (self.hp + amount).clamp(0, max_hp);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    // Remaining lifetime in milliseconds.
    pub life_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    Health,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: PickupId,
    pub x: f32,
    pub y: f32,
    pub kind: PickupKind,
    // Health restored when taken.
    pub amount: i32,
    // One-shot: never flips back to false.
    pub taken: bool,
}

/// A validated-shape request from a connected player.
///
/// Numbers are guaranteed finite by the connection adapter; game preconditions
/// (alive, ammo, ...) are checked by the input gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Move { x: f32, y: f32, dir: f32 },
    Shoot { x: f32, y: f32, angle: f32 },
    Pickup { pickup_id: PickupId },
    UseMedkit,
}

/// Outcome of a projectile hit resolved during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    Hit {
        victim_id: PlayerId,
        hp: i32,
        attacker_id: PlayerId,
    },
    Died {
        victim_id: PlayerId,
        killer_id: PlayerId,
    },
}
