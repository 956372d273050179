use rand::Rng;

/// Axis-aligned rectangle in world pixels (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    pub fn clamp(&self, x: f32, y: f32) -> (f32, f32) {
        (x.clamp(self.min_x, self.max_x), y.clamp(self.min_y, self.max_y))
    }

    /// Uniformly samples a point inside the rectangle.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (f32, f32) {
        (
            rng.gen_range(self.min_x..=self.max_x),
            rng.gen_range(self.min_y..=self.max_y),
        )
    }
}

/// World dimensions shared by player spawning and pickup placement.
#[derive(Debug, Clone, Copy)]
pub struct WorldTuning {
    pub width: f32,
    pub height: f32,
    /// Inset from the world edge for pickup placement.
    pub pickup_margin: f32,
    /// Where new players appear.
    pub spawn: Rect,
}

impl WorldTuning {
    pub fn bounds(&self) -> Rect {
        self.inset(0.0)
    }

    pub fn pickup_area(&self) -> Rect {
        self.inset(self.pickup_margin)
    }

    pub fn spawn_area(&self) -> Rect {
        self.spawn
    }

    fn inset(&self, margin: f32) -> Rect {
        Rect {
            min_x: margin,
            max_x: self.width - margin,
            min_y: margin,
            max_y: self.height - margin,
        }
    }
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 900.0,
            pickup_margin: 100.0,
            spawn: Rect {
                min_x: 200.0,
                max_x: 1200.0,
                min_y: 200.0,
                max_y: 600.0,
            },
        }
    }
}
