//! Burn-in offsets

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Pixel shift applied to the whole clock face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    pub const CENTER: Offset = Offset { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Produces the next burn-in offset, each axis within `[-max_shift, max_shift]`
pub trait OffsetSource: Send + 'static {
    fn next_offset(&mut self, max_shift: i32) -> Offset;
}

/// Uniformly random offsets
pub struct RandomOffsets {
    rng: StdRng,
}

impl RandomOffsets {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomOffsets {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetSource for RandomOffsets {
    fn next_offset(&mut self, max_shift: i32) -> Offset {
        let max_shift = max_shift.abs();
        Offset {
            x: self.rng.gen_range(-max_shift..=max_shift),
            y: self.rng.gen_range(-max_shift..=max_shift),
        }
    }
}
