//! Seeded scene randomization: job seed, draw-ordered randomizer and camera recentering.

pub mod randomizer;
pub mod recenter;
pub mod seed;
