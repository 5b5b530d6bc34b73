//! Rendering seam: the scene engine capability, compositor graph and debug overlays.

pub mod engine;
pub mod graph;
pub mod overlay;
