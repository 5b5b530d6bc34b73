//! Parametric body: the 24-joint rig and the pose/shape solver that drives it.

pub mod rig;
pub mod solver;
