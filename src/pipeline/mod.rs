//! Job resolution, input loading and the per-clip phase driver.

pub mod inputs;
pub mod job;
pub mod orchestrator;
