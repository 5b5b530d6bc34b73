//! Per-frame ground truth: the recorder and its JSON sink.

pub mod record;
pub mod sink;
