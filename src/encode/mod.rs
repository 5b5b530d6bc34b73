//! Packaging of finished clips: videos, frame archives and annotations.

pub mod ffmpeg;
