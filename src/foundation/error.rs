/// Convenience result type used across bodysynth.
pub type SynthResult<T> = Result<T, SynthError>;

/// Top-level error taxonomy used by the generation pipeline.
#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    /// Invalid user-provided data: malformed pose vectors, bad config values, mis-shaped tables.
    #[error("validation error: {0}")]
    Validation(String),

    /// A job-level precondition does not hold (missing identifiers, cut index out of range).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The external scene engine rejected or failed a request.
    #[error("engine error: {0}")]
    Engine(String),

    /// A pipeline phase was entered out of order.
    #[error("phase error: {0}")]
    Phase(String),

    /// An external packaging tool (ffmpeg, tar) failed.
    #[error("packaging error: {0}")]
    Package(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SynthError {
    /// Build a [`SynthError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SynthError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`SynthError::Engine`] value.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Build a [`SynthError::Phase`] value.
    pub fn phase(msg: impl Into<String>) -> Self {
        Self::Phase(msg.into())
    }

    /// Build a [`SynthError::Package`] value.
    pub fn package(msg: impl Into<String>) -> Self {
        Self::Package(msg.into())
    }

    /// Build a [`SynthError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
