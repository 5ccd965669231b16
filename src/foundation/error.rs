/// Convenience result type used across adreel.
pub type AdreelResult<T> = Result<T, AdreelError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// `Fetch` and `Render` are recoverable: the fetcher and the overlay compositor absorb them
/// into fallback values, so they never end a job. Every other variant is fatal for the job
/// that raised it.
#[derive(thiserror::Error, Debug)]
pub enum AdreelError {
    /// An image source could not be retrieved, decoded or validated.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The text rendering backend could not produce an overlay.
    #[error("render error: {0}")]
    Render(String),

    /// Caller input violates the media contract (empty scene list, bad duration/fps,
    /// frame resolution mismatch).
    #[error("media shape error: {0}")]
    MediaShape(String),

    /// The video writer could not be opened, fed, flushed or published.
    #[error("encode error: {0}")]
    Encode(String),

    /// The job was stopped cooperatively at a scene boundary.
    #[error("job cancelled")]
    Cancelled,

    /// Unusable configuration or manifest data.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdreelError {
    /// Build a [`AdreelError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`AdreelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`AdreelError::MediaShape`] value.
    pub fn media_shape(msg: impl Into<String>) -> Self {
        Self::MediaShape(msg.into())
    }

    /// Build a [`AdreelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`AdreelError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable, machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Render(_) => "render",
            Self::MediaShape(_) => "media_shape",
            Self::Encode(_) => "encode",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }

    /// Return `true` when this error ends the job that raised it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Fetch(_) | Self::Render(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
