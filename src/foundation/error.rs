/// Convenience result type used across vjmix.
pub type VjResult<T> = Result<T, VjError>;

/// Top-level error taxonomy used by mixer APIs.
#[derive(thiserror::Error, Debug)]
pub enum VjError {
    /// Invalid operation input (unknown ids, out-of-range indices, exceeded caps).
    #[error("validation error: {0}")]
    Validation(String),

    /// A media source could not be read or decoded.
    #[error("media error: {0}")]
    Media(String),

    /// Errors while rasterizing a frame plan.
    #[error("render error: {0}")]
    Render(String),

    /// Capture could not be started, fed, or finalized.
    #[error("capture error: {0}")]
    Capture(String),

    /// Errors when serializing or deserializing snapshots and configs.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VjError {
    /// Build a [`VjError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VjError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`VjError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`VjError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`VjError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for VjError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
