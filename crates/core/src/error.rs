/// Result alias that carries the custom [`StillpointError`] type.
pub type Result<T> = std::result::Result<T, StillpointError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum StillpointError {
    /// Free-form error used for conditions that do not warrant their own
    /// variant, such as an unknown method id requested by the application.
    #[error("{0}")]
    Message(String),
    /// A caller handed a component data it cannot operate on, e.g. a
    /// breathing method with an empty segment list.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around catalog deserialization errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl StillpointError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for StillpointError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for StillpointError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
