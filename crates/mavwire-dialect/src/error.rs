/// Errors that can occur while building or querying dialects.
#[derive(Debug, thiserror::Error)]
pub enum DialectError {
    /// No registered dialect defines the message id.
    #[error("unknown message id {0}")]
    UnknownMessage(u8),

    /// A dialect defines the same message id more than once.
    #[error("dialect {dialect:?} defines message id {id} more than once")]
    DuplicateMessage { dialect: String, id: u8 },

    /// The dialect file could not be loaded.
    #[error("failed to load dialect: {0}")]
    LoadFailed(String),

    /// The dialect document is not valid JSON or has the wrong shape.
    #[error("invalid dialect document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DialectError>;
