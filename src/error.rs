use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from the terminal, log file or preference file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid configuration value or unusable config location.
    #[error("Config error: {0}")]
    Config(String),

    /// A tree model contract was violated.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors raised synchronously by the tree model and the view layer.
///
/// These signal a caller handing in a stale or malformed path and are
/// never expected during normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("invalid tree snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("no such path: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("name already taken: {0}")]
    DuplicateName(String),

    #[error("invalid name: {0:?}")]
    InvalidName(String),
}

/// Result alias for model and view operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Failures reported by the sync client. Always returned as data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("could not retrieve file tree: {detail}")]
    TreeFetchFailed { detail: String },

    #[error("could not read file: {detail}")]
    FileReadFailed { detail: String, not_found: bool },

    #[error("could not write file: {detail}")]
    FileWriteFailed { detail: String },

    #[error("could not rename file: {detail}")]
    RenameFailed { detail: String },

    #[error("could not delete file: {detail}")]
    DeleteFailed { detail: String },
}

impl SyncError {
    /// The raw message from the boundary that produced this error.
    pub fn detail(&self) -> &str {
        match self {
            SyncError::TreeFetchFailed { detail }
            | SyncError::FileReadFailed { detail, .. }
            | SyncError::FileWriteFailed { detail }
            | SyncError::RenameFailed { detail }
            | SyncError::DeleteFailed { detail } => detail,
        }
    }

    /// Whether a read failed because the server has no such file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::FileReadFailed { not_found: true, .. })
    }
}

/// Low-level failure of a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response body: {0}")]
    Decode(String),
}
