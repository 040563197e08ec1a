use thiserror::Error;

use crate::repository::RepositoryError;

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an audit run.
///
/// Hitting the document cap or the time budget is not an error: those runs
/// end with a partial report and a non-success [`Status`](crate::Status).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The configuration leaves no room to run; raised before any document is read
    #[error("invalid audit configuration: {0}")]
    InvalidConfig(String),

    /// Reading one document (its ACL or its children) failed
    #[error("failed to audit '{path}': {source}")]
    Document {
        /// Path of the document being read
        path: String,
        /// Underlying repository failure
        #[source]
        source: RepositoryError,
    },

    /// The repository failed outside of a single document (e.g. paging)
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl Error {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }

    pub(crate) fn document(path: impl Into<String>, source: RepositoryError) -> Self {
        Error::Document {
            path: path.into(),
            source,
        }
    }
}
