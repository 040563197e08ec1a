//! Boundary with the document repository.
//!
//! The engine only reads through these traits. Storage, sessions and ACL
//! persistence formats live on the other side.

use std::fmt;

use thiserror::Error;

use crate::acl::AclLayer;

/// A document handle as returned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document {
    /// Human-readable title
    pub title: String,
    /// Absolute path, unique within the repository
    pub path: String,
}

impl Document {
    /// Creates a document handle.
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
        }
    }
}

/// Error reported by a repository call.
///
/// # Examples
///
/// ```
/// use acl_audit::{RepositoryError, RepositoryErrorKind};
///
/// let error = RepositoryError::new(RepositoryErrorKind::NotFound, "/missing");
/// assert_eq!(error.kind(), RepositoryErrorKind::NotFound);
/// assert_eq!(error.to_string(), "not found: /missing");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RepositoryError {
    kind: RepositoryErrorKind,
    message: String,
}

impl RepositoryError {
    /// Creates a new repository error.
    pub fn new(kind: RepositoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> RepositoryErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Kind of repository error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryErrorKind {
    /// The document does not exist (or no longer exists)
    NotFound,
    /// The document exists but its data could not be read
    Unreadable,
    /// The backend itself failed
    Backend,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Unreadable => write!(f, "unreadable"),
            Self::Backend => write!(f, "backend failure"),
        }
    }
}

/// Read access to a document tree.
///
/// Calls are blocking. The repository is expected to present a consistent
/// snapshot for the duration of one audit run.
pub trait Repository {
    /// Returns the direct children of `parent`, in repository order.
    fn children(&self, parent: &Document) -> Result<Vec<Document>, RepositoryError>;

    /// Returns the ACL layers attached to `document`.
    fn acl_layers(&self, document: &Document) -> Result<Vec<AclLayer>, RepositoryError>;

    /// Opens a flat, paginated cursor over every descendant of `root`.
    ///
    /// The root itself is not part of the cursor. Pages need not follow
    /// hierarchical order.
    fn paged_descendants<'a>(
        &'a self,
        root: &Document,
        page_size: usize,
    ) -> Result<Box<dyn PageCursor + 'a>, RepositoryError>;
}

/// Cursor over pages of documents.
///
/// A freshly opened cursor is positioned on its first page.
pub trait PageCursor {
    /// Returns the documents of the current page.
    fn current_page(&self) -> &[Document];

    /// Returns true if another page follows the current one.
    fn has_next(&self) -> bool;

    /// Moves to the next page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the next page cannot be fetched.
    fn advance(&mut self) -> Result<(), RepositoryError>;
}
