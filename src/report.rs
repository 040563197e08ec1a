//! Terminal output of an audit run.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::acl::Principal;
use crate::summary::DocumentSummary;

/// How an audit run ended.
///
/// Only `Success` denotes a complete traversal. The two error statuses are
/// still valid runs whose report is partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Every document was visited
    Success,
    /// The document cap was reached
    ErrorTooManyDocuments,
    /// The time budget was exhausted
    ErrorTooLongProcess,
}

impl Status {
    /// Returns true for [`Status::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "SUCCESS"),
            Status::ErrorTooManyDocuments => write!(f, "ERROR_TOO_MANY_DOCUMENTS"),
            Status::ErrorTooLongProcess => write!(f, "ERROR_TOO_LONG_PROCESS"),
        }
    }
}

/// Immutable result of an audit run.
///
/// Summaries are sorted by path, whatever order the documents were visited in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub(crate) status: Status,
    pub(crate) info: String,
    pub(crate) summaries: Vec<DocumentSummary>,
    pub(crate) principals: BTreeSet<Principal>,
    pub(crate) permissions: BTreeSet<String>,
    pub(crate) min_depth: usize,
    pub(crate) max_depth: usize,
    pub(crate) count: usize,
}

impl AuditReport {
    /// Returns how the run ended.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the human-readable explanation of the status.
    pub fn info(&self) -> &str {
        &self.info
    }

    /// Returns true if the whole tree was audited.
    pub fn is_complete(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the document summaries, sorted by path.
    pub fn summaries(&self) -> &[DocumentSummary] {
        &self.summaries
    }

    /// Returns the summary for `path`, if it was audited.
    pub fn summary(&self, path: &str) -> Option<&DocumentSummary> {
        self.summaries
            .binary_search_by(|s| s.path().cmp(path))
            .ok()
            .map(|i| &self.summaries[i])
    }

    /// Returns the summaries of documents blocking inheritance.
    pub fn locked_documents(&self) -> impl Iterator<Item = &DocumentSummary> {
        self.summaries.iter().filter(|s| s.acl_lock_inheritance())
    }

    /// Returns every principal recorded anywhere in the tree.
    pub fn principals(&self) -> &BTreeSet<Principal> {
        &self.principals
    }

    /// Returns every permission recorded anywhere in the tree.
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Returns the smallest depth seen.
    pub fn min_depth(&self) -> usize {
        self.min_depth
    }

    /// Returns the largest depth seen.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the number of audited documents.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditReport[status={}, documents={}, depth={}..{}, principals={}, permissions={}, locked={}]",
            self.status,
            self.count,
            self.min_depth,
            self.max_depth,
            self.principals.len(),
            self.permissions.len(),
            self.locked_documents().count()
        )
    }
}
