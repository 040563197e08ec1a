use std::fmt;

/// Run-scoped logger.
///
/// Every message carries the path of the audited root so that interleaved
/// runs can be told apart. Messages go through `tracing` under the
/// `acl_audit` target; installing a subscriber is left to the application.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AuditLog<'a> {
    root: &'a str,
}

impl<'a> AuditLog<'a> {
    /// Creates a logger for the run rooted at `root`.
    pub(crate) fn new(root: &'a str) -> Self {
        Self { root }
    }

    pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "acl_audit", root = %self.root, "{}", args);
    }

    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "acl_audit", root = %self.root, "{}", args);
    }

    pub(crate) fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "acl_audit", root = %self.root, "{}", args);
    }
}
