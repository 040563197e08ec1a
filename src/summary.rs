use serde::Serialize;

use crate::acl::AclView;
use crate::extract::{AclWarning, Mentions};
use crate::repository::Document;

/// Immutable snapshot of one audited document.
///
/// Built by [`extract::summarize`](crate::extract::summarize). `depth` is the
/// number of path segments below the audited root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    title: String,
    path: String,
    depth: usize,
    acl_lock_inheritance: bool,
    local: AclView,
    #[serde(skip_serializing_if = "Option::is_none")]
    inherited: Option<AclView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<AclWarning>,
}

impl DocumentSummary {
    pub(crate) fn new(
        document: &Document,
        depth: usize,
        acl_lock_inheritance: bool,
        local: AclView,
        inherited: Option<AclView>,
        warnings: Vec<AclWarning>,
    ) -> Self {
        Self {
            title: document.title.clone(),
            path: document.path.clone(),
            depth,
            acl_lock_inheritance,
            local,
            inherited,
            warnings,
        }
    }

    /// Returns the document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the document path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the depth below the audited root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if the document blocks inheritance.
    pub fn acl_lock_inheritance(&self) -> bool {
        self.acl_lock_inheritance
    }

    /// Returns the recorded local entries.
    pub fn local(&self) -> &AclView {
        &self.local
    }

    /// Returns the recorded inherited entries, if the document has an inherited layer.
    pub fn inherited(&self) -> Option<&AclView> {
        self.inherited.as_ref()
    }

    /// Returns the ACL anomalies met while summarizing.
    pub fn warnings(&self) -> &[AclWarning] {
        &self.warnings
    }

    /// Principals and permissions recorded in either view.
    pub fn mentions(&self) -> Mentions {
        let mut mentions = Mentions::default();
        for view in std::iter::once(&self.local).chain(self.inherited.as_ref()) {
            for (principal, entries) in view.iter() {
                for entry in entries {
                    mentions.record(principal, &entry.permission);
                }
            }
        }
        mentions
    }
}
