use std::collections::BTreeSet;

use crate::acl::Principal;
use crate::report::{AuditReport, Status};
use crate::summary::DocumentSummary;

/// Running state of one audit run.
#[derive(Debug, Default)]
struct AuditState {
    principals: BTreeSet<Principal>,
    permissions: BTreeSet<String>,
    summaries: Vec<DocumentSummary>,
    depth: Option<(usize, usize)>,
    count: usize,
}

/// Accumulates document summaries into an [`AuditReport`].
///
/// Summaries are appended in visit order and sorted once, at
/// [`finalize`](Self::finalize).
///
/// # Example
///
/// ```
/// use acl_audit::{extract, AcceptAll, Ace, AclLayer, AuditAggregator, Document, Status};
///
/// let mut aggregator = AuditAggregator::new();
/// let layers = vec![AclLayer::local(vec![Ace::grant("bob", "READ")])];
/// aggregator.on_document(extract::summarize(&Document::new("/b", "B"), 1, &layers, &AcceptAll));
/// aggregator.on_document(extract::summarize(&Document::new("/", "Root"), 0, &[], &AcceptAll));
///
/// let report = aggregator.finalize(Status::Success, "done");
/// assert_eq!(report.count(), 2);
/// assert_eq!(report.summaries()[0].path(), "/");
/// assert!(report.principals().contains("bob"));
/// ```
#[derive(Debug, Default)]
pub struct AuditAggregator {
    state: AuditState,
}

impl AuditAggregator {
    /// Creates an aggregator with empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one visited document.
    ///
    /// Must be called exactly once per document, in visit order.
    pub fn on_document(&mut self, summary: DocumentSummary) {
        let state = &mut self.state;
        let mentions = summary.mentions();
        state.principals.extend(mentions.principals);
        state.permissions.extend(mentions.permissions);

        let depth = summary.depth();
        state.depth = Some(match state.depth {
            Some((min, max)) => (min.min(depth), max.max(depth)),
            None => (depth, depth),
        });

        state.summaries.push(summary);
        state.count += 1;
    }

    /// Returns the number of documents recorded so far.
    pub fn count(&self) -> usize {
        self.state.count
    }

    /// Freezes the state into a report.
    ///
    /// Summaries are sorted by path. Calling this again returns an equivalent
    /// report. With no document recorded both depths are 0.
    pub fn finalize(&mut self, status: Status, info: impl Into<String>) -> AuditReport {
        let state = &mut self.state;
        state.summaries.sort_by(|a, b| a.path().cmp(b.path()));
        let (min_depth, max_depth) = state.depth.unwrap_or((0, 0));

        AuditReport {
            status,
            info: info.into(),
            summaries: state.summaries.clone(),
            principals: state.principals.clone(),
            permissions: state.permissions.clone(),
            min_depth,
            max_depth,
            count: state.count,
        }
    }
}
