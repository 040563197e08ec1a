use crate::aggregator::AuditAggregator;
use crate::error::Result;
use crate::extract;
use crate::filter::ContentFilter;
use crate::logging::AuditLog;
use crate::report::{AuditReport, Status};
use crate::repository::{Document, Repository};
use crate::traversal::{Clock, MonotonicClock, Strategy, Traversal};

/// The ACL audit engine.
///
/// Drives one traversal strategy, summarizes every visited document through
/// the extractor and aggregates the summaries into an [`AuditReport`]. The
/// engine only reads: it never changes ACLs and never persists the report.
///
/// # Examples
///
/// ```
/// use acl_audit::{AcceptAll, AclAudit, Ace, AclLayer, Document, MemoryRepository, Status};
///
/// let repo = MemoryRepository::new()
///     .with_document("/", "Root", vec![])
///     .with_document("/a", "A", vec![AclLayer::local(vec![Ace::grant("bob", "READ")])])
///     .with_document(
///         "/a/b",
///         "B",
///         vec![AclLayer::local(vec![Ace::deny("EVERYONE", "EVERYTHING")])],
///     );
///
/// let report = AclAudit::new(&repo, &AcceptAll)
///     .run(&Document::new("/", "Root"))
///     .expect("audit should run");
///
/// assert_eq!(report.status(), Status::Success);
/// assert_eq!(report.count(), 3);
/// assert_eq!(report.max_depth(), 2);
/// assert_eq!(report.locked_documents().count(), 1);
/// ```
pub struct AclAudit<'a> {
    repository: &'a dyn Repository,
    filter: &'a dyn ContentFilter,
    strategy: Strategy,
    clock: &'a dyn Clock,
}

impl<'a> AclAudit<'a> {
    /// Creates an engine using the recursive strategy.
    pub fn new(repository: &'a dyn Repository, filter: &'a dyn ContentFilter) -> Self {
        Self {
            repository,
            filter,
            strategy: Strategy::Recursive,
            clock: &MonotonicClock,
        }
    }

    /// Selects the traversal strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replaces the clock used for time budgets.
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Audits the tree below (and including) `root`.
    ///
    /// Reaching the document cap or the time budget is not an error: the
    /// report is returned with the matching [`Status`] and holds everything
    /// aggregated up to that point.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`](crate::Error::InvalidConfig) before any
    ///   document is read, if the paged configuration cannot run
    /// - [`Error::Document`](crate::Error::Document) or
    ///   [`Error::Repository`](crate::Error::Repository) if the repository
    ///   fails; the run is abandoned and no partial report is produced
    pub fn run(&self, root: &Document) -> Result<AuditReport> {
        let log = AuditLog::new(&root.path);
        let mut traversal = Traversal::new(&self.strategy, self.repository, root, self.clock)?;
        log.info(format_args!("starting ACL audit ({})", self.strategy_name()));

        let mut aggregator = AuditAggregator::new();
        for visit in traversal.by_ref() {
            let visit = visit?;
            log.debug(format_args!(
                "visiting {} at depth {}",
                visit.document.path, visit.depth
            ));
            aggregator.on_document(extract::summarize(
                &visit.document,
                visit.depth,
                &visit.layers,
                self.filter,
            ));
        }

        let status = traversal.status().unwrap_or(Status::Success);
        let info = traversal.info().unwrap_or_default().to_string();
        let report = aggregator.finalize(status, info);
        log.info(format_args!("ACL audit finished: {report}"));
        Ok(report)
    }

    fn strategy_name(&self) -> &'static str {
        match self.strategy {
            Strategy::Recursive => "recursive",
            Strategy::Paged(_) => "paged",
        }
    }
}
