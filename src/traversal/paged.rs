use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::{Clock, MonotonicClock, Phase, Visit};
use crate::config::AuditConfig;
use crate::error::{Error, Result};
use crate::logging::AuditLog;
use crate::report::Status;
use crate::repository::{Document, PageCursor, Repository};

/// Number of path segments of `path` below `root`.
///
/// `path` is assumed to be `root` or one of its descendants.
///
/// ```
/// use acl_audit::traversal::relative_depth;
///
/// assert_eq!(relative_depth("/", "/a/b"), 2);
/// assert_eq!(relative_depth("/ws", "/ws/a"), 1);
/// assert_eq!(relative_depth("/ws/", "/ws"), 0);
/// ```
pub fn relative_depth(root: &str, path: &str) -> usize {
    segments(path).saturating_sub(segments(root))
}

fn segments(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

/// Flat, paginated traversal bounded by document count and elapsed time.
///
/// Yields the root first, then every descendant from the repository's
/// paged cursor. Depth is computed from paths since the cursor does not
/// guarantee hierarchical order.
///
/// Limits are checked each time the next document is requested, that is
/// after the previous one has been handed out and aggregated:
///
/// 1. the document cap is reached: [`Status::ErrorTooManyDocuments`]
/// 2. the processing budget (`timeout_seconds - reserved_render_seconds`)
///    is spent: [`Status::ErrorTooLongProcess`]
/// 3. the cursor is exhausted: [`Status::Success`]
///
/// The document that hit a limit is therefore part of the report.
///
/// A path the cursor lists more than once, or the root listed again, is
/// audited once. Repeats are logged and skipped without counting towards
/// the cap.
///
/// # Example
///
/// ```
/// use acl_audit::{AuditConfig, Document, MemoryRepository, PagedTraversal, Status};
///
/// let mut repo = MemoryRepository::new().with_document("/", "Root", vec![]);
/// for i in 0..10 {
///     repo = repo.with_document(format!("/doc-{i}"), "Doc", vec![]);
/// }
///
/// let config = AuditConfig::default().with_page_size(3).with_max_documents(5);
/// let mut traversal = PagedTraversal::new(&repo, &Document::new("/", "Root"), config).unwrap();
///
/// assert_eq!(traversal.by_ref().count(), 5);
/// assert_eq!(traversal.status(), Some(Status::ErrorTooManyDocuments));
/// ```
pub struct PagedTraversal<'a> {
    repository: &'a dyn Repository,
    root: Document,
    config: AuditConfig,
    budget: Option<Duration>,
    clock: &'a dyn Clock,
    started: Instant,
    cursor: Option<Box<dyn PageCursor + 'a>>,
    position: usize,
    seen: HashSet<String>,
    count: usize,
    phase: Phase,
}

impl<'a> PagedTraversal<'a> {
    /// Creates a traversal timed by the monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate. No
    /// document is read in that case.
    pub fn new(
        repository: &'a dyn Repository,
        root: &Document,
        config: AuditConfig,
    ) -> Result<Self> {
        Self::with_clock(repository, root, config, &MonotonicClock)
    }

    /// Creates a traversal timed by `clock`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_clock(
        repository: &'a dyn Repository,
        root: &Document,
        config: AuditConfig,
        clock: &'a dyn Clock,
    ) -> Result<Self> {
        let budget = config.processing_budget()?;
        Ok(Self {
            repository,
            root: root.clone(),
            config,
            budget,
            clock,
            started: clock.now(),
            cursor: None,
            position: 0,
            seen: HashSet::from([root.path.clone()]),
            count: 0,
            phase: Phase::Init,
        })
    }

    /// Terminal status, once the sequence is exhausted.
    pub fn status(&self) -> Option<Status> {
        self.phase.status()
    }

    /// Explanation of the terminal status.
    pub fn info(&self) -> Option<&str> {
        self.phase.info()
    }

    /// Number of documents handed out so far.
    pub fn count(&self) -> usize {
        self.count
    }

    fn visit(&mut self, document: Document) -> Result<Option<Visit>> {
        let layers = self
            .repository
            .acl_layers(&document)
            .map_err(|e| Error::document(&document.path, e))?;
        let depth = relative_depth(&self.root.path, &document.path);
        self.count += 1;
        Ok(Some(Visit {
            document,
            depth,
            layers,
        }))
    }

    fn exceeded_limit(&self) -> Option<Phase> {
        if self.count >= self.config.max_documents {
            return Some(Phase::Stopped {
                status: Status::ErrorTooManyDocuments,
                info: format!(
                    "Reached the maximum of {} documents, the report is partial",
                    self.config.max_documents
                ),
            });
        }
        let budget = self.budget?;
        let elapsed = self.clock.now().saturating_duration_since(self.started);
        (elapsed >= budget).then(|| Phase::Stopped {
            status: Status::ErrorTooLongProcess,
            info: format!(
                "Stopped after {}s and {} documents: the {}s timeout keeps {}s for rendering, the report is partial",
                elapsed.as_secs(),
                self.count,
                self.config.timeout_seconds,
                self.config.reserved_render_seconds
            ),
        })
    }

    fn step(&mut self) -> Result<Option<Visit>> {
        if self.phase == Phase::Init {
            self.phase = Phase::Running;
            let root = self.root.clone();
            return self.visit(root);
        }

        if let Some(stop) = self.exceeded_limit() {
            AuditLog::new(&self.root.path).warn(format_args!(
                "stopping after {} documents: {}",
                self.count,
                stop.info().unwrap_or_default()
            ));
            self.phase = stop;
            return Ok(None);
        }

        if self.cursor.is_none() {
            let cursor = self
                .repository
                .paged_descendants(&self.root, self.config.page_size)?;
            self.cursor = Some(cursor);
        }

        loop {
            let Some(cursor) = self.cursor.as_mut() else {
                return Ok(None);
            };
            if let Some(document) = cursor.current_page().get(self.position).cloned() {
                self.position += 1;
                if !self.seen.insert(document.path.clone()) {
                    AuditLog::new(&self.root.path).warn(format_args!(
                        "skipping {}, already audited in this run",
                        document.path
                    ));
                    continue;
                }
                return self.visit(document);
            }
            if !cursor.has_next() {
                self.phase = Phase::Stopped {
                    status: Status::Success,
                    info: format!("Audited all {} documents", self.count),
                };
                return Ok(None);
            }
            cursor.advance()?;
            self.position = 0;
            AuditLog::new(&self.root.path).debug(format_args!(
                "next page after {} documents",
                self.count
            ));
        }
    }
}

impl Iterator for PagedTraversal<'_> {
    type Item = Result<Visit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.phase.is_finished() {
            return None;
        }
        match self.step() {
            Ok(Some(visit)) => Some(Ok(visit)),
            Ok(None) => None,
            Err(e) => {
                self.phase = Phase::Failed;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::AclLayer;
    use crate::memory::{MemoryCursor, MemoryRepository};
    use crate::repository::{RepositoryError, RepositoryErrorKind};
    use std::cell::Cell;

    type RepoResult<T> = std::result::Result<T, RepositoryError>;

    /// Reads ACLs from `inner` and lists descendants from fixed pages.
    struct Scripted {
        inner: MemoryRepository,
        pages: Vec<Vec<&'static str>>,
        fail_open: bool,
        fail_advance: bool,
    }

    impl Scripted {
        fn new(inner: MemoryRepository, pages: Vec<Vec<&'static str>>) -> Self {
            Self {
                inner,
                pages,
                fail_open: false,
                fail_advance: false,
            }
        }
    }

    struct ScriptedCursor {
        pages: MemoryCursor,
        fail_advance: bool,
    }

    impl PageCursor for ScriptedCursor {
        fn current_page(&self) -> &[Document] {
            self.pages.current_page()
        }

        fn has_next(&self) -> bool {
            self.pages.has_next()
        }

        fn advance(&mut self) -> RepoResult<()> {
            if self.fail_advance {
                return Err(RepositoryError::new(
                    RepositoryErrorKind::Backend,
                    "connection reset",
                ));
            }
            self.pages.advance()
        }
    }

    impl Repository for Scripted {
        fn children(&self, parent: &Document) -> RepoResult<Vec<Document>> {
            self.inner.children(parent)
        }

        fn acl_layers(&self, document: &Document) -> RepoResult<Vec<AclLayer>> {
            self.inner.acl_layers(document)
        }

        fn paged_descendants<'a>(
            &'a self,
            _root: &Document,
            _page_size: usize,
        ) -> RepoResult<Box<dyn PageCursor + 'a>> {
            if self.fail_open {
                return Err(RepositoryError::new(
                    RepositoryErrorKind::Backend,
                    "query rejected",
                ));
            }
            let pages = self
                .pages
                .iter()
                .map(|page| page.iter().map(|path| Document::new(*path, *path)).collect())
                .collect();
            Ok(Box::new(ScriptedCursor {
                pages: MemoryCursor::new(pages),
                fail_advance: self.fail_advance,
            }))
        }
    }

    fn paths(traversal: &mut PagedTraversal<'_>) -> Vec<String> {
        traversal.map(|v| v.unwrap().document.path).collect()
    }

    /// Advances by `step` every time it is read.
    struct SteppingClock {
        base: Instant,
        step: Duration,
        reads: Cell<u32>,
    }

    impl SteppingClock {
        fn new(step: Duration) -> Self {
            Self {
                base: Instant::now(),
                step,
                reads: Cell::new(0),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> Instant {
            let n = self.reads.get();
            self.reads.set(n + 1);
            self.base + self.step * n
        }
    }

    fn flat(n: usize) -> MemoryRepository {
        let mut repo = MemoryRepository::new().with_document("/", "Root", vec![]);
        for i in 0..n {
            repo = repo.with_document(format!("/doc-{i:03}"), "Doc", vec![]);
        }
        repo
    }

    fn root() -> Document {
        Document::new("/", "Root")
    }

    #[test]
    fn relative_depths() {
        assert_eq!(relative_depth("/", "/"), 0);
        assert_eq!(relative_depth("/", "/a"), 1);
        assert_eq!(relative_depth("/a", "/a/b/c"), 2);
        assert_eq!(relative_depth("/a/", "/a/b/"), 1);
    }

    #[test]
    fn walks_every_page() {
        let repo = flat(7);
        let config = AuditConfig::default().with_page_size(3);
        let mut traversal = PagedTraversal::new(&repo, &root(), config).unwrap();

        let paths: Vec<String> = traversal.by_ref().map(|v| v.unwrap().document.path).collect();
        assert_eq!(paths.len(), 8);
        assert_eq!(paths[0], "/");
        assert_eq!(paths[7], "/doc-006");
        assert_eq!(traversal.status(), Some(Status::Success));
        assert_eq!(traversal.info(), Some("Audited all 8 documents"));
    }

    #[test]
    fn root_only_tree_succeeds() {
        let repo = flat(0);
        let mut traversal = PagedTraversal::new(&repo, &root(), AuditConfig::default()).unwrap();
        assert_eq!(traversal.by_ref().count(), 1);
        assert_eq!(traversal.status(), Some(Status::Success));
    }

    #[test]
    fn document_cap_is_inclusive() {
        let repo = flat(10);
        let config = AuditConfig::default().with_page_size(4).with_max_documents(6);
        let mut traversal = PagedTraversal::new(&repo, &root(), config).unwrap();

        assert_eq!(traversal.by_ref().count(), 6);
        assert_eq!(traversal.status(), Some(Status::ErrorTooManyDocuments));
        assert_eq!(repo.acl_reads(), 6);
    }

    #[test]
    fn cap_of_one_audits_only_the_root() {
        let repo = flat(3);
        let config = AuditConfig::default().with_max_documents(1);
        let mut traversal = PagedTraversal::new(&repo, &root(), config).unwrap();

        let visits: Vec<Visit> = traversal.by_ref().map(Result::unwrap).collect();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].depth, 0);
        assert_eq!(traversal.status(), Some(Status::ErrorTooManyDocuments));
    }

    #[test]
    fn time_budget_stops_inclusively() {
        let repo = flat(20);
        // budget of 10s, each clock read advances 3s
        let config = AuditConfig::default().with_timeout(100);
        let clock = SteppingClock::new(Duration::from_secs(3));
        let mut traversal = PagedTraversal::with_clock(&repo, &root(), config, &clock).unwrap();

        assert_eq!(traversal.by_ref().count(), 4);
        assert_eq!(traversal.status(), Some(Status::ErrorTooLongProcess));
        assert!(traversal.info().unwrap().contains("partial"));
    }

    #[test]
    fn document_cap_is_checked_before_time() {
        let repo = flat(20);
        let config = AuditConfig::default().with_timeout(100).with_max_documents(1);
        let clock = SteppingClock::new(Duration::from_secs(60));
        let mut traversal = PagedTraversal::with_clock(&repo, &root(), config, &clock).unwrap();

        assert_eq!(traversal.by_ref().count(), 1);
        assert_eq!(traversal.status(), Some(Status::ErrorTooManyDocuments));
    }

    #[test]
    fn no_timeout_never_reads_the_clock_for_budget() {
        let repo = flat(5);
        let clock = SteppingClock::new(Duration::from_secs(3600));
        let mut traversal =
            PagedTraversal::with_clock(&repo, &root(), AuditConfig::default(), &clock).unwrap();

        assert_eq!(traversal.by_ref().count(), 6);
        assert_eq!(traversal.status(), Some(Status::Success));
        assert_eq!(clock.reads.get(), 1);
    }

    #[test]
    fn invalid_timeout_is_rejected_before_reading() {
        let repo = flat(5);
        let config = AuditConfig::default()
            .with_timeout(60)
            .with_reserved_render_seconds(60);
        let result = PagedTraversal::new(&repo, &root(), config);

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        assert_eq!(repo.acl_reads(), 0);
    }

    #[test]
    fn depth_comes_from_paths_not_order() {
        let repo = MemoryRepository::new()
            .with_document("/", "Root", vec![])
            .with_document("/a", "A", vec![])
            .with_document("/a/b", "B", vec![])
            .with_document("/a/b/c", "C", vec![])
            .with_descendant_order(["/a/b/c", "/a", "/a/b"]);
        let traversal = PagedTraversal::new(&repo, &root(), AuditConfig::default()).unwrap();
        let visits: Vec<(String, usize)> = traversal
            .map(|v| {
                let v = v.unwrap();
                (v.document.path, v.depth)
            })
            .collect();

        assert_eq!(
            visits,
            vec![
                ("/".to_string(), 0),
                ("/a/b/c".to_string(), 3),
                ("/a".to_string(), 1),
                ("/a/b".to_string(), 2),
            ]
        );
    }

    #[test]
    fn unreadable_descendant_fails_the_traversal() {
        let repo = flat(3).with_unreadable("/doc-001");
        let mut traversal = PagedTraversal::new(&repo, &root(), AuditConfig::default()).unwrap();

        assert!(traversal.next().unwrap().is_ok());
        assert!(traversal.next().unwrap().is_ok());
        assert!(matches!(
            traversal.next(),
            Some(Err(Error::Document { .. }))
        ));
        assert!(traversal.next().is_none());
        assert_eq!(traversal.status(), None);
    }

    #[test]
    fn repeated_paths_are_audited_once() {
        let repo = Scripted::new(
            flat(2),
            vec![vec!["/", "/doc-000"], vec!["/doc-000", "/doc-001"]],
        );
        let mut traversal = PagedTraversal::new(&repo, &root(), AuditConfig::default()).unwrap();

        assert_eq!(paths(&mut traversal), ["/", "/doc-000", "/doc-001"]);
        assert_eq!(PagedTraversal::count(&traversal), 3);
        assert_eq!(traversal.status(), Some(Status::Success));
        assert_eq!(repo.inner.acl_reads(), 3);
    }

    #[test]
    fn repeats_do_not_count_towards_the_cap() {
        let repo = Scripted::new(
            flat(2),
            vec![vec!["/doc-000", "/doc-000"], vec!["/doc-000", "/doc-001"]],
        );
        let config = AuditConfig::default().with_max_documents(3);
        let mut traversal = PagedTraversal::new(&repo, &root(), config).unwrap();

        assert_eq!(paths(&mut traversal), ["/", "/doc-000", "/doc-001"]);
        assert_eq!(traversal.status(), Some(Status::ErrorTooManyDocuments));
    }

    #[test]
    fn failed_page_fetch_fails_the_traversal() {
        let mut repo = Scripted::new(flat(2), vec![vec!["/doc-000"], vec!["/doc-001"]]);
        repo.fail_advance = true;
        let mut traversal = PagedTraversal::new(&repo, &root(), AuditConfig::default()).unwrap();

        assert!(traversal.next().unwrap().is_ok());
        assert!(traversal.next().unwrap().is_ok());
        match traversal.next() {
            Some(Err(Error::Repository(e))) => assert_eq!(e.kind(), RepositoryErrorKind::Backend),
            other => panic!("expected a repository error, got {other:?}"),
        }
        assert!(traversal.next().is_none());
        assert_eq!(traversal.status(), None);
        assert_eq!(repo.inner.acl_reads(), 2);
    }

    #[test]
    fn failed_cursor_open_fails_after_the_root() {
        let mut repo = Scripted::new(flat(1), vec![vec!["/doc-000"]]);
        repo.fail_open = true;
        let mut traversal = PagedTraversal::new(&repo, &root(), AuditConfig::default()).unwrap();

        assert!(traversal.next().unwrap().is_ok());
        assert!(matches!(traversal.next(), Some(Err(Error::Repository(_)))));
        assert!(traversal.next().is_none());
    }
}
