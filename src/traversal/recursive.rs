use super::{Phase, Visit};
use crate::error::{Error, Result};
use crate::report::Status;
use crate::repository::{Document, Repository};

/// Depth-first, pre-order traversal with no limits.
///
/// Uses an explicit stack seeded with the root at depth 0. The children of a
/// visited document are fetched only when the next item is requested, and
/// siblings come out in the order the repository lists them. Intended for
/// trees small enough to be walked exhaustively: it always ends with
/// [`Status::Success`].
///
/// # Example
///
/// ```
/// use acl_audit::{Document, MemoryRepository, RecursiveTraversal, Status};
///
/// let repo = MemoryRepository::new()
///     .with_document("/", "Root", vec![])
///     .with_document("/a", "A", vec![])
///     .with_document("/a/b", "B", vec![])
///     .with_document("/c", "C", vec![]);
///
/// let mut traversal = RecursiveTraversal::new(&repo, &Document::new("/", "Root"));
/// let paths: Vec<String> = traversal.by_ref().map(|v| v.unwrap().document.path).collect();
///
/// assert_eq!(paths, ["/", "/a", "/a/b", "/c"]);
/// assert_eq!(traversal.status(), Some(Status::Success));
/// ```
pub struct RecursiveTraversal<'a> {
    repository: &'a dyn Repository,
    stack: Vec<(Document, usize)>,
    expand: Option<(Document, usize)>,
    visited: usize,
    phase: Phase,
}

impl<'a> RecursiveTraversal<'a> {
    /// Creates a traversal of the tree below (and including) `root`.
    pub fn new(repository: &'a dyn Repository, root: &Document) -> Self {
        Self {
            repository,
            stack: vec![(root.clone(), 0)],
            expand: None,
            visited: 0,
            phase: Phase::Init,
        }
    }

    /// Terminal status, once the sequence is exhausted.
    pub fn status(&self) -> Option<Status> {
        self.phase.status()
    }

    /// Explanation of the terminal status.
    pub fn info(&self) -> Option<&str> {
        self.phase.info()
    }

    fn step(&mut self) -> Result<Option<Visit>> {
        if let Some((parent, depth)) = self.expand.take() {
            let children = self
                .repository
                .children(&parent)
                .map_err(|e| Error::document(&parent.path, e))?;
            // reversed so the first child is popped first
            self.stack
                .extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }

        let Some((document, depth)) = self.stack.pop() else {
            return Ok(None);
        };
        let layers = self
            .repository
            .acl_layers(&document)
            .map_err(|e| Error::document(&document.path, e))?;

        self.expand = Some((document.clone(), depth));
        self.visited += 1;
        Ok(Some(Visit {
            document,
            depth,
            layers,
        }))
    }
}

impl Iterator for RecursiveTraversal<'_> {
    type Item = Result<Visit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.phase.is_finished() {
            return None;
        }
        self.phase = Phase::Running;

        match self.step() {
            Ok(Some(visit)) => Some(Ok(visit)),
            Ok(None) => {
                self.phase = Phase::Stopped {
                    status: Status::Success,
                    info: format!("Audited all {} documents", self.visited),
                };
                None
            }
            Err(e) => {
                self.phase = Phase::Failed;
                Some(Err(e))
            }
        }
    }
}
