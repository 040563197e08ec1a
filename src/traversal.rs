//! Traversal strategies.
//!
//! Both strategies produce the same lazy, single-pass sequence of [`Visit`]s
//! and only differ in ordering and limits:
//!
//! - [`RecursiveTraversal`]: depth-first pre-order, no limits
//! - [`PagedTraversal`]: root first, then a flat paginated cursor, bounded
//!   by a document cap and a time budget
//!
//! Once a strategy returns `None` its terminal [`Status`] and explanation
//! are available through `status()` and `info()`. A strategy that yielded an
//! error is finished and reports no status.

mod paged;
mod recursive;

use std::time::Instant;

pub use paged::{relative_depth, PagedTraversal};
pub use recursive::RecursiveTraversal;

use crate::acl::AclLayer;
use crate::config::AuditConfig;
use crate::error::Result;
use crate::report::Status;
use crate::repository::{Document, Repository};

/// One document handed out by a strategy, with its raw ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// The visited document
    pub document: Document,
    /// Number of path segments below the audited root
    pub depth: usize,
    /// ACL layers as read from the repository
    pub layers: Vec<AclLayer>,
}

/// Source of monotonic time for budget checks.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Which traversal an audit runs with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Exhaustive depth-first traversal
    #[default]
    Recursive,
    /// Flat paginated traversal with limits
    Paged(AuditConfig),
}

/// INIT → RUNNING → terminal status; `Failed` once an error was yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Phase {
    Init,
    Running,
    Stopped { status: Status, info: String },
    Failed,
}

impl Phase {
    pub(crate) fn is_finished(&self) -> bool {
        matches!(self, Phase::Stopped { .. } | Phase::Failed)
    }

    pub(crate) fn status(&self) -> Option<Status> {
        match self {
            Phase::Stopped { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn info(&self) -> Option<&str> {
        match self {
            Phase::Stopped { info, .. } => Some(info),
            _ => None,
        }
    }
}

/// A strategy selected at run time.
pub enum Traversal<'a> {
    /// See [`RecursiveTraversal`]
    Recursive(RecursiveTraversal<'a>),
    /// See [`PagedTraversal`]
    Paged(PagedTraversal<'a>),
}

impl<'a> Traversal<'a> {
    /// Builds the traversal described by `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) for a
    /// paged strategy whose configuration cannot run. No document is read.
    pub fn new(
        strategy: &Strategy,
        repository: &'a dyn Repository,
        root: &Document,
        clock: &'a dyn Clock,
    ) -> Result<Self> {
        Ok(match strategy {
            Strategy::Recursive => Traversal::Recursive(RecursiveTraversal::new(repository, root)),
            Strategy::Paged(config) => Traversal::Paged(PagedTraversal::with_clock(
                repository,
                root,
                config.clone(),
                clock,
            )?),
        })
    }

    /// Terminal status, once the sequence is exhausted.
    pub fn status(&self) -> Option<Status> {
        match self {
            Traversal::Recursive(t) => t.status(),
            Traversal::Paged(t) => t.status(),
        }
    }

    /// Explanation of the terminal status.
    pub fn info(&self) -> Option<&str> {
        match self {
            Traversal::Recursive(t) => t.info(),
            Traversal::Paged(t) => t.info(),
        }
    }
}

impl Iterator for Traversal<'_> {
    type Item = Result<Visit>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Traversal::Recursive(t) => t.next(),
            Traversal::Paged(t) => t.next(),
        }
    }
}
