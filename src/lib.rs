//! Read-only ACL audit engine for hierarchical document repositories.
//!
//! The engine walks a document tree, extracts the access-control facts of
//! every node and aggregates them into a single bounded report:
//! - **Principals and permissions** mentioned anywhere in the tree
//! - **Inheritance locks**: documents denying `EVERYTHING` to `EVERYONE`
//! - **Tree shape**: document count and depth range
//!
//! It observes ACLs only. It does not compute effective permissions, does
//! not modify the repository and does not persist its report.
//!
//! # Core Types
//!
//! - [`Repository`] / [`PageCursor`]: read access to the document tree
//! - [`ContentFilter`]: decides which principals are worth recording
//! - [`Strategy`]: [`RecursiveTraversal`] (exhaustive) or
//!   [`PagedTraversal`] (bounded by [`AuditConfig`])
//! - [`AuditAggregator`]: turns [`DocumentSummary`] events into an [`AuditReport`]
//! - [`AclAudit`]: wires everything together
//!
//! A run that hits the document cap or the time budget still returns a
//! valid, partial report; its [`Status`] says why it stopped early.
//!
//! # Examples
//!
//! ```
//! use acl_audit::{
//!     AclAudit, AuditConfig, Ace, AclLayer, Document, ExcludePrincipals,
//!     MemoryRepository, Status, Strategy,
//! };
//!
//! let repo = MemoryRepository::new()
//!     .with_document("/", "Root", vec![AclLayer::local(vec![Ace::grant("system", "EVERYTHING")])])
//!     .with_document("/hr", "HR", vec![AclLayer::local(vec![
//!         Ace::grant("hr-team", "WRITE"),
//!         Ace::deny("EVERYONE", "EVERYTHING"),
//!     ])]);
//!
//! let filter = ExcludePrincipals::new(["system"]);
//! let report = AclAudit::new(&repo, &filter)
//!     .with_strategy(Strategy::Paged(AuditConfig::default().with_timeout(600)))
//!     .run(&Document::new("/", "Root"))
//!     .expect("audit should run");
//!
//! assert_eq!(report.status(), Status::Success);
//! assert!(report.principals().contains("hr-team"));
//! assert!(!report.principals().contains("system"));
//! assert_eq!(report.summary("/hr").map(|s| s.acl_lock_inheritance()), Some(true));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod acl;
mod aggregator;
mod config;
mod engine;
mod error;
pub mod extract;
mod filter;
mod logging;
mod memory;
mod report;
mod repository;
mod summary;
pub mod traversal;

pub use acl::{AccessEntry, Ace, AclLayer, AclScope, AclView, Principal, EVERYONE, EVERYTHING};
pub use aggregator::AuditAggregator;
pub use config::{
    AuditConfig, DEFAULT_MAX_DOCUMENTS, DEFAULT_PAGE_SIZE, DEFAULT_RESERVED_RENDER_SECONDS,
    SPREADSHEET_ROW_LIMIT,
};
pub use engine::AclAudit;
pub use error::{Error, Result};
pub use extract::{AclWarning, Mentions};
pub use filter::{AcceptAll, ContentFilter, ExcludePrincipals, RejectAll};
pub use memory::{MemoryCursor, MemoryRepository};
pub use report::{AuditReport, Status};
pub use repository::{Document, PageCursor, Repository, RepositoryError, RepositoryErrorKind};
pub use summary::DocumentSummary;
pub use traversal::{
    Clock, MonotonicClock, PagedTraversal, RecursiveTraversal, Strategy, Traversal, Visit,
};
