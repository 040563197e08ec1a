//! ACL vocabulary shared by the extractor, the repository boundary and the report.
//!
//! An [`Ace`] is what the repository stores; an [`AccessEntry`] is what the
//! audit keeps once the principal has been factored out into an [`AclView`].

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Identifier of a user or group.
pub type Principal = String;

/// Pseudo-group matching every principal.
pub const EVERYONE: &str = "EVERYONE";

/// Permission implying every other permission.
pub const EVERYTHING: &str = "EVERYTHING";

/// A single access control entry as stored by the repository.
///
/// `granted` and `denied` are independent flags because some backends can
/// hold an entry with both set. The audit never resolves such an entry, it
/// only reports it.
///
/// # Example
///
/// ```
/// use acl_audit::Ace;
///
/// let ace = Ace::deny("EVERYONE", "EVERYTHING");
/// assert!(ace.is_denied());
/// assert!(!Ace::new("bob", "READ", true, true).is_denied());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ace {
    /// User or group the entry applies to
    pub principal: Principal,
    /// Permission name (e.g. "READ", "WRITE")
    pub permission: String,
    /// Whether the entry grants the permission
    pub granted: bool,
    /// Whether the entry denies the permission
    pub denied: bool,
}

impl Ace {
    /// Creates an entry with explicit flags.
    pub fn new(
        principal: impl Into<String>,
        permission: impl Into<String>,
        granted: bool,
        denied: bool,
    ) -> Self {
        Self {
            principal: principal.into(),
            permission: permission.into(),
            granted,
            denied,
        }
    }

    /// Creates a granting entry.
    pub fn grant(principal: impl Into<String>, permission: impl Into<String>) -> Self {
        Self::new(principal, permission, true, false)
    }

    /// Creates a denying entry.
    pub fn deny(principal: impl Into<String>, permission: impl Into<String>) -> Self {
        Self::new(principal, permission, false, true)
    }

    /// Returns true if the entry denies and does not also grant.
    ///
    /// An entry with both flags set is recorded as a grant.
    pub fn is_denied(&self) -> bool {
        self.denied && !self.granted
    }
}

/// Where an ACL layer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclScope {
    /// Declared directly on the document
    Local,
    /// Contributed by ancestors
    Inherited,
}

/// An ordered list of entries with their scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclLayer {
    /// Local or inherited
    pub scope: AclScope,
    /// Entries in declaration order
    pub entries: Vec<Ace>,
}

impl AclLayer {
    /// Creates a local layer.
    pub fn local(entries: Vec<Ace>) -> Self {
        Self {
            scope: AclScope::Local,
            entries,
        }
    }

    /// Creates an inherited layer.
    pub fn inherited(entries: Vec<Ace>) -> Self {
        Self {
            scope: AclScope::Inherited,
            entries,
        }
    }
}

/// One entry once the principal key has been factored out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessEntry {
    /// Permission name
    pub permission: String,
    /// True when recorded as a grant
    pub allow: bool,
}

impl AccessEntry {
    /// Creates an entry.
    pub fn new(permission: impl Into<String>, allow: bool) -> Self {
        Self {
            permission: permission.into(),
            allow,
        }
    }
}

/// Entries grouped by principal.
///
/// Principals are kept in lexical order so two views built from the same
/// layers serialize identically. Each principal's list keeps declaration
/// order and is never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AclView {
    entries: BTreeMap<Principal, Vec<AccessEntry>>,
}

impl AclView {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, principal: &str, entry: AccessEntry) {
        match self.entries.get_mut(principal) {
            Some(list) => list.push(entry),
            None => {
                self.entries.insert(principal.to_string(), vec![entry]);
            }
        }
    }

    /// Returns the entries recorded for `principal`, in declaration order.
    pub fn entries(&self, principal: &str) -> &[AccessEntry] {
        self.entries.get(principal).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the principals present in the view.
    pub fn principals(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns every distinct permission mentioned in the view.
    pub fn permissions(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .flatten()
            .map(|e| e.permission.as_str())
            .collect()
    }

    /// Iterates over `(principal, entries)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, Principal, Vec<AccessEntry>> {
        self.entries.iter()
    }

    /// Returns the number of principals in the view.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no principal is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicting_ace_is_not_a_deny() {
        assert!(Ace::deny("bob", "READ").is_denied());
        assert!(!Ace::grant("bob", "READ").is_denied());
        assert!(!Ace::new("bob", "READ", true, true).is_denied());
        assert!(!Ace::new("bob", "READ", false, false).is_denied());
    }

    #[test]
    fn layer_constructors_set_scope() {
        assert_eq!(AclLayer::local(vec![]).scope, AclScope::Local);
        assert_eq!(AclLayer::inherited(vec![]).scope, AclScope::Inherited);
    }

    #[test]
    fn view_keeps_duplicates_in_order() {
        let mut view = AclView::new();
        view.push("bob", AccessEntry::new("READ", true));
        view.push("bob", AccessEntry::new("READ", false));
        view.push("bob", AccessEntry::new("READ", true));

        let entries = view.entries("bob");
        assert_eq!(entries.len(), 3);
        assert!(entries[0].allow);
        assert!(!entries[1].allow);
        assert!(entries[2].allow);
    }

    #[test]
    fn view_lookups() {
        let mut view = AclView::new();
        view.push("bob", AccessEntry::new("READ", true));
        view.push("alice", AccessEntry::new("WRITE", true));
        view.push("alice", AccessEntry::new("READ", false));

        assert_eq!(view.len(), 2);
        assert!(!view.is_empty());
        assert_eq!(view.principals().collect::<Vec<_>>(), vec!["alice", "bob"]);
        assert_eq!(
            view.permissions().into_iter().collect::<Vec<_>>(),
            vec!["READ", "WRITE"]
        );
        assert!(view.entries("carol").is_empty());
    }

    #[test]
    fn view_serializes_as_map() {
        let mut view = AclView::new();
        view.push("bob", AccessEntry::new("READ", true));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "bob": [{ "permission": "READ", "allow": true }] })
        );
    }
}
