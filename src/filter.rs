use std::collections::BTreeSet;

/// Decides which principals are relevant to an audit.
///
/// Filtering happens per ACE: a filter that rejects every principal still
/// lets every document be visited, it only suppresses what gets recorded.
///
/// # Invariants
///
/// Implementations MUST be deterministic and free of side effects. The
/// engine may call `accepts` once per ACE and never caches the answer
/// across runs.
///
/// # Examples
///
/// ```
/// use acl_audit::{ContentFilter, ExcludePrincipals};
///
/// let filter = ExcludePrincipals::new(["system", "Administrator"]);
/// assert!(filter.accepts("bob"));
/// assert!(!filter.accepts("system"));
///
/// // Closures are filters too
/// let only_groups = |p: &str| p.ends_with("-group");
/// assert!(only_groups.accepts("members-group"));
/// ```
pub trait ContentFilter {
    /// Returns true if entries for `principal` should be recorded.
    fn accepts(&self, principal: &str) -> bool;
}

impl<F> ContentFilter for F
where
    F: Fn(&str) -> bool,
{
    fn accepts(&self, principal: &str) -> bool {
        self(principal)
    }
}

/// Filter recording every principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ContentFilter for AcceptAll {
    fn accepts(&self, _principal: &str) -> bool {
        true
    }
}

/// Filter recording no principal at all.
///
/// Useful to measure tree shape without collecting ACL facts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl ContentFilter for RejectAll {
    fn accepts(&self, _principal: &str) -> bool {
        false
    }
}

/// Filter excluding a fixed set of principals (case-sensitive).
#[derive(Debug, Clone, Default)]
pub struct ExcludePrincipals {
    excluded: BTreeSet<String>,
}

impl ExcludePrincipals {
    /// Creates a filter rejecting exactly the given principals.
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if `principal` is on the exclusion list.
    pub fn is_excluded(&self, principal: &str) -> bool {
        self.excluded.contains(principal)
    }
}

impl ContentFilter for ExcludePrincipals {
    fn accepts(&self, principal: &str) -> bool {
        !self.is_excluded(principal)
    }
}
