//! Turns raw ACL layers into audit-friendly shapes.
//!
//! Every function here applies the [`ContentFilter`] at ACE level: entries
//! for rejected principals are simply not recorded. ACE order is kept in the
//! output but carries no meaning for the audit, which only records presence.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::acl::{AccessEntry, Ace, AclLayer, AclScope, AclView, Principal, EVERYONE, EVERYTHING};
use crate::filter::ContentFilter;
use crate::repository::Document;
use crate::summary::DocumentSummary;

/// An anomaly found while reading an ACL. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AclWarning {
    /// The ACE is marked both granted and denied; it was recorded as granted
    ConflictingAce {
        /// Principal of the entry
        principal: Principal,
        /// Permission of the entry
        permission: String,
    },
    /// The ACE is marked neither granted nor denied; it was recorded as not allowed
    UndecidedAce {
        /// Principal of the entry
        principal: Principal,
        /// Permission of the entry
        permission: String,
    },
}

/// Result of [`to_view`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Recorded entries
    pub view: AclView,
    /// Anomalies met on recorded entries
    pub warnings: Vec<AclWarning>,
    /// True if a recorded entry is the inheritance lock
    pub locked: bool,
}

/// Principals and permissions mentioned on a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mentions {
    /// Accepted principals
    pub principals: BTreeSet<Principal>,
    /// Permissions held by accepted principals
    pub permissions: BTreeSet<String>,
}

impl Mentions {
    pub(crate) fn record(&mut self, principal: &str, permission: &str) {
        if !self.principals.contains(principal) {
            self.principals.insert(principal.to_string());
        }
        if !self.permissions.contains(permission) {
            self.permissions.insert(permission.to_string());
        }
    }

    /// Returns true if nothing was mentioned.
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty() && self.permissions.is_empty()
    }
}

/// Groups the accepted entries of `layers` by principal.
///
/// # Examples
///
/// ```
/// use acl_audit::{extract, Ace, AclLayer, AcceptAll};
///
/// let layer = AclLayer::local(vec![
///     Ace::grant("bob", "READ"),
///     Ace::new("bob", "WRITE", true, true),
/// ]);
/// let extraction = extract::to_view([&layer], &AcceptAll);
///
/// assert_eq!(extraction.view.entries("bob").len(), 2);
/// assert!(extraction.view.entries("bob")[1].allow);
/// assert_eq!(extraction.warnings.len(), 1);
/// ```
pub fn to_view<'a, I>(layers: I, filter: &dyn ContentFilter) -> Extraction
where
    I: IntoIterator<Item = &'a AclLayer>,
{
    let mut extraction = Extraction::default();
    let aces = layers.into_iter().flat_map(|layer| layer.entries.iter());
    for ace in aces.filter(|ace| filter.accepts(&ace.principal)) {
        extraction.locked |= is_lock_inheritance(ace);
        let allow = match (ace.granted, ace.denied) {
            (true, true) => {
                extraction.warnings.push(AclWarning::ConflictingAce {
                    principal: ace.principal.clone(),
                    permission: ace.permission.clone(),
                });
                true
            }
            (false, false) => {
                extraction.warnings.push(AclWarning::UndecidedAce {
                    principal: ace.principal.clone(),
                    permission: ace.permission.clone(),
                });
                false
            }
            (granted, _) => granted,
        };
        extraction
            .view
            .push(&ace.principal, AccessEntry::new(ace.permission.as_str(), allow));
    }
    extraction
}

/// Returns true if `ace` is the inheritance lock: `EVERYONE` denied `EVERYTHING`.
pub fn is_lock_inheritance(ace: &Ace) -> bool {
    ace.principal == EVERYONE && ace.permission == EVERYTHING && ace.is_denied()
}

/// Returns true if any accepted ACE of any layer is the inheritance lock.
pub fn has_lock_inheritance(layers: &[AclLayer], filter: &dyn ContentFilter) -> bool {
    accepted(layers, filter).any(is_lock_inheritance)
}

/// Collects the accepted principals and their permissions across all layers.
pub fn mention_summary(layers: &[AclLayer], filter: &dyn ContentFilter) -> Mentions {
    let mut mentions = Mentions::default();
    for ace in accepted(layers, filter) {
        mentions.record(&ace.principal, &ace.permission);
    }
    mentions
}

/// Builds the summary of one audited document.
///
/// Layers are split by scope; `inherited` is left absent when the document
/// has no inherited layer at all. The filter is asked once per ACE.
pub fn summarize(
    document: &Document,
    depth: usize,
    layers: &[AclLayer],
    filter: &dyn ContentFilter,
) -> DocumentSummary {
    let local = to_view(of_scope(layers, AclScope::Local), filter);
    let inherited = layers
        .iter()
        .any(|l| l.scope == AclScope::Inherited)
        .then(|| to_view(of_scope(layers, AclScope::Inherited), filter));

    let mut locked = local.locked;
    let mut warnings = local.warnings;
    let inherited = inherited.map(|extraction| {
        locked |= extraction.locked;
        warnings.extend(extraction.warnings);
        extraction.view
    });
    for warning in &warnings {
        tracing::warn!(target: "acl_audit", path = %document.path, ?warning, "malformed ACE");
    }

    DocumentSummary::new(
        document,
        depth,
        locked,
        local.view,
        inherited,
        warnings,
    )
}

fn accepted<'a>(
    layers: &'a [AclLayer],
    filter: &'a dyn ContentFilter,
) -> impl Iterator<Item = &'a Ace> + 'a {
    layers
        .iter()
        .flat_map(|layer| layer.entries.iter())
        .filter(move |ace| filter.accepts(&ace.principal))
}

fn of_scope(layers: &[AclLayer], scope: AclScope) -> impl Iterator<Item = &AclLayer> {
    layers.iter().filter(move |l| l.scope == scope)
}
