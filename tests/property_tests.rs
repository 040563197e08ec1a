//! Property tests for tree-wide audit invariants.
//!
//! Trees are generated by picking, for every new node, a parent among the
//! nodes generated before it. ACEs are drawn from a small pool so that
//! duplicates, conflicts and inheritance locks show up often.

use std::collections::BTreeSet;

use acl_audit::{
    AcceptAll, AclAudit, AclLayer, Ace, AuditConfig, AuditReport, ContentFilter, Document,
    MemoryRepository, RejectAll, Status, Strategy as AuditStrategy, EVERYONE, EVERYTHING,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Node {
    path: String,
    depth: usize,
    aces: Vec<Ace>,
}

fn arb_ace() -> impl Strategy<Value = Ace> {
    (
        prop::sample::select(vec![EVERYONE, "alice", "bob", "system"]),
        prop::sample::select(vec![EVERYTHING, "READ", "WRITE"]),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(principal, permission, granted, denied)| {
            Ace::new(principal, permission, granted, denied)
        })
}

fn arb_tree() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(
        (
            any::<prop::sample::Index>(),
            prop::collection::vec(arb_ace(), 0..4),
        ),
        0..40,
    )
    .prop_map(|picks| {
        let mut nodes = vec![Node {
            path: "/".to_string(),
            depth: 0,
            aces: vec![],
        }];
        for (i, (parent, aces)) in picks.into_iter().enumerate() {
            let parent = &nodes[parent.index(i + 1)];
            let path = if parent.path == "/" {
                format!("/n{i}")
            } else {
                format!("{}/n{i}", parent.path)
            };
            let depth = parent.depth + 1;
            nodes.push(Node { path, depth, aces });
        }
        nodes
    })
}

// Tree plus a scrambled listing order for the flat cursor
fn arb_scrambled_tree() -> impl Strategy<Value = (Vec<Node>, Vec<usize>)> {
    arb_tree().prop_flat_map(|nodes| {
        let order: Vec<usize> = (1..nodes.len()).collect();
        (Just(nodes), Just(order).prop_shuffle())
    })
}

fn repository(nodes: &[Node]) -> MemoryRepository {
    nodes.iter().fold(MemoryRepository::new(), |repo, node| {
        repo.with_document(
            node.path.clone(),
            node.path.clone(),
            vec![AclLayer::local(node.aces.clone())],
        )
    })
}

fn root() -> Document {
    Document::new("/", "/")
}

fn audit(
    repo: &MemoryRepository,
    filter: &dyn ContentFilter,
    strategy: AuditStrategy,
) -> AuditReport {
    AclAudit::new(repo, filter)
        .with_strategy(strategy)
        .run(&root())
        .expect("in-memory audit cannot fail")
}

proptest! {
    /// Property: the recursive traversal visits every node exactly once
    #[test]
    fn proptest_recursive_visits_every_node_once(nodes in arb_tree()) {
        let repo = repository(&nodes);
        let report = audit(&repo, &AcceptAll, AuditStrategy::Recursive);

        prop_assert_eq!(report.status(), Status::Success);
        prop_assert_eq!(report.count(), nodes.len());

        let visited: BTreeSet<&str> = report.summaries().iter().map(|s| s.path()).collect();
        let expected: BTreeSet<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        prop_assert_eq!(visited.len(), report.count());
        prop_assert_eq!(visited, expected);
    }

    /// Property: depths match the tree and bound each other
    #[test]
    fn proptest_depth_range(nodes in arb_tree()) {
        let repo = repository(&nodes);
        let report = audit(&repo, &AcceptAll, AuditStrategy::Recursive);

        prop_assert!(report.min_depth() <= report.max_depth());
        prop_assert_eq!(report.min_depth(), 0);
        let deepest = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        prop_assert_eq!(report.max_depth(), deepest);

        for summary in report.summaries() {
            let node = nodes.iter().find(|n| n.path == summary.path()).unwrap();
            prop_assert_eq!(summary.depth(), node.depth);
        }
    }

    /// Property: the paged traversal agrees with the recursive one,
    /// whatever order the cursor lists descendants in
    #[test]
    fn proptest_paged_matches_recursive_on_scrambled_cursor(
        (nodes, order) in arb_scrambled_tree(),
        page_size in 1usize..8
    ) {
        let repo = repository(&nodes)
            .with_descendant_order(order.iter().map(|&i| nodes[i].path.clone()));
        let recursive = audit(&repo, &AcceptAll, AuditStrategy::Recursive);
        let paged = audit(
            &repo,
            &AcceptAll,
            AuditStrategy::Paged(AuditConfig::default().with_page_size(page_size)),
        );

        prop_assert_eq!(paged.status(), Status::Success);
        prop_assert_eq!(paged.summaries(), recursive.summaries());
        prop_assert_eq!(paged.principals(), recursive.principals());
        prop_assert_eq!(paged.permissions(), recursive.permissions());
        prop_assert_eq!(paged.max_depth(), recursive.max_depth());

        let paths: Vec<&str> = paged.summaries().iter().map(|s| s.path()).collect();
        let mut sorted = paths.clone();
        sorted.sort_unstable();
        prop_assert_eq!(paths, sorted);
    }

    /// Property: the document cap is exact and inclusive
    #[test]
    fn proptest_paged_cap_is_exact(nodes in arb_tree(), max in 1usize..50) {
        let repo = repository(&nodes);
        let report = audit(
            &repo,
            &AcceptAll,
            AuditStrategy::Paged(AuditConfig::default().with_page_size(5).with_max_documents(max)),
        );

        prop_assert_eq!(report.count(), max.min(nodes.len()));
        if max <= nodes.len() {
            prop_assert_eq!(report.status(), Status::ErrorTooManyDocuments);
        } else {
            prop_assert_eq!(report.status(), Status::Success);
        }
    }

    /// Property: filtering is ACE-level, never document-level
    #[test]
    fn proptest_reject_all_keeps_count(nodes in arb_tree()) {
        let repo = repository(&nodes);
        let report = audit(&repo, &RejectAll, AuditStrategy::Recursive);

        prop_assert_eq!(report.count(), nodes.len());
        prop_assert!(report.principals().is_empty());
        prop_assert!(report.permissions().is_empty());
    }

    /// Property: a document is locked iff it carries a pure EVERYONE/EVERYTHING deny
    #[test]
    fn proptest_lock_detection(nodes in arb_tree()) {
        let repo = repository(&nodes);
        let report = audit(&repo, &AcceptAll, AuditStrategy::Recursive);

        for node in &nodes {
            let expected = node.aces.iter().any(|ace| {
                ace.principal == EVERYONE
                    && ace.permission == EVERYTHING
                    && ace.denied
                    && !ace.granted
            });
            let summary = report.summary(&node.path).unwrap();
            prop_assert_eq!(summary.acl_lock_inheritance(), expected);
        }
    }
}
