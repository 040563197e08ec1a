//! In-memory repository for tests and demonstrations.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

use crate::acl::AclLayer;
use crate::repository::{Document, PageCursor, Repository, RepositoryError, RepositoryErrorKind};

#[derive(Debug, Clone)]
struct Node {
    document: Document,
    layers: Vec<AclLayer>,
}

/// A document tree held in memory.
///
/// The hierarchy is derived from paths: `/a/b` is a child of `/a`, and
/// children are listed in insertion order. The flat descendant cursor
/// follows insertion order too, unless [`with_descendant_order`] says
/// otherwise.
///
/// [`with_descendant_order`]: MemoryRepository::with_descendant_order
///
/// # Example
///
/// ```
/// use acl_audit::{Ace, AclLayer, Document, MemoryRepository, Repository};
///
/// let repo = MemoryRepository::new()
///     .with_document("/", "Root", vec![])
///     .with_document("/a", "A", vec![AclLayer::local(vec![Ace::grant("bob", "READ")])]);
///
/// let root = Document::new("/", "Root");
/// let children = repo.children(&root).unwrap();
/// assert_eq!(children.len(), 1);
/// assert_eq!(children[0].path, "/a");
/// ```
#[derive(Debug, Default)]
pub struct MemoryRepository {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    descendant_order: Vec<String>,
    unreadable: BTreeSet<String>,
    acl_reads: Cell<usize>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a document. Returns the repository for chaining.
    pub fn with_document(
        mut self,
        path: impl Into<String>,
        title: impl Into<String>,
        layers: Vec<AclLayer>,
    ) -> Self {
        self.insert(Document::new(path, title), layers);
        self
    }

    /// Adds (or replaces) a document.
    pub fn insert(&mut self, document: Document, layers: Vec<AclLayer>) {
        match self.index.get(&document.path) {
            Some(&i) => self.nodes[i] = Node { document, layers },
            None => {
                self.index.insert(document.path.clone(), self.nodes.len());
                self.nodes.push(Node { document, layers });
            }
        }
    }

    /// Overrides the order of the flat descendant cursor.
    ///
    /// Listed paths come first, in the given order; descendants not listed
    /// follow in insertion order.
    pub fn with_descendant_order<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descendant_order = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Makes every ACL read of `path` fail with [`RepositoryErrorKind::Unreadable`].
    pub fn with_unreadable(mut self, path: impl Into<String>) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    /// Returns how many ACL reads were served (including failed ones).
    pub fn acl_reads(&self) -> usize {
        self.acl_reads.get()
    }

    /// Returns the number of documents.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the repository holds no document.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the stored handle for `path`.
    pub fn document(&self, path: &str) -> Option<&Document> {
        self.index.get(path).map(|&i| &self.nodes[i].document)
    }

    fn node(&self, path: &str) -> Result<&Node, RepositoryError> {
        self.index
            .get(path)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| RepositoryError::new(RepositoryErrorKind::NotFound, path))
    }

    fn descendants_of(&self, root: &str) -> Vec<Document> {
        let mut ordered: Vec<Document> = self
            .descendant_order
            .iter()
            .filter(|p| is_descendant(root, p))
            .filter_map(|p| self.document(p).cloned())
            .collect();
        let listed: BTreeSet<&str> = self.descendant_order.iter().map(String::as_str).collect();
        ordered.extend(
            self.nodes
                .iter()
                .map(|n| &n.document)
                .filter(|d| is_descendant(root, &d.path) && !listed.contains(d.path.as_str()))
                .cloned(),
        );
        ordered
    }
}

impl Repository for MemoryRepository {
    fn children(&self, parent: &Document) -> Result<Vec<Document>, RepositoryError> {
        self.node(&parent.path)?;
        Ok(self
            .nodes
            .iter()
            .filter(|n| parent_path(&n.document.path) == Some(parent.path.as_str()))
            .map(|n| n.document.clone())
            .collect())
    }

    fn acl_layers(&self, document: &Document) -> Result<Vec<AclLayer>, RepositoryError> {
        self.acl_reads.set(self.acl_reads.get() + 1);
        if self.unreadable.contains(&document.path) {
            return Err(RepositoryError::new(
                RepositoryErrorKind::Unreadable,
                format!("ACL of {} cannot be read", document.path),
            ));
        }
        Ok(self.node(&document.path)?.layers.clone())
    }

    fn paged_descendants<'a>(
        &'a self,
        root: &Document,
        page_size: usize,
    ) -> Result<Box<dyn PageCursor + 'a>, RepositoryError> {
        if page_size == 0 {
            return Err(RepositoryError::new(
                RepositoryErrorKind::Backend,
                "page size must be positive",
            ));
        }
        self.node(&root.path)?;
        let pages = self
            .descendants_of(&root.path)
            .chunks(page_size)
            .map(<[Document]>::to_vec)
            .collect();
        Ok(Box::new(MemoryCursor::new(pages)))
    }
}

/// Cursor over pre-computed pages.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    pages: Vec<Vec<Document>>,
    index: usize,
}

impl MemoryCursor {
    /// Creates a cursor positioned on the first of `pages`.
    pub fn new(pages: Vec<Vec<Document>>) -> Self {
        Self { pages, index: 0 }
    }
}

impl PageCursor for MemoryCursor {
    fn current_page(&self) -> &[Document] {
        self.pages.get(self.index).map(Vec::as_slice).unwrap_or(&[])
    }

    fn has_next(&self) -> bool {
        self.index + 1 < self.pages.len()
    }

    fn advance(&mut self) -> Result<(), RepositoryError> {
        if !self.has_next() {
            return Err(RepositoryError::new(
                RepositoryErrorKind::Backend,
                "cursor is already on its last page",
            ));
        }
        self.index += 1;
        Ok(())
    }
}

/// Parent of an absolute path; `None` for `/` and relative paths.
fn parent_path(path: &str) -> Option<&str> {
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    if trimmed == "/" {
        return None;
    }
    match trimmed.rfind('/')? {
        0 => Some("/"),
        i => Some(&trimmed[..i]),
    }
}

fn is_descendant(root: &str, path: &str) -> bool {
    if path == root {
        return false;
    }
    let root = root.trim_end_matches('/');
    path.strip_prefix(root)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}
