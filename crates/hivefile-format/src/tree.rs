//! In-memory object tree.
//!
//! A parsed hivefile image becomes a tree of groups and datasets rooted at
//! an (unnamed) root group. Children keep their insertion order, which is
//! also the on-disk entry order; enumeration follows it.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::record::{DatasetRecord, LinkKind};

/// A node in the container hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A group holding further nodes.
    Group(GroupNode),
    /// A leaf dataset.
    Dataset(DatasetRecord),
}

impl Node {
    /// The link kind this node is recorded as.
    pub fn kind(&self) -> LinkKind {
        match self {
            Node::Group(_) => LinkKind::Group,
            Node::Dataset(_) => LinkKind::Dataset,
        }
    }

    /// Borrow as a group, if this is one.
    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Node::Group(g) => Some(g),
            Node::Dataset(_) => None,
        }
    }

    /// Mutably borrow as a group, if this is one.
    pub fn as_group_mut(&mut self) -> Option<&mut GroupNode> {
        match self {
            Node::Group(g) => Some(g),
            Node::Dataset(_) => None,
        }
    }

    /// Borrow as a dataset, if this is one.
    pub fn as_dataset(&self) -> Option<&DatasetRecord> {
        match self {
            Node::Group(_) => None,
            Node::Dataset(d) => Some(d),
        }
    }
}

/// A group: named children in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNode {
    children: Vec<(String, Node)>,
}

/// Split a slash-delimited path into components, ignoring empty ones
/// (leading/trailing/duplicate slashes).
pub fn path_components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

impl GroupNode {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct child links.
    pub fn num_links(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child names in native (insertion) order.
    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over `(name, node)` pairs in native order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    /// Mutable lookup of a direct child by name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    /// Append a child. The caller is responsible for name uniqueness.
    pub fn insert(&mut self, name: String, node: Node) {
        debug_assert!(self.child(&name).is_none(), "duplicate link name");
        self.children.push((name, node));
    }

    /// Resolve a slash-delimited path against this group.
    ///
    /// Returns `None` when any component is missing or crosses a dataset.
    /// An all-slash/empty path resolves to nothing here; the root group is
    /// not itself a child node (callers special-case it).
    pub fn resolve(&self, path: &str) -> Option<&Node> {
        let mut components = path_components(path);
        let first = components.next()?;
        let mut node = self.child(first)?;
        for component in components {
            node = node.as_group()?.child(component)?;
        }
        Some(node)
    }

    /// Mutable variant of [`resolve`](Self::resolve).
    pub fn resolve_mut(&mut self, path: &str) -> Option<&mut Node> {
        let mut components = path_components(path);
        let first = components.next()?;
        let mut node = self.child_mut(first)?;
        for component in components {
            node = node.as_group_mut()?.child_mut(component)?;
        }
        Some(node)
    }
}
