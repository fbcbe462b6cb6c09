//! Persistent directory tree and path resolution.
//!
//! Directories hold their children behind an `Arc`, and every mutation goes
//! through `Arc::make_mut` on the way down. When a directory mapping is
//! shared with an older snapshot it is copied first, so only the
//! directories along the mutated path are ever duplicated; sibling
//! subtrees stay shared.
//!
//! Nodes never point at their parents. A node's position is its
//! [`Location`]: the link-free segment list from the root, used as a lookup
//! key whenever the node needs to touch the tree.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use treefs_path::FsPath;

use crate::buffer::ContentBuffer;
use crate::error::{FsError, FsResult};

use super::node::Node;

/// Link-free position of an entry, root first. The root is `[]`.
pub(crate) type Location = Vec<String>;

/// A stored entry. Phantom nodes are never stored.
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Directory(Directory),
    File(ContentBuffer),
    Link(FsPath),
}

/// An immutable-per-version child mapping.
#[derive(Debug, Clone, Default)]
pub(crate) struct Directory {
    children: Arc<BTreeMap<String, Entry>>,
}

impl Directory {
    pub(crate) fn get(&self, name: &str) -> Option<&Entry> {
        self.children.get(name)
    }

    pub(crate) fn names(&self) -> BTreeSet<String> {
        self.children.keys().cloned().collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn entries_mut(&mut self) -> &mut BTreeMap<String, Entry> {
        Arc::make_mut(&mut self.children)
    }
}

/// Whether a link in the final position is followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Follow {
    /// Stop on the link itself (lstat-like).
    Never,
    /// Keep following until the final node is not a link (stat-like).
    Final,
}

/// One version of the filesystem.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    root: Directory,
    max_symlink_hops: usize,
}

impl Tree {
    pub(crate) fn new(max_symlink_hops: usize) -> Self {
        Self {
            root: Directory::default(),
            max_symlink_hops,
        }
    }

    /// The directory at `at`, if `at` names one.
    pub(crate) fn directory(&self, at: &[String]) -> Option<&Directory> {
        at.iter().try_fold(&self.root, |dir, name| match dir.get(name) {
            Some(Entry::Directory(child)) => Some(child),
            _ => None,
        })
    }

    /// Mutable access to the directory at `at`, copying shared mappings
    /// along the way.
    fn directory_mut(&mut self, at: &[String]) -> Option<&mut Directory> {
        at.iter().try_fold(&mut self.root, |dir, name| {
            match dir.entries_mut().get_mut(name) {
                Some(Entry::Directory(child)) => Some(child),
                _ => None,
            }
        })
    }

    /// The content buffer of the file at `at`.
    pub(crate) fn file(&self, at: &[String]) -> Option<&ContentBuffer> {
        let (name, parent) = at.split_last()?;
        match self.directory(parent)?.get(name)? {
            Entry::File(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Bind `name` inside the directory at `parent`, replacing any entry.
    pub(crate) fn insert(&mut self, parent: &[String], name: &str, entry: Entry) -> Option<()> {
        self.directory_mut(parent)?
            .entries_mut()
            .insert(name.to_owned(), entry);
        Some(())
    }

    /// Unbind the entry at `at` from its parent.
    pub(crate) fn detach(&mut self, at: &[String]) -> Option<Entry> {
        let (name, parent) = at.split_last()?;
        self.directory_mut(parent)?.entries_mut().remove(name)
    }

    /// Walk `path` from the root into a node.
    ///
    /// Absence is never an error here; it comes back as a phantom node.
    /// The only failure is exceeding the link hop bound, reported as
    /// [`FsError::SymbolicLoop`] on the prefix of `path` consumed so far.
    pub(crate) fn resolve(&self, path: &FsPath, follow: Follow) -> FsResult<Node> {
        let mut pending: VecDeque<String> = path.segments().map(str::to_owned).collect();
        // Caller segments always sit at the tail of `pending`.
        let mut unconsumed = pending.len();
        let mut hops = 0usize;
        let mut node = Node::root();

        loop {
            let next = pending.pop_front();
            unconsumed = unconsumed.min(pending.len());

            node = match (node, next) {
                (Node::Link { at, target }, Some(name)) => {
                    pending.push_front(name);
                    self.redirect(&mut pending, &at, &target, &mut hops, || {
                        path.prefix(path.len() - unconsumed)
                    })?;
                    Node::root()
                }
                (Node::Link { at, target }, None) if follow == Follow::Final => {
                    self.redirect(&mut pending, &at, &target, &mut hops, || path.clone())?;
                    Node::root()
                }
                (node, None) => return Ok(node),
                (Node::Directory { at }, Some(name)) => self.lookup(at, name),
                (Node::File { .. } | Node::FileChild, Some(_)) => Node::FileChild,
                (Node::DirectoryChild { .. } | Node::NoSuchEntry, Some(_)) => Node::NoSuchEntry,
            };
        }
    }

    /// The node a link currently points at, with every further link in
    /// the final position followed.
    pub(crate) fn entry_at_source(&self, at: &[String], target: &FsPath) -> FsResult<Node> {
        let destination = FsPath::root().descendant(link_destination(at, target));
        self.resolve(&destination, Follow::Final)
    }

    /// Queue a link's destination in front of the remaining segments.
    fn redirect(
        &self,
        pending: &mut VecDeque<String>,
        at: &[String],
        target: &FsPath,
        hops: &mut usize,
        reported: impl FnOnce() -> FsPath,
    ) -> FsResult<()> {
        *hops += 1;
        if *hops > self.max_symlink_hops {
            let reported = reported();
            tracing::warn!(path = %reported, hops = *hops, "symlink loop");
            return Err(FsError::SymbolicLoop(reported));
        }
        tracing::trace!(link = ?at, target = %target, "following link");
        for segment in link_destination(at, target).into_iter().rev() {
            pending.push_front(segment);
        }
        Ok(())
    }

    /// Child `name` of the existing directory at `at`.
    fn lookup(&self, mut at: Location, name: String) -> Node {
        match name.as_str() {
            "." => return Node::Directory { at },
            ".." => {
                // The root is its own parent.
                at.pop();
                return Node::Directory { at };
            }
            _ => {}
        }

        let entry = self.directory(&at).and_then(|dir| dir.get(&name));
        match entry {
            None => Node::DirectoryChild { parent: at, name },
            Some(Entry::Directory(_)) => {
                at.push(name);
                Node::Directory { at }
            }
            Some(Entry::File(_)) => {
                at.push(name);
                Node::File { at }
            }
            Some(Entry::Link(target)) => {
                let target = target.clone();
                at.push(name);
                Node::Link { at, target }
            }
        }
    }
}

/// Absolute segments a link at `at` points to. Relative targets are taken
/// from the link's own directory.
fn link_destination(at: &[String], target: &FsPath) -> Location {
    if target.is_absolute() {
        return target.segments().map(str::to_owned).collect();
    }
    let parent = at.split_last().map(|(_, parent)| parent).unwrap_or(&[]);
    parent
        .iter()
        .cloned()
        .chain(target.segments().map(str::to_owned))
        .collect()
}
