//! Resolved nodes and their per-variant behavior.
//!
//! Every path resolves to exactly one [`Node`]. Three variants are real
//! entries; the other three are phantoms describing *why* nothing is there,
//! which is exactly what decides the error an operation owes:
//!
//! | Variant          | Meaning                                         |
//! |------------------|-------------------------------------------------|
//! | `Directory`      | existing directory                              |
//! | `File`           | existing regular file                           |
//! | `Link`           | existing symbolic link                          |
//! | `DirectoryChild` | missing, but its parent directory exists        |
//! | `FileChild`      | missing, somewhere beneath a regular file       |
//! | `NoSuchEntry`    | missing, and so is its parent                   |

use std::collections::BTreeSet;

use treefs_path::FsPath;

use crate::buffer::{ContentBuffer, MemoryFile};
use crate::error::{FsError, FsResult};
use crate::mode::{Activity, OpenMode, Representation};

use super::tree::{Directory, Entry, Location, Tree};

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Directory { at: Location },
    File { at: Location },
    Link { at: Location, target: FsPath },
    DirectoryChild { parent: Location, name: String },
    FileChild,
    NoSuchEntry,
}

impl Node {
    pub(crate) fn root() -> Self {
        Node::Directory { at: Vec::new() }
    }

    pub(crate) fn create_directory(self, tree: &mut Tree, path: &FsPath) -> FsResult<()> {
        match self {
            Node::Directory { .. } | Node::File { .. } | Node::Link { .. } => {
                Err(FsError::FileExists(path.clone()))
            }
            Node::DirectoryChild { parent, name } => {
                bind(tree, &parent, &name, Entry::Directory(Directory::default()), path)?;
                tracing::debug!(path = %path, "created directory");
                Ok(())
            }
            Node::FileChild => Err(FsError::NotADirectory(path.parent())),
            Node::NoSuchEntry => Err(FsError::FileNotFound(path.parent())),
        }
    }

    pub(crate) fn list_directory(self, tree: &Tree, path: &FsPath) -> FsResult<BTreeSet<String>> {
        match self {
            Node::Directory { at } => tree
                .directory(&at)
                .map(Directory::names)
                .ok_or_else(|| FsError::FileNotFound(path.clone())),
            Node::File { .. } | Node::FileChild => Err(FsError::NotADirectory(path.clone())),
            Node::Link { at, target } => tree
                .entry_at_source(&at, &target)?
                .list_directory(tree, path),
            Node::DirectoryChild { .. } | Node::NoSuchEntry => {
                Err(FsError::FileNotFound(path.clone()))
            }
        }
    }

    pub(crate) fn remove_empty_directory(self, tree: &mut Tree, path: &FsPath) -> FsResult<()> {
        match self {
            Node::Directory { at } => {
                if at.is_empty() {
                    return Err(FsError::PermissionError(path.clone()));
                }
                let empty = tree.directory(&at).is_some_and(Directory::is_empty);
                if !empty {
                    return Err(FsError::DirectoryNotEmpty(path.clone()));
                }
                tree.detach(&at);
                tracing::debug!(path = %path, "removed directory");
                Ok(())
            }
            Node::File { .. } | Node::Link { .. } | Node::FileChild => {
                Err(FsError::NotADirectory(path.clone()))
            }
            Node::DirectoryChild { .. } | Node::NoSuchEntry => {
                Err(FsError::FileNotFound(path.clone()))
            }
        }
    }

    pub(crate) fn create_file(self, tree: &mut Tree, path: &FsPath) -> FsResult<MemoryFile> {
        match self {
            Node::Directory { .. } | Node::File { .. } | Node::Link { .. } => {
                Err(FsError::FileExists(path.clone()))
            }
            Node::DirectoryChild { parent, name } => {
                let mode = OpenMode::new(Activity::Write, Representation::Text);
                new_file(tree, &parent, &name, mode, path)
            }
            Node::FileChild => Err(FsError::NotADirectory(path.clone())),
            Node::NoSuchEntry => Err(FsError::FileNotFound(path.parent())),
        }
    }

    pub(crate) fn open_file(
        self,
        tree: &mut Tree,
        path: &FsPath,
        mode: OpenMode,
    ) -> FsResult<MemoryFile> {
        match self {
            Node::Directory { .. } => Err(FsError::IsADirectory(path.clone())),
            Node::File { at } => open_existing(tree, &at, mode, path),
            Node::Link { at, target } => tree
                .entry_at_source(&at, &target)?
                .open_file(tree, path, mode),
            Node::DirectoryChild { parent, name } => {
                if mode.read() {
                    Err(FsError::FileNotFound(path.clone()))
                } else {
                    new_file(tree, &parent, &name, mode, path)
                }
            }
            Node::FileChild => Err(FsError::NotADirectory(path.clone())),
            Node::NoSuchEntry => Err(FsError::FileNotFound(path.clone())),
        }
    }

    pub(crate) fn remove_file(self, tree: &mut Tree, path: &FsPath) -> FsResult<()> {
        match self {
            Node::Directory { .. } => Err(FsError::PermissionError(path.clone())),
            Node::File { at } | Node::Link { at, .. } => {
                tree.detach(&at)
                    .ok_or_else(|| FsError::FileNotFound(path.clone()))?;
                tracing::debug!(path = %path, "removed file");
                Ok(())
            }
            Node::FileChild => Err(FsError::NotADirectory(path.clone())),
            Node::DirectoryChild { .. } | Node::NoSuchEntry => {
                Err(FsError::FileNotFound(path.clone()))
            }
        }
    }

    pub(crate) fn link(self, tree: &mut Tree, source: &FsPath, to: &FsPath) -> FsResult<()> {
        match self {
            Node::Directory { .. } | Node::File { .. } | Node::Link { .. } => {
                Err(FsError::FileExists(to.clone()))
            }
            Node::DirectoryChild { parent, name } => {
                bind(tree, &parent, &name, Entry::Link(source.clone()), to)?;
                tracing::debug!(to = %to, source = %source, "created link");
                Ok(())
            }
            Node::FileChild => Err(FsError::NotADirectory(to.parent())),
            Node::NoSuchEntry => Err(FsError::FileNotFound(to.parent())),
        }
    }

    pub(crate) fn readlink(self, path: &FsPath) -> FsResult<FsPath> {
        match self {
            Node::Link { target, .. } => Ok(target),
            Node::Directory { .. } | Node::File { .. } => Err(FsError::NotASymlink(path.clone())),
            Node::FileChild => Err(FsError::NotADirectory(path.clone())),
            Node::DirectoryChild { .. } | Node::NoSuchEntry => {
                Err(FsError::FileNotFound(path.clone()))
            }
        }
    }

    pub(crate) fn exists(&self, tree: &Tree) -> bool {
        match self {
            Node::Directory { .. } | Node::File { .. } => true,
            Node::Link { .. } => self.through_link(tree, Node::exists),
            _ => false,
        }
    }

    pub(crate) fn is_dir(&self, tree: &Tree) -> bool {
        match self {
            Node::Directory { .. } => true,
            Node::Link { .. } => self.through_link(tree, Node::is_dir),
            _ => false,
        }
    }

    pub(crate) fn is_file(&self, tree: &Tree) -> bool {
        match self {
            Node::File { .. } => true,
            Node::Link { .. } => self.through_link(tree, Node::is_file),
            _ => false,
        }
    }

    pub(crate) fn is_link(&self) -> bool {
        matches!(self, Node::Link { .. })
    }

    /// Apply a predicate to a link's current target. Loops answer false.
    fn through_link(&self, tree: &Tree, predicate: fn(&Node, &Tree) -> bool) -> bool {
        match self {
            Node::Link { at, target } => tree
                .entry_at_source(at, target)
                .is_ok_and(|node| predicate(&node, tree)),
            _ => false,
        }
    }
}

fn bind(tree: &mut Tree, parent: &[String], name: &str, entry: Entry, path: &FsPath) -> FsResult<()> {
    tree.insert(parent, name, entry)
        .ok_or_else(|| FsError::FileNotFound(path.parent()))
}

/// Create an empty file and open it.
fn new_file(
    tree: &mut Tree,
    parent: &[String],
    name: &str,
    mode: OpenMode,
    path: &FsPath,
) -> FsResult<MemoryFile> {
    let buffer = ContentBuffer::new();
    bind(tree, parent, name, Entry::File(buffer.clone()), path)?;
    tracing::debug!(path = %path, "created file");
    Ok(MemoryFile::writer(buffer, mode))
}

/// Open an existing file. Write and append install a fresh buffer, so
/// readers and older snapshots keep the bytes they saw.
fn open_existing(tree: &mut Tree, at: &[String], mode: OpenMode, path: &FsPath) -> FsResult<MemoryFile> {
    let not_found = || FsError::FileNotFound(path.clone());
    let current = tree.file(at).ok_or_else(not_found)?;

    let fresh = match mode.activity {
        Activity::Read => return Ok(MemoryFile::reader(current, mode)),
        Activity::Write => ContentBuffer::new(),
        Activity::Append => current.fork(),
    };

    let (name, parent) = at.split_last().ok_or_else(not_found)?;
    bind(tree, parent, name, Entry::File(fresh.clone()), path)?;
    tracing::trace!(path = %path, activity = %mode.activity, "opened file");
    Ok(MemoryFile::writer(fresh, mode))
}
