//! In-memory filesystem engine.
//!
//! Every path is resolved into a [`node::Node`] first and the node decides
//! what an operation means for it. The tree is persistent, so
//! [`MemoryFs::snapshot`] is a cheap clone that later mutations on either
//! side never leak into.

mod node;
mod tree;

use std::collections::BTreeSet;

use parking_lot::RwLock;
use treefs_path::FsPath;

use crate::buffer::MemoryFile;
use crate::config::FsConfig;
use crate::error::FsResult;
use crate::mode::OpenMode;
use crate::ops::Filesystem;

use node::Node;
use tree::{Follow, Tree};

/// In-memory filesystem.
///
/// Thread-safe via an internal `RwLock`. All data is lost when dropped.
#[derive(Debug)]
pub struct MemoryFs {
    tree: RwLock<Tree>,
    config: FsConfig,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create an empty filesystem holding only the root directory.
    pub fn new() -> Self {
        Self::with_config(FsConfig::default())
    }

    pub fn with_config(config: FsConfig) -> Self {
        Self {
            tree: RwLock::new(Tree::new(config.max_symlink_hops)),
            config,
        }
    }

    /// An independent copy of the current state.
    ///
    /// Directories are shared until one side changes them. File contents
    /// are shared too: opening a file for write or append on either side
    /// installs a fresh buffer, leaving the other side's bytes alone.
    pub fn snapshot(&self) -> Self {
        Self {
            tree: RwLock::new(self.tree.read().clone()),
            config: self.config.clone(),
        }
    }

    fn node(&self, path: &FsPath) -> FsResult<Node> {
        self.tree.read().resolve(path, Follow::Never)
    }

    /// Run a predicate against the unfollowed node. Loops answer false.
    fn check(&self, path: &FsPath, predicate: impl FnOnce(&Node, &Tree) -> bool) -> bool {
        let tree = self.tree.read();
        tree.resolve(path, Follow::Never)
            .is_ok_and(|node| predicate(&node, &*tree))
    }
}

impl Filesystem for MemoryFs {
    type File = MemoryFile;

    #[tracing::instrument(skip(self), name = "memfs.create_file")]
    fn create_file(&self, path: &FsPath) -> FsResult<MemoryFile> {
        let mut tree = self.tree.write();
        let node = tree.resolve(path, Follow::Never)?;
        node.create_file(&mut tree, path)
    }

    #[tracing::instrument(skip(self), name = "memfs.open_file")]
    fn open_file(&self, path: &FsPath, mode: &str) -> FsResult<MemoryFile> {
        let mode = OpenMode::parse(mode)?;
        let mut tree = self.tree.write();
        let node = tree.resolve(path, Follow::Never)?;
        node.open_file(&mut tree, path, mode)
    }

    #[tracing::instrument(skip(self), name = "memfs.remove_file")]
    fn remove_file(&self, path: &FsPath) -> FsResult<()> {
        let mut tree = self.tree.write();
        let node = tree.resolve(path, Follow::Never)?;
        node.remove_file(&mut tree, path)
    }

    #[tracing::instrument(skip(self), name = "memfs.create_directory")]
    fn create_directory(&self, path: &FsPath) -> FsResult<()> {
        let mut tree = self.tree.write();
        let node = tree.resolve(path, Follow::Never)?;
        node.create_directory(&mut tree, path)
    }

    #[tracing::instrument(skip(self), name = "memfs.list_directory")]
    fn list_directory(&self, path: &FsPath) -> FsResult<BTreeSet<String>> {
        let tree = self.tree.read();
        let node = tree.resolve(path, Follow::Never)?;
        node.list_directory(&tree, path)
    }

    #[tracing::instrument(skip(self), name = "memfs.remove_empty_directory")]
    fn remove_empty_directory(&self, path: &FsPath) -> FsResult<()> {
        let mut tree = self.tree.write();
        let node = tree.resolve(path, Follow::Never)?;
        node.remove_empty_directory(&mut tree, path)
    }

    #[tracing::instrument(skip(self), name = "memfs.temporary_directory")]
    fn temporary_directory(&self) -> FsResult<FsPath> {
        let path = self.config.temporary_path()?;
        self.create_directory(&path)?;
        tracing::debug!(path = %path, "created temporary directory");
        Ok(path)
    }

    #[tracing::instrument(skip(self), name = "memfs.link")]
    fn link(&self, source: &FsPath, to: &FsPath) -> FsResult<()> {
        let mut tree = self.tree.write();
        let node = tree.resolve(to, Follow::Never)?;
        node.link(&mut tree, source, to)
    }

    #[tracing::instrument(skip(self), name = "memfs.readlink")]
    fn readlink(&self, path: &FsPath) -> FsResult<FsPath> {
        self.node(path)?.readlink(path)
    }

    fn exists(&self, path: &FsPath) -> bool {
        self.check(path, Node::exists)
    }

    fn is_dir(&self, path: &FsPath) -> bool {
        self.check(path, Node::is_dir)
    }

    fn is_file(&self, path: &FsPath) -> bool {
        self.check(path, Node::is_file)
    }

    fn is_link(&self, path: &FsPath) -> bool {
        self.node(path).is_ok_and(|node| node.is_link())
    }

    fn max_symlink_hops(&self) -> usize {
        self.config.max_symlink_hops
    }
}
