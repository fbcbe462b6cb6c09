//! Filesystem operations trait.
//!
//! This trait defines the path-keyed operation set every backend exposes,
//! so callers can swap the in-memory engine for the native one without
//! changing a line. Errors come from the shared [`FsError`] taxonomy.

use std::collections::{BTreeSet, VecDeque};
use std::io::{self, Read, Write};

use treefs_path::FsPath;

use crate::config::DEFAULT_MAX_SYMLINK_HOPS;
use crate::error::{FsError, FsResult};
use crate::mode::{OpenMode, Representation};

/// An open file handle.
///
/// `Read`/`Write` move raw bytes in every mode. The `*_text` and `*_bytes`
/// helpers enforce the representation the handle was opened with.
pub trait OpenFile: Read + Write {
    /// The mode this handle was opened with.
    fn mode(&self) -> OpenMode;

    /// Read everything remaining as text. Text mode only.
    fn read_text(&mut self) -> io::Result<String> {
        expect_representation(self.mode(), Representation::Text)?;
        let mut text = String::new();
        self.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Write a string. Text mode only.
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        expect_representation(self.mode(), Representation::Text)?;
        self.write_all(text.as_bytes())
    }

    /// Read everything remaining as bytes. Binary mode only.
    fn read_bytes(&mut self) -> io::Result<Vec<u8>> {
        expect_representation(self.mode(), Representation::Binary)?;
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Write bytes. Binary mode only.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        expect_representation(self.mode(), Representation::Binary)?;
        self.write_all(bytes)
    }
}

fn expect_representation(mode: OpenMode, wanted: Representation) -> io::Result<()> {
    if mode.representation == wanted {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("handle opened in {} mode, not {}", mode.representation, wanted),
        ))
    }
}

/// Core filesystem operations trait.
///
/// Absolute and relative paths are both resolved from the root; a backend
/// has no working directory.
pub trait Filesystem: Send + Sync {
    /// Handle type returned by [`Filesystem::open_file`].
    type File: OpenFile;

    // ========================================================================
    // Files
    // ========================================================================

    /// Create a new file and open it for writing (text mode).
    ///
    /// Fails with `FileExists` if anything, including a dangling link,
    /// already occupies the path.
    fn create_file(&self, path: &FsPath) -> FsResult<Self::File>;

    /// Open a file with a mode string (see [`OpenMode`]).
    ///
    /// Write and append create the file when it is missing; read does not.
    fn open_file(&self, path: &FsPath, mode: &str) -> FsResult<Self::File>;

    /// Remove a file or a link. Links are removed, never followed.
    fn remove_file(&self, path: &FsPath) -> FsResult<()>;

    // ========================================================================
    // Directories
    // ========================================================================

    /// Create a single directory. The parent must already exist.
    fn create_directory(&self, path: &FsPath) -> FsResult<()>;

    /// Names of the entries in a directory.
    fn list_directory(&self, path: &FsPath) -> FsResult<BTreeSet<String>>;

    /// Remove a directory that has no entries.
    fn remove_empty_directory(&self, path: &FsPath) -> FsResult<()>;

    /// Create a uniquely named, empty directory and return its path.
    fn temporary_directory(&self) -> FsResult<FsPath>;

    // ========================================================================
    // Links
    // ========================================================================

    /// Create a symbolic link at `to` pointing at `source`.
    ///
    /// `source` need not exist. A relative `source` is interpreted against
    /// the directory containing `to`.
    fn link(&self, source: &FsPath, to: &FsPath) -> FsResult<()>;

    /// The immediate target of a link.
    fn readlink(&self, path: &FsPath) -> FsResult<FsPath>;

    // ========================================================================
    // Predicates
    // ========================================================================

    /// True if the path exists, following links.
    fn exists(&self, path: &FsPath) -> bool;

    /// True if the path is a directory, following links.
    fn is_dir(&self, path: &FsPath) -> bool;

    /// True if the path is a regular file, following links.
    fn is_file(&self, path: &FsPath) -> bool;

    /// True if the path itself is a symbolic link.
    fn is_link(&self, path: &FsPath) -> bool;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Upper bound on link hops during one resolution.
    fn max_symlink_hops(&self) -> usize {
        DEFAULT_MAX_SYMLINK_HOPS
    }

    /// Canonical path with every link along it resolved.
    ///
    /// Links are substituted one at a time, left to right, until no prefix
    /// of the path is a link. Components that do not exist are kept as
    /// they are.
    fn realpath(&self, path: &FsPath) -> FsResult<FsPath> {
        let mut resolved = FsPath::root();
        let mut pending: VecDeque<String> = path.segments().map(str::to_owned).collect();
        let mut hops = 0usize;

        while let Some(name) = pending.pop_front() {
            match name.as_str() {
                "." => continue,
                ".." => {
                    resolved = resolved.parent();
                    continue;
                }
                _ => {}
            }

            let candidate = resolved.descendant([name]);
            if !self.is_link(&candidate) {
                resolved = candidate;
                continue;
            }

            hops += 1;
            if hops > self.max_symlink_hops() {
                tracing::warn!(path = %path, link = %candidate, "symlink loop during realpath");
                return Err(FsError::SymbolicLoop(candidate));
            }

            let target = self.readlink(&candidate)?;
            tracing::trace!(link = %candidate, target = %target, "realpath hop");
            for segment in target.segments().rev() {
                pending.push_front(segment.to_owned());
            }
            if target.is_absolute() {
                resolved = FsPath::root();
            }
        }

        Ok(resolved)
    }
}
