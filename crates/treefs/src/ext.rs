//! Convenience helpers layered over [`Filesystem`].
//!
//! Implemented once for every backend; nothing here touches backend
//! internals.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use treefs_path::FsPath;

use crate::error::{FsError, FsResult};
use crate::ops::Filesystem;

/// Extension methods available on every [`Filesystem`].
pub trait FilesystemExt: Filesystem {
    /// Create the file if it is missing, leaving existing contents alone.
    fn touch(&self, path: &FsPath) -> FsResult<()> {
        self.open_file(path, "ab")?;
        Ok(())
    }

    /// Remove a path and everything beneath it.
    ///
    /// Links are removed, never followed.
    fn remove(&self, path: &FsPath) -> FsResult<()> {
        if self.is_dir(path) && !self.is_link(path) {
            for child in self.children(path)? {
                self.remove(&child)?;
            }
            self.remove_empty_directory(path)
        } else {
            self.remove_file(path)
        }
    }

    /// Full paths of the entries in a directory.
    fn children(&self, path: &FsPath) -> FsResult<BTreeSet<FsPath>> {
        Ok(self
            .list_directory(path)?
            .into_iter()
            .map(|name| path.descendant([name]))
            .collect())
    }

    /// Children whose name matches `pattern`.
    fn glob_children(&self, path: &FsPath, pattern: &glob::Pattern) -> FsResult<BTreeSet<FsPath>> {
        Ok(self
            .list_directory(path)?
            .into_iter()
            .filter(|name| pattern.matches(name))
            .map(|name| path.descendant([name]))
            .collect())
    }

    /// Whole file as text. Invalid UTF-8 is replaced, not rejected.
    fn contents_of(&self, path: &FsPath) -> FsResult<String> {
        let bytes = self.bytes_of(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Whole file as bytes.
    fn bytes_of(&self, path: &FsPath) -> FsResult<Vec<u8>> {
        let mut file = self.open_file(path, "rb")?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|source| io_error(path, source))?;
        Ok(bytes)
    }

    /// Replace a file's contents, creating it if needed.
    fn set_contents(&self, path: &FsPath, bytes: &[u8]) -> FsResult<()> {
        let mut file = self.open_file(path, "wb")?;
        file.write_all(bytes).map_err(|source| io_error(path, source))?;
        file.flush().map_err(|source| io_error(path, source))
    }
}

impl<T: Filesystem + ?Sized> FilesystemExt for T {}

fn io_error(path: &FsPath, source: std::io::Error) -> FsError {
    FsError::Io {
        path: path.clone(),
        source,
    }
}
