//! Host filesystem backend.
//!
//! Provides the same operation set over a real directory tree. All paths
//! are taken relative to `root`: if `root` is `/srv/data`, then `/a/b`
//! names `/srv/data/a/b`.
//!
//! Host errors are mapped onto [`FsError`] by errno, with per-operation
//! adjustments so the path reported matches the in-memory engine.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use rustix::io::Errno;
use treefs_path::FsPath;

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::mode::{Activity, OpenMode, Representation};
use crate::ops::{Filesystem, OpenFile};

/// Host filesystem rooted at a directory.
#[derive(Debug, Clone)]
pub struct NativeFs {
    root: PathBuf,
    config: FsConfig,
}

impl NativeFs {
    /// Create a backend rooted at the given host directory.
    ///
    /// The root is canonicalized at construction time so absolute link
    /// targets can be mapped back (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, FsConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: FsConfig) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self { root, config }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for `path`. A `..` at the root stays at the root.
    fn host(&self, path: &FsPath) -> PathBuf {
        let mut host = self.root.clone();
        let mut depth = 0usize;
        for segment in path.segments() {
            match segment {
                "." => {}
                ".." if depth == 0 => {}
                ".." => {
                    depth -= 1;
                    host.push("..");
                }
                name => {
                    depth += 1;
                    host.push(name);
                }
            }
        }
        host
    }

    /// What gets written into a symlink for `source`.
    fn link_target(&self, source: &FsPath) -> PathBuf {
        if source.is_absolute() {
            self.host(source)
        } else {
            source.segments().collect()
        }
    }

    /// Map a symlink's host contents back into this filesystem.
    fn guest_target(&self, target: &Path) -> FsResult<FsPath> {
        let (absolute, rest) = match target.strip_prefix(&self.root) {
            Ok(inside) => (true, inside),
            Err(_) => (target.is_absolute(), target),
        };

        let segments = rest.components().filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_owned()),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => None,
        });

        let mapped = if absolute {
            FsPath::absolute(segments)
        } else {
            FsPath::relative(segments)
        };
        mapped.map_err(|e| FsError::Io {
            path: FsPath::from(&*target.to_string_lossy()),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    /// Map a host error onto the taxonomy, naming `path`.
    fn host_error(&self, path: &FsPath, source: io::Error) -> FsError {
        let path = path.clone();
        match Errno::from_io_error(&source) {
            Some(Errno::NOENT) => FsError::FileNotFound(path),
            Some(Errno::EXIST) => FsError::FileExists(path),
            Some(Errno::NOTDIR) => FsError::NotADirectory(path),
            Some(Errno::ISDIR) => FsError::IsADirectory(path),
            Some(Errno::NOTEMPTY) => FsError::DirectoryNotEmpty(path),
            Some(Errno::PERM) => FsError::PermissionError(path),
            Some(Errno::INVAL) => FsError::NotASymlink(path),
            Some(Errno::LOOP) => FsError::SymbolicLoop(self.loop_path(&path)),
            _ => FsError::Io { path, source },
        }
    }

    /// Errors from creating a directory or link name the missing parent.
    fn creation_error(&self, path: &FsPath, source: io::Error) -> FsError {
        match self.host_error(path, source) {
            FsError::FileNotFound(_) => FsError::FileNotFound(path.parent()),
            FsError::NotADirectory(_) => FsError::NotADirectory(path.parent()),
            other => other,
        }
    }

    /// The part of `path` reported for a symlink loop: the first looping
    /// prefix plus the name looked up beneath it, as the memory engine
    /// reports it.
    fn loop_path(&self, path: &FsPath) -> FsPath {
        (1..=path.len())
            .find(|&n| {
                fs::metadata(self.host(&path.prefix(n)))
                    .is_err_and(|e| Errno::from_io_error(&e) == Some(Errno::LOOP))
            })
            .map(|n| path.prefix((n + 1).min(path.len())))
            .unwrap_or_else(|| path.clone())
    }
}

impl Filesystem for NativeFs {
    type File = NativeFile;

    #[tracing::instrument(skip(self), name = "nativefs.create_file")]
    fn create_file(&self, path: &FsPath) -> FsResult<NativeFile> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.host(path))
            .map_err(|e| match self.host_error(path, e) {
                FsError::FileNotFound(_) => FsError::FileNotFound(path.parent()),
                other => other,
            })?;
        tracing::debug!(path = %path, "created file");
        Ok(NativeFile::new(
            file,
            OpenMode::new(Activity::Write, Representation::Text),
        ))
    }

    #[tracing::instrument(skip(self), name = "nativefs.open_file")]
    fn open_file(&self, path: &FsPath, mode: &str) -> FsResult<NativeFile> {
        let mode = OpenMode::parse(mode)?;
        let mut options = OpenOptions::new();
        match mode.activity {
            Activity::Read => options.read(true),
            Activity::Write => options.write(true).create(true).truncate(true),
            Activity::Append => options.append(true).create(true),
        };

        let file = options
            .open(self.host(path))
            .map_err(|e| self.host_error(path, e))?;

        // Reading a directory handle succeeds on the host; refuse it here.
        let is_dir = file
            .metadata()
            .map_err(|e| self.host_error(path, e))?
            .is_dir();
        if is_dir {
            return Err(FsError::IsADirectory(path.clone()));
        }

        Ok(NativeFile::new(file, mode))
    }

    #[tracing::instrument(skip(self), name = "nativefs.remove_file")]
    fn remove_file(&self, path: &FsPath) -> FsResult<()> {
        fs::remove_file(self.host(path)).map_err(|e| match self.host_error(path, e) {
            FsError::IsADirectory(p) => FsError::PermissionError(p),
            other => other,
        })?;
        tracing::debug!(path = %path, "removed file");
        Ok(())
    }

    #[tracing::instrument(skip(self), name = "nativefs.create_directory")]
    fn create_directory(&self, path: &FsPath) -> FsResult<()> {
        fs::create_dir(self.host(path)).map_err(|e| self.creation_error(path, e))?;
        tracing::debug!(path = %path, "created directory");
        Ok(())
    }

    #[tracing::instrument(skip(self), name = "nativefs.list_directory")]
    fn list_directory(&self, path: &FsPath) -> FsResult<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(self.host(path)).map_err(|e| self.host_error(path, e))? {
            let entry = entry.map_err(|e| self.host_error(path, e))?;
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    #[tracing::instrument(skip(self), name = "nativefs.remove_empty_directory")]
    fn remove_empty_directory(&self, path: &FsPath) -> FsResult<()> {
        let host = self.host(path);
        if host == self.root {
            return Err(FsError::PermissionError(path.clone()));
        }
        fs::remove_dir(host).map_err(|e| match self.host_error(path, e) {
            // Some platforms report a non-empty directory as EEXIST.
            FsError::FileExists(p) => FsError::DirectoryNotEmpty(p),
            other => other,
        })?;
        tracing::debug!(path = %path, "removed directory");
        Ok(())
    }

    #[tracing::instrument(skip(self), name = "nativefs.temporary_directory")]
    fn temporary_directory(&self) -> FsResult<FsPath> {
        let path = self.config.temporary_path()?;
        self.create_directory(&path)?;
        tracing::debug!(path = %path, "created temporary directory");
        Ok(path)
    }

    #[tracing::instrument(skip(self), name = "nativefs.link")]
    fn link(&self, source: &FsPath, to: &FsPath) -> FsResult<()> {
        std::os::unix::fs::symlink(self.link_target(source), self.host(to))
            .map_err(|e| self.creation_error(to, e))?;
        tracing::debug!(to = %to, source = %source, "created link");
        Ok(())
    }

    #[tracing::instrument(skip(self), name = "nativefs.readlink")]
    fn readlink(&self, path: &FsPath) -> FsResult<FsPath> {
        let target = fs::read_link(self.host(path)).map_err(|e| self.host_error(path, e))?;
        self.guest_target(&target)
    }

    fn exists(&self, path: &FsPath) -> bool {
        fs::metadata(self.host(path)).is_ok()
    }

    fn is_dir(&self, path: &FsPath) -> bool {
        fs::metadata(self.host(path)).is_ok_and(|meta| meta.is_dir())
    }

    fn is_file(&self, path: &FsPath) -> bool {
        fs::metadata(self.host(path)).is_ok_and(|meta| meta.is_file())
    }

    fn is_link(&self, path: &FsPath) -> bool {
        fs::symlink_metadata(self.host(path)).is_ok_and(|meta| meta.file_type().is_symlink())
    }

    fn max_symlink_hops(&self) -> usize {
        self.config.max_symlink_hops
    }
}

/// Handle returned by [`NativeFs`].
#[derive(Debug)]
pub struct NativeFile {
    file: fs::File,
    mode: OpenMode,
}

impl NativeFile {
    fn new(file: fs::File, mode: OpenMode) -> Self {
        Self { file, mode }
    }
}

impl Read for NativeFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for NativeFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl OpenFile for NativeFile {
    fn mode(&self) -> OpenMode {
        self.mode
    }
}
