//! Filesystem error taxonomy.
//!
//! Every backend reports failures through the same closed set of
//! conditions, each tied to the path it concerns. Display strings follow
//! `strerror(3)` so a message reads the same whichever backend raised it.

use std::io;

use thiserror::Error;
use treefs_path::{FsPath, PathError};

/// Filesystem error type.
#[derive(Debug, Error)]
pub enum FsError {
    /// ENOENT.
    #[error("No such file or directory: {0}")]
    FileNotFound(FsPath),

    /// EEXIST.
    #[error("File exists: {0}")]
    FileExists(FsPath),

    /// ENOTDIR.
    #[error("Not a directory: {0}")]
    NotADirectory(FsPath),

    /// EISDIR.
    #[error("Is a directory: {0}")]
    IsADirectory(FsPath),

    /// ENOTEMPTY.
    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(FsPath),

    /// EPERM, e.g. removing a directory as if it were a file.
    #[error("Operation not permitted: {0}")]
    PermissionError(FsPath),

    /// EINVAL from readlink on something that is not a link.
    #[error("Invalid argument: {0}")]
    NotASymlink(FsPath),

    /// ELOOP.
    #[error("Too many levels of symbolic links: {0}")]
    SymbolicLoop(FsPath),

    /// A mode string that does not parse. Raised before any tree access.
    #[error("invalid mode: {0:?}")]
    InvalidMode(String),

    /// A generated name that is not a valid path segment.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Host failure outside the taxonomy. Only the native backend raises it.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: FsPath,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// The path this error concerns, if it has one.
    pub fn path(&self) -> Option<&FsPath> {
        match self {
            FsError::FileNotFound(p)
            | FsError::FileExists(p)
            | FsError::NotADirectory(p)
            | FsError::IsADirectory(p)
            | FsError::DirectoryNotEmpty(p)
            | FsError::PermissionError(p)
            | FsError::NotASymlink(p)
            | FsError::SymbolicLoop(p) => Some(p),
            FsError::Io { path, .. } => Some(path),
            FsError::InvalidMode(_) | FsError::InvalidPath(_) => None,
        }
    }

    /// The POSIX errno this condition corresponds to.
    #[cfg(unix)]
    pub fn errno(&self) -> Option<i32> {
        use rustix::io::Errno;

        let errno = match self {
            FsError::FileNotFound(_) => Errno::NOENT,
            FsError::FileExists(_) => Errno::EXIST,
            FsError::NotADirectory(_) => Errno::NOTDIR,
            FsError::IsADirectory(_) => Errno::ISDIR,
            FsError::DirectoryNotEmpty(_) => Errno::NOTEMPTY,
            FsError::PermissionError(_) => Errno::PERM,
            FsError::NotASymlink(_) => Errno::INVAL,
            FsError::SymbolicLoop(_) => Errno::LOOP,
            FsError::Io { source, .. } => return source.raw_os_error(),
            FsError::InvalidMode(_) | FsError::InvalidPath(_) => return None,
        };
        Some(errno.raw_os_error())
    }
}

/// Convert FsError to std::io::Error for compatibility.
impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        let kind = match &e {
            FsError::FileNotFound(_) => io::ErrorKind::NotFound,
            FsError::FileExists(_) => io::ErrorKind::AlreadyExists,
            FsError::NotADirectory(_) => io::ErrorKind::NotADirectory,
            FsError::IsADirectory(_) => io::ErrorKind::IsADirectory,
            FsError::DirectoryNotEmpty(_) => io::ErrorKind::DirectoryNotEmpty,
            FsError::PermissionError(_) => io::ErrorKind::PermissionDenied,
            FsError::NotASymlink(_) | FsError::InvalidMode(_) | FsError::InvalidPath(_) => {
                io::ErrorKind::InvalidInput
            }
            FsError::SymbolicLoop(_) => io::ErrorKind::Other,
            FsError::Io { source, .. } => source.kind(),
        };
        match e {
            FsError::Io { source, .. } => source,
            other => io::Error::new(kind, other),
        }
    }
}

/// Filesystem result type.
pub type FsResult<T> = Result<T, FsError>;
