//! Path values for treefs.
//!
//! An [`FsPath`] is an immutable, ordered sequence of name segments that is
//! either absolute (anchored at the filesystem root) or relative. Backends
//! treat it as an opaque key: they walk [`FsPath::segments`] and build new
//! paths with [`FsPath::descendant`], [`FsPath::sibling`] and
//! [`FsPath::parent`]. Nothing here touches a filesystem.
//!
//! ```text
//! "/"        → root (absolute, zero segments)
//! "/a/b"     → absolute ["a", "b"]
//! "a/../b"   → relative ["a", "..", "b"]   (`..` is kept, `.` is dropped)
//! ""  / "."  → relative, zero segments
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building a path out of raw segments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A segment contained a `/` separator.
    #[error("segment contains a separator: {0:?}")]
    SeparatorInSegment(String),

    /// A segment was empty.
    #[error("empty path segment")]
    EmptySegment,
}

/// A filesystem path made of name segments.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FsPath {
    absolute: bool,
    segments: Vec<String>,
}

impl FsPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self {
            absolute: true,
            segments: Vec::new(),
        }
    }

    /// An absolute path from already-split segments.
    pub fn absolute<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_segments(true, segments)
    }

    /// A relative path from already-split segments.
    pub fn relative<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_segments(false, segments)
    }

    fn from_segments<I, S>(absolute: bool, segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments
            .into_iter()
            .map(|s| validate(s.into()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { absolute, segments })
    }

    /// The name segments, root first.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.segments.iter().map(String::as_str)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for zero-segment paths (`/` or `.`).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// True only for `/`.
    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty()
    }

    /// The last segment, if any.
    pub fn basename(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing path. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self {
            absolute: self.absolute,
            segments,
        }
    }

    /// Extend this path with more segments.
    ///
    /// # Panics
    ///
    /// Panics if a name is empty or contains `/`; use [`FsPath::join`] to
    /// append parsed paths.
    pub fn descendant<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments = self.segments.clone();
        for name in names {
            match validate(name.into()) {
                Ok(name) => segments.push(name),
                Err(e) => panic!("invalid descendant name: {e}"),
            }
        }
        Self {
            absolute: self.absolute,
            segments,
        }
    }

    /// A child of this path's parent.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        self.parent().descendant([name])
    }

    /// Append `other` to this path. An absolute `other` replaces `self`.
    pub fn join(&self, other: &FsPath) -> Self {
        if other.absolute {
            return other.clone();
        }
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self {
            absolute: self.absolute,
            segments,
        }
    }

    /// The first `n` segments of this path.
    pub fn prefix(&self, n: usize) -> Self {
        Self {
            absolute: self.absolute,
            segments: self.segments.iter().take(n).cloned().collect(),
        }
    }
}

fn validate(segment: String) -> Result<String, PathError> {
    if segment.is_empty() {
        Err(PathError::EmptySegment)
    } else if segment.contains('/') {
        Err(PathError::SeparatorInSegment(segment))
    } else {
        Ok(segment)
    }
}

impl FromStr for FsPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            absolute: s.starts_with('/'),
            segments: s
                .split('/')
                .filter(|seg| !seg.is_empty() && *seg != ".")
                .map(str::to_owned)
                .collect(),
        })
    }
}

impl From<&str> for FsPath {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(path) => path,
            Err(never) => match never {},
        }
    }
}

impl From<FsPath> for String {
    fn from(path: FsPath) -> String {
        path.to_string()
    }
}

impl TryFrom<String> for FsPath {
    type Error = std::convert::Infallible;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.absolute, self.segments.is_empty()) {
            (true, true) => f.write_str("/"),
            (false, true) => f.write_str("."),
            (true, false) => write!(f, "/{}", self.segments.join("/")),
            (false, false) => f.write_str(&self.segments.join("/")),
        }
    }
}

impl fmt::Debug for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FsPath({self})")
    }
}
