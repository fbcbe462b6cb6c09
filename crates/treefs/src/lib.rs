//! Filesystem abstraction with an in-memory engine and a host backend.
//!
//! Both backends implement [`Filesystem`] and report failures with the
//! same [`FsError`] conditions, so code written against one runs against
//! the other unchanged.
//!
//! ```
//! use treefs::{Filesystem, FilesystemExt, FsPath, MemoryFs};
//!
//! let fs = MemoryFs::new();
//! fs.create_directory(&FsPath::from("/docs")).unwrap();
//! fs.set_contents(&FsPath::from("/docs/readme"), b"hello").unwrap();
//! fs.link(&FsPath::from("docs"), &FsPath::from("/alias")).unwrap();
//!
//! assert_eq!(fs.contents_of(&FsPath::from("/alias/readme")).unwrap(), "hello");
//! assert_eq!(fs.realpath(&FsPath::from("/alias/readme")).unwrap(), FsPath::from("/docs/readme"));
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod ext;
pub mod memory;
pub mod mode;
#[cfg(unix)]
pub mod native;
pub mod ops;

pub use buffer::{ContentBuffer, MemoryFile};
pub use config::{ConfigError, DEFAULT_MAX_SYMLINK_HOPS, FsConfig};
pub use error::{FsError, FsResult};
pub use ext::FilesystemExt;
pub use memory::MemoryFs;
pub use mode::{Activity, OpenMode, Representation};
#[cfg(unix)]
pub use native::{NativeFile, NativeFs};
pub use ops::{Filesystem, OpenFile};
pub use treefs_path::{FsPath, PathError};
