//! In-memory file contents and the handles that read and write them.

use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::mode::OpenMode;
use crate::ops::OpenFile;

/// The bytes of one file.
///
/// Cloning shares the same storage; a writer handle holds a clone, so its
/// writes land in the file immediately.
#[derive(Debug, Clone, Default)]
pub struct ContentBuffer(Arc<Mutex<Vec<u8>>>);

impl ContentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new, unshared buffer holding a copy of these bytes.
    pub fn fork(&self) -> Self {
        Self(Arc::new(Mutex::new(self.bytes())))
    }

    /// Copy of the current bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    fn extend(&self, data: &[u8]) {
        self.0.lock().extend_from_slice(data);
    }
}

#[derive(Debug)]
enum Stream {
    /// Private copy taken at open time.
    Reader(Cursor<Vec<u8>>),
    /// Live buffer installed in the tree.
    Writer(ContentBuffer),
}

/// Handle returned by the in-memory engine.
///
/// Closing (or dropping) stops further I/O, but [`MemoryFile::contents`]
/// keeps answering with the final bytes.
#[derive(Debug)]
pub struct MemoryFile {
    mode: OpenMode,
    stream: Stream,
    closed: bool,
}

impl MemoryFile {
    pub(crate) fn reader(buffer: &ContentBuffer, mode: OpenMode) -> Self {
        Self {
            mode,
            stream: Stream::Reader(Cursor::new(buffer.bytes())),
            closed: false,
        }
    }

    pub(crate) fn writer(buffer: ContentBuffer, mode: OpenMode) -> Self {
        Self {
            mode,
            stream: Stream::Writer(buffer),
            closed: false,
        }
    }

    /// Everything this handle can see, regardless of position or closure.
    pub fn contents(&self) -> Vec<u8> {
        match &self.stream {
            Stream::Reader(cursor) => cursor.get_ref().clone(),
            Stream::Writer(buffer) => buffer.bytes(),
        }
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed {
            Err(io::Error::other("I/O operation on closed file"))
        } else {
            Ok(())
        }
    }
}

impl Read for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        match &mut self.stream {
            Stream::Reader(cursor) => cursor.read(buf),
            Stream::Writer(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("handle opened for {}", self.mode.activity),
            )),
        }
    }
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        match &self.stream {
            Stream::Writer(buffer) => {
                buffer.extend(buf);
                Ok(buf.len())
            }
            Stream::Reader(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "handle opened for read",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()
    }
}

impl OpenFile for MemoryFile {
    fn mode(&self) -> OpenMode {
        self.mode
    }
}
