use std::error::Error;
use std::fmt;
use std::io;

/// Enumeration of all possible errors that can occur while demultiplexing
#[derive(Debug)]
pub enum DemuxError {
    Header(HeaderError),
    Sync(SyncError),
    Cursor(CursorError),
    Io(io::Error),
}

/// Container header could not be parsed; fatal for the input
#[derive(Debug)]
pub struct HeaderError {
    pub message: String,
}

impl HeaderError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A stream lost synchronization and cannot be packetized any further
#[derive(Debug)]
pub struct SyncError {
    pub stream_id: u32,
    pub message: String,
}

impl SyncError {
    /// Create a new error for `stream_id` with the given message.
    pub fn new(stream_id: u32, message: impl Into<String>) -> Self {
        Self {
            stream_id,
            message: message.into(),
        }
    }
}

/// Bounds-checked cursor errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// Fewer bytes (or bits) left than requested
    OutOfData { wanted: usize, available: usize },
}

impl fmt::Display for DemuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemuxError::Io(err) => write!(f, "I/O error: {}", err),
            DemuxError::Header(err) => write!(f, "Header error: {}", err),
            DemuxError::Sync(err) => write!(f, "Sync error: {}", err),
            DemuxError::Cursor(err) => write!(f, "Cursor error: {}", err),
        }
    }
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream {}: {}", self.stream_id, self.message)
    }
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::OutOfData { wanted, available } => write!(
                f,
                "out of data: wanted {} but only {} available",
                wanted, available
            ),
        }
    }
}

impl Error for DemuxError {}
impl Error for HeaderError {}
impl Error for SyncError {}
impl Error for CursorError {}

// Conversion implementations
impl From<io::Error> for DemuxError {
    fn from(err: io::Error) -> Self {
        DemuxError::Io(err)
    }
}

impl From<HeaderError> for DemuxError {
    fn from(err: HeaderError) -> Self {
        DemuxError::Header(err)
    }
}

impl From<SyncError> for DemuxError {
    fn from(err: SyncError) -> Self {
        DemuxError::Sync(err)
    }
}

impl From<CursorError> for DemuxError {
    fn from(err: CursorError) -> Self {
        DemuxError::Cursor(err)
    }
}

// A header that runs out of bytes is an unparseable header
impl From<CursorError> for HeaderError {
    fn from(err: CursorError) -> Self {
        HeaderError::new(format!("truncated header: {}", err))
    }
}

// Conversion to io::Error for callers working with std I/O
impl From<DemuxError> for io::Error {
    fn from(err: DemuxError) -> Self {
        match err {
            DemuxError::Io(e) => e,
            other => io::Error::other(other),
        }
    }
}

impl From<HeaderError> for io::Error {
    fn from(err: HeaderError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

impl From<SyncError> for io::Error {
    fn from(err: SyncError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

// Type alias for Result with DemuxError
pub type DemuxResult<T> = Result<T, DemuxError>;
