//! Error types for the Btrieve decoder.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for decoder operations.
pub type BtrieveResult<T> = Result<T, BtrieveError>;

/// Errors that can occur while loading or querying a Btrieve file.
#[derive(Debug, Error)]
pub enum BtrieveError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] btrv_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not exist and no template could stand in for it.
    #[error("unable to locate btrieve file {}", path.display())]
    MissingFile {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The file violates the on-disk format.
    #[error("invalid btrieve format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A single record could not be reconstructed.
    #[error("record at offset {offset:#x} could not be decoded: {source}")]
    RecordDecode {
        /// Absolute file offset of the record.
        offset: u32,
        /// The underlying failure.
        #[source]
        source: Box<BtrieveError>,
    },

    /// A key segment does not fit inside the record it is extracted from.
    #[error(
        "key {key} segment {segment} (offset {offset}, length {length}) exceeds a {record_len}-byte record"
    )]
    SegmentOutOfBounds {
        /// Key number.
        key: u16,
        /// Segment index within the key.
        segment: usize,
        /// Segment offset within the record.
        offset: u16,
        /// Segment length.
        length: u16,
        /// Length of the record buffer.
        record_len: usize,
    },
}

impl BtrieveError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a missing file error.
    pub fn missing_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    /// Wraps `source` as the decode failure of the record at `offset`.
    pub fn record_decode(offset: u32, source: BtrieveError) -> Self {
        Self::RecordDecode {
            offset,
            source: Box::new(source),
        }
    }

    /// Returns true if this error only concerns a single record.
    #[must_use]
    pub fn is_record_decode(&self) -> bool {
        matches!(self, Self::RecordDecode { .. })
    }
}
