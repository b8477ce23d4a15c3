// SPDX-License-Identifier: MPL-2.0

//! Error types for recorder configuration, WebM processing and the ingest server

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Recorder selection or construction errors
    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),
    /// WebM parsing errors
    #[error("WebM error: {0}")]
    Webm(#[from] WebmError),
    /// Recording storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Server errors
    #[error("Server error: {0}")]
    Server(String),
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recorder selection and construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    /// The media source has neither video nor audio tracks
    #[error("no tracks to record")]
    NoTracks,
    /// None of the candidate identifiers is supported by the host
    #[error("unsupported mime type")]
    UnsupportedMimeType {
        /// Candidates that were probed, in priority order
        candidates: Vec<String>,
    },
    /// The host cannot record the configured mime type
    #[error("mime type not supported by recorder: {0}")]
    NotSupported(String),
    /// An option value was rejected by the host
    #[error("invalid recorder option {name}: {reason}")]
    InvalidOption { name: String, reason: String },
    /// Pipeline construction or state change failed
    #[error("pipeline error: {0}")]
    Pipeline(String),
    /// GStreamer initialization or element errors
    #[error("GStreamer error: {0}")]
    Gstreamer(String),
}

#[cfg(feature = "gstreamer")]
impl RecordingError {
    pub(crate) fn invalid_option(name: &str, reason: impl Into<String>) -> Self {
        RecordingError::InvalidOption {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// EBML/WebM parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebmError {
    /// Input does not start with an EBML header
    #[error("not an EBML document")]
    NotEbml,
    /// EBML header declares a doc type other than webm/matroska
    #[error("unsupported doc type: {0}")]
    UnsupportedDocType(String),
    /// Invalid variable-length integer at the given offset
    #[error("invalid variable-length integer at offset {0}")]
    InvalidVint(usize),
    /// Element payload runs past its parent
    #[error("element {id:#x} at offset {offset} overruns its parent")]
    Overrun { id: u32, offset: usize },
    /// Element payload has an invalid length for its type
    #[error("element {id:#x} has invalid payload length {len}")]
    InvalidPayload { id: u32, len: usize },
    /// Unknown size on an element that must be sized
    #[error("element {id:#x} at offset {offset} has unknown size")]
    UnknownSize { id: u32, offset: usize },
    /// No Segment element follows the EBML header
    #[error("missing Segment element")]
    MissingSegment,
    /// The segment contains no clusters
    #[error("stream contains no clusters")]
    NoClusters,
    /// The clusters contain no blocks
    #[error("stream contains no blocks")]
    NoBlocks,
    /// Value cannot be encoded as EBML
    #[error("value {0} cannot be encoded as an EBML size")]
    Unencodable(u64),
    /// Cluster timecode plus a block offset does not fit in a signed timecode
    #[error("block timecode out of range in cluster at {0}")]
    TimecodeOverflow(u64),
}

/// Recording storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Recording name is empty or escapes the recordings directory
    #[error("invalid recording name: {0:?}")]
    InvalidName(String),
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ingest server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Upload could not be parsed as WebM
    #[error("invalid recording: {0}")]
    InvalidRecording(#[from] WebmError),
    /// Upload exceeds the configured limit
    #[error("upload exceeds {0} bytes")]
    TooLarge(usize),
    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Background task failed
    #[error("task failed: {0}")]
    Task(String),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Storage(StorageError::Io(err))
    }
}

impl From<ServerError> for AppError {
    fn from(err: ServerError) -> Self {
        AppError::Server(err.to_string())
    }
}
