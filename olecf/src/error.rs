//! Domain × kind tagged errors, spec.md §7.

/// Broad origin of an error, mirroring the C library's error domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Arguments,
    Conversion,
    Compression,
    Io,
    Input,
    Memory,
    Output,
    Runtime,
}

/// Specific failure kind within a [`Domain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    InvalidData,
    SignatureMismatch,
    ChecksumMismatch,
    ValueMismatch,
    ValueMissing,
    ValueAlreadySet,
    InitializeFailed,
    ResizeFailed,
    FinalizeFailed,
    GetFailed,
    SetFailed,
    AppendFailed,
    CopyFailed,
    RemoveFailed,
    PrintFailed,
    ValueOutOfBounds,
    ValueExceedsMaximum,
    UnsupportedValue,
    AbortRequested,
}

/// A single engine error: which domain it came from, what kind of failure it
/// was, a human-readable message, and (for I/O / conversion failures) the
/// underlying source error.
#[derive(Debug, thiserror::Error)]
#[error("{domain:?}/{kind:?}: {message}")]
pub struct Error {
    pub domain: Domain,
    pub kind: Kind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(domain: Domain, kind: Kind, message: impl Into<String>) -> Self {
        Error {
            domain,
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        domain: Domain,
        kind: Kind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error {
            domain,
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn input(kind: Kind, message: impl Into<String>) -> Self {
        Self::new(Domain::Input, kind, message)
    }

    pub fn runtime(kind: Kind, message: impl Into<String>) -> Self {
        Self::new(Domain::Runtime, kind, message)
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::with_source(Domain::Io, Kind::InvalidData, message, source)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io("I/O operation failed", err)
    }
}

impl From<std::string::FromUtf16Error> for Error {
    fn from(err: std::string::FromUtf16Error) -> Self {
        Error::with_source(
            Domain::Conversion,
            Kind::InvalidData,
            "invalid UTF-16 data",
            err,
        )
    }
}
