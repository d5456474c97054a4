//! Contains the main error type for the library.
use thiserror::Error;

/// The main error type for the library. Each module has it's own error type that is contained by this error.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Not Found")]
    NotFound,
    #[error("Malformed Frame")]
    MalformedFrame,
    #[error("Timeout")]
    Timeout,
    #[error("Adapter Disconnected")]
    Disconnected,
    #[error("IO Error: {0:?}")]
    Io(std::io::ErrorKind),
    #[error(transparent)]
    CodecError(crate::codec::Error),
    #[error(transparent)]
    EndpointError(crate::endpoints::Error),
}

impl From<tokio_stream::Elapsed> for Error {
    fn from(_: tokio_stream::Elapsed) -> Error {
        Error::Timeout
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Error {
        Error::Timeout
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound,
            kind => Error::Io(kind),
        }
    }
}

impl From<crate::codec::Error> for Error {
    fn from(err: crate::codec::Error) -> Error {
        Error::CodecError(err)
    }
}

impl From<crate::endpoints::Error> for Error {
    fn from(err: crate::endpoints::Error) -> Error {
        Error::EndpointError(err)
    }
}
