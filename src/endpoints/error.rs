//! Error types for endpoint lookup and addressing.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown Endpoint: {0}")]
    UnknownEndpoint(String),
    #[error("Duplicate Endpoint: {0}")]
    DuplicateEndpoint(&'static str),
    #[error("Malformed Endpoint {endpoint}: {reason}")]
    MalformedEndpoint { endpoint: &'static str, reason: String },
    #[error("Node ID {node_id} Out Of Range for endpoint 0x{ep_id:03x}")]
    NodeIdOutOfRange { node_id: u8, ep_id: u16 },
    #[error("Endpoint {endpoint} requires firmware {required}, device runs {actual}")]
    UnsupportedFirmwareVersion {
        endpoint: &'static str,
        required: semver::Version,
        actual: semver::Version,
    },
    #[error("Endpoint {0} does not support this direction")]
    WrongDirection(&'static str),
}
