//! Error types for the payload codec.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unsupported Data Type: {0}")]
    UnsupportedType(String),
    #[error("Missing Required Field: {0}")]
    MissingRequiredField(&'static str),
    #[error("Unknown Field: {0}")]
    UnknownField(String),
    #[error("Payload Too Large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Payload Too Short: expected {expected} bytes, got {actual}")]
    PayloadTooShort { expected: usize, actual: usize },
    #[error("Incompatible Units: cannot convert {from} to {to}")]
    IncompatibleUnits { from: String, to: String },
    #[error("Unknown Unit: {0}")]
    UnknownUnit(String),
    #[error("Unknown Serialization Group: {0}")]
    UnknownGroup(String),
}
