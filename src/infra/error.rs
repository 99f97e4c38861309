//! Error taxonomy and result alias for PKI object handling.

use thiserror::Error;

/// Result type for PKI and CMS operations
pub type PkiResult<T> = Result<T, PkiError>;

/// Error kinds surfaced by entities, collections, services and engine adapters
#[derive(Error, Debug, miette::Diagnostic)]
pub enum PkiError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Collection is empty")]
    EmptyCollection,

    #[error("Index {index} out of range for collection of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Signer certificate not found: {0}")]
    SignerCertificateNotFound(String),

    #[error("Signed attribute mismatch: {0}")]
    AttributeMismatch(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Content missing: {0}")]
    ContentMissing(String),

    #[error("Issuer certificate not found: {0}")]
    IssuerCertificateNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<der::Error> for PkiError {
    fn from(error: der::Error) -> Self {
        PkiError::Decode(error.to_string())
    }
}

impl From<pem::PemError> for PkiError {
    fn from(error: pem::PemError) -> Self {
        PkiError::Decode(error.to_string())
    }
}

impl From<std::io::Error> for PkiError {
    fn from(error: std::io::Error) -> Self {
        PkiError::Io(error.to_string())
    }
}
