//! Serialization formats and the shared encode/decode capability.
//!
//! Every top-level PKI entity implements [`PkiObject`]: canonical DER in and
//! out, PEM armor on top of the same DER, and blocking file load/save. The
//! canonical DER bytes are the basis for comparison and hashing, so `to_der`
//! must be deterministic for a given object state.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::infra::error::{PkiError, PkiResult};

/// Serialization format for PKI objects and key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Canonical binary encoding.
    Der,
    /// Base64 text with `-----BEGIN ...-----` armor around the DER.
    Pem,
}

impl FromStr for DataFormat {
    type Err = PkiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "der" => Ok(DataFormat::Der),
            "pem" => Ok(DataFormat::Pem),
            other => Err(PkiError::Decode(format!("unknown data format: {other}"))),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Der => write!(f, "DER"),
            DataFormat::Pem => write!(f, "PEM"),
        }
    }
}

/// Wraps DER bytes in PEM armor with the given label.
pub(crate) fn pem_wrap(label: &str, der: &[u8]) -> String {
    pem::encode(&pem::Pem::new(label, der.to_vec()))
}

/// Strips PEM armor, checking the label against the accepted set.
pub(crate) fn pem_unwrap(data: &[u8], accepted: &[&str]) -> PkiResult<Vec<u8>> {
    let block = pem::parse(data)?;
    if !accepted.contains(&block.tag()) {
        return Err(PkiError::Decode(format!(
            "unexpected PEM label {:?}, expected one of {:?}",
            block.tag(),
            accepted
        )));
    }
    Ok(block.contents().to_vec())
}

/// Canonical encode/decode capability shared by Certificate, CRL and
/// SignedData.
///
/// `import`/`export` and `load`/`save` are provided on top of the two
/// required methods, so an implementation only supplies its DER codec and
/// PEM label.
pub trait PkiObject: Sized {
    /// PEM label written on export.
    const PEM_LABEL: &'static str;

    /// Alternate PEM labels accepted on import.
    const PEM_ALIASES: &'static [&'static str] = &[];

    /// Decodes an object from canonical DER.
    ///
    /// # Errors
    /// `PkiError::Decode` on malformed input.
    fn from_der(der: &[u8]) -> PkiResult<Self>;

    /// Encodes the object to canonical DER.
    ///
    /// # Errors
    /// `PkiError::Encode` if the object graph cannot be serialized.
    fn to_der(&self) -> PkiResult<Vec<u8>>;

    /// Decodes from raw bytes in the given format.
    ///
    /// # Errors
    /// `PkiError::Decode` on malformed input or a wrong PEM label.
    fn import(data: &[u8], format: DataFormat) -> PkiResult<Self> {
        match format {
            DataFormat::Der => Self::from_der(data),
            DataFormat::Pem => {
                let mut accepted = vec![Self::PEM_LABEL];
                accepted.extend_from_slice(Self::PEM_ALIASES);
                let der = pem_unwrap(data, &accepted)?;
                Self::from_der(&der)
            }
        }
    }

    /// Encodes to raw bytes in the given format. Deterministic per format.
    ///
    /// # Errors
    /// `PkiError::Encode` if serialization fails.
    fn export(&self, format: DataFormat) -> PkiResult<Vec<u8>> {
        let der = self.to_der()?;
        Ok(match format {
            DataFormat::Der => der,
            DataFormat::Pem => pem_wrap(Self::PEM_LABEL, &der).into_bytes(),
        })
    }

    /// Reads and decodes a file. Blocking.
    ///
    /// # Errors
    /// `PkiError::Io` on file errors, `PkiError::Decode` on malformed content.
    fn load(path: impl AsRef<Path>, format: DataFormat) -> PkiResult<Self> {
        let data = fs::read(path)?;
        Self::import(&data, format)
    }

    /// Encodes and writes to a file. Blocking.
    ///
    /// # Errors
    /// `PkiError::Io` on file errors, `PkiError::Encode` if serialization
    /// fails.
    fn save(&self, path: impl AsRef<Path>, format: DataFormat) -> PkiResult<()> {
        fs::write(path, self.export(format)?)?;
        Ok(())
    }
}
