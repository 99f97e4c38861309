//! Cryptographic engine trait behind signing and verification.
//!
//! The domain and service layers never call a crypto library directly; they go
//! through this trait. Implementations hash-and-sign: `sign` and
//! `verify_signature` receive the exact message bytes together with a digest
//! algorithm name and perform the hashing internally.

use crate::domain::algorithm::{KeyKind, PrivateKey};
use crate::domain::encoding::DataFormat;
use crate::infra::error::PkiResult;

/// Low-level cryptographic operations used by the message services.
pub trait CryptoEngine: Send + Sync {
    /// Compute the digest of `data` under the named algorithm (`"sha256"`, ...).
    ///
    /// # Errors
    ///
    /// Returns error if the algorithm name is not recognized.
    fn digest(&self, algorithm: &str, data: &[u8]) -> PkiResult<Vec<u8>>;

    /// Sign `data` with `key`, hashing internally with the named digest.
    ///
    /// # Errors
    ///
    /// Returns error if the key cannot be loaded or the signature operation
    /// fails.
    fn sign(&self, key: &PrivateKey, algorithm: &str, data: &[u8]) -> PkiResult<Vec<u8>>;

    /// Check `signature` over `data` against a DER-encoded
    /// `SubjectPublicKeyInfo`.
    ///
    /// A structurally sound signature that simply does not match yields
    /// `Ok(false)`; errors are reserved for unusable keys or algorithms.
    ///
    /// # Errors
    ///
    /// Returns error if the public key or algorithm name cannot be used.
    fn verify_signature(
        &self,
        spki_der: &[u8],
        algorithm: &str,
        data: &[u8],
        signature: &[u8],
    ) -> PkiResult<bool>;

    /// Load a private key from PKCS#8 DER or PEM.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes do not parse as a private key or the key
    /// type is unsupported.
    fn load_private_key(&self, data: &[u8], format: DataFormat) -> PkiResult<PrivateKey>;

    /// Generate a fresh keypair of the given kind.
    ///
    /// # Errors
    ///
    /// Returns error if key generation fails.
    fn generate_keypair(&self, kind: KeyKind) -> PkiResult<PrivateKey>;
}

/// Build the default engine.
///
/// Currently always the OpenSSL-backed implementation.
#[must_use]
pub fn default_engine() -> Box<dyn CryptoEngine> {
    Box::new(crate::adapters::openssl::OpensslEngine::new())
}
