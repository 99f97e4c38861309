//! Algorithm descriptors and private key handles.

use std::fmt;

use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_224, ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512,
    ID_EC_PUBLIC_KEY, ID_SHA_1, ID_SHA_224, ID_SHA_256, ID_SHA_384, ID_SHA_512, RSA_ENCRYPTION,
    SHA_1_WITH_RSA_ENCRYPTION, SHA_224_WITH_RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION,
    SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
};
use der::asn1::ObjectIdentifier;

/// Role an algorithm plays in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Digest,
    Signature,
}

/// A resolved algorithm: human name, object identifier and role.
///
/// Names of well-known algorithms follow OpenSSL conventions (`sha256`,
/// `sha256WithRSAEncryption`, `ecdsa-with-SHA256`); identifiers outside the
/// known set fall back to the dotted OID string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Algorithm {
    name: String,
    oid: ObjectIdentifier,
    kind: AlgorithmKind,
}

impl Algorithm {
    #[must_use]
    pub fn new(name: impl Into<String>, oid: ObjectIdentifier, kind: AlgorithmKind) -> Self {
        Self {
            name: name.into(),
            oid,
            kind,
        }
    }

    /// Builds a descriptor from a decoded identifier, resolving the name
    /// from the well-known table where possible.
    #[must_use]
    pub fn from_oid(oid: ObjectIdentifier, kind: AlgorithmKind) -> Self {
        let name = well_known_name(oid)
            .map(str::to_string)
            .unwrap_or_else(|| oid.to_string());
        Self { name, oid, kind }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        self.oid
    }

    #[must_use]
    pub fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    #[must_use]
    pub fn is_digest(&self) -> bool {
        self.kind == AlgorithmKind::Digest
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Maps a well-known OID to its conventional name.
pub(crate) fn well_known_name(oid: ObjectIdentifier) -> Option<&'static str> {
    match oid {
        ID_SHA_1 => Some("sha1"),
        ID_SHA_224 => Some("sha224"),
        ID_SHA_256 => Some("sha256"),
        ID_SHA_384 => Some("sha384"),
        ID_SHA_512 => Some("sha512"),
        SHA_1_WITH_RSA_ENCRYPTION => Some("sha1WithRSAEncryption"),
        SHA_224_WITH_RSA_ENCRYPTION => Some("sha224WithRSAEncryption"),
        SHA_256_WITH_RSA_ENCRYPTION => Some("sha256WithRSAEncryption"),
        SHA_384_WITH_RSA_ENCRYPTION => Some("sha384WithRSAEncryption"),
        SHA_512_WITH_RSA_ENCRYPTION => Some("sha512WithRSAEncryption"),
        ECDSA_WITH_SHA_224 => Some("ecdsa-with-SHA224"),
        ECDSA_WITH_SHA_256 => Some("ecdsa-with-SHA256"),
        ECDSA_WITH_SHA_384 => Some("ecdsa-with-SHA384"),
        ECDSA_WITH_SHA_512 => Some("ecdsa-with-SHA512"),
        RSA_ENCRYPTION => Some("rsaEncryption"),
        ID_EC_PUBLIC_KEY => Some("id-ecPublicKey"),
        _ => None,
    }
}

/// Private key families the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Rsa,
    Ec,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Rsa => write!(f, "RSA"),
            KeyKind::Ec => write!(f, "EC"),
        }
    }
}

/// Opaque private signing key: kind plus normalized PKCS#8 DER.
///
/// Move-only, no `Clone`. The raw key material is only meaningful to a
/// [`crate::adapters::CryptoEngine`] implementation.
pub struct PrivateKey {
    kind: KeyKind,
    pkcs8_der: Vec<u8>,
}

impl PrivateKey {
    #[must_use]
    pub fn new(kind: KeyKind, pkcs8_der: Vec<u8>) -> Self {
        Self { kind, pkcs8_der }
    }

    #[must_use]
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Raw PKCS#8 DER for engine implementations.
    #[must_use]
    pub fn pkcs8_der(&self) -> &[u8] {
        &self.pkcs8_der
    }
}

impl fmt::Debug for PrivateKey {
    // Redacts key material; only the kind is printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
