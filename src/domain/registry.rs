//! Read-only algorithm registry.
//!
//! Resolves digest names to identifiers, derives signature algorithms from a
//! key kind plus a digest, and recovers the digest behind a declared
//! signature algorithm. Registries are constructed explicitly and passed by
//! reference wherever name resolution is needed; there is no global table.

use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_224, ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512,
    ID_EC_PUBLIC_KEY, ID_SHA_1, ID_SHA_224, ID_SHA_256, ID_SHA_384, ID_SHA_512, RSA_ENCRYPTION,
    SHA_1_WITH_RSA_ENCRYPTION, SHA_224_WITH_RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION,
    SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
};
use der::asn1::ObjectIdentifier;

use crate::domain::algorithm::{Algorithm, AlgorithmKind, KeyKind};
use crate::infra::error::{PkiError, PkiResult};

struct DigestFamily {
    name: &'static str,
    oid: ObjectIdentifier,
    rsa: ObjectIdentifier,
    rsa_name: &'static str,
    ecdsa: ObjectIdentifier,
    ecdsa_name: &'static str,
}

const FAMILIES: &[DigestFamily] = &[
    DigestFamily {
        name: "sha1",
        oid: ID_SHA_1,
        rsa: SHA_1_WITH_RSA_ENCRYPTION,
        rsa_name: "sha1WithRSAEncryption",
        // RFC 5912 defines no ecdsa-with-SHA1 member in the SHA-2 series;
        // 1.2.840.10045.4.1 is the X9.62 value.
        ecdsa: ObjectIdentifier::new_unwrap("1.2.840.10045.4.1"),
        ecdsa_name: "ecdsa-with-SHA1",
    },
    DigestFamily {
        name: "sha224",
        oid: ID_SHA_224,
        rsa: SHA_224_WITH_RSA_ENCRYPTION,
        rsa_name: "sha224WithRSAEncryption",
        ecdsa: ECDSA_WITH_SHA_224,
        ecdsa_name: "ecdsa-with-SHA224",
    },
    DigestFamily {
        name: "sha256",
        oid: ID_SHA_256,
        rsa: SHA_256_WITH_RSA_ENCRYPTION,
        rsa_name: "sha256WithRSAEncryption",
        ecdsa: ECDSA_WITH_SHA_256,
        ecdsa_name: "ecdsa-with-SHA256",
    },
    DigestFamily {
        name: "sha384",
        oid: ID_SHA_384,
        rsa: SHA_384_WITH_RSA_ENCRYPTION,
        rsa_name: "sha384WithRSAEncryption",
        ecdsa: ECDSA_WITH_SHA_384,
        ecdsa_name: "ecdsa-with-SHA384",
    },
    DigestFamily {
        name: "sha512",
        oid: ID_SHA_512,
        rsa: SHA_512_WITH_RSA_ENCRYPTION,
        rsa_name: "sha512WithRSAEncryption",
        ecdsa: ECDSA_WITH_SHA_512,
        ecdsa_name: "ecdsa-with-SHA512",
    },
];

/// Injected lookup service for algorithm names, OIDs and pairings.
pub struct AlgorithmRegistry {
    families: &'static [DigestFamily],
}

impl AlgorithmRegistry {
    /// Registry covering the SHA-1/SHA-2 digest families with their RSA and
    /// ECDSA signature pairings.
    #[must_use]
    pub fn builtin() -> Self {
        Self { families: FAMILIES }
    }

    fn family_by_name(&self, name: &str) -> Option<&'static DigestFamily> {
        // Accepts "SHA-256" and "SHA256" spellings alongside "sha256".
        let normalized = name.to_ascii_lowercase().replace('-', "");
        self.families.iter().find(|f| f.name == normalized)
    }

    fn family_by_digest_oid(&self, oid: ObjectIdentifier) -> Option<&'static DigestFamily> {
        self.families.iter().find(|f| f.oid == oid)
    }

    /// Resolves a digest algorithm by name.
    ///
    /// # Errors
    /// `PkiError::UnsupportedAlgorithm` if the name is not a known digest.
    pub fn digest(&self, name: &str) -> PkiResult<Algorithm> {
        self.family_by_name(name)
            .map(|f| Algorithm::new(f.name, f.oid, AlgorithmKind::Digest))
            .ok_or_else(|| PkiError::UnsupportedAlgorithm(name.to_string()))
    }

    /// Resolves a digest algorithm by OID.
    #[must_use]
    pub fn digest_by_oid(&self, oid: ObjectIdentifier) -> Option<Algorithm> {
        self.family_by_digest_oid(oid)
            .map(|f| Algorithm::new(f.name, f.oid, AlgorithmKind::Digest))
    }

    /// Derives the signature algorithm for a key kind and digest.
    ///
    /// # Errors
    /// `PkiError::UnsupportedAlgorithm` if the pair has no defined encoding.
    pub fn signature_for(&self, kind: KeyKind, digest: &Algorithm) -> PkiResult<Algorithm> {
        let family = self.family_by_digest_oid(digest.oid()).ok_or_else(|| {
            PkiError::UnsupportedAlgorithm(format!("digest {} has no signature pairing", digest))
        })?;
        Ok(match kind {
            KeyKind::Rsa => Algorithm::new(family.rsa_name, family.rsa, AlgorithmKind::Signature),
            KeyKind::Ec => {
                Algorithm::new(family.ecdsa_name, family.ecdsa, AlgorithmKind::Signature)
            }
        })
    }

    /// Recovers the digest to verify with from a declared signature
    /// algorithm, falling back to the declared digest algorithm when the
    /// signature OID does not pin one (bare rsaEncryption / id-ecPublicKey).
    ///
    /// # Errors
    /// `PkiError::UnsupportedAlgorithm` if neither identifier resolves.
    pub fn digest_for_signature(
        &self,
        signature_oid: ObjectIdentifier,
        declared_digest_oid: ObjectIdentifier,
    ) -> PkiResult<Algorithm> {
        for family in self.families {
            if family.rsa == signature_oid || family.ecdsa == signature_oid {
                return Ok(Algorithm::new(family.name, family.oid, AlgorithmKind::Digest));
            }
        }
        if signature_oid == RSA_ENCRYPTION || signature_oid == ID_EC_PUBLIC_KEY {
            return self.digest_by_oid(declared_digest_oid).ok_or_else(|| {
                PkiError::UnsupportedAlgorithm(format!(
                    "digest algorithm {declared_digest_oid} declared with {signature_oid}"
                ))
            });
        }
        Err(PkiError::UnsupportedAlgorithm(format!(
            "signature algorithm {signature_oid}"
        )))
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// True when the OID names an ECDSA signature algorithm. ECDSA algorithm
/// identifiers carry no parameters on the wire; the RSA ones carry NULL.
pub(crate) fn is_ecdsa_signature(oid: ObjectIdentifier) -> bool {
    FAMILIES.iter().any(|family| family.ecdsa == oid)
}

/// True when the OID names one of the PKCS #1 v1.5 signature pairings.
pub(crate) fn is_rsa_signature(oid: ObjectIdentifier) -> bool {
    FAMILIES.iter().any(|family| family.rsa == oid)
}
