//! Certificate revocation list entity.
//!
//! Same ownership and canonical-DER rules as [`crate::domain::certificate`]:
//! the decoded structure is kept alongside the exact bytes it came from, and
//! all comparisons run over those bytes.

use std::cmp::Ordering;
use std::fmt;
use std::time::SystemTime;

use const_oid::AssociatedOid;
use der::asn1::{ObjectIdentifier, Uint};
use der::{Decode, Encode};
use x509_cert::crl::CertificateList;
use x509_cert::ext::pkix::AuthorityKeyIdentifier;
use x509_cert::ext::Extension;
use x509_cert::Version;

use crate::adapters::engine::CryptoEngine;
use crate::domain::algorithm::{Algorithm, AlgorithmKind};
use crate::domain::certificate::{common_name, time_to_system};
use crate::domain::collection::ItemCollection;
use crate::domain::encoding::PkiObject;
use crate::domain::registry::AlgorithmRegistry;
use crate::infra::error::{PkiError, PkiResult};

/// Ordered list of revocation lists.
pub type CrlCollection = ItemCollection<Crl>;

/// One revoked certificate entry from a CRL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedEntry {
    serial: Vec<u8>,
    revoked_at: SystemTime,
}

impl RevokedEntry {
    /// Serial number of the revoked certificate, raw big-endian bytes.
    #[must_use]
    pub fn serial_number(&self) -> &[u8] {
        &self.serial
    }

    /// Moment the certificate was revoked.
    #[must_use]
    pub fn revoked_at(&self) -> SystemTime {
        self.revoked_at
    }
}

/// Decoded X.509 CRL. Move-only; copies are made with [`Crl::duplicate`].
pub struct Crl {
    inner: CertificateList,
    der: Vec<u8>,
    revoked: ItemCollection<RevokedEntry>,
}

impl Crl {
    /// CRL version number (1 or 2).
    #[must_use]
    pub fn version(&self) -> u32 {
        match self.inner.tbs_cert_list.version {
            Version::V1 => 1,
            Version::V2 => 2,
            Version::V3 => 3,
        }
    }

    /// Issuer distinguished name as an RFC 4514 string.
    #[must_use]
    pub fn issuer(&self) -> String {
        self.inner.tbs_cert_list.issuer.to_string()
    }

    /// Issuer common name, when the issuer carries one.
    #[must_use]
    pub fn issuer_friendly_name(&self) -> Option<String> {
        common_name(&self.inner.tbs_cert_list.issuer)
    }

    /// DER encoding of the issuer name.
    ///
    /// # Errors
    /// `PkiError::Encode` if the name cannot be re-serialized.
    pub fn issuer_der(&self) -> PkiResult<Vec<u8>> {
        self.inner
            .tbs_cert_list
            .issuer
            .to_der()
            .map_err(|e| PkiError::Encode(format!("issuer name: {e}")))
    }

    /// `thisUpdate` timestamp.
    #[must_use]
    pub fn last_update(&self) -> SystemTime {
        time_to_system(self.inner.tbs_cert_list.this_update)
    }

    /// `nextUpdate` timestamp, when the CRL declares one.
    #[must_use]
    pub fn next_update(&self) -> Option<SystemTime> {
        self.inner.tbs_cert_list.next_update.map(time_to_system)
    }

    /// Raw signature bits from the outer SIGNED wrapper.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        self.inner.signature.raw_bytes()
    }

    /// Declared signature algorithm.
    #[must_use]
    pub fn signature_algorithm(&self) -> Algorithm {
        Algorithm::from_oid(self.inner.signature_algorithm.oid, AlgorithmKind::Signature)
    }

    /// Digest algorithm implied by the signature algorithm.
    ///
    /// # Errors
    /// `PkiError::UnsupportedAlgorithm` when the signature OID is unknown.
    pub fn signature_digest_algorithm(&self, registry: &AlgorithmRegistry) -> PkiResult<Algorithm> {
        let oid = self.inner.signature_algorithm.oid;
        registry.digest_for_signature(oid, oid)
    }

    /// Authority key identifier extension value, when present.
    #[must_use]
    pub fn authority_key_identifier(&self) -> Option<Vec<u8>> {
        let ext = self.find_extension(AuthorityKeyIdentifier::OID)?;
        let aki = AuthorityKeyIdentifier::from_der(ext.extn_value.as_bytes()).ok()?;
        Some(aki.key_identifier?.as_bytes().to_vec())
    }

    /// CRL number extension value as raw big-endian bytes, when present.
    #[must_use]
    pub fn crl_number(&self) -> Option<Vec<u8>> {
        let ext = self.find_extension(const_oid::db::rfc5280::ID_CE_CRL_NUMBER)?;
        let number = Uint::from_der(ext.extn_value.as_bytes()).ok()?;
        Some(number.as_bytes().to_vec())
    }

    /// Revoked certificate entries, in encoding order.
    #[must_use]
    pub fn revoked(&self) -> &ItemCollection<RevokedEntry> {
        &self.revoked
    }

    /// Three-way ordering by lexicographic comparison of canonical DER.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.der.cmp(&other.der)
    }

    /// Equality under [`Crl::compare`].
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }

    /// Digest of the canonical encoding, rendered lowercase hex.
    ///
    /// # Errors
    /// `PkiError::UnsupportedAlgorithm` for unknown digest names.
    pub fn hash(&self, engine: &dyn CryptoEngine, digest_name: &str) -> PkiResult<String> {
        let digest = engine.digest(digest_name, &self.der)?;
        Ok(hex::encode(digest))
    }

    /// SHA-1 fingerprint of the canonical encoding, lowercase hex.
    ///
    /// # Errors
    /// Propagates engine failures from [`Crl::hash`].
    pub fn thumbprint(&self, engine: &dyn CryptoEngine) -> PkiResult<String> {
        self.hash(engine, "sha1")
    }

    /// Deep copy with an independently owned decode of the same DER.
    ///
    /// # Errors
    /// `PkiError::Decode` if the stored bytes fail to re-parse.
    pub fn duplicate(&self) -> PkiResult<Self> {
        Self::from_der(&self.der)
    }

    fn find_extension(&self, oid: ObjectIdentifier) -> Option<&Extension> {
        self.inner
            .tbs_cert_list
            .crl_extensions
            .as_ref()?
            .iter()
            .find(|ext| ext.extn_id == oid)
    }
}

impl PkiObject for Crl {
    const PEM_LABEL: &'static str = "X509 CRL";

    fn from_der(der: &[u8]) -> PkiResult<Self> {
        let inner =
            CertificateList::from_der(der).map_err(|e| PkiError::Decode(format!("crl: {e}")))?;
        let mut revoked = ItemCollection::new();
        if let Some(entries) = &inner.tbs_cert_list.revoked_certificates {
            for entry in entries {
                revoked.push(RevokedEntry {
                    serial: entry.serial_number.as_bytes().to_vec(),
                    revoked_at: time_to_system(entry.revocation_date),
                });
            }
        }
        Ok(Self {
            inner,
            der: der.to_vec(),
            revoked,
        })
    }

    fn to_der(&self) -> PkiResult<Vec<u8>> {
        Ok(self.der.clone())
    }
}

impl PartialEq for Crl {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Crl {}

impl PartialOrd for Crl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Crl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Debug for Crl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crl")
            .field("issuer", &self.issuer())
            .field("revoked", &self.revoked.len())
            .field("der_len", &self.der.len())
            .finish()
    }
}
