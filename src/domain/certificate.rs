//! X.509 certificate entity.
//!
//! Wraps the parsed structure together with the canonical DER it was decoded
//! from. The stored bytes are authoritative: comparison, hashing and export
//! all operate on them, so a decode/encode round trip is byte-identical.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::time::{SystemTime, UNIX_EPOCH};

use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION};
use const_oid::AssociatedOid;
use der::asn1::ObjectIdentifier;
use der::{Any, Decode, Encode, Tag, Tagged};
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, KeyUsage, SubjectKeyIdentifier};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::time::Time;
use x509_cert::Certificate as X509Certificate;
use x509_cert::Version;

use crate::adapters::engine::CryptoEngine;
use crate::domain::collection::ItemCollection;
use crate::domain::encoding::PkiObject;
use crate::domain::registry;
use crate::infra::error::{PkiError, PkiResult};

/// Ordered list of certificates.
pub type CertificateCollection = ItemCollection<Certificate>;

// X9.57 DSA and X9.42 DH identifiers, outside the registry's families.
const ID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");
const DSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.3");
const DSA_WITH_SHA224: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.1");
const DSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.2");
const DH_PUBLIC_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10046.2.1");

/// Capability mask of a certificate, in the shape of OpenSSL's
/// `X509_certificate_type`: the subject key family, the operations that
/// family supports, and the family of the issuing signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CertificateType(u32);

impl CertificateType {
    /// RSA subject public key.
    pub const RSA: Self = Self(0x0001);
    /// DSA subject public key.
    pub const DSA: Self = Self(0x0002);
    /// Diffie-Hellman subject public key.
    pub const DH: Self = Self(0x0004);
    /// Elliptic-curve subject public key.
    pub const EC: Self = Self(0x0008);
    /// The key can sign.
    pub const SIGN: Self = Self(0x0010);
    /// The key can encrypt.
    pub const ENCRYPT: Self = Self(0x0020);
    /// The key can negotiate shared secrets.
    pub const EXCHANGE: Self = Self(0x0040);
    /// The certificate is signed with an RSA key.
    pub const SIGNED_WITH_RSA: Self = Self(0x0100);
    /// The certificate is signed with a DSA key.
    pub const SIGNED_WITH_DSA: Self = Self(0x0200);
    /// The certificate is signed with an EC key.
    pub const SIGNED_WITH_EC: Self = Self(0x0400);

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CertificateType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CertificateType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Decoded X.509 certificate. Move-only; copies are made with
/// [`Certificate::duplicate`].
pub struct Certificate {
    inner: X509Certificate,
    der: Vec<u8>,
}

impl Certificate {
    /// Subject distinguished name as an RFC 4514 string.
    #[must_use]
    pub fn subject(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    /// Issuer distinguished name as an RFC 4514 string.
    #[must_use]
    pub fn issuer(&self) -> String {
        self.inner.tbs_certificate.issuer.to_string()
    }

    /// Subject common name, when the subject carries one.
    #[must_use]
    pub fn subject_friendly_name(&self) -> Option<String> {
        common_name(&self.inner.tbs_certificate.subject)
    }

    /// Issuer common name, when the issuer carries one.
    #[must_use]
    pub fn issuer_friendly_name(&self) -> Option<String> {
        common_name(&self.inner.tbs_certificate.issuer)
    }

    /// Serial number as the raw big-endian bytes from the encoding.
    #[must_use]
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    /// Start of the validity window.
    #[must_use]
    pub fn not_before(&self) -> SystemTime {
        time_to_system(self.inner.tbs_certificate.validity.not_before)
    }

    /// End of the validity window.
    #[must_use]
    pub fn not_after(&self) -> SystemTime {
        time_to_system(self.inner.tbs_certificate.validity.not_after)
    }

    /// X.509 version number (1, 2 or 3).
    #[must_use]
    pub fn version(&self) -> u32 {
        match self.inner.tbs_certificate.version {
            Version::V1 => 1,
            Version::V2 => 2,
            Version::V3 => 3,
        }
    }

    /// Capability mask derived from the subject public key and signature
    /// algorithm identifiers. Unrecognized algorithms leave their bits
    /// clear.
    #[must_use]
    pub fn certificate_type(&self) -> CertificateType {
        let key = self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .algorithm
            .oid;
        let mut mask = if key == RSA_ENCRYPTION {
            CertificateType::RSA | CertificateType::SIGN | CertificateType::ENCRYPT
        } else if key == ID_EC_PUBLIC_KEY {
            CertificateType::EC | CertificateType::SIGN | CertificateType::EXCHANGE
        } else if key == ID_DSA {
            CertificateType::DSA | CertificateType::SIGN
        } else if key == DH_PUBLIC_NUMBER {
            CertificateType::DH | CertificateType::EXCHANGE
        } else {
            CertificateType::default()
        };

        let signature = self.inner.signature_algorithm.oid;
        if registry::is_rsa_signature(signature) {
            mask |= CertificateType::SIGNED_WITH_RSA;
        } else if registry::is_ecdsa_signature(signature) {
            mask |= CertificateType::SIGNED_WITH_EC;
        } else if signature == DSA_WITH_SHA1
            || signature == DSA_WITH_SHA224
            || signature == DSA_WITH_SHA256
        {
            mask |= CertificateType::SIGNED_WITH_DSA;
        }
        mask
    }

    /// Key usage bits from the extension, when present.
    #[must_use]
    pub fn key_usage(&self) -> Option<u16> {
        let ext = self.find_extension(KeyUsage::OID)?;
        let usage = KeyUsage::from_der(ext.extn_value.as_bytes()).ok()?;
        Some(usage.0.bits())
    }

    /// Subject key identifier extension value, when present.
    #[must_use]
    pub fn subject_key_identifier(&self) -> Option<Vec<u8>> {
        let ext = self.find_extension(SubjectKeyIdentifier::OID)?;
        let ski = SubjectKeyIdentifier::from_der(ext.extn_value.as_bytes()).ok()?;
        Some(ski.0.as_bytes().to_vec())
    }

    /// Authority key identifier extension value, when present.
    #[must_use]
    pub fn authority_key_identifier(&self) -> Option<Vec<u8>> {
        let ext = self.find_extension(AuthorityKeyIdentifier::OID)?;
        let aki = AuthorityKeyIdentifier::from_der(ext.extn_value.as_bytes()).ok()?;
        Some(aki.key_identifier?.as_bytes().to_vec())
    }

    /// True when issuer and subject name are identical.
    #[must_use]
    pub fn is_self_signed(&self) -> bool {
        self.inner.tbs_certificate.issuer == self.inner.tbs_certificate.subject
    }

    /// DER encoding of the subject public key info, as consumed by
    /// [`CryptoEngine::verify_signature`].
    ///
    /// # Errors
    /// `PkiError::Encode` if the key info cannot be re-serialized.
    pub fn spki_der(&self) -> PkiResult<Vec<u8>> {
        self.inner
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| PkiError::Encode(format!("subject public key info: {e}")))
    }

    /// DER encoding of the issuer name, used for signer matching.
    ///
    /// # Errors
    /// `PkiError::Encode` if the name cannot be re-serialized.
    pub fn issuer_der(&self) -> PkiResult<Vec<u8>> {
        self.inner
            .tbs_certificate
            .issuer
            .to_der()
            .map_err(|e| PkiError::Encode(format!("issuer name: {e}")))
    }

    /// DER encoding of the subject name.
    ///
    /// # Errors
    /// `PkiError::Encode` if the name cannot be re-serialized.
    pub fn subject_der(&self) -> PkiResult<Vec<u8>> {
        self.inner
            .tbs_certificate
            .subject
            .to_der()
            .map_err(|e| PkiError::Encode(format!("subject name: {e}")))
    }

    /// Three-way ordering by lexicographic comparison of canonical DER.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.der.cmp(&other.der)
    }

    /// Equality under [`Certificate::compare`].
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
    /// Propagates engine failures from [`Certificate::hash`].
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

    pub(crate) fn x509(&self) -> &X509Certificate {
        &self.inner
    }

    pub(crate) fn raw_der(&self) -> &[u8] {
        &self.der
    }

    fn find_extension(&self, oid: ObjectIdentifier) -> Option<&Extension> {
        self.inner
            .tbs_certificate
            .extensions
            .as_ref()?
            .iter()
            .find(|ext| ext.extn_id == oid)
    }
}

impl PkiObject for Certificate {
    const PEM_LABEL: &'static str = "CERTIFICATE";

    fn from_der(der: &[u8]) -> PkiResult<Self> {
        let inner = X509Certificate::from_der(der)
            .map_err(|e| PkiError::Decode(format!("certificate: {e}")))?;
        Ok(Self {
            inner,
            der: der.to_vec(),
        })
    }

    fn to_der(&self) -> PkiResult<Vec<u8>> {
        Ok(self.der.clone())
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl PartialOrd for Certificate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Certificate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject())
            .field("serial", &hex::encode(self.serial_number()))
            .field("der_len", &self.der.len())
            .finish()
    }
}

/// Extracts the first common name value from a distinguished name.
pub(crate) fn common_name(name: &Name) -> Option<String> {
    for rdn in name.0.iter() {
        for atv in rdn.0.iter() {
            if atv.oid == const_oid::db::rfc4519::CN {
                return directory_string(&atv.value);
            }
        }
    }
    None
}

/// Renders a DirectoryString-ish value; unknown string types fall back to a
/// lossy UTF-8 read of the raw content octets.
fn directory_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::PrintableString => value
            .decode_as::<der::asn1::PrintableStringRef<'_>>()
            .ok()
            .map(|s| s.to_string()),
        Tag::Utf8String => value
            .decode_as::<der::asn1::Utf8StringRef<'_>>()
            .ok()
            .map(|s| s.to_string()),
        Tag::Ia5String => value
            .decode_as::<der::asn1::Ia5StringRef<'_>>()
            .ok()
            .map(|s| s.to_string()),
        _ => Some(String::from_utf8_lossy(value.value()).into_owned()),
    }
}

/// Converts an encoded UTCTime/GeneralizedTime to a system timestamp.
pub(crate) fn time_to_system(time: Time) -> SystemTime {
    UNIX_EPOCH + time.to_unix_duration()
}
