//! CMS signed-data message model.
//!
//! [`SignedData`] holds the decoded object graph: optional content bytes,
//! embedded certificates, and one [`Signer`] per signing party. Decoding maps
//! the RFC 5652 wire structures into the model; encoding rebuilds them
//! deterministically, so exporting a message twice yields identical bytes.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::{CmsVersion, ContentInfo};
use cms::revocation::RevocationInfoChoices;
use cms::signed_data::{
    CertificateSet, EncapsulatedContentInfo, SignedData as CmsSignedData, SignerIdentifier,
    SignerInfo, SignerInfos,
};
use const_oid::db::rfc5911::{ID_DATA, ID_SIGNED_DATA};
use der::asn1::{ObjectIdentifier, OctetString, SetOfVec};
use der::{Any, AnyRef, Decode, Encode};
use spki::AlgorithmIdentifierOwned;
use x509_cert::attr::Attributes;
use x509_cert::ext::pkix::SubjectKeyIdentifier;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::domain::algorithm::{Algorithm, AlgorithmKind, PrivateKey};
use crate::domain::attribute::{self, Attribute, AttributeCollection};
use crate::domain::certificate::{Certificate, CertificateCollection};
use crate::domain::encoding::PkiObject;
use crate::domain::registry::{self, AlgorithmRegistry};
use crate::domain::signer::{Signer, SignerCollection, SignerId};
use crate::infra::error::{PkiError, PkiResult};

/// Encoding options for a [`SignedData`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignedDataFlags(u32);

impl SignedDataFlags {
    /// Content and certificates are embedded in the encoding.
    pub const NONE: Self = Self(0);
    /// Omit the content; it must be supplied externally before verification.
    pub const DETACHED: Self = Self(1);
    /// Omit the embedded certificate set.
    pub const OMIT_CERTIFICATES: Self = Self(1 << 1);

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

impl BitOr for SignedDataFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SignedDataFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A CMS signed-data message.
///
/// Built up by setting content and creating signers, then signed and encoded;
/// or decoded from the wire and verified. Signing and verification live in
/// [`crate::services::signing::SigningService`] and
/// [`crate::services::verification::VerificationService`].
pub struct SignedData {
    content: Option<Vec<u8>>,
    content_type: ObjectIdentifier,
    flags: SignedDataFlags,
    certificates: CertificateCollection,
    crls: Option<RevocationInfoChoices>,
    signers: SignerCollection,
}

impl SignedData {
    /// Empty message with the `id-data` content type and no options set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            content: None,
            content_type: ID_DATA,
            flags: SignedDataFlags::NONE,
            certificates: CertificateCollection::new(),
            crls: None,
            signers: SignerCollection::new(),
        }
    }

    /// Content bytes, absent for detached messages until supplied.
    #[must_use]
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Sets (or replaces) the content bytes. For a decoded detached message
    /// this is how the caller supplies the external content before verifying.
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = Some(content);
    }

    /// Encapsulated content type OID; `id-data` unless changed.
    #[must_use]
    pub fn content_type(&self) -> ObjectIdentifier {
        self.content_type
    }

    pub fn set_content_type(&mut self, content_type: ObjectIdentifier) {
        self.content_type = content_type;
    }

    /// Current encoding options.
    #[must_use]
    pub fn flags(&self) -> SignedDataFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: SignedDataFlags) {
        self.flags = flags;
    }

    /// True when no content is attached. Verification of a detached message
    /// requires the caller to supply content via [`SignedData::set_content`].
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.content.is_none()
    }

    /// Message-level certificates embedded as trust material.
    #[must_use]
    pub fn certificates(&self) -> &CertificateCollection {
        &self.certificates
    }

    pub fn certificates_mut(&mut self) -> &mut CertificateCollection {
        &mut self.certificates
    }

    /// Embeds an additional certificate in the message.
    pub fn add_certificate(&mut self, certificate: Certificate) {
        self.certificates.push(certificate);
    }

    /// Signers attached to this message.
    #[must_use]
    pub fn signers(&self) -> &SignerCollection {
        &self.signers
    }

    pub fn signers_mut(&mut self) -> &mut SignerCollection {
        &mut self.signers
    }

    /// Creates a pending signer bound to `certificate` and returns its index.
    ///
    /// The signature algorithm is derived from the key kind combined with the
    /// named digest. The key stays with the signer only until
    /// [`crate::services::signing::SigningService::sign`] consumes it.
    ///
    /// # Errors
    /// `PkiError::UnsupportedAlgorithm` if `digest_name` is not a known
    /// digest or has no pairing for the key kind.
    pub fn create_signer(
        &mut self,
        certificate: Certificate,
        key: PrivateKey,
        digest_name: &str,
        registry: &AlgorithmRegistry,
    ) -> PkiResult<usize> {
        let digest_algorithm = registry.digest(digest_name)?;
        let signature_algorithm = registry.signature_for(key.kind(), &digest_algorithm)?;
        let id = SignerId::IssuerAndSerial {
            issuer_der: certificate.issuer_der()?,
            serial: certificate.serial_number().to_vec(),
        };
        let signer = Signer::new_pending(
            id,
            certificate,
            digest_algorithm,
            signature_algorithm,
            key,
        );
        self.signers.push(signer);
        Ok(self.signers.len() - 1)
    }

    fn to_cms(&self) -> PkiResult<CmsSignedData> {
        let mut digest_oids: Vec<ObjectIdentifier> = Vec::new();
        for signer in self.signers.iter() {
            let oid = signer.digest_algorithm().oid();
            if !digest_oids.contains(&oid) {
                digest_oids.push(oid);
            }
        }
        let identifiers: Vec<AlgorithmIdentifierOwned> = digest_oids
            .into_iter()
            .map(digest_algorithm_identifier)
            .collect();
        let digest_algorithms = SetOfVec::try_from(identifiers)
            .map_err(|e| PkiError::Encode(format!("digest algorithm set: {e}")))?;

        let econtent = if self.flags.contains(SignedDataFlags::DETACHED) {
            None
        } else {
            match &self.content {
                Some(content) => {
                    let octets = OctetString::new(content.as_slice())
                        .map_err(|e| PkiError::Encode(format!("content: {e}")))?;
                    let wrapped = Any::encode_from(&octets)
                        .map_err(|e| PkiError::Encode(format!("content: {e}")))?;
                    Some(wrapped)
                }
                None => None,
            }
        };
        let encap_content_info = EncapsulatedContentInfo {
            econtent_type: self.content_type,
            econtent,
        };

        let mut infos = Vec::with_capacity(self.signers.len());
        for signer in self.signers.iter() {
            infos.push(encode_signer(signer)?);
        }
        let signer_infos = SignerInfos(
            SetOfVec::try_from(infos)
                .map_err(|e| PkiError::Encode(format!("signer info set: {e}")))?,
        );

        Ok(CmsSignedData {
            version: self.cms_version(),
            digest_algorithms,
            encap_content_info,
            certificates: self.encode_certificates()?,
            crls: self.crls.clone(),
            signer_infos,
        })
    }

    /// Union of message-level certificates and each signer's own certificate,
    /// deduplicated by canonical DER.
    fn encode_certificates(&self) -> PkiResult<Option<CertificateSet>> {
        if self.flags.contains(SignedDataFlags::OMIT_CERTIFICATES) {
            return Ok(None);
        }
        let mut seen: Vec<&[u8]> = Vec::new();
        let mut choices = Vec::new();
        let explicit = self.signers.iter().filter_map(Signer::certificate);
        for certificate in self.certificates.iter().chain(explicit) {
            if seen.contains(&certificate.raw_der()) {
                continue;
            }
            seen.push(certificate.raw_der());
            choices.push(CertificateChoices::Certificate(certificate.x509().clone()));
        }
        if choices.is_empty() {
            return Ok(None);
        }
        let set = SetOfVec::try_from(choices)
            .map_err(|e| PkiError::Encode(format!("certificate set: {e}")))?;
        Ok(Some(CertificateSet(set)))
    }

    fn cms_version(&self) -> CmsVersion {
        let has_key_id_signer = self
            .signers
            .iter()
            .any(|signer| matches!(signer.id(), SignerId::SubjectKeyId(_)));
        if has_key_id_signer || self.content_type != ID_DATA {
            CmsVersion::V3
        } else {
            CmsVersion::V1
        }
    }
}

impl Default for SignedData {
    fn default() -> Self {
        Self::new()
    }
}

impl PkiObject for SignedData {
    const PEM_LABEL: &'static str = "CMS";
    const PEM_ALIASES: &'static [&'static str] = &["PKCS7"];

    fn from_der(der: &[u8]) -> PkiResult<Self> {
        let content_info = ContentInfo::from_der(der)
            .map_err(|e| PkiError::Decode(format!("content info: {e}")))?;
        if content_info.content_type != ID_SIGNED_DATA {
            return Err(PkiError::Decode(format!(
                "expected signed-data content type, got {}",
                content_info.content_type
            )));
        }
        let message: CmsSignedData = content_info
            .content
            .decode_as()
            .map_err(|e| PkiError::Decode(format!("signed data: {e}")))?;

        let content = match &message.encap_content_info.econtent {
            Some(any) => {
                let octets: OctetString = any
                    .decode_as()
                    .map_err(|e| PkiError::Decode(format!("encapsulated content: {e}")))?;
                Some(octets.as_bytes().to_vec())
            }
            None => None,
        };

        let mut certificates = CertificateCollection::new();
        if let Some(set) = &message.certificates {
            for choice in set.0.iter() {
                match choice {
                    CertificateChoices::Certificate(cert) => {
                        let raw = cert.to_der().map_err(|e| {
                            PkiError::Decode(format!("embedded certificate: {e}"))
                        })?;
                        certificates.push(Certificate::from_der(&raw)?);
                    }
                    _ => {
                        return Err(PkiError::Decode(
                            "unsupported embedded certificate format".to_string(),
                        ))
                    }
                }
            }
        }

        let mut signers = SignerCollection::new();
        for info in message.signer_infos.0.iter() {
            signers.push(decode_signer(info)?);
        }

        let mut flags = SignedDataFlags::NONE;
        if content.is_none() {
            flags |= SignedDataFlags::DETACHED;
        }

        Ok(Self {
            content,
            content_type: message.encap_content_info.econtent_type,
            flags,
            certificates,
            crls: message.crls,
            signers,
        })
    }

    fn to_der(&self) -> PkiResult<Vec<u8>> {
        let message = self.to_cms()?;
        let content = Any::encode_from(&message)
            .map_err(|e| PkiError::Encode(format!("signed data: {e}")))?;
        let content_info = ContentInfo {
            content_type: ID_SIGNED_DATA,
            content,
        };
        content_info
            .to_der()
            .map_err(|e| PkiError::Encode(format!("content info: {e}")))
    }
}

impl fmt::Debug for SignedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedData")
            .field("content_len", &self.content.as_ref().map(Vec::len))
            .field("content_type", &self.content_type)
            .field("flags", &self.flags)
            .field("certificates", &self.certificates.len())
            .field("signers", &self.signers.len())
            .finish()
    }
}

fn decode_signer(info: &SignerInfo) -> PkiResult<Signer> {
    let id = match &info.sid {
        SignerIdentifier::IssuerAndSerialNumber(identifier) => SignerId::IssuerAndSerial {
            issuer_der: identifier
                .issuer
                .to_der()
                .map_err(|e| PkiError::Decode(format!("signer issuer: {e}")))?,
            serial: identifier.serial_number.as_bytes().to_vec(),
        },
        SignerIdentifier::SubjectKeyIdentifier(key_id) => {
            SignerId::SubjectKeyId(key_id.0.as_bytes().to_vec())
        }
    };
    let digest_algorithm = Algorithm::from_oid(info.digest_alg.oid, AlgorithmKind::Digest);
    let signature_algorithm =
        Algorithm::from_oid(info.signature_algorithm.oid, AlgorithmKind::Signature);
    let signed_attributes = decode_attributes(info.signed_attrs.as_ref(), &digest_algorithm)?;
    let unsigned_attributes = decode_attributes(info.unsigned_attrs.as_ref(), &digest_algorithm)?;
    Ok(Signer::from_decoded(
        id,
        digest_algorithm,
        signature_algorithm,
        info.signature.as_bytes().to_vec(),
        signed_attributes,
        unsigned_attributes,
    ))
}

fn decode_attributes(
    attributes: Option<&Attributes>,
    algorithm: &Algorithm,
) -> PkiResult<AttributeCollection> {
    let mut collection = AttributeCollection::new();
    if let Some(set) = attributes {
        for attribute in set.iter() {
            collection.push(Attribute::from_x509(attribute, algorithm)?);
        }
    }
    Ok(collection)
}

fn encode_signer(signer: &Signer) -> PkiResult<SignerInfo> {
    let (sid, version) = match signer.id() {
        SignerId::IssuerAndSerial { issuer_der, serial } => {
            let issuer = Name::from_der(issuer_der)
                .map_err(|e| PkiError::Encode(format!("signer issuer: {e}")))?;
            let serial_number = SerialNumber::new(serial)
                .map_err(|e| PkiError::Encode(format!("signer serial: {e}")))?;
            (
                SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                    issuer,
                    serial_number,
                }),
                CmsVersion::V1,
            )
        }
        SignerId::SubjectKeyId(key_id) => {
            let octets = OctetString::new(key_id.as_slice())
                .map_err(|e| PkiError::Encode(format!("signer key id: {e}")))?;
            (
                SignerIdentifier::SubjectKeyIdentifier(SubjectKeyIdentifier(octets)),
                CmsVersion::V3,
            )
        }
    };
    let signed_attrs = if signer.signed_attributes().is_empty() {
        None
    } else {
        Some(attribute::to_wire_set(signer.signed_attributes())?)
    };
    let unsigned_attrs = if signer.unsigned_attributes().is_empty() {
        None
    } else {
        Some(attribute::to_wire_set(signer.unsigned_attributes())?)
    };
    let signature = OctetString::new(signer.signature())
        .map_err(|e| PkiError::Encode(format!("signature value: {e}")))?;
    Ok(SignerInfo {
        version,
        sid,
        digest_alg: digest_algorithm_identifier(signer.digest_algorithm().oid()),
        signed_attrs,
        signature_algorithm: signature_algorithm_identifier(signer.signature_algorithm()),
        signature,
        unsigned_attrs,
    })
}

/// Digest algorithm identifiers carry an explicit NULL parameter, matching
/// the dominant encoder behavior so re-encoded messages interoperate.
fn digest_algorithm_identifier(oid: ObjectIdentifier) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid,
        parameters: Some(Any::from(AnyRef::NULL)),
    }
}

/// RSA signature identifiers carry NULL parameters; ECDSA ones carry none.
fn signature_algorithm_identifier(algorithm: &Algorithm) -> AlgorithmIdentifierOwned {
    let parameters = if registry::is_ecdsa_signature(algorithm.oid()) {
        None
    } else {
        Some(Any::from(AnyRef::NULL))
    };
    AlgorithmIdentifierOwned {
        oid: algorithm.oid(),
        parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_operations() {
        let flags = SignedDataFlags::DETACHED | SignedDataFlags::OMIT_CERTIFICATES;
        assert!(flags.contains(SignedDataFlags::DETACHED));
        assert!(flags.contains(SignedDataFlags::OMIT_CERTIFICATES));
        assert!(!SignedDataFlags::NONE.contains(SignedDataFlags::DETACHED));
        assert_eq!(SignedDataFlags::default(), SignedDataFlags::NONE);
    }

    #[test]
    fn test_new_message_is_detached_until_content_set() {
        let mut message = SignedData::new();
        assert!(message.is_detached());
        message.set_content(b"payload".to_vec());
        assert!(!message.is_detached());
        assert_eq!(message.content(), Some(&b"payload"[..]));
    }

    #[test]
    fn test_version_tracks_content_type() {
        let mut message = SignedData::new();
        assert_eq!(message.cms_version(), CmsVersion::V1);
        message.set_content_type(ID_SIGNED_DATA);
        assert_eq!(message.cms_version(), CmsVersion::V3);
    }
}
