//! Per-signer state attached to a signed message.

use std::fmt;

use crate::domain::algorithm::{Algorithm, PrivateKey};
use crate::domain::attribute::AttributeCollection;
use crate::domain::certificate::Certificate;
use crate::domain::collection::ItemCollection;
use crate::infra::error::PkiResult;

/// Ordered list of signers.
pub type SignerCollection = ItemCollection<Signer>;

/// Identifies the certificate a signature was produced under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerId {
    /// Issuer name (DER) plus certificate serial number.
    IssuerAndSerial { issuer_der: Vec<u8>, serial: Vec<u8> },
    /// Subject key identifier extension value.
    SubjectKeyId(Vec<u8>),
}

impl SignerId {
    /// True when `cert` is the certificate this identifier points at.
    pub(crate) fn matches_certificate(&self, cert: &Certificate) -> bool {
        match self {
            Self::IssuerAndSerial { issuer_der, serial } => cert
                .issuer_der()
                .is_ok_and(|der| der == *issuer_der && cert.serial_number() == serial.as_slice()),
            Self::SubjectKeyId(ski) => cert
                .subject_key_identifier()
                .is_some_and(|id| id == *ski),
        }
    }
}

/// One signer of a [`crate::domain::signed_data::SignedData`] message.
///
/// A signer is either *pending* (created with a private key, signature not
/// yet produced) or *settled* (decoded from the wire, or already signed).
/// The key is consumed by the signing service and never serialized.
pub struct Signer {
    id: SignerId,
    certificate: Option<Certificate>,
    digest_algorithm: Algorithm,
    signature_algorithm: Algorithm,
    signature: Vec<u8>,
    signed_attributes: AttributeCollection,
    unsigned_attributes: AttributeCollection,
    signing_key: Option<PrivateKey>,
}

impl Signer {
    pub(crate) fn new_pending(
        id: SignerId,
        certificate: Certificate,
        digest_algorithm: Algorithm,
        signature_algorithm: Algorithm,
        key: PrivateKey,
    ) -> Self {
        Self {
            id,
            certificate: Some(certificate),
            digest_algorithm,
            signature_algorithm,
            signature: Vec::new(),
            signed_attributes: AttributeCollection::new(),
            unsigned_attributes: AttributeCollection::new(),
            signing_key: Some(key),
        }
    }

    pub(crate) fn from_decoded(
        id: SignerId,
        digest_algorithm: Algorithm,
        signature_algorithm: Algorithm,
        signature: Vec<u8>,
        signed_attributes: AttributeCollection,
        unsigned_attributes: AttributeCollection,
    ) -> Self {
        Self {
            id,
            certificate: None,
            digest_algorithm,
            signature_algorithm,
            signature,
            signed_attributes,
            unsigned_attributes,
            signing_key: None,
        }
    }

    /// Identifier linking this signer to its certificate.
    #[must_use]
    pub fn id(&self) -> &SignerId {
        &self.id
    }

    /// Certificate carried by this signer, when one is attached.
    #[must_use]
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// Digest algorithm this signer hashes content with.
    #[must_use]
    pub fn digest_algorithm(&self) -> &Algorithm {
        &self.digest_algorithm
    }

    /// Signature algorithm recorded for this signer.
    #[must_use]
    pub fn signature_algorithm(&self) -> &Algorithm {
        &self.signature_algorithm
    }

    /// Raw signature bytes; empty until the signer has signed.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// True once a signature value is present.
    #[must_use]
    pub fn has_signature(&self) -> bool {
        !self.signature.is_empty()
    }

    /// True while the signer still holds the private key it was created
    /// with, before [`crate::services::signing::SigningService::sign`]
    /// settles it.
    #[must_use]
    pub fn has_pending_key(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Attributes covered by the signature.
    #[must_use]
    pub fn signed_attributes(&self) -> &AttributeCollection {
        &self.signed_attributes
    }

    /// Mutable access to the signed attributes of a not-yet-signed signer.
    pub fn signed_attributes_mut(&mut self) -> &mut AttributeCollection {
        &mut self.signed_attributes
    }

    /// Attributes carried outside the signature.
    #[must_use]
    pub fn unsigned_attributes(&self) -> &AttributeCollection {
        &self.unsigned_attributes
    }

    /// Mutable access to the unsigned attributes.
    pub fn unsigned_attributes_mut(&mut self) -> &mut AttributeCollection {
        &mut self.unsigned_attributes
    }

    /// Deep copy of the signer's settled state. A pending private key is
    /// not carried over to the copy.
    ///
    /// # Errors
    /// `PkiError::Decode` if an attached certificate fails to re-parse.
    pub fn duplicate(&self) -> PkiResult<Self> {
        let certificate = match &self.certificate {
            Some(cert) => Some(cert.duplicate()?),
            None => None,
        };
        let mut signed_attributes = AttributeCollection::new();
        for attr in self.signed_attributes.iter() {
            signed_attributes.push(attr.duplicate());
        }
        let mut unsigned_attributes = AttributeCollection::new();
        for attr in self.unsigned_attributes.iter() {
            unsigned_attributes.push(attr.duplicate());
        }
        Ok(Self {
            id: self.id.clone(),
            certificate,
            digest_algorithm: self.digest_algorithm.clone(),
            signature_algorithm: self.signature_algorithm.clone(),
            signature: self.signature.clone(),
            signed_attributes,
            unsigned_attributes,
            signing_key: None,
        })
    }

    pub(crate) fn signing_key(&self) -> Option<&PrivateKey> {
        self.signing_key.as_ref()
    }

    pub(crate) fn set_signature(&mut self, signature: Vec<u8>) {
        self.signature = signature;
    }

    pub(crate) fn replace_signed_attributes(&mut self, attributes: AttributeCollection) {
        self.signed_attributes = attributes;
    }

    pub(crate) fn clear_key(&mut self) {
        self.signing_key = None;
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("id", &self.id)
            .field("digest_algorithm", &self.digest_algorithm)
            .field("signature_algorithm", &self.signature_algorithm)
            .field("has_signature", &self.has_signature())
            .field("pending_key", &self.has_pending_key())
            .finish()
    }
}
