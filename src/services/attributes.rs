//! Construction and canonical encoding of signed attributes.
//!
//! When a signer carries signed attributes, RFC 5652 requires content-type
//! and message-digest attributes and defines the signature input as the DER
//! of the attribute SET. This service builds those attributes and produces
//! that canonical encoding; the signing and verification services both go
//! through it so the two sides agree byte for byte.

use const_oid::db::rfc5911::{ID_CONTENT_TYPE, ID_MESSAGE_DIGEST};
use der::asn1::{ObjectIdentifier, OctetString};
use der::{Decode, Encode};

use crate::domain::algorithm::Algorithm;
use crate::domain::attribute::{self, Attribute, AttributeCollection, AttributeValueCollection};
use crate::infra::error::{PkiError, PkiResult};

pub struct AttributeBuilder;

impl Default for AttributeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds a message-digest attribute carrying `digest` as an OCTET STRING.
    ///
    /// # Errors
    /// `PkiError::Encode` if the digest cannot be wrapped.
    pub fn message_digest(&self, algorithm: &Algorithm, digest: &[u8]) -> PkiResult<Attribute> {
        let wrapped = OctetString::new(digest)
            .and_then(|octets| octets.to_der())
            .map_err(|e| PkiError::Encode(format!("message digest attribute: {e}")))?;
        let mut values = AttributeValueCollection::new(algorithm.clone());
        values.push(wrapped);
        Ok(Attribute::new(ID_MESSAGE_DIGEST, values))
    }

    /// Builds a content-type attribute carrying `content_type`.
    ///
    /// # Errors
    /// `PkiError::Encode` if the OID cannot be encoded.
    pub fn content_type(
        &self,
        algorithm: &Algorithm,
        content_type: ObjectIdentifier,
    ) -> PkiResult<Attribute> {
        let encoded = content_type
            .to_der()
            .map_err(|e| PkiError::Encode(format!("content type attribute: {e}")))?;
        let mut values = AttributeValueCollection::new(algorithm.clone());
        values.push(encoded);
        Ok(Attribute::new(ID_CONTENT_TYPE, values))
    }

    /// Inserts or replaces the content-type and message-digest attributes a
    /// non-empty signed-attribute set must carry. Caller-supplied attributes
    /// with other types are left untouched.
    ///
    /// # Errors
    /// `PkiError::Encode` if either standard attribute cannot be built.
    pub fn ensure_standard_attributes(
        &self,
        attributes: &mut AttributeCollection,
        algorithm: &Algorithm,
        content_type: ObjectIdentifier,
        digest: &[u8],
    ) -> PkiResult<()> {
        replace_or_push(attributes, self.content_type(algorithm, content_type)?)?;
        replace_or_push(attributes, self.message_digest(algorithm, digest)?)?;
        Ok(())
    }

    /// Extracts the declared message-digest value, unwrapping its OCTET
    /// STRING. `Ok(None)` when no message-digest attribute is present.
    ///
    /// # Errors
    /// `PkiError::Decode` if the attribute value is malformed.
    pub fn message_digest_value(
        &self,
        attributes: &AttributeCollection,
    ) -> PkiResult<Option<Vec<u8>>> {
        let Some(attribute) = attributes.iter().find(|a| a.oid() == ID_MESSAGE_DIGEST) else {
            return Ok(None);
        };
        let Some(raw) = attribute.values().values().iter().next() else {
            return Ok(None);
        };
        let octets = OctetString::from_der(raw)
            .map_err(|e| PkiError::Decode(format!("message digest attribute: {e}")))?;
        Ok(Some(octets.as_bytes().to_vec()))
    }

    /// Canonical DER of the attribute SET. This is the exact byte sequence a
    /// signature over signed attributes covers.
    ///
    /// # Errors
    /// `PkiError::Encode` if any attribute fails to re-serialize.
    pub fn encode_for_signing(&self, attributes: &AttributeCollection) -> PkiResult<Vec<u8>> {
        attribute::to_wire_set(attributes)?
            .to_der()
            .map_err(|e| PkiError::Encode(format!("signed attribute set: {e}")))
    }
}

fn replace_or_push(attributes: &mut AttributeCollection, attribute: Attribute) -> PkiResult<()> {
    let existing = attributes.iter().position(|a| a.oid() == attribute.oid());
    match existing {
        Some(index) => {
            *attributes.items_mut(index)? = attribute;
        }
        None => attributes.push(attribute),
    }
    Ok(())
}
