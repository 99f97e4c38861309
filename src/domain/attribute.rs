//! Signer attributes: typed OID/value pairs carried in signed and unsigned
//! attribute sets.

use der::asn1::ObjectIdentifier;
use der::{Any, Decode, Encode};
use x509_cert::attr::{Attribute as X509Attribute, Attributes};

use crate::domain::algorithm::Algorithm;
use crate::domain::collection::ItemCollection;
use crate::infra::error::{PkiError, PkiResult};

/// Attribute list attached to one signer.
pub type AttributeCollection = ItemCollection<Attribute>;

/// Ordered binary values interpreted under one algorithm.
///
/// The algorithm is fixed at construction; only the values mutate. Each value
/// is a complete DER encoding (tag, length, content).
#[derive(Debug)]
pub struct AttributeValueCollection {
    algorithm: Algorithm,
    values: ItemCollection<Vec<u8>>,
}

impl AttributeValueCollection {
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            values: ItemCollection::new(),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    pub fn push(&mut self, value: Vec<u8>) {
        self.values.push(value);
    }

    #[must_use]
    pub fn values(&self) -> &ItemCollection<Vec<u8>> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ItemCollection<Vec<u8>> {
        &mut self.values
    }

    /// Deep copy with an independent value list.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::new(self.algorithm.clone());
        for value in &self.values {
            copy.push(value.clone());
        }
        copy
    }
}

/// One (type OID, value collection) pair plus the ASN.1 tag number of its
/// values.
#[derive(Debug)]
pub struct Attribute {
    oid: ObjectIdentifier,
    asn1_tag: u32,
    values: AttributeValueCollection,
}

impl Attribute {
    /// Creates an attribute; the ASN.1 tag number is read from the first
    /// value's identifier octets (class and constructed bits masked, the
    /// high-tag-number form followed into its continuation octets).
    #[must_use]
    pub fn new(oid: ObjectIdentifier, values: AttributeValueCollection) -> Self {
        let asn1_tag = values.values().iter().next().map_or(0, |v| tag_number(v));
        Self {
            oid,
            asn1_tag,
            values,
        }
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        self.oid
    }

    pub fn set_oid(&mut self, oid: ObjectIdentifier) {
        self.oid = oid;
    }

    /// ASN.1 tag number of the attribute values.
    #[must_use]
    pub fn asn1_tag(&self) -> u32 {
        self.asn1_tag
    }

    pub fn set_asn1_tag(&mut self, tag: u32) {
        self.asn1_tag = tag;
    }

    #[must_use]
    pub fn values(&self) -> &AttributeValueCollection {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut AttributeValueCollection {
        &mut self.values
    }

    /// Deep copy with independently owned values.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            oid: self.oid,
            asn1_tag: self.asn1_tag,
            values: self.values.duplicate(),
        }
    }

    /// DER encoding of the whole attribute (SEQUENCE of OID and value set).
    ///
    /// # Errors
    /// `PkiError::Encode` if a value is not valid DER.
    pub fn to_der(&self) -> PkiResult<Vec<u8>> {
        self.to_x509()?
            .to_der()
            .map_err(|e| PkiError::Encode(format!("attribute: {e}")))
    }

    /// Converts to the wire representation.
    pub(crate) fn to_x509(&self) -> PkiResult<X509Attribute> {
        let mut any_values = Vec::with_capacity(self.values.values().len());
        for raw in self.values.values() {
            let any = Any::from_der(raw)
                .map_err(|e| PkiError::Encode(format!("attribute value for {}: {e}", self.oid)))?;
            any_values.push(any);
        }
        let values = der::asn1::SetOfVec::try_from(any_values)
            .map_err(|e| PkiError::Encode(format!("attribute value set: {e}")))?;
        Ok(X509Attribute {
            oid: self.oid,
            values,
        })
    }

    /// Builds the model attribute from the wire representation. Values are
    /// interpreted under the owning signer's digest algorithm.
    pub(crate) fn from_x509(attribute: &X509Attribute, algorithm: &Algorithm) -> PkiResult<Self> {
        let mut values = AttributeValueCollection::new(algorithm.clone());
        for any in attribute.values.iter() {
            let raw = any
                .to_der()
                .map_err(|e| PkiError::Decode(format!("attribute value: {e}")))?;
            values.push(raw);
        }
        Ok(Self::new(attribute.oid, values))
    }
}

/// Tag number from a DER identifier. Low-tag-number identifiers carry the
/// number in the low five bits; when those bits are all set the number
/// continues base-128 in the following octets. At most four continuation
/// octets are read, bounding the result to 28 bits.
fn tag_number(encoded: &[u8]) -> u32 {
    let Some((&first, rest)) = encoded.split_first() else {
        return 0;
    };
    let low = u32::from(first & 0x1f);
    if low != 0x1f {
        return low;
    }
    let mut number = 0;
    for &octet in rest.iter().take(4) {
        number = (number << 7) | u32::from(octet & 0x7f);
        if octet & 0x80 == 0 {
            break;
        }
    }
    number
}

/// Converts a whole attribute collection to the canonically sorted wire SET.
/// The DER of this SET is what signatures over signed attributes cover.
pub(crate) fn to_wire_set(attributes: &AttributeCollection) -> PkiResult<Attributes> {
    let mut wire = Vec::with_capacity(attributes.len());
    for attribute in attributes.iter() {
        wire.push(attribute.to_x509()?);
    }
    Attributes::try_from(wire).map_err(|e| PkiError::Encode(format!("attribute set: {e}")))
}
