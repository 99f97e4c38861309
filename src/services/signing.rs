//! Signing service: produces RFC 5652 signatures over a signed-data message.
//!
//! Walks the message's pending signers (those still holding a private key),
//! computes each content digest, completes the signed-attribute set where one
//! is present, and asks the primitives engine for the signature bytes. All
//! signatures are staged first and committed together, so a failure for any
//! signer leaves the message untouched.

use log::{debug, info};

use crate::adapters::engine::CryptoEngine;
use crate::domain::attribute::AttributeCollection;
use crate::domain::signed_data::SignedData;
use crate::infra::error::{PkiError, PkiResult};
use crate::services::attributes::AttributeBuilder;

pub struct SigningService {
    attributes: AttributeBuilder,
}

impl Default for SigningService {
    fn default() -> Self {
        Self::new()
    }
}

/// Computed state held back until every pending signer has succeeded.
struct StagedSignature {
    index: usize,
    attributes: Option<AttributeCollection>,
    signature: Vec<u8>,
}

impl SigningService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: AttributeBuilder::new(),
        }
    }

    /// Signs `message` with every pending signer, in insertion order.
    ///
    /// Per signer: the content digest is computed with the signer's digest
    /// algorithm; with signed attributes present, content-type and
    /// message-digest attributes are completed and the signature covers the
    /// DER of the attribute SET, otherwise it covers the content directly.
    /// On success each signer holds its signature and its key is released.
    ///
    /// # Errors
    /// - `PkiError::Signing` when no signer exists, no signer holds a key, or
    ///   the engine fails; the message is left unmodified in every case
    /// - `PkiError::ContentMissing` when no content has been set
    pub fn sign(&self, message: &mut SignedData, engine: &dyn CryptoEngine) -> PkiResult<()> {
        if message.signers().is_empty() {
            return Err(PkiError::Signing(
                "message has no signers to sign with".to_string(),
            ));
        }
        let content = message
            .content()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| PkiError::ContentMissing("content must be set before signing".into()))?;
        let content_type = message.content_type();

        let mut staged: Vec<StagedSignature> = Vec::new();
        for (index, signer) in message.signers().iter().enumerate() {
            let Some(key) = signer.signing_key() else {
                debug!("Signer {index} carries no private key, skipping");
                continue;
            };
            let digest_algorithm = signer.digest_algorithm().clone();
            let digest = engine
                .digest(digest_algorithm.name(), &content)
                .map_err(|e| PkiError::Signing(format!("digest for signer {index}: {e}")))?;

            let (input, attributes) = if signer.signed_attributes().is_empty() {
                (content.clone(), None)
            } else {
                let mut completed = AttributeCollection::new();
                for attribute in signer.signed_attributes().iter() {
                    completed.push(attribute.duplicate());
                }
                self.attributes.ensure_standard_attributes(
                    &mut completed,
                    &digest_algorithm,
                    content_type,
                    &digest,
                )?;
                let input = self.attributes.encode_for_signing(&completed)?;
                (input, Some(completed))
            };

            let signature = engine
                .sign(key, digest_algorithm.name(), &input)
                .map_err(|e| PkiError::Signing(format!("signature for signer {index}: {e}")))?;
            debug!(
                "Produced {} signature bytes for signer {index} ({})",
                signature.len(),
                signer.signature_algorithm().name()
            );
            staged.push(StagedSignature {
                index,
                attributes,
                signature,
            });
        }

        if staged.is_empty() {
            return Err(PkiError::Signing(
                "no signer holds a private key; create signers before signing".to_string(),
            ));
        }

        let signed = staged.len();
        for stage in staged {
            let signer = message.signers_mut().items_mut(stage.index)?;
            if let Some(attributes) = stage.attributes {
                signer.replace_signed_attributes(attributes);
            }
            signer.set_signature(stage.signature);
            signer.clear_key();
        }
        info!("Signed message content with {signed} signer(s)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::openssl::OpensslEngine;

    #[test]
    fn test_sign_without_signers_fails() {
        let service = SigningService::new();
        let engine = OpensslEngine::new();
        let mut message = SignedData::new();
        message.set_content(b"data".to_vec());

        let err = service.sign(&mut message, &engine).unwrap_err();
        assert!(matches!(err, PkiError::Signing(_)));
    }
}
