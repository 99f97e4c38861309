//! Verification service: validates every signer of a signed-data message.
//!
//! Cryptographic primitives stay behind the engine and DER handling in the
//! domain layer; this service sequences the per-signer checks and aggregates
//! their outcomes into a [`VerificationReport`]. The aggregate is fail-closed:
//! one failing signer fails the message.

use log::{debug, info};

use crate::adapters::engine::CryptoEngine;
use crate::domain::certificate::{Certificate, CertificateCollection};
use crate::domain::registry::AlgorithmRegistry;
use crate::domain::signed_data::SignedData;
use crate::domain::signer::{Signer, SignerId};
use crate::domain::verification::{SignerStatus, SignerVerification, VerificationReport};
use crate::infra::error::{PkiError, PkiResult};
use crate::services::attributes::AttributeBuilder;

pub struct VerificationService {
    attributes: AttributeBuilder,
}

impl Default for VerificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: AttributeBuilder::new(),
        }
    }

    /// Boolean verification contract: true only when every signer validates.
    ///
    /// # Errors
    /// Same as [`VerificationService::verify_report`].
    pub fn verify(
        &self,
        message: &SignedData,
        certificates: &CertificateCollection,
        engine: &dyn CryptoEngine,
        registry: &AlgorithmRegistry,
    ) -> PkiResult<bool> {
        Ok(self
            .verify_report(message, certificates, engine, registry)?
            .success())
    }

    /// Checks every signer and reports per-signer outcomes.
    ///
    /// Per signer: resolve the certificate (the signer's own, then embedded,
    /// then the supplied collection), check a declared message-digest
    /// attribute against the recomputed content digest, and verify the
    /// signature bytes under the certificate's public key. A failure in one
    /// signer never short-circuits the others.
    ///
    /// # Errors
    /// - `PkiError::InvalidSignature` when the message has no signers
    /// - `PkiError::ContentMissing` for a detached message whose content was
    ///   not supplied via [`SignedData::set_content`]
    pub fn verify_report(
        &self,
        message: &SignedData,
        certificates: &CertificateCollection,
        engine: &dyn CryptoEngine,
        registry: &AlgorithmRegistry,
    ) -> PkiResult<VerificationReport> {
        if message.signers().is_empty() {
            return Err(PkiError::InvalidSignature(
                "message has no signers".to_string(),
            ));
        }
        let content = message.content().ok_or_else(|| {
            PkiError::ContentMissing(
                "detached message requires externally supplied content".to_string(),
            )
        })?;

        let mut results = Vec::with_capacity(message.signers().len());
        for (index, signer) in message.signers().iter().enumerate() {
            let (certificate_subject, status) =
                self.check_signer(message, signer, content, certificates, engine, registry);
            debug!("Signer {index}: {status:?}");
            results.push(SignerVerification {
                index,
                certificate_subject,
                status,
            });
        }

        let report = VerificationReport::new(results);
        info!(
            "Verification {} for {} signer(s)",
            if report.success() { "passed" } else { "failed" },
            report.signers().len()
        );
        Ok(report)
    }

    fn check_signer(
        &self,
        message: &SignedData,
        signer: &Signer,
        content: &[u8],
        supplied: &CertificateCollection,
        engine: &dyn CryptoEngine,
        registry: &AlgorithmRegistry,
    ) -> (Option<String>, SignerStatus) {
        let Some(certificate) = resolve_certificate(message, signer, supplied) else {
            return (None, SignerStatus::CertificateNotFound(unmatched(signer.id())));
        };
        let subject = Some(certificate.subject());
        let status = self
            .check_signature(signer, certificate, content, engine, registry)
            .unwrap_or_else(|e| SignerStatus::Error(e.to_string()));
        (subject, status)
    }

    fn check_signature(
        &self,
        signer: &Signer,
        certificate: &Certificate,
        content: &[u8],
        engine: &dyn CryptoEngine,
        registry: &AlgorithmRegistry,
    ) -> PkiResult<SignerStatus> {
        let signature_digest = registry.digest_for_signature(
            signer.signature_algorithm().oid(),
            signer.digest_algorithm().oid(),
        )?;

        let input = if signer.signed_attributes().is_empty() {
            content.to_vec()
        } else {
            // The attribute comparison recomputes with the declared digest
            // algorithm; the signature check uses the digest the signature
            // algorithm encodes. The two differ in mixed-algorithm messages.
            let declared_digest = registry
                .digest_by_oid(signer.digest_algorithm().oid())
                .ok_or_else(|| {
                    PkiError::UnsupportedAlgorithm(signer.digest_algorithm().to_string())
                })?;
            let digest = engine.digest(declared_digest.name(), content)?;
            match self
                .attributes
                .message_digest_value(signer.signed_attributes())?
            {
                None => {
                    return Ok(SignerStatus::AttributeMismatch(
                        "signed attributes lack a message-digest attribute".to_string(),
                    ))
                }
                Some(declared) if declared != digest => {
                    return Ok(SignerStatus::AttributeMismatch(format!(
                        "declared digest {} does not match content digest {}",
                        hex::encode(&declared),
                        hex::encode(&digest)
                    )))
                }
                Some(_) => {}
            }
            self.attributes.encode_for_signing(signer.signed_attributes())?
        };

        let spki = certificate.spki_der()?;
        let valid =
            engine.verify_signature(&spki, signature_digest.name(), &input, signer.signature())?;
        if valid {
            Ok(SignerStatus::Valid)
        } else {
            Ok(SignerStatus::SignatureInvalid(
                "signature does not verify under the resolved certificate".to_string(),
            ))
        }
    }
}

/// Resolution order: the signer's own certificate, then one embedded in the
/// message matching the declared identifier, then the supplied collection.
fn resolve_certificate<'a>(
    message: &'a SignedData,
    signer: &'a Signer,
    supplied: &'a CertificateCollection,
) -> Option<&'a Certificate> {
    if let Some(certificate) = signer.certificate() {
        return Some(certificate);
    }
    message
        .certificates()
        .iter()
        .find(|c| signer.id().matches_certificate(c))
        .or_else(|| supplied.iter().find(|c| signer.id().matches_certificate(c)))
}

fn unmatched(id: &SignerId) -> String {
    match id {
        SignerId::IssuerAndSerial { serial, .. } => {
            format!("no certificate matches serial 0x{}", hex::encode(serial))
        }
        SignerId::SubjectKeyId(key_id) => {
            format!("no certificate matches subject key id 0x{}", hex::encode(key_id))
        }
    }
}
