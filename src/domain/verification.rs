//! Verification domain types for CMS signed-data messages.
//!
//! Aggregates per-signer outcomes into a single report. The cryptographic
//! and structural checks themselves are performed by the verification
//! service; these types only carry the results.

use crate::infra::error::PkiError;

/// Outcome of checking one signer.
///
/// Each variant beyond `Valid` identifies the first check that failed for
/// that signer, with a human-readable detail string:
/// - `CertificateNotFound`: no embedded or supplied certificate matches the
///   signer's declared identifier
/// - `AttributeMismatch`: the signed attributes carry a message-digest value
///   that does not match the recomputed content digest
/// - `SignatureInvalid`: the signature bytes do not verify under the resolved
///   certificate's public key
/// - `Error`: the check could not be carried out (unsupported algorithm,
///   malformed structure, engine failure)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerStatus {
    Valid,
    CertificateNotFound(String),
    AttributeMismatch(String),
    SignatureInvalid(String),
    Error(String),
}

impl SignerStatus {
    /// True for a fully validated signer.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Maps a failed status onto the error it stands for; `None` when valid.
    #[must_use]
    pub fn as_error(&self) -> Option<PkiError> {
        match self {
            Self::Valid => None,
            Self::CertificateNotFound(detail) => {
                Some(PkiError::SignerCertificateNotFound(detail.clone()))
            }
            Self::AttributeMismatch(detail) => Some(PkiError::AttributeMismatch(detail.clone())),
            Self::SignatureInvalid(detail) => Some(PkiError::InvalidSignature(detail.clone())),
            Self::Error(detail) => Some(PkiError::InvalidSignature(detail.clone())),
        }
    }
}

/// Result of checking one signer, tied back to its position in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerVerification {
    /// Index of the signer in the message's signer collection.
    pub index: usize,
    /// Subject of the certificate the signer resolved to, when one was found.
    pub certificate_subject: Option<String>,
    /// Outcome for this signer.
    pub status: SignerStatus,
}

/// Result of verifying a whole signed-data message.
///
/// The aggregate is fail-closed: the message verifies only if every signer
/// does. Individual failure reasons stay inspectable per signer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationReport {
    signers: Vec<SignerVerification>,
}

impl VerificationReport {
    #[must_use]
    pub fn new(signers: Vec<SignerVerification>) -> Self {
        Self { signers }
    }

    /// Overall success indicator. True only if every signer validated.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.signers.is_empty() && self.signers.iter().all(|s| s.status.is_valid())
    }

    /// Per-signer outcomes, in signer collection order.
    #[must_use]
    pub fn signers(&self) -> &[SignerVerification] {
        &self.signers
    }

    /// First failure in signer order, if any.
    #[must_use]
    pub fn first_failure(&self) -> Option<&SignerVerification> {
        self.signers.iter().find(|s| !s.status.is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(index: usize) -> SignerVerification {
        SignerVerification {
            index,
            certificate_subject: Some("CN=Signer".to_string()),
            status: SignerStatus::Valid,
        }
    }

    #[test]
    fn test_report_requires_every_signer_valid() {
        let mut report = VerificationReport::new(vec![valid(0), valid(1)]);
        assert!(report.success());

        report = VerificationReport::new(vec![
            valid(0),
            SignerVerification {
                index: 1,
                certificate_subject: None,
                status: SignerStatus::CertificateNotFound("no match for serial 0x2a".into()),
            },
        ]);
        assert!(!report.success());
        assert_eq!(report.first_failure().map(|s| s.index), Some(1));
    }

    #[test]
    fn test_empty_report_is_not_success() {
        assert!(!VerificationReport::default().success());
    }

    #[test]
    fn test_status_maps_to_errors() {
        assert!(SignerStatus::Valid.as_error().is_none());
        let status = SignerStatus::AttributeMismatch("digest differs".into());
        let err = status.as_error().unwrap();
        assert!(err.to_string().contains("digest differs"));
    }
}
