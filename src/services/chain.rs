//! Certificate chain assembly.
//!
//! Orders a leaf certificate and a pool of candidate issuers into a
//! leaf-to-root chain. Matching is by issuer/subject name, refined by the
//! authority/subject key identifier pair when both sides carry one. Entities
//! are move-only, so the returned chain holds independent duplicates.

use log::debug;

use crate::domain::certificate::{Certificate, CertificateCollection};
use crate::infra::error::{PkiError, PkiResult};

pub struct ChainBuilder;

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds the chain from `leaf` towards the root, pulling issuers out of
    /// `pool`. The chain ends at the first self-signed certificate; a root is
    /// not required to be present in the pool for every use, but a gap below
    /// one is an error.
    ///
    /// # Errors
    /// - `PkiError::IssuerCertificateNotFound` when no pool certificate
    ///   matches the next issuer, or the candidates form a loop
    /// - `PkiError::Decode`/`PkiError::Encode` on malformed entities
    pub fn build(
        &self,
        leaf: &Certificate,
        pool: &CertificateCollection,
    ) -> PkiResult<CertificateCollection> {
        let mut chain = CertificateCollection::new();
        chain.push(leaf.duplicate()?);
        let mut current = leaf;

        for _ in 0..=pool.len() {
            if current.is_self_signed() {
                debug!(
                    "Chain complete with {} certificate(s), root {}",
                    chain.len(),
                    current.subject()
                );
                return Ok(chain);
            }
            match find_issuer(current, pool)? {
                Some(issuer) => {
                    debug!("Chain extended with issuer {}", issuer.subject());
                    chain.push(issuer.duplicate()?);
                    current = issuer;
                }
                None => {
                    return Err(PkiError::IssuerCertificateNotFound(format!(
                        "no issuer certificate found for {}",
                        current.subject()
                    )))
                }
            }
        }
        Err(PkiError::IssuerCertificateNotFound(
            "issuer loop detected while assembling the chain".to_string(),
        ))
    }
}

fn find_issuer<'a>(
    subject: &Certificate,
    pool: &'a CertificateCollection,
) -> PkiResult<Option<&'a Certificate>> {
    let issuer_der = subject.issuer_der()?;
    let authority_key_id = subject.authority_key_identifier();
    let mut name_match = None;
    for candidate in pool.iter() {
        if candidate.subject_der()? != issuer_der {
            continue;
        }
        match (&authority_key_id, candidate.subject_key_identifier()) {
            (Some(aki), Some(ski)) => {
                if *aki == ski {
                    return Ok(Some(candidate));
                }
            }
            _ => {
                if name_match.is_none() {
                    name_match = Some(candidate);
                }
            }
        }
    }
    Ok(name_match)
}
