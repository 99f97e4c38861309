//! OpenSSL-backed [`CryptoEngine`] implementation.
//!
//! Keys are held as unencrypted PKCS#8 DER and re-parsed per operation, so
//! the engine itself stays stateless. RSA signatures use PKCS#1 v1.5 padding
//! and ECDSA signatures use the DER `ECDSA-Sig-Value` encoding, matching what
//! the registered signature algorithm identifiers declare.

use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, Private};
use openssl::rsa::Rsa;
use openssl::sign::{Signer, Verifier};

use crate::adapters::engine::CryptoEngine;
use crate::domain::algorithm::{KeyKind, PrivateKey};
use crate::domain::encoding::DataFormat;
use crate::infra::error::{PkiError, PkiResult};

/// Stateless engine delegating every primitive to OpenSSL.
pub struct OpensslEngine;

impl OpensslEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn message_digest(algorithm: &str) -> PkiResult<MessageDigest> {
        MessageDigest::from_name(algorithm)
            .ok_or_else(|| PkiError::UnsupportedAlgorithm(algorithm.to_string()))
    }

    fn parse_private_key(key: &PrivateKey) -> PkiResult<PKey<Private>> {
        PKey::private_key_from_pkcs8(key.pkcs8_der())
            .map_err(|e| PkiError::Signing(format!("private key rejected: {e}")))
    }

    fn key_kind(pkey: &PKey<Private>) -> PkiResult<KeyKind> {
        match pkey.id() {
            Id::RSA => Ok(KeyKind::Rsa),
            Id::EC => Ok(KeyKind::Ec),
            other => Err(PkiError::UnsupportedAlgorithm(format!(
                "key type {other:?}"
            ))),
        }
    }

    fn to_pkcs8(pkey: &PKey<Private>) -> PkiResult<PrivateKey> {
        let kind = Self::key_kind(pkey)?;
        let der = pkey
            .private_key_to_pkcs8()
            .map_err(|e| PkiError::Encode(format!("private key: {e}")))?;
        Ok(PrivateKey::new(kind, der))
    }
}

impl Default for OpensslEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoEngine for OpensslEngine {
    fn digest(&self, algorithm: &str, data: &[u8]) -> PkiResult<Vec<u8>> {
        let md = Self::message_digest(algorithm)?;
        let digest = openssl::hash::hash(md, data)
            .map_err(|e| PkiError::Signing(format!("digest {algorithm}: {e}")))?;
        Ok(digest.to_vec())
    }

    fn sign(&self, key: &PrivateKey, algorithm: &str, data: &[u8]) -> PkiResult<Vec<u8>> {
        let md = Self::message_digest(algorithm)?;
        let pkey = Self::parse_private_key(key)?;
        let mut signer = Signer::new(md, &pkey)
            .map_err(|e| PkiError::Signing(format!("signer init: {e}")))?;
        signer
            .sign_oneshot_to_vec(data)
            .map_err(|e| PkiError::Signing(format!("signature operation: {e}")))
    }

    fn verify_signature(
        &self,
        spki_der: &[u8],
        algorithm: &str,
        data: &[u8],
        signature: &[u8],
    ) -> PkiResult<bool> {
        let md = Self::message_digest(algorithm)?;
        let pkey = PKey::public_key_from_der(spki_der)
            .map_err(|e| PkiError::Decode(format!("public key: {e}")))?;
        let mut verifier = Verifier::new(md, &pkey)
            .map_err(|e| PkiError::Signing(format!("verifier init: {e}")))?;
        match verifier.verify_oneshot(signature, data) {
            Ok(valid) => Ok(valid),
            Err(e) => {
                // Malformed signature encodings surface as an error stack
                // rather than a clean mismatch. Treat them as failed checks.
                log::debug!("Signature verification errored: {e}");
                Ok(false)
            }
        }
    }

    fn load_private_key(&self, data: &[u8], format: DataFormat) -> PkiResult<PrivateKey> {
        let pkey = match format {
            DataFormat::Pem => PKey::private_key_from_pem(data)
                .map_err(|e| PkiError::Decode(format!("private key: {e}")))?,
            DataFormat::Der => PKey::private_key_from_pkcs8(data)
                .or_else(|_| PKey::private_key_from_der(data))
                .map_err(|e| PkiError::Decode(format!("private key: {e}")))?,
        };
        Self::to_pkcs8(&pkey)
    }

    fn generate_keypair(&self, kind: KeyKind) -> PkiResult<PrivateKey> {
        let pkey = match kind {
            KeyKind::Rsa => {
                let rsa = Rsa::generate(2048)
                    .map_err(|e| PkiError::Signing(format!("RSA generation: {e}")))?;
                PKey::from_rsa(rsa)
                    .map_err(|e| PkiError::Signing(format!("RSA generation: {e}")))?
            }
            KeyKind::Ec => {
                let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)
                    .map_err(|e| PkiError::Signing(format!("EC generation: {e}")))?;
                let ec = EcKey::generate(&group)
                    .map_err(|e| PkiError::Signing(format!("EC generation: {e}")))?;
                PKey::from_ec_key(ec)
                    .map_err(|e| PkiError::Signing(format!("EC generation: {e}")))?
            }
        };
        Self::to_pkcs8(&pkey)
    }
}
