//! Shared certificate and key fixtures for integration tests.
//!
//! Certificates are minted on the fly with OpenSSL so tests never depend on
//! checked-in key material. Fixtures come back as crate-level types, ready to
//! drop into messages and collections.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};

use cmskit::{Certificate, CryptoEngine, DataFormat, KeyKind, OpensslEngine, PkiObject, PrivateKey};
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectKeyIdentifier,
};
use openssl::x509::{X509, X509Builder, X509Name, X509NameBuilder, X509Ref};

static NEXT_SERIAL: AtomicU32 = AtomicU32::new(0x1000);

/// An end-entity certificate together with its private key.
pub struct TestIdentity {
    pub certificate: Certificate,
    pub key: PrivateKey,
}

/// A certificate authority that can mint further certificates.
pub struct TestCa {
    pub certificate: Certificate,
    x509: X509,
    pkey: PKey<Private>,
}

impl TestCa {
    /// Self-signed root authority.
    pub fn root(cn: &str) -> Self {
        let (pkey, _) = generate_keypair(KeyKind::Rsa);
        let x509 = build_cert(cn, &pkey, None, true);
        Self {
            certificate: to_domain(&x509),
            x509,
            pkey,
        }
    }

    /// Intermediate authority signed by `self`.
    pub fn issue_ca(&self, cn: &str) -> Self {
        let (pkey, _) = generate_keypair(KeyKind::Rsa);
        let x509 = build_cert(cn, &pkey, Some((&self.x509, &self.pkey)), true);
        Self {
            certificate: to_domain(&x509),
            x509,
            pkey,
        }
    }

    /// End-entity identity signed by `self`.
    pub fn issue_identity(&self, cn: &str, kind: KeyKind) -> TestIdentity {
        let (pkey, key) = generate_keypair(kind);
        let x509 = build_cert(cn, &pkey, Some((&self.x509, &self.pkey)), false);
        TestIdentity {
            certificate: to_domain(&x509),
            key,
        }
    }

    /// Fresh copy of the authority's private key.
    pub fn signing_key(&self) -> PrivateKey {
        let der = self.pkey.private_key_to_pkcs8().expect("authority key PKCS#8");
        OpensslEngine::new()
            .load_private_key(&der, DataFormat::Der)
            .expect("load authority key")
    }
}

/// Self-signed end-entity identity.
pub fn self_signed_identity(cn: &str, kind: KeyKind) -> TestIdentity {
    let (pkey, key) = generate_keypair(kind);
    let x509 = build_cert(cn, &pkey, None, false);
    TestIdentity {
        certificate: to_domain(&x509),
        key,
    }
}

/// Fresh copy of a private key; `PrivateKey` has no `Clone`.
pub fn reload_key(key: &PrivateKey) -> PrivateKey {
    OpensslEngine::new()
        .load_private_key(key.pkcs8_der(), DataFormat::Der)
        .expect("reload key")
}

fn generate_keypair(kind: KeyKind) -> (PKey<Private>, PrivateKey) {
    let key = OpensslEngine::new().generate_keypair(kind).expect("keypair");
    let pkey = PKey::private_key_from_pkcs8(key.pkcs8_der()).expect("parse generated key");
    (pkey, key)
}

fn to_domain(x509: &X509) -> Certificate {
    let der = x509.to_der().expect("certificate DER");
    Certificate::import(&der, DataFormat::Der).expect("import certificate")
}

fn subject_name(cn: &str) -> X509Name {
    let mut builder = X509NameBuilder::new().expect("name builder");
    builder.append_entry_by_text("CN", cn).expect("CN entry");
    builder.build()
}

fn next_serial() -> Asn1Integer {
    let value = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
    let bn = BigNum::from_u32(value).expect("serial bignum");
    bn.to_asn1_integer().expect("serial integer")
}

fn build_cert(
    cn: &str,
    keypair: &PKey<Private>,
    issuer: Option<(&X509Ref, &PKey<Private>)>,
    is_ca: bool,
) -> X509 {
    let subject = subject_name(cn);
    let mut builder = X509Builder::new().expect("cert builder");
    builder.set_version(2).expect("set version");
    builder
        .set_serial_number(&next_serial())
        .expect("set serial");
    builder.set_subject_name(&subject).expect("set subject");
    match issuer {
        Some((issuer_cert, _)) => builder.set_issuer_name(issuer_cert.subject_name()),
        None => builder.set_issuer_name(&subject),
    }
    .expect("set issuer");
    builder.set_pubkey(keypair).expect("set pubkey");

    let not_before = Asn1Time::days_from_now(0).expect("not before");
    let not_after = Asn1Time::days_from_now(365).expect("not after");
    builder.set_not_before(&not_before).expect("set not before");
    builder.set_not_after(&not_after).expect("set not after");

    if is_ca {
        let basic = BasicConstraints::new()
            .critical()
            .ca()
            .build()
            .expect("basic constraints");
        builder.append_extension(basic).expect("append constraints");
        let usage = KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .build()
            .expect("key usage");
        builder.append_extension(usage).expect("append key usage");
    } else {
        let usage = KeyUsage::new()
            .critical()
            .digital_signature()
            .build()
            .expect("key usage");
        builder.append_extension(usage).expect("append key usage");
    }

    let issuer_ref = issuer.map(|(cert, _)| cert);
    let ski = SubjectKeyIdentifier::new()
        .build(&builder.x509v3_context(issuer_ref, None))
        .expect("subject key id");
    builder.append_extension(ski).expect("append subject key id");
    if let Some(issuer_cert) = issuer_ref {
        let aki = AuthorityKeyIdentifier::new()
            .keyid(true)
            .build(&builder.x509v3_context(Some(issuer_cert), None))
            .expect("authority key id");
        builder.append_extension(aki).expect("append authority key id");
    }

    let signing_key = issuer.map_or(keypair, |(_, key)| key);
    builder
        .sign(signing_key, MessageDigest::sha256())
        .expect("sign certificate");
    builder.build()
}
