//! Certificate entity behavior against freshly minted identities.

mod common;

use cmskit::{Certificate, CertificateType, DataFormat, KeyKind, OpensslEngine, PkiError, PkiObject};
use common::{self_signed_identity, TestCa};
use std::cmp::Ordering;
use tempfile::TempDir;

#[test]
fn accessors_reflect_minted_fields() {
    let ca = TestCa::root("Fixture Root CA");
    let identity = ca.issue_identity("Leaf Subject", KeyKind::Rsa);
    let cert = &identity.certificate;

    assert_eq!(cert.version(), 3);
    assert_eq!(cert.subject_friendly_name().as_deref(), Some("Leaf Subject"));
    assert_eq!(
        cert.issuer_friendly_name().as_deref(),
        Some("Fixture Root CA")
    );
    assert!(cert.subject().contains("Leaf Subject"));
    assert!(cert.issuer().contains("Fixture Root CA"));
    assert!(!cert.serial_number().is_empty());
    assert!(cert.not_before() < cert.not_after());
    assert!(!cert.is_self_signed());
    assert!(ca.certificate.is_self_signed());
}

#[test]
fn key_identifier_extensions_are_exposed() {
    let ca = TestCa::root("Fixture Root CA");
    let identity = ca.issue_identity("Leaf Subject", KeyKind::Rsa);

    let ski = ca
        .certificate
        .subject_key_identifier()
        .expect("CA carries a subject key identifier");
    let aki = identity
        .certificate
        .authority_key_identifier()
        .expect("leaf carries an authority key identifier");
    assert_eq!(aki, ski);

    // digitalSignature is bit 0 of the key usage flags.
    let usage = identity.certificate.key_usage().expect("key usage set");
    assert_ne!(usage & 0x01, 0);
}

#[test]
fn spki_parses_as_a_public_key() {
    let identity = self_signed_identity("SPKI Check", KeyKind::Ec);
    let spki = identity.certificate.spki_der().expect("SPKI DER");
    openssl::pkey::PKey::public_key_from_der(&spki).expect("SPKI is a valid public key");
}

#[test]
fn certificate_type_masks_key_and_signature_families() {
    let rsa = self_signed_identity("RSA Type", KeyKind::Rsa).certificate;
    let mask = rsa.certificate_type();
    assert!(mask.contains(
        CertificateType::RSA | CertificateType::SIGN | CertificateType::ENCRYPT
    ));
    assert!(mask.contains(CertificateType::SIGNED_WITH_RSA));
    assert!(!mask.contains(CertificateType::EC));

    // EC leaf under an RSA root: EC key, RSA issuing signature.
    let ca = TestCa::root("Type Root CA");
    let ec = ca.issue_identity("EC Type", KeyKind::Ec).certificate;
    let mask = ec.certificate_type();
    assert!(mask.contains(
        CertificateType::EC | CertificateType::SIGN | CertificateType::EXCHANGE
    ));
    assert!(mask.contains(CertificateType::SIGNED_WITH_RSA));
    assert!(!mask.contains(CertificateType::SIGNED_WITH_EC));

    let self_ec = self_signed_identity("EC Self", KeyKind::Ec).certificate;
    assert!(self_ec.certificate_type().contains(CertificateType::SIGNED_WITH_EC));
}

#[test]
fn comparison_is_a_total_order_over_encodings() {
    let a = self_signed_identity("Order A", KeyKind::Rsa).certificate;
    let b = self_signed_identity("Order B", KeyKind::Rsa).certificate;

    let copy = a.duplicate().expect("duplicate");
    assert!(a.equals(&copy));
    assert_eq!(a.compare(&copy), Ordering::Equal);

    // Distinct certificates never compare equal, and the order is symmetric.
    assert!(!a.equals(&b));
    assert_eq!(a.compare(&b), b.compare(&a).reverse());
}

#[test]
fn duplicate_is_independent_but_identical() {
    let original = self_signed_identity("Duplicate Me", KeyKind::Rsa).certificate;
    let copy = original.duplicate().expect("duplicate");

    let original_der = original.export(DataFormat::Der).expect("export original");
    let copy_der = copy.export(DataFormat::Der).expect("export copy");
    assert_eq!(original_der, copy_der);
}

#[test]
fn hash_and_thumbprint_are_stable_hex() {
    let engine = OpensslEngine::new();
    let cert = self_signed_identity("Hash Me", KeyKind::Rsa).certificate;

    let sha256 = cert.hash(&engine, "sha256").expect("sha256 hash");
    assert_eq!(sha256.len(), 64);
    assert!(sha256.chars().all(|c| c.is_ascii_hexdigit()));

    let thumbprint = cert.thumbprint(&engine).expect("thumbprint");
    assert_eq!(thumbprint.len(), 40);

    let copy = cert.duplicate().expect("duplicate");
    assert_eq!(copy.thumbprint(&engine).expect("thumbprint"), thumbprint);
}

#[test]
fn der_round_trip_is_byte_identical() {
    let cert = self_signed_identity("Round Trip", KeyKind::Rsa).certificate;

    let der = cert.export(DataFormat::Der).expect("export DER");
    let reimported = Certificate::import(&der, DataFormat::Der).expect("reimport");
    assert_eq!(reimported.export(DataFormat::Der).expect("re-export"), der);
}

#[test]
fn pem_round_trip_preserves_the_certificate() {
    let cert = self_signed_identity("PEM Trip", KeyKind::Ec).certificate;

    let pem = cert.export(DataFormat::Pem).expect("export PEM");
    let text = String::from_utf8(pem.clone()).expect("PEM is text");
    assert!(text.contains("BEGIN CERTIFICATE"));

    let reimported = Certificate::import(&pem, DataFormat::Pem).expect("reimport PEM");
    assert!(reimported.equals(&cert));
}

#[test]
fn load_and_save_round_trip_through_files() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join("cert.pem");
    let cert = self_signed_identity("File Trip", KeyKind::Rsa).certificate;

    cert.save(&path, DataFormat::Pem).expect("save");
    let loaded = Certificate::load(&path, DataFormat::Pem).expect("load");
    assert!(loaded.equals(&cert));
}

#[test]
fn unknown_digest_name_is_rejected() {
    let engine = OpensslEngine::new();
    let cert = self_signed_identity("Bad Digest", KeyKind::Rsa).certificate;

    let result = cert.hash(&engine, "md42");
    assert!(matches!(result, Err(PkiError::UnsupportedAlgorithm(_))));
}

#[test]
fn malformed_input_is_a_decode_error() {
    let result = Certificate::import(b"definitely not DER", DataFormat::Der);
    assert!(matches!(result, Err(PkiError::Decode(_))));

    let result = Certificate::import(b"no pem armor here", DataFormat::Pem);
    assert!(matches!(result, Err(PkiError::Decode(_))));
}
