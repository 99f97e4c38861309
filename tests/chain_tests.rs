//! Issuer chain assembly from certificate pools.

mod common;

use cmskit::{CertificateCollection, ChainBuilder, KeyKind, PkiError};
use common::{self_signed_identity, TestCa};

#[test]
fn assembles_leaf_to_root() {
    let root = TestCa::root("Chain Root CA");
    let intermediate = root.issue_ca("Chain Intermediate CA");
    let leaf = intermediate
        .issue_identity("Chain Leaf", KeyKind::Rsa)
        .certificate;

    let mut pool = CertificateCollection::new();
    pool.push(root.certificate.duplicate().expect("duplicate"));
    pool.push(intermediate.certificate.duplicate().expect("duplicate"));
    // Unrelated certificate that must not end up in the chain.
    pool.push(self_signed_identity("Unrelated", KeyKind::Rsa).certificate);

    let chain = ChainBuilder::new().build(&leaf, &pool).expect("chain");
    assert_eq!(chain.len(), 3);
    assert!(chain.items(0).expect("leaf").equals(&leaf));
    assert_eq!(
        chain
            .items(1)
            .expect("intermediate")
            .subject_friendly_name()
            .as_deref(),
        Some("Chain Intermediate CA")
    );
    let anchor = chain.items(2).expect("root");
    assert_eq!(anchor.subject_friendly_name().as_deref(), Some("Chain Root CA"));
    assert!(anchor.is_self_signed());
}

#[test]
fn self_signed_leaf_is_a_complete_chain() {
    let leaf = self_signed_identity("Standalone", KeyKind::Rsa).certificate;

    let chain = ChainBuilder::new()
        .build(&leaf, &CertificateCollection::new())
        .expect("chain");
    assert_eq!(chain.len(), 1);
    assert!(chain.items(0).expect("leaf").equals(&leaf));
}

#[test]
fn missing_issuer_is_reported() {
    let root = TestCa::root("Absent Root CA");
    let leaf = root.issue_identity("Orphan Leaf", KeyKind::Rsa).certificate;

    let result = ChainBuilder::new().build(&leaf, &CertificateCollection::new());
    assert!(matches!(result, Err(PkiError::IssuerCertificateNotFound(_))));
}

#[test]
fn incomplete_chain_stops_at_the_gap() {
    let root = TestCa::root("Gap Root CA");
    let intermediate = root.issue_ca("Gap Intermediate CA");
    let leaf = intermediate
        .issue_identity("Gap Leaf", KeyKind::Rsa)
        .certificate;

    // Intermediate present, root withheld.
    let mut pool = CertificateCollection::new();
    pool.push(intermediate.certificate.duplicate().expect("duplicate"));

    let result = ChainBuilder::new().build(&leaf, &pool);
    assert!(matches!(result, Err(PkiError::IssuerCertificateNotFound(_))));
}

#[test]
fn key_identifiers_disambiguate_same_named_issuers() {
    let real = TestCa::root("Twin CA");
    let decoy = TestCa::root("Twin CA");
    let leaf = real.issue_identity("Twin Leaf", KeyKind::Rsa).certificate;

    // The decoy shares the issuer name but not the key.
    let mut pool = CertificateCollection::new();
    pool.push(decoy.certificate.duplicate().expect("duplicate"));
    pool.push(real.certificate.duplicate().expect("duplicate"));

    let chain = ChainBuilder::new().build(&leaf, &pool).expect("chain");
    assert_eq!(chain.len(), 2);
    let issuer = chain.items(1).expect("issuer");
    assert_eq!(
        issuer.subject_key_identifier(),
        leaf.authority_key_identifier()
    );
}
