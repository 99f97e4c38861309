//! Revocation list entity behavior against runtime-built CRLs.

mod common;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use cmskit::{AlgorithmRegistry, Crl, CryptoEngine, DataFormat, OpensslEngine, PkiError, PkiObject};
use common::TestCa;
use const_oid::db::rfc5280::ID_CE_CRL_NUMBER;
use const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION;
use const_oid::AssociatedOid;
use der::asn1::{BitString, OctetString, Uint, UtcTime};
use der::{Any, AnyRef, Decode, Encode};
use spki::AlgorithmIdentifierOwned;
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::AuthorityKeyIdentifier;
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Time;
use x509_cert::Version;

const THIS_UPDATE: u64 = 1_700_000_000;
const NEXT_UPDATE: u64 = 1_731_536_000;
const REVOKED_AT: u64 = 1_690_000_000;

fn utc(secs: u64) -> Time {
    Time::UtcTime(UtcTime::from_unix_duration(Duration::from_secs(secs)).expect("utc time"))
}

fn system(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Build and sign a CRL issued by `ca`.
fn build_crl(
    ca: &TestCa,
    revoked: &[(&[u8], u64)],
    crl_number: Option<u8>,
    next_update: Option<u64>,
) -> Vec<u8> {
    let issuer_der = ca.certificate.subject_der().expect("issuer DER");
    let issuer = Name::from_der(&issuer_der).expect("issuer name");
    let algorithm = AlgorithmIdentifierOwned {
        oid: SHA_256_WITH_RSA_ENCRYPTION,
        parameters: Some(Any::from(AnyRef::NULL)),
    };

    let revoked_certificates = if revoked.is_empty() {
        None
    } else {
        let entries = revoked
            .iter()
            .map(|(serial, at)| RevokedCert {
                serial_number: SerialNumber::new(serial).expect("serial"),
                revocation_date: utc(*at),
                crl_entry_extensions: None,
            })
            .collect();
        Some(entries)
    };

    let mut extensions = Vec::new();
    if let Some(number) = crl_number {
        let value = Uint::new(&[number])
            .expect("crl number")
            .to_der()
            .expect("crl number DER");
        extensions.push(Extension {
            extn_id: ID_CE_CRL_NUMBER,
            critical: false,
            extn_value: OctetString::new(value).expect("extension value"),
        });
    }
    if let Some(ski) = ca.certificate.subject_key_identifier() {
        let aki = AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(ski).expect("key id")),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };
        extensions.push(Extension {
            extn_id: AuthorityKeyIdentifier::OID,
            critical: false,
            extn_value: OctetString::new(aki.to_der().expect("AKI DER"))
                .expect("extension value"),
        });
    }

    let tbs = TbsCertList {
        version: Version::V2,
        signature: algorithm.clone(),
        issuer,
        this_update: utc(THIS_UPDATE),
        next_update: next_update.map(utc),
        revoked_certificates,
        crl_extensions: if extensions.is_empty() {
            None
        } else {
            Some(extensions)
        },
    };

    let tbs_der = tbs.to_der().expect("TBS DER");
    let signature = OpensslEngine::new()
        .sign(&ca.signing_key(), "sha256", &tbs_der)
        .expect("sign CRL");

    let crl = CertificateList {
        tbs_cert_list: tbs,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&signature).expect("signature bits"),
    };
    crl.to_der().expect("CRL DER")
}

#[test]
fn accessors_reflect_built_fields() {
    let ca = TestCa::root("CRL Issuer CA");
    let der = build_crl(
        &ca,
        &[(&[0x05, 0x39], REVOKED_AT), (&[0x10, 0x01], REVOKED_AT)],
        Some(42),
        Some(NEXT_UPDATE),
    );

    let crl = Crl::import(&der, DataFormat::Der).expect("import CRL");
    assert_eq!(crl.version(), 2);
    assert_eq!(crl.issuer_friendly_name().as_deref(), Some("CRL Issuer CA"));
    assert!(crl.issuer().contains("CRL Issuer CA"));
    assert_eq!(
        crl.issuer_der().expect("issuer DER"),
        ca.certificate.subject_der().expect("subject DER")
    );
    assert_eq!(crl.last_update(), system(THIS_UPDATE));
    assert_eq!(crl.next_update(), Some(system(NEXT_UPDATE)));
    assert_eq!(crl.crl_number(), Some(vec![42]));
    assert_eq!(
        crl.authority_key_identifier(),
        ca.certificate.subject_key_identifier()
    );
    assert_eq!(crl.signature_algorithm().oid(), SHA_256_WITH_RSA_ENCRYPTION);
    assert!(!crl.signature().is_empty());
}

#[test]
fn revoked_entries_keep_order_and_timestamps() {
    let ca = TestCa::root("CRL Issuer CA");
    let der = build_crl(
        &ca,
        &[(&[0x05, 0x39], REVOKED_AT), (&[0x10, 0x01], THIS_UPDATE)],
        None,
        None,
    );

    let crl = Crl::import(&der, DataFormat::Der).expect("import CRL");
    assert_eq!(crl.revoked().len(), 2);

    let entries = crl.revoked();
    let first = entries.items(0).expect("first entry");
    assert_eq!(first.serial_number(), &[0x05, 0x39]);
    assert_eq!(first.revoked_at(), system(REVOKED_AT));

    let second = entries.items(1).expect("second entry");
    assert_eq!(second.serial_number(), &[0x10, 0x01]);
    assert_eq!(second.revoked_at(), system(THIS_UPDATE));
}

#[test]
fn empty_crl_has_no_entries_or_next_update() {
    let ca = TestCa::root("Quiet CA");
    let der = build_crl(&ca, &[], None, None);

    let crl = Crl::import(&der, DataFormat::Der).expect("import CRL");
    assert!(crl.revoked().is_empty());
    assert!(crl.next_update().is_none());
    assert!(crl.crl_number().is_none());
}

#[test]
fn signature_checks_out_against_the_issuer_key() {
    let ca = TestCa::root("CRL Issuer CA");
    let registry = AlgorithmRegistry::builtin();
    let engine = OpensslEngine::new();
    let der = build_crl(&ca, &[(&[0x01], REVOKED_AT)], Some(7), Some(NEXT_UPDATE));

    let crl = Crl::import(&der, DataFormat::Der).expect("import CRL");
    let digest = crl
        .signature_digest_algorithm(&registry)
        .expect("digest algorithm");
    assert_eq!(digest.name(), "sha256");

    let parsed = CertificateList::from_der(&der).expect("reparse");
    let tbs_der = parsed.tbs_cert_list.to_der().expect("TBS DER");
    let spki = ca.certificate.spki_der().expect("issuer SPKI");
    assert!(engine
        .verify_signature(&spki, digest.name(), &tbs_der, crl.signature())
        .expect("verify"));
}

#[test]
fn round_trips_are_byte_identical() {
    let ca = TestCa::root("Round Trip CA");
    let der = build_crl(&ca, &[(&[0x02], REVOKED_AT)], Some(3), None);

    let crl = Crl::import(&der, DataFormat::Der).expect("import CRL");
    assert_eq!(crl.export(DataFormat::Der).expect("export DER"), der);

    let pem = crl.export(DataFormat::Pem).expect("export PEM");
    let text = String::from_utf8(pem.clone()).expect("PEM is text");
    assert!(text.contains("BEGIN X509 CRL"));
    let reimported = Crl::import(&pem, DataFormat::Pem).expect("reimport PEM");
    assert!(reimported.equals(&crl));

    let copy = crl.duplicate().expect("duplicate");
    assert!(copy.equals(&crl));
    let engine = OpensslEngine::new();
    assert_eq!(
        copy.thumbprint(&engine).expect("thumbprint"),
        crl.thumbprint(&engine).expect("thumbprint")
    );
}

#[test]
fn malformed_input_is_a_decode_error() {
    let result = Crl::import(b"not a revocation list", DataFormat::Der);
    assert!(matches!(result, Err(PkiError::Decode(_))));
}
