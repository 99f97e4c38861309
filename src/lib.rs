//! CMS Signed-Data Toolkit
//!
//! A self-contained library for building, signing and verifying CMS/PKCS#7
//! `SignedData` messages, including the certificate and CRL handling around
//! them. Wire encoding follows RFC 5652; cryptographic primitives run behind
//! a pluggable engine with an OpenSSL-backed default.

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

pub use adapters::{default_engine, CryptoEngine, OpensslEngine};
pub use domain::algorithm::{Algorithm, AlgorithmKind, KeyKind, PrivateKey};
pub use domain::attribute::{Attribute, AttributeCollection, AttributeValueCollection};
pub use domain::certificate::{Certificate, CertificateCollection, CertificateType};
pub use domain::collection::ItemCollection;
pub use domain::crl::{Crl, CrlCollection, RevokedEntry};
pub use domain::encoding::{DataFormat, PkiObject};
pub use domain::registry::AlgorithmRegistry;
pub use domain::signed_data::{SignedData, SignedDataFlags};
pub use domain::signer::{Signer, SignerCollection, SignerId};
pub use domain::verification::{SignerStatus, SignerVerification, VerificationReport};
pub use infra::config::{ProfileManager, SigningProfile};
pub use infra::error::{PkiError, PkiResult};
pub use services::{AttributeBuilder, ChainBuilder, SigningService, VerificationService};
