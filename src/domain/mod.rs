pub mod algorithm;
pub mod attribute;
pub mod certificate;
pub mod collection;
pub mod crl;
pub mod encoding;
pub mod registry;
pub mod signed_data;
pub mod signer;
pub mod verification;
