//! Service layer module root.
//! Contains the signing, verification and chain building services.

pub mod attributes;
pub mod chain;
pub mod signing;
pub mod verification;

pub use attributes::AttributeBuilder;
pub use chain::ChainBuilder;
pub use signing::SigningService;
pub use verification::VerificationService;
