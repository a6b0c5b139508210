//! Key derivation and at-rest encryption for entitlement tokens.

pub mod cipher;
pub mod kdf;
