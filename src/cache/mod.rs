//! Persisted entitlement token: record format, codec and file storage.

pub mod file;
pub mod format;
