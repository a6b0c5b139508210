//! # Tollgate
//!
//! **Machine-bound offline entitlement cache for storefront-gated apps.**
//!
//! Tollgate asks a live storefront oracle whether the current user owns an
//! application (and which DLC is installed), then caches the answer in an
//! encrypted token bound to this machine. When the storefront is not
//! reachable on a later launch, the cached token keeps the app entitled
//! until its TTL runs out.
//!
//! ## Features
//!
//! - **Live check with fallback**: oracle first, cached token second
//! - **Machine-bound token**: AES-256-CBC under a key derived from machine and app identity
//! - **Expiry and scope**: tokens expire after a TTL and only unlock the app they were minted for
//! - **Never fails the host**: every error path ends in "not entitled"
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use tollgate::{EntitlementStore, OfflineOracle, TollgateConfig};
//!
//! fn main() -> Result<(), tollgate::TollgateError> {
//!     let config = TollgateConfig::new("Shinymoon", "MateEngine", "mate-engine");
//!     let store = EntitlementStore::new(config, Arc::new(OfflineOracle))?;
//!
//!     store.initialize(480);
//!     if store.is_entitled() && store.has_dlc(100) {
//!         println!("DLC 100 unlocked");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Tollgate deters:
//! - **Token copying**: a token file decrypts only on the machine and account that wrote it
//! - **Casual edits**: flipping bytes in the token makes it unreadable
//!
//! Tollgate does **not** resist a determined reverse-engineer. The key is
//! derived from non-secret machine data and the cipher is unauthenticated.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;
pub mod identity;

// Crypto layer
pub mod crypto;

// Cache layer
pub mod cache;

// Oracle seam
pub mod oracle;

// Store (main public API)
pub mod store;

// Polling helpers
pub mod retry;
pub mod watch;

// Re-exports for public API
pub use cache::format::{EntitlementRecord, ANY_APP};
pub use clock::{Clock, SystemClock};
pub use config::TollgateConfig;
pub use errors::TollgateError;
pub use identity::MachineIdentity;
pub use oracle::{LiveOracle, OfflineOracle};
pub use retry::{retry_until_entitled, RetryOutcome, RetryPolicy};
pub use store::{EntitlementStatus, EntitlementStore};
pub use watch::EntitlementWatch;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-seams"))]
pub use oracle::ScriptedOracle;
