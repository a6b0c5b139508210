//! Tollgate error types.

use thiserror::Error;

/// Errors that can occur while checking or caching an entitlement.
///
/// The public [`EntitlementStore`](crate::EntitlementStore) facade never
/// returns these; they describe *why* a check fell back so the store can
/// pick the right recovery path.
#[derive(Debug, Error)]
pub enum TollgateError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The live oracle could not be reached or failed mid-call.
    #[error("Live entitlement oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// The oracle is reachable but no user is signed in.
    #[error("No authenticated storefront user")]
    NotAuthenticated,

    /// The oracle reports the user does not own the application.
    #[error("Application {app_id} is not owned by the current user")]
    AppNotOwned {
        /// The application id that was checked.
        app_id: u32,
    },

    /// No persisted token exists.
    #[error("No persisted entitlement token")]
    TokenMissing,

    /// The persisted token could not be decrypted or parsed.
    #[error("Corrupt entitlement token: {0}")]
    CorruptToken(String),

    /// The persisted token could not be written or read.
    #[error("Token persistence failure: {0}")]
    PersistFailure(String),

    /// The record is structurally fine but its expiry has passed.
    #[error("Entitlement token expired at {expires_at_ms}")]
    TokenExpired {
        /// Expiry instant in Unix epoch milliseconds.
        expires_at_ms: i64,
    },

    /// The record was minted for a different application.
    #[error("Entitlement token minted for app {minted}, requested {requested}")]
    ScopeMismatch {
        /// The application id requested by the caller.
        requested: u32,
        /// The application id stored in the record.
        minted: u32,
    },
}

impl TollgateError {
    /// Whether this error means the live check could not produce a verdict
    /// and the cached token should be consulted instead.
    pub fn is_live_check_failure(&self) -> bool {
        matches!(
            self,
            TollgateError::OracleUnavailable(_)
                | TollgateError::NotAuthenticated
                | TollgateError::AppNotOwned { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_check_failures_are_classified() {
        assert!(TollgateError::OracleUnavailable("offline".into()).is_live_check_failure());
        assert!(TollgateError::NotAuthenticated.is_live_check_failure());
        assert!(TollgateError::AppNotOwned { app_id: 480 }.is_live_check_failure());
        assert!(!TollgateError::TokenMissing.is_live_check_failure());
        assert!(!TollgateError::CorruptToken("bad padding".into()).is_live_check_failure());
    }

    #[test]
    fn messages_carry_context() {
        let err = TollgateError::ScopeMismatch {
            requested: 20,
            minted: 10,
        };
        assert_eq!(
            err.to_string(),
            "Entitlement token minted for app 10, requested 20"
        );
    }
}
