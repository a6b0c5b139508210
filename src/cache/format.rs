//! Entitlement record format and token codec.
//!
//! The record is serialized as compact JSON with a fixed field order and
//! sorted DLC ids, then encrypted with the machine-bound key:
//! - `owner_id` (string)
//! - `app_id` (u32)
//! - `expires_at_ms` (Unix epoch milliseconds)
//! - `owned_dlc_ids` (ascending list)
//!
//! On load, we:
//! 1. Decrypt (length and padding checked)
//! 2. Parse strictly (unknown or missing fields reject the token)
//! 3. Apply [`EntitlementRecord::validate`] for expiry and scope

use crate::clock::Clock;
use crate::crypto::{cipher, kdf::TokenKey};
use crate::TollgateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Wildcard app id: validation skips the scope check.
pub const ANY_APP: u32 = 0;

/// One cached entitlement: who, which app, until when, which DLC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitlementRecord {
    /// Storefront user id at mint time (empty when unknown).
    pub owner_id: String,

    /// Application the record is scoped to.
    pub app_id: u32,

    /// Expiry instant in Unix epoch milliseconds.
    pub expires_at_ms: i64,

    /// DLC ids confirmed installed at mint time.
    pub owned_dlc_ids: BTreeSet<u32>,
}

impl EntitlementRecord {
    /// Mint a record that expires `ttl` after the clock's current time.
    pub fn mint(
        owner_id: String,
        app_id: u32,
        owned_dlc_ids: BTreeSet<u32>,
        ttl: Duration,
        clock: &dyn Clock,
    ) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            owner_id,
            app_id,
            expires_at_ms: clock.now_ms().saturating_add(ttl_ms),
            owned_dlc_ids,
        }
    }

    /// Check expiry and scope.
    ///
    /// Valid iff `expires_at_ms > 0`, `now < expires_at_ms`, and the
    /// requested app is [`ANY_APP`] or equals `app_id`.
    pub fn validate(&self, requested_app_id: u32, clock: &dyn Clock) -> Result<(), TollgateError> {
        if self.expires_at_ms <= 0 || clock.now_ms() >= self.expires_at_ms {
            return Err(TollgateError::TokenExpired {
                expires_at_ms: self.expires_at_ms,
            });
        }

        if requested_app_id != ANY_APP && requested_app_id != self.app_id {
            return Err(TollgateError::ScopeMismatch {
                requested: requested_app_id,
                minted: self.app_id,
            });
        }

        Ok(())
    }

    /// Serialize the record to canonical JSON.
    pub fn to_json(&self) -> Result<String, TollgateError> {
        serde_json::to_string(self)
            .map_err(|e| TollgateError::PersistFailure(format!("Failed to serialize token: {}", e)))
    }

    /// Deserialize a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, TollgateError> {
        serde_json::from_str(json)
            .map_err(|e| TollgateError::CorruptToken(format!("Failed to parse token: {}", e)))
    }

    /// Serialize and encrypt for storage.
    pub fn seal(&self, key: &TokenKey) -> Result<Vec<u8>, TollgateError> {
        let json = self.to_json()?;
        Ok(cipher::encrypt(json.as_bytes(), key))
    }

    /// Decrypt and parse a stored token.
    pub fn open(ciphertext: &[u8], key: &TokenKey) -> Result<Self, TollgateError> {
        let plain = cipher::decrypt(ciphertext, key)?;
        let json = std::str::from_utf8(&plain)
            .map_err(|e| TollgateError::CorruptToken(format!("Invalid UTF-8 in token: {}", e)))?;
        Self::from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    const NOW_MS: i64 = 1_736_942_400_000;

    fn key() -> TokenKey {
        TokenKey::from_bytes([0x42; 32], [0x24; 16])
    }

    fn record(expires_at_ms: i64) -> EntitlementRecord {
        EntitlementRecord {
            owner_id: "76561198000000000".to_string(),
            app_id: 10,
            expires_at_ms,
            owned_dlc_ids: [101, 100].into_iter().collect(),
        }
    }

    #[test]
    fn test_mint_sets_expiry_from_ttl() {
        let clock = MockClock::from_millis(NOW_MS);
        let minted = EntitlementRecord::mint(
            "owner".into(),
            480,
            BTreeSet::new(),
            Duration::from_secs(14 * 86_400),
            &clock,
        );
        assert_eq!(minted.expires_at_ms, NOW_MS + 1_209_600_000);
        assert!(minted.validate(480, &clock).is_ok());
    }

    #[test]
    fn test_mint_saturates_huge_ttl() {
        let clock = MockClock::from_millis(NOW_MS);
        let minted =
            EntitlementRecord::mint(String::new(), 1, BTreeSet::new(), Duration::MAX, &clock);
        assert_eq!(minted.expires_at_ms, i64::MAX);
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let clock = MockClock::from_millis(NOW_MS);
        assert!(matches!(
            record(NOW_MS).validate(10, &clock),
            Err(TollgateError::TokenExpired { .. })
        ));
        assert!(record(NOW_MS + 1).validate(10, &clock).is_ok());
    }

    #[test]
    fn test_non_positive_expiry_never_valid() {
        let clock = MockClock::from_millis(-5_000);
        assert!(record(0).validate(10, &clock).is_err());
        assert!(record(-1).validate(10, &clock).is_err());
    }

    #[test]
    fn test_scope_check() {
        let clock = MockClock::from_millis(NOW_MS);
        let rec = record(NOW_MS + 60_000);
        assert!(matches!(
            rec.validate(20, &clock),
            Err(TollgateError::ScopeMismatch {
                requested: 20,
                minted: 10
            })
        ));
        assert!(rec.validate(ANY_APP, &clock).is_ok());
        assert!(rec.validate(10, &clock).is_ok());
    }

    #[test]
    fn test_json_is_canonical() {
        let json = record(5).to_json().unwrap();
        assert_eq!(
            json,
            r#"{"owner_id":"76561198000000000","app_id":10,"expires_at_ms":5,"owned_dlc_ids":[100,101]}"#
        );
    }

    #[test]
    fn test_duplicate_dlc_ids_collapse() {
        let json = r#"{"owner_id":"","app_id":1,"expires_at_ms":5,"owned_dlc_ids":[7,7,3]}"#;
        let rec = EntitlementRecord::from_json(json).unwrap();
        assert_eq!(rec.owned_dlc_ids.into_iter().collect::<Vec<_>>(), vec![3, 7]);
    }

    #[test]
    fn test_unknown_and_missing_fields_rejected() {
        let extra = r#"{"owner_id":"","app_id":1,"expires_at_ms":5,"owned_dlc_ids":[],"v":2}"#;
        assert!(matches!(
            EntitlementRecord::from_json(extra),
            Err(TollgateError::CorruptToken(_))
        ));
        let missing = r#"{"owner_id":"","app_id":1,"owned_dlc_ids":[]}"#;
        assert!(EntitlementRecord::from_json(missing).is_err());
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let rec = record(NOW_MS + 1);
        let sealed = rec.seal(&key()).unwrap();
        assert_eq!(EntitlementRecord::open(&sealed, &key()).unwrap(), rec);
    }

    #[test]
    fn test_seal_open_roundtrip_varied_records() {
        let records = [
            EntitlementRecord {
                owner_id: String::new(),
                app_id: 480,
                expires_at_ms: 1,
                owned_dlc_ids: BTreeSet::new(),
            },
            EntitlementRecord {
                owner_id: "José \"草\" 🎮".to_string(),
                app_id: u32::MAX,
                expires_at_ms: i64::MAX,
                owned_dlc_ids: [u32::MAX, 0, 42].into_iter().collect(),
            },
            EntitlementRecord {
                owner_id: "x".repeat(300),
                app_id: 0,
                expires_at_ms: NOW_MS,
                owned_dlc_ids: (1..=64).collect(),
            },
        ];

        for rec in records {
            let sealed = rec.seal(&key()).unwrap();
            assert_eq!(EntitlementRecord::open(&sealed, &key()).unwrap(), rec);
        }
    }

    #[test]
    fn test_seal_is_deterministic() {
        let rec = record(NOW_MS + 1);
        assert_eq!(rec.seal(&key()).unwrap(), rec.seal(&key()).unwrap());
    }

    #[test]
    fn test_open_with_other_key_fails() {
        let sealed = record(NOW_MS + 1).seal(&key()).unwrap();
        let other = TokenKey::from_bytes([0x43; 32], [0x24; 16]);
        assert!(matches!(
            EntitlementRecord::open(&sealed, &other),
            Err(TollgateError::CorruptToken(_))
        ));
    }

    #[test]
    fn test_single_byte_flip_never_opens() {
        let sealed = record(NOW_MS + 1).seal(&key()).unwrap();
        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0xFF;
            assert!(
                EntitlementRecord::open(&tampered, &key()).is_err(),
                "flipping byte {} still produced a record",
                i
            );
        }
    }
}
