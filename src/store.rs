//! Entitlement store - the main public API for Tollgate.
//!
//! The `EntitlementStore` owns the current entitlement for one application:
//! - Live check through a [`LiveOracle`], minting and caching a token
//! - Offline fallback to the machine-bound cached token
//! - Expiry and app-scope validation on every path
//!
//! No public operation fails. Every error ends in "not entitled", so an
//! entitlement problem can never stop the host application from starting.

use crate::cache::file::TokenFile;
use crate::cache::format::EntitlementRecord;
use crate::clock::{Clock, SystemClock};
use crate::config::TollgateConfig;
use crate::crypto::kdf::TokenKey;
use crate::identity::MachineIdentity;
use crate::oracle::LiveOracle;
use crate::TollgateError;
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the store is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementStatus {
    /// `initialize` has not run yet.
    Uninitialized,
    /// A valid record is held.
    Entitled,
    /// Checked, and no valid record could be obtained.
    NotEntitled,
}

#[derive(Debug)]
struct StoreState {
    status: EntitlementStatus,
    /// App id the store was last initialized or checked for.
    app_id: Option<u32>,
    /// Present only while `status == Entitled`.
    record: Option<EntitlementRecord>,
}

impl StoreState {
    fn uninitialized() -> Self {
        Self {
            status: EntitlementStatus::Uninitialized,
            app_id: None,
            record: None,
        }
    }
}

/// Process-wide entitlement state for one application.
///
/// Create one instance in the application's composition root and share it
/// by reference or `Arc`. Reads are cheap and never touch the disk.
pub struct EntitlementStore {
    config: TollgateConfig,
    clock: Arc<dyn Clock>,
    oracle: Arc<dyn LiveOracle>,
    identity: MachineIdentity,
    token_file: TokenFile,
    state: RwLock<StoreState>,
}

impl EntitlementStore {
    /// Create a store for this machine, using the system clock.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - No platform data directory exists and none was configured
    pub fn new(
        config: TollgateConfig,
        oracle: Arc<dyn LiveOracle>,
    ) -> Result<Self, TollgateError> {
        let identity = MachineIdentity::collect(config.company_name, config.product_name);
        Self::from_parts(config, oracle, Arc::new(SystemClock), identity)
    }

    /// Create a store with an explicit clock and machine identity.
    pub fn from_parts(
        config: TollgateConfig,
        oracle: Arc<dyn LiveOracle>,
        clock: Arc<dyn Clock>,
        identity: MachineIdentity,
    ) -> Result<Self, TollgateError> {
        config.validate()?;
        let token_file = TokenFile::from_config(&config)?;

        Ok(Self {
            config,
            clock,
            oracle,
            identity,
            token_file,
            state: RwLock::new(StoreState::uninitialized()),
        })
    }

    /// Initialize for `app_id` with the configured default TTL.
    pub fn initialize(&self, app_id: u32) -> EntitlementStatus {
        self.initialize_with_ttl(app_id, self.config.default_ttl)
    }

    /// Initialize for `app_id`.
    ///
    /// A no-op when already initialized for the same app. Otherwise:
    /// 1. Try the live oracle; on success mint, persist and finish
    /// 2. Fall back to the cached token, validated for `app_id`
    ///
    /// Switching to a different app discards the previous entitlement.
    pub fn initialize_with_ttl(&self, app_id: u32, ttl: Duration) -> EntitlementStatus {
        {
            let state = self.read_state();
            if state.app_id == Some(app_id) && state.status != EntitlementStatus::Uninitialized {
                debug!(app_id, status = ?state.status, "already initialized");
                return state.status;
            }
        }

        match self.live_check(app_id, ttl) {
            Ok(_) => EntitlementStatus::Entitled,
            Err(live_error) => {
                log_live_failure(app_id, &live_error);
                let cached = match self.load_cached(app_id) {
                    Ok(record) => {
                        info!(
                            app_id,
                            expires_at_ms = record.expires_at_ms,
                            "entitled from cached token"
                        );
                        Some(record)
                    }
                    Err(e @ TollgateError::CorruptToken(_)) => {
                        warn!(app_id, error = %e, "cached token unreadable");
                        None
                    }
                    Err(e) => {
                        debug!(app_id, error = %e, "no usable cached token");
                        None
                    }
                };
                self.commit(app_id, cached)
            }
        }
    }

    /// Run the live round trip and report only whether it succeeded.
    ///
    /// Safe to call repeatedly; a failure leaves the current state alone.
    pub fn try_live_check(&self, app_id: u32, ttl: Duration) -> bool {
        self.live_check(app_id, ttl).is_ok()
    }

    /// Run the live round trip: query the oracle, mint, persist, commit.
    ///
    /// # Errors
    /// - `OracleUnavailable` - the oracle could not answer
    /// - `NotAuthenticated` - no storefront user signed in
    /// - `AppNotOwned` - the user does not own `app_id`
    /// - `TokenExpired` - `ttl` too short to produce a valid record
    ///
    /// A persist failure is not an error: the entitlement still holds for
    /// this process, it just will not survive a restart.
    pub fn live_check(
        &self,
        app_id: u32,
        ttl: Duration,
    ) -> Result<EntitlementRecord, TollgateError> {
        let record = self.query_oracle(app_id, ttl)?;
        record.validate(app_id, self.clock.as_ref())?;

        if let Err(e) = self.persist(&record) {
            warn!(app_id, error = %e, "entitlement token not persisted");
        }

        info!(
            app_id,
            expires_at_ms = record.expires_at_ms,
            dlc_count = record.owned_dlc_ids.len(),
            "minted entitlement from live check"
        );
        self.commit(app_id, Some(record.clone()));
        Ok(record)
    }

    /// Current entitlement flag. No I/O.
    pub fn is_entitled(&self) -> bool {
        self.read_state().status == EntitlementStatus::Entitled
    }

    /// Current lifecycle status.
    pub fn status(&self) -> EntitlementStatus {
        self.read_state().status
    }

    /// Snapshot of the held record, if entitled.
    pub fn record(&self) -> Option<EntitlementRecord> {
        self.read_state().record.clone()
    }

    /// DLC ids known to be owned from the last mint or load.
    pub fn owned_dlc(&self) -> BTreeSet<u32> {
        self.read_state()
            .record
            .as_ref()
            .map(|r| r.owned_dlc_ids.clone())
            .unwrap_or_default()
    }

    /// Whether the DLC `dlc_id` is available.
    ///
    /// While entitled, the oracle is asked first and the cached set is
    /// OR-ed in. If the oracle fails, or the store is not entitled, only the
    /// cached set counts.
    pub fn has_dlc(&self, dlc_id: u32) -> bool {
        let (entitled, cached) = {
            let state = self.read_state();
            let cached = state
                .record
                .as_ref()
                .is_some_and(|r| r.owned_dlc_ids.contains(&dlc_id));
            (state.status == EntitlementStatus::Entitled, cached)
        };

        if entitled {
            match self.oracle.is_dlc_installed(dlc_id) {
                Ok(installed) => return installed || cached,
                Err(e) => debug!(dlc_id, error = %e, "DLC query failed, using cached set"),
            }
        }
        cached
    }

    /// Drop the in-memory entitlement. The token file is left in place.
    pub fn invalidate(&self) {
        let mut state = self.write_state();
        if state.status != EntitlementStatus::Uninitialized {
            state.status = EntitlementStatus::NotEntitled;
        }
        state.record = None;
        debug!(app_id = ?state.app_id, "entitlement invalidated");
    }

    /// Invalidate and delete the persisted token.
    pub fn purge(&self) -> Result<(), TollgateError> {
        self.invalidate();
        self.token_file.delete()
    }

    /// Get the current configuration.
    pub fn config(&self) -> &TollgateConfig {
        &self.config
    }

    /// Location of the persisted token.
    pub fn token_path(&self) -> std::path::PathBuf {
        self.token_file.path()
    }

    fn query_oracle(&self, app_id: u32, ttl: Duration) -> Result<EntitlementRecord, TollgateError> {
        if !self.oracle.is_user_authenticated()? {
            return Err(TollgateError::NotAuthenticated);
        }
        if !self.oracle.owns_app(app_id)? {
            return Err(TollgateError::AppNotOwned { app_id });
        }

        let dlc = self.oracle.list_installed_dlc(app_id)?;
        let owner_id = self.oracle.current_user_id()?;

        Ok(EntitlementRecord::mint(
            owner_id,
            app_id,
            dlc,
            ttl,
            self.clock.as_ref(),
        ))
    }

    fn persist(&self, record: &EntitlementRecord) -> Result<(), TollgateError> {
        let key = TokenKey::derive(&self.identity, record.app_id);
        let sealed = record.seal(&key)?;
        self.token_file.save(&sealed)?;
        let path = self.token_file.path();
        debug!(key = %key.fingerprint(), path = %path.display(), "token persisted");
        Ok(())
    }

    fn load_cached(&self, app_id: u32) -> Result<EntitlementRecord, TollgateError> {
        let sealed = self
            .token_file
            .load()?
            .ok_or(TollgateError::TokenMissing)?;
        let key = TokenKey::derive(&self.identity, app_id);
        let record = EntitlementRecord::open(&sealed, &key)?;
        record.validate(app_id, self.clock.as_ref())?;
        Ok(record)
    }

    fn commit(&self, app_id: u32, record: Option<EntitlementRecord>) -> EntitlementStatus {
        let mut state = self.write_state();
        state.app_id = Some(app_id);
        state.status = if record.is_some() {
            EntitlementStatus::Entitled
        } else {
            EntitlementStatus::NotEntitled
        };
        state.record = record;
        state.status
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_live_failure(app_id: u32, error: &TollgateError) {
    match error {
        TollgateError::NotAuthenticated | TollgateError::AppNotOwned { .. } => {
            info!(app_id, error = %error, "storefront denied live check, trying cached token")
        }
        e if e.is_live_check_failure() => {
            debug!(app_id, error = %e, "storefront unavailable, trying cached token")
        }
        e => warn!(app_id, error = %e, "minted record rejected, trying cached token"),
    }
}
