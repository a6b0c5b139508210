//! Live entitlement oracle seam.
//!
//! The store never talks to a storefront SDK directly. Production code wraps
//! the SDK in a [`LiveOracle`]; tests and non-storefront builds plug in
//! something else.

use crate::TollgateError;
use std::collections::BTreeSet;

/// Ground-truth entitlement authority (e.g. a storefront SDK).
///
/// Every call may fail with [`TollgateError::OracleUnavailable`]. The store
/// treats a failure as "no verdict", never as "not entitled".
pub trait LiveOracle: Send + Sync {
    /// Whether a storefront user is signed in.
    fn is_user_authenticated(&self) -> Result<bool, TollgateError>;

    /// Whether the signed-in user owns `app_id`.
    fn owns_app(&self, app_id: u32) -> Result<bool, TollgateError>;

    /// DLC ids of `app_id` currently installed.
    fn list_installed_dlc(&self, app_id: u32) -> Result<BTreeSet<u32>, TollgateError>;

    /// Whether a single DLC is installed right now.
    fn is_dlc_installed(&self, dlc_id: u32) -> Result<bool, TollgateError>;

    /// Opaque id of the signed-in user.
    fn current_user_id(&self) -> Result<String, TollgateError>;
}

/// Oracle for builds shipped outside the storefront: always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

impl OfflineOracle {
    fn unavailable<T>() -> Result<T, TollgateError> {
        Err(TollgateError::OracleUnavailable(
            "no storefront in this build".to_string(),
        ))
    }
}

impl LiveOracle for OfflineOracle {
    fn is_user_authenticated(&self) -> Result<bool, TollgateError> {
        Self::unavailable()
    }

    fn owns_app(&self, _app_id: u32) -> Result<bool, TollgateError> {
        Self::unavailable()
    }

    fn list_installed_dlc(&self, _app_id: u32) -> Result<BTreeSet<u32>, TollgateError> {
        Self::unavailable()
    }

    fn is_dlc_installed(&self, _dlc_id: u32) -> Result<bool, TollgateError> {
        Self::unavailable()
    }

    fn current_user_id(&self) -> Result<String, TollgateError> {
        Self::unavailable()
    }
}

/// Scripted oracle for deterministic testing.
///
/// Answers can be changed while the store holds it, to simulate the
/// storefront coming online or a user signing out.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    state: std::sync::Mutex<ScriptedState>,
}

#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Default, Clone)]
struct ScriptedState {
    reachable: bool,
    authenticated: bool,
    owned_apps: BTreeSet<u32>,
    installed_dlc: BTreeSet<u32>,
    user_id: String,
    calls: usize,
}

#[cfg(any(test, feature = "test-seams"))]
impl ScriptedOracle {
    /// An oracle that cannot be reached.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// A reachable oracle with a signed-in user owning `app_id` and `dlc`.
    pub fn owning(app_id: u32, user_id: &str, dlc: &[u32]) -> Self {
        let oracle = Self::default();
        oracle.set_reachable(true);
        {
            let mut state = oracle.lock();
            state.authenticated = true;
            state.owned_apps.insert(app_id);
            state.installed_dlc = dlc.iter().copied().collect();
            state.user_id = user_id.to_string();
        }
        oracle
    }

    /// Toggle whether calls succeed.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Toggle whether a user is signed in.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.lock().authenticated = authenticated;
    }

    /// Grant or revoke ownership of `app_id`.
    pub fn set_owns(&self, app_id: u32, owned: bool) {
        let mut state = self.lock();
        if owned {
            state.owned_apps.insert(app_id);
        } else {
            state.owned_apps.remove(&app_id);
        }
    }

    /// Replace the set of installed DLC ids.
    pub fn set_installed_dlc(&self, dlc: &[u32]) {
        self.lock().installed_dlc = dlc.iter().copied().collect();
    }

    /// Number of oracle calls made so far.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedState> {
        self.state.lock().expect("scripted oracle poisoned")
    }

    fn answer<T>(&self, f: impl FnOnce(&ScriptedState) -> T) -> Result<T, TollgateError> {
        let mut state = self.lock();
        state.calls += 1;
        if !state.reachable {
            return Err(TollgateError::OracleUnavailable(
                "scripted oracle offline".to_string(),
            ));
        }
        Ok(f(&state))
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl LiveOracle for ScriptedOracle {
    fn is_user_authenticated(&self) -> Result<bool, TollgateError> {
        self.answer(|s| s.authenticated)
    }

    fn owns_app(&self, app_id: u32) -> Result<bool, TollgateError> {
        self.answer(|s| s.owned_apps.contains(&app_id))
    }

    fn list_installed_dlc(&self, _app_id: u32) -> Result<BTreeSet<u32>, TollgateError> {
        self.answer(|s| s.installed_dlc.clone())
    }

    fn is_dlc_installed(&self, dlc_id: u32) -> Result<bool, TollgateError> {
        self.answer(|s| s.installed_dlc.contains(&dlc_id))
    }

    fn current_user_id(&self) -> Result<String, TollgateError> {
        self.answer(|s| s.user_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_oracle_is_always_unavailable() {
        let oracle = OfflineOracle;
        assert!(matches!(
            oracle.is_user_authenticated(),
            Err(TollgateError::OracleUnavailable(_))
        ));
        assert!(oracle.owns_app(480).is_err());
        assert!(oracle.list_installed_dlc(480).is_err());
        assert!(oracle.is_dlc_installed(100).is_err());
        assert!(oracle.current_user_id().is_err());
    }

    #[test]
    fn scripted_oracle_follows_script() {
        let oracle = ScriptedOracle::owning(480, "76561198000000000", &[100, 101]);
        assert!(oracle.is_user_authenticated().unwrap());
        assert!(oracle.owns_app(480).unwrap());
        assert!(!oracle.owns_app(481).unwrap());
        assert!(oracle.is_dlc_installed(101).unwrap());
        assert_eq!(oracle.current_user_id().unwrap(), "76561198000000000");

        oracle.set_reachable(false);
        assert!(oracle.owns_app(480).is_err());
        assert_eq!(oracle.calls(), 6);
    }
}
