//! Edge detection on the entitlement flag for per-frame polling.

use crate::store::EntitlementStore;

/// Remembers the last observed entitlement so a frame loop only reacts to flips.
///
/// The first poll always reports, so the caller can apply the initial
/// visibility of storefront-only content.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitlementWatch {
    last: Option<bool>,
}

impl EntitlementWatch {
    /// A watch that has not observed anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(entitled)` when the flag differs from the last poll, else `None`.
    pub fn poll(&mut self, store: &EntitlementStore) -> Option<bool> {
        let now = store.is_entitled();
        if self.last == Some(now) {
            return None;
        }
        self.last = Some(now);
        Some(now)
    }

    /// Last value reported by [`poll`](Self::poll).
    pub fn last(&self) -> Option<bool> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::config::TollgateConfig;
    use crate::identity::MachineIdentity;
    use crate::oracle::ScriptedOracle;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn reports_initial_state_then_only_flips() {
        let dir = TempDir::new().unwrap();
        let mut config = TollgateConfig::new("Shinymoon", "MateEngine", "mate-engine");
        config.cache_dir = Some(dir.path().to_path_buf());
        let oracle = Arc::new(ScriptedOracle::owning(480, "owner-1", &[]));
        oracle.set_reachable(false);
        let store = EntitlementStore::from_parts(
            config,
            oracle.clone(),
            Arc::new(MockClock::from_rfc3339("2025-01-15T12:00:00Z")),
            MachineIdentity::collect("Shinymoon", "MateEngine"),
        )
        .unwrap();
        store.initialize(480);

        let mut watch = EntitlementWatch::new();
        assert_eq!(watch.poll(&store), Some(false));
        assert_eq!(watch.poll(&store), None);

        oracle.set_reachable(true);
        assert!(store.try_live_check(480, store.config().default_ttl));
        assert_eq!(watch.poll(&store), Some(true));
        assert_eq!(watch.poll(&store), None);

        store.invalidate();
        assert_eq!(watch.poll(&store), Some(false));
        assert_eq!(watch.last(), Some(false));
    }
}
