//! Background re-check loop for launches that start without an entitlement.
//!
//! Mirrors how a storefront client often comes up a few seconds after the
//! game: keep asking the oracle at a fixed interval, up to a bounded total
//! wait, and stop as soon as the owner tears down.

use crate::config::TollgateConfig;
use crate::store::EntitlementStore;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timing of the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub interval: Duration,
    /// Attempts stop once this much waiting has accumulated.
    pub max_wait: Duration,
}

impl RetryPolicy {
    /// Take the retry timing from config.
    pub fn from_config(config: &TollgateConfig) -> Self {
        Self {
            interval: config.retry_interval,
            max_wait: config.retry_max_wait,
        }
    }
}

/// How the retry loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The store is entitled.
    Entitled,
    /// `max_wait` elapsed without a successful live check.
    TimedOut,
    /// A stop signal arrived, or every sender was dropped.
    Cancelled,
}

/// Retry the live check until entitled, timed out or stopped.
///
/// Returns immediately with [`RetryOutcome::Entitled`] if the store already
/// is. The only blocking work per attempt is the oracle call itself.
pub async fn retry_until_entitled(
    store: &EntitlementStore,
    app_id: u32,
    ttl: Duration,
    policy: RetryPolicy,
    mut stop_rx: mpsc::Receiver<()>,
) -> RetryOutcome {
    let mut waited = Duration::ZERO;

    while !store.is_entitled() {
        if waited >= policy.max_wait {
            tracing::info!(app_id, waited_secs = waited.as_secs(), "entitlement retry gave up");
            return RetryOutcome::TimedOut;
        }

        if store.try_live_check(app_id, ttl) {
            break;
        }

        tokio::select! {
            _ = stop_rx.recv() => {
                tracing::info!(app_id, "entitlement retry stop requested");
                return RetryOutcome::Cancelled;
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }
        waited += policy.interval;
    }

    RetryOutcome::Entitled
}
