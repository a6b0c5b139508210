//! Offline launch example.
//!
//! Demonstrates the launch-time flow for a storefront build: initialize the
//! store, show or hide storefront-only content, and keep retrying in the
//! background until the storefront client comes up.
//!
//! # Running
//!
//! ```bash
//! cargo run --example offline_launch
//! ```
//!
//! # Note
//!
//! This example uses `OfflineOracle`, so it always falls back to the cached
//! token. A real build passes an oracle backed by the storefront SDK.

use std::sync::Arc;
use std::time::Duration;
use tollgate::{
    retry_until_entitled, EntitlementStore, EntitlementWatch, OfflineOracle, RetryOutcome,
    RetryPolicy, TollgateConfig,
};

const APP_ID: u32 = 480;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut config = TollgateConfig::new("Shinymoon", "MateEngine", "tollgate-example");
    config.retry_max_wait = Duration::from_secs(15);

    let store = match EntitlementStore::new(config, Arc::new(OfflineOracle)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Never fails: falls back to the cached token, then to "not entitled".
    let status = store.initialize(APP_ID);
    println!("Initial status: {:?} (token at {})", status, store.token_path().display());

    let mut watch = EntitlementWatch::new();
    if let Some(entitled) = watch.poll(&store) {
        println!("Storefront-only content visible: {}", entitled);
    }

    // The sender would live in the owning component and be dropped on teardown.
    let (_stop_tx, stop_rx) = tokio::sync::mpsc::channel(1);
    let policy = RetryPolicy::from_config(store.config());
    let outcome =
        retry_until_entitled(&store, APP_ID, store.config().default_ttl, policy, stop_rx).await;

    match outcome {
        RetryOutcome::Entitled => println!("Entitled; DLC 100 owned: {}", store.has_dlc(100)),
        RetryOutcome::TimedOut => println!("Storefront never came up; running as non-storefront build"),
        RetryOutcome::Cancelled => println!("Retry cancelled"),
    }

    if let Some(entitled) = watch.poll(&store) {
        println!("Storefront-only content visible: {}", entitled);
    }
}
