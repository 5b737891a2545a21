//! # Paywarden
//!
//! **Subscription status reconciliation and paywall gating for mobile clients.**
//!
//! Paywarden keeps one authoritative "is this user premium" value for an app
//! that sells subscriptions through a store purchase SDK (RevenueCat) and
//! also records them on its own backend.
//!
//! ## Features
//!
//! - **Instant cold start**: the last value is read back from the local store synchronously
//! - **Permissive reconciliation**: a paid store receipt is never revoked by a backend that has not caught up
//! - **Network-tolerant**: failed or slow backend calls never flip premium off
//! - **Capability-guarded SDK**: runs on targets without the native purchase module
//! - **Stale-response guard**: superseded refreshes cannot overwrite newer answers
//!
//! ## Quickstart
//!
//! ```no_run
//! use paywarden::{MemoryStore, PaywardenConfig, Session, SubscriptionCoordinator};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), paywarden::PaywardenError> {
//! let config = PaywardenConfig::new("appl_public_sdk_key", "https://api.example.com/api");
//! let store = Arc::new(MemoryStore::new());
//!
//! // No native purchase module on this target.
//! let coordinator = SubscriptionCoordinator::new(config, store, None)?;
//!
//! coordinator
//!     .on_session_changed(Some(Session::new("user-42", "bearer-token")))
//!     .await;
//!
//! if coordinator.is_subscribed() {
//!     println!("premium unlocked");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Reconciliation
//!
//! | SDK          | Backend              | Result            |
//! |--------------|----------------------|-------------------|
//! | entitled     | anything             | entitled          |
//! | anything     | entitled             | entitled          |
//! | not entitled | not entitled / no session | not entitled |
//! | unavailable  | not entitled         | not entitled      |
//! | not entitled | failed               | previous value    |
//! | failed       | failed               | previous value    |
//!
//! See [`policy::reconcile`] for the full table.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;
pub mod session;
pub mod status;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Purchase SDK layer
pub mod sdk;

// Cache layer
pub mod cache;

// Policy layer
pub mod policy;

// Paywall layer
pub mod paywall;

// Coordinator (main public API)
pub mod coordinator;

// Re-exports for public API
pub use cache::file::FileStore;
pub use cache::store::{KeyValueStore, MemoryStore};
pub use client::http::{BackendApi, BackendClient};
pub use clock::{Clock, SystemClock};
pub use config::{ApiSettings, PaywardenConfig};
pub use coordinator::SubscriptionCoordinator;
pub use errors::{PaywardenError, PurchaseError, RestoreError, SdkError};
pub use paywall::offer::{Navigator, PaywallOffer, PlanId, UpgradePresentation};
pub use protocol::models::{CustomerInfo, Offerings};
pub use sdk::guard::PurchaseSdk;
pub use session::Session;
pub use status::{EntitlementState, StatusSource, SubscriptionStatus};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
