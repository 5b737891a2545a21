//! The subscription status value observed by the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entitlement state machine: `Unknown -> {Entitled, NotEntitled}`, re-entrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementState {
    /// Nothing is known yet (cold start without a cached value).
    #[default]
    Unknown,
    /// The user may use premium features.
    Entitled,
    /// The user may not use premium features.
    NotEntitled,
}

impl EntitlementState {
    /// Map a boolean answer onto a resolved state.
    pub fn from_bool(entitled: bool) -> Self {
        if entitled {
            EntitlementState::Entitled
        } else {
            EntitlementState::NotEntitled
        }
    }
}

/// Where the current value came from. Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    /// Last persisted value.
    Cache,
    /// Purchase SDK entitlement snapshot.
    Sdk,
    /// Backend `subscription-status` endpoint.
    Backend,
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusSource::Cache => "cache",
            StatusSource::Sdk => "sdk",
            StatusSource::Backend => "backend",
        };
        f.write_str(name)
    }
}

/// Derived subscription status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscriptionStatus {
    /// Current entitlement state.
    pub state: EntitlementState,

    /// Provenance of the current state.
    pub source: Option<StatusSource>,

    /// When the state was last written.
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl SubscriptionStatus {
    /// Whether premium features are unlocked. `Unknown` reads as `false`.
    pub fn is_entitled(&self) -> bool {
        self.state == EntitlementState::Entitled
    }
}
