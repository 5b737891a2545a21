//! Cached subscription status record.
//!
//! Stored under `cached_subscription_status` as versioned JSON. Older clients
//! wrote the bare strings `"true"` / `"false"`; those still load, with
//! provenance and timestamp unknown.

use crate::clock::Clock;
use crate::status::{EntitlementState, StatusSource, SubscriptionStatus};
use crate::PaywardenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current record version.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Persisted last-known status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedStatus {
    /// Record format version.
    pub version: u32,

    /// Last-known entitlement.
    pub is_entitled: bool,

    /// Source that produced the value, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<StatusSource>,

    /// When the value was written, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,

    /// Last entitlement the purchase SDK itself reported, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_entitled: Option<bool>,
}

impl CachedStatus {
    /// Create a record stamped with the clock's current time.
    pub fn new(is_entitled: bool, source: StatusSource, clock: &dyn Clock) -> Self {
        Self {
            version: CACHE_FORMAT_VERSION,
            is_entitled,
            source: Some(source),
            checked_at: Some(clock.now_utc()),
            sdk_entitled: None,
        }
    }

    /// Record the SDK's last answer alongside the value.
    pub fn with_sdk_snapshot(mut self, sdk_entitled: Option<bool>) -> Self {
        self.sdk_entitled = sdk_entitled;
        self
    }

    /// The SDK's last-known answer carried across restarts.
    ///
    /// Records written before `sdk_entitled` existed still count an
    /// entitled value attributed to the SDK.
    pub fn sdk_snapshot(&self) -> Option<bool> {
        self.sdk_entitled.or_else(|| {
            (self.is_entitled && self.source == Some(StatusSource::Sdk)).then_some(true)
        })
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, PaywardenError> {
        serde_json::to_string(self)
            .map_err(|e| PaywardenError::StoreIO(format!("Failed to serialize status: {}", e)))
    }

    /// Parse a stored value, accepting the legacy boolean strings.
    pub fn parse(raw: &str) -> Result<Self, PaywardenError> {
        match raw.trim() {
            "true" => return Ok(Self::legacy(true)),
            "false" => return Ok(Self::legacy(false)),
            _ => {}
        }

        let record: Self = serde_json::from_str(raw)
            .map_err(|e| PaywardenError::StoreIO(format!("Failed to parse cached status: {}", e)))?;
        if record.version > CACHE_FORMAT_VERSION {
            return Err(PaywardenError::StoreIO(format!(
                "Unsupported cached status version {}",
                record.version
            )));
        }
        Ok(record)
    }

    fn legacy(is_entitled: bool) -> Self {
        Self {
            version: 0,
            is_entitled,
            source: None,
            checked_at: None,
            sdk_entitled: None,
        }
    }

    /// The status a cold start should display before any check runs.
    ///
    /// Provenance is always `Cache`: whatever produced the value originally,
    /// it is now a guess read back from disk.
    pub fn to_status(&self) -> SubscriptionStatus {
        SubscriptionStatus {
            state: EntitlementState::from_bool(self.is_entitled),
            source: Some(StatusSource::Cache),
            last_checked_at: self.checked_at,
        }
    }
}
