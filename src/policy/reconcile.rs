//! Entitlement reconciliation.
//!
//! Combines the cached value, the purchase SDK snapshot, and the backend
//! answer into one decision. The rules:
//! - An SDK affirmative always wins; it reflects a store receipt the user
//!   paid for, whichever backend account is logged in.
//! - A backend affirmative wins over an SDK denial.
//! - A denial only lands when the source that denied actually answered.
//!   Failed or skipped checks keep the previous value.

use crate::status::StatusSource;

/// Result of consulting one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The source reported an active entitlement.
    Affirmed,
    /// The source answered and reported no entitlement.
    Denied,
    /// The source could not be consulted (unavailable, failed, timed out).
    Unreachable,
    /// The source was deliberately not consulted (no session, mock API).
    Skipped,
}

impl Probe {
    /// Map a successful boolean answer onto a probe.
    pub fn from_answer(entitled: bool) -> Self {
        if entitled {
            Probe::Affirmed
        } else {
            Probe::Denied
        }
    }
}

/// A reconciled answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Final entitlement.
    pub entitled: bool,
    /// Source the final value is attributed to.
    pub source: StatusSource,
    /// The SDK affirmed while the backend denied.
    pub disagreement: bool,
}

/// Reconcile the three sources.
///
/// `cached` is the value before this check (`None` when unknown). Returns
/// `None` when no source answered and nothing was cached, i.e. the state
/// stays unknown.
pub fn reconcile(cached: Option<bool>, sdk: Probe, backend: Probe) -> Option<Decision> {
    let decision = |entitled, source| Decision {
        entitled,
        source,
        disagreement: false,
    };

    match (sdk, backend) {
        (Probe::Affirmed, Probe::Denied) => Some(Decision {
            entitled: true,
            source: StatusSource::Sdk,
            disagreement: true,
        }),
        (Probe::Affirmed, _) => Some(decision(true, StatusSource::Sdk)),
        (_, Probe::Affirmed) => Some(decision(true, StatusSource::Backend)),
        (Probe::Denied, Probe::Denied) => Some(decision(false, StatusSource::Backend)),
        // Without a session the SDK is the only authority; a stale cache is corrected.
        (Probe::Denied, Probe::Skipped) => Some(decision(false, StatusSource::Sdk)),
        // SDK absent: degrade to backend-only verification.
        (Probe::Unreachable | Probe::Skipped, Probe::Denied) => {
            Some(decision(false, StatusSource::Backend))
        }
        // The backend failed; a network error never revokes.
        (Probe::Denied, Probe::Unreachable) => match cached {
            Some(value) => Some(decision(value, StatusSource::Cache)),
            None => Some(decision(false, StatusSource::Sdk)),
        },
        (Probe::Unreachable | Probe::Skipped, Probe::Unreachable | Probe::Skipped) => {
            cached.map(|value| decision(value, StatusSource::Cache))
        }
    }
}
