//! Paywarden error types.
//!
//! Infrastructure failures surface as [`PaywardenError`]. The user-facing
//! purchase and restore flows have their own enums so the UI can tell a
//! silent cancel apart from a failure that deserves an alert.

use thiserror::Error;

/// Infrastructure errors: configuration, transport, persistence.
#[derive(Debug, Error)]
pub enum PaywardenError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The backend could not be reached (DNS, connect, timeout).
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}")]
    BackendStatus {
        /// HTTP status code.
        status: u16,
    },

    /// A response body could not be parsed.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Key-value store I/O failed.
    #[error("Store I/O error: {0}")]
    StoreIO(String),

    /// The backend rejected the session token (HTTP 401).
    #[error("Session token rejected by backend")]
    NotAuthenticated,
}

impl PaywardenError {
    /// Whether this error is transient and must never revoke a cached entitlement.
    pub fn is_transient(&self) -> bool {
        match self {
            PaywardenError::NetworkUnavailable(_) => true,
            PaywardenError::BackendStatus { status } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors reported by the guarded purchase SDK adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// The native SDK is not present on this run target.
    #[error("Purchase SDK unavailable on this platform")]
    Unavailable,

    /// The user dismissed the store sheet.
    #[error("Purchase cancelled by user")]
    Cancelled,

    /// The store or SDK reported a failure.
    #[error("Store error: {message}")]
    Store {
        /// Vendor-supplied message.
        message: String,
    },

    /// The SDK call did not complete within the request timeout.
    #[error("Purchase SDK call timed out")]
    TimedOut,
}

/// Outcome of a purchase that did not confirm an entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// The user tapped cancel. Silent.
    #[error("Purchase cancelled")]
    Cancelled,

    /// The purchase failed; the message is shown once to the user.
    #[error("Purchase failed: {message}")]
    Failed {
        /// Vendor-supplied message.
        message: String,
    },

    /// The store accepted the purchase but no entitlement is active yet.
    #[error("Purchase completed without an active entitlement")]
    NoEntitlementGranted,

    /// The purchase SDK is not available on this platform.
    #[error("In-app purchases are not available on this platform")]
    SdkUnavailable,

    /// No package in the current offering matches the requested plan.
    #[error("No package available for plan: {0}")]
    UnknownPlan(String),
}

impl PurchaseError {
    /// Whether the UI should display an alert for this outcome.
    pub fn should_alert(&self) -> bool {
        matches!(self, PurchaseError::Failed { .. })
    }
}

impl From<SdkError> for PurchaseError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Unavailable => PurchaseError::SdkUnavailable,
            SdkError::Cancelled => PurchaseError::Cancelled,
            SdkError::Store { message } => PurchaseError::Failed { message },
            SdkError::TimedOut => PurchaseError::Failed {
                message: "The store did not respond in time".to_string(),
            },
        }
    }
}

/// Restore failures. Finding nothing to restore is `Ok(false)`, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    /// The purchase SDK is not available on this platform.
    #[error("In-app purchases are not available on this platform")]
    SdkUnavailable,

    /// The restore call itself failed.
    #[error("Restore failed: {message}")]
    Failed {
        /// Vendor-supplied message.
        message: String,
    },
}

impl From<SdkError> for RestoreError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Unavailable => RestoreError::SdkUnavailable,
            SdkError::Cancelled => RestoreError::Failed {
                message: "Restore was cancelled".to_string(),
            },
            SdkError::Store { message } => RestoreError::Failed { message },
            SdkError::TimedOut => RestoreError::Failed {
                message: "The store did not respond in time".to_string(),
            },
        }
    }
}
