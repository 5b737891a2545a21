//! Purchase SDK snapshots and backend request/response bodies.
//!
//! SDK shapes mirror the RevenueCat customer-info and offerings objects as
//! the native bridge serializes them (camelCase).

use crate::PaywardenError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Customer snapshot returned by `getCustomerInfo`, `purchasePackage`, and
/// `restorePurchases`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    /// SDK app user id (anonymous `$RCAnonymousID:...` before login).
    #[serde(default)]
    pub original_app_user_id: Option<String>,

    /// Entitlement records.
    #[serde(default)]
    pub entitlements: Entitlements,
}

/// Entitlement records keyed by entitlement identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entitlements {
    /// Entitlements currently granting access.
    #[serde(default)]
    pub active: HashMap<String, EntitlementInfo>,
}

/// A single entitlement record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementInfo {
    /// Entitlement identifier.
    #[serde(default)]
    pub identifier: String,

    /// Store product that granted it.
    #[serde(default)]
    pub product_identifier: Option<String>,

    /// Whether the store still reports it active.
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// RFC 3339 expiry, absent for lifetime purchases.
    #[serde(default)]
    pub expiration_date: Option<String>,
}

fn default_true() -> bool {
    true
}

impl CustomerInfo {
    /// Whether an entitlement grants access.
    ///
    /// `required` of `None` accepts any active entitlement.
    pub fn has_active_entitlement(&self, required: Option<&str>) -> bool {
        match required {
            Some(id) => self
                .entitlements
                .active
                .get(id)
                .is_some_and(|e| e.is_active),
            None => self.entitlements.active.values().any(|e| e.is_active),
        }
    }
}

/// Offerings returned by `getOfferings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Offerings {
    /// The offering the dashboard marks as current.
    #[serde(default)]
    pub current: Option<Offering>,
}

/// A named bundle of purchasable packages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    /// Offering identifier.
    #[serde(default)]
    pub identifier: String,

    /// Packages available for purchase.
    #[serde(default)]
    pub available_packages: Vec<Package>,
}

/// A purchasable package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Package identifier, e.g. `$rc_monthly`.
    pub identifier: String,

    /// Package type, e.g. `MONTHLY` or `ANNUAL`.
    #[serde(default)]
    pub package_type: Option<String>,

    /// Underlying store product.
    pub product: StoreProduct,
}

/// Store product behind a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProduct {
    /// Store product id.
    #[serde(default)]
    pub identifier: String,

    /// Localized display price, e.g. `$9.99`.
    pub price_string: String,
}

/// `GET /users/subscription-status` response and `PUT` request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSubscriptionStatus {
    /// Whether the backend considers the account premium.
    #[serde(rename = "isPremium")]
    pub is_premium: bool,
}

/// `PUT /users/link-revenuecat` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRevenueCatRequest {
    /// SDK app user id to associate with the account.
    pub revenuecat_id: String,
}

/// Parse a backend subscription-status body.
pub fn parse_subscription_status(body: &[u8]) -> Result<BackendSubscriptionStatus, PaywardenError> {
    serde_json::from_slice(body).map_err(|e| {
        PaywardenError::ProtocolError(format!("Failed to parse subscription status: {}", e))
    })
}
