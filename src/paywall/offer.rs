//! Plans, the offer shown on the upgrade surface, and the navigation seam.

use crate::config::PaywardenConfig;
use crate::protocol::models::{Offerings, Package};
use std::fmt;
use std::str::FromStr;

/// Purchasable plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanId {
    /// Monthly subscription.
    Monthly,
    /// Annual subscription.
    Annual,
}

impl PlanId {
    /// Plan identifier as the UI names it.
    pub fn as_str(self) -> &'static str {
        match self {
            PlanId::Monthly => "monthly",
            PlanId::Annual => "annual",
        }
    }

    fn package_type(self) -> &'static str {
        match self {
            PlanId::Monthly => "MONTHLY",
            PlanId::Annual => "ANNUAL",
        }
    }

    /// Whether a vendor package sells this plan.
    ///
    /// Matches `monthly`, `$rc_monthly` (any case) or the package type.
    pub fn matches(self, package: &Package) -> bool {
        let lowered = package.identifier.to_ascii_lowercase();
        let id = lowered.strip_prefix("$rc_").unwrap_or(lowered.as_str());
        id == self.as_str()
            || package
                .package_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(self.package_type()))
    }

    /// Find this plan's package in the current offering.
    pub fn find_package(self, offerings: &Offerings) -> Option<&Package> {
        offerings
            .current
            .as_ref()?
            .available_packages
            .iter()
            .find(|p| self.matches(p))
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(PlanId::Monthly),
            "annual" | "yearly" => Ok(PlanId::Annual),
            other => Err(other.to_string()),
        }
    }
}

/// What the upgrade surface displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaywallOffer {
    /// Monthly display price.
    pub monthly_price: String,
    /// Annual display price.
    pub annual_price: String,
    /// Prices are the hardcoded fallbacks, not the store's.
    pub uses_fallback_prices: bool,
}

impl PaywallOffer {
    /// Build an offer from fetched offerings, falling back per plan.
    pub fn from_offerings(offerings: Option<&Offerings>, config: &PaywardenConfig) -> Self {
        let price = |plan: PlanId| {
            offerings
                .and_then(|o| plan.find_package(o))
                .map(|p| p.product.price_string.clone())
                .filter(|s| !s.is_empty())
        };
        let monthly = price(PlanId::Monthly);
        let annual = price(PlanId::Annual);
        let uses_fallback_prices = monthly.is_none() || annual.is_none();

        Self {
            monthly_price: monthly.unwrap_or_else(|| config.fallback_monthly_price.clone()),
            annual_price: annual.unwrap_or_else(|| config.fallback_annual_price.clone()),
            uses_fallback_prices,
        }
    }

    /// Offer made entirely of fallback prices.
    pub fn fallback(config: &PaywardenConfig) -> Self {
        Self::from_offerings(None, config)
    }
}

/// Result of asking for the upgrade surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradePresentation {
    /// No session: the user was routed to login and is expected to retry.
    RedirectedToLogin,
    /// The paywall was shown with this offer.
    Paywall(PaywallOffer),
}

/// Navigation seam implemented by the UI shell.
pub trait Navigator: Send + Sync {
    /// Route an anonymous user to authentication.
    fn redirect_to_login(&self);

    /// Show the upgrade surface.
    fn show_paywall(&self, offer: &PaywallOffer);
}
