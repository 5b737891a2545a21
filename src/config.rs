//! Paywarden configuration.

use crate::cache::store::KeyValueStore;
use crate::PaywardenError;
use std::time::Duration;
use tracing::warn;

/// Store key holding a runtime override of the backend base URL.
pub const API_URL_KEY: &str = "api_url";

/// Store key holding `"true"` when the app runs against the mock API.
pub const USE_MOCK_API_KEY: &str = "use_mock_api";

/// Display price used when offerings cannot be fetched.
pub const DEFAULT_MONTHLY_PRICE: &str = "$9.99";

/// Display price used when offerings cannot be fetched.
pub const DEFAULT_ANNUAL_PRICE: &str = "$99.99";

/// Configuration for the subscription coordinator.
#[derive(Debug, Clone)]
pub struct PaywardenConfig {
    /// Public API key handed to the purchase SDK on configure.
    pub sdk_api_key: String,

    /// Entitlement identifier that unlocks premium (e.g. "premium").
    /// `None` means any active entitlement counts.
    pub entitlement_id: Option<String>,

    /// Backend base URL, e.g. `https://api.example.com/api`.
    /// Overridden at runtime by the `api_url` store key.
    pub api_base_url: String,

    /// Upper bound for every backend and SDK call.
    pub request_timeout: Duration,

    /// User-Agent product token sent to the backend.
    pub user_agent_product: String,

    /// Monthly price shown when the offering fetch fails.
    pub fallback_monthly_price: String,

    /// Annual price shown when the offering fetch fails.
    pub fallback_annual_price: String,

    /// Directory name under the platform data dir for the file store.
    pub store_namespace: String,
}

impl PaywardenConfig {
    /// Build a configuration with the default timeout and fallback prices.
    pub fn new(sdk_api_key: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            sdk_api_key: sdk_api_key.into(),
            entitlement_id: Some("premium".to_string()),
            api_base_url: api_base_url.into(),
            request_timeout: Duration::from_secs(15),
            user_agent_product: "paywarden".to_string(),
            fallback_monthly_price: DEFAULT_MONTHLY_PRICE.to_string(),
            fallback_annual_price: DEFAULT_ANNUAL_PRICE.to_string(),
            store_namespace: "paywarden".to_string(),
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), PaywardenError> {
        if self.sdk_api_key.trim().is_empty() {
            return Err(PaywardenError::ConfigError(
                "sdk_api_key cannot be empty".to_string(),
            ));
        }
        if !is_http_url(&self.api_base_url) {
            return Err(PaywardenError::ConfigError(format!(
                "api_base_url must start with http:// or https://, got {:?}",
                self.api_base_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(PaywardenError::ConfigError(
                "request_timeout must be non-zero".to_string(),
            ));
        }
        if self.store_namespace.is_empty() {
            return Err(PaywardenError::ConfigError(
                "store_namespace cannot be empty".to_string(),
            ));
        }
        if matches!(&self.entitlement_id, Some(id) if id.is_empty()) {
            return Err(PaywardenError::ConfigError(
                "entitlement_id cannot be empty; use None to accept any entitlement".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Backend settings after applying runtime overrides from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Base URL all backend paths are joined onto, without trailing slash.
    pub base_url: String,

    /// When set, backend verification is skipped entirely.
    pub use_mock_api: bool,
}

impl ApiSettings {
    /// Resolve settings from config plus the `api_url` / `use_mock_api` keys.
    ///
    /// Store failures and malformed overrides fall back to the configured
    /// values; they are logged, never fatal.
    pub fn resolve(config: &PaywardenConfig, store: &dyn KeyValueStore) -> Self {
        let base_url = match store.get(API_URL_KEY) {
            Ok(Some(url)) if is_http_url(url.trim()) => url.trim().to_string(),
            Ok(Some(url)) => {
                warn!(url = %url, "ignoring malformed api_url override");
                config.api_base_url.clone()
            }
            Ok(None) => config.api_base_url.clone(),
            Err(e) => {
                warn!(error = %e, "failed to read api_url override");
                config.api_base_url.clone()
            }
        };

        let use_mock_api = match store.get(USE_MOCK_API_KEY) {
            Ok(Some(flag)) => flag.trim().eq_ignore_ascii_case("true"),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "failed to read use_mock_api flag");
                false
            }
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            use_mock_api,
        }
    }
}
