//! Capability-presence adapter around the native purchase SDK.
//!
//! The SDK is a native module that is missing on web and in test hosts.
//! Every call goes through [`GuardedSdk`], which answers
//! [`SdkError::Unavailable`] instead of panicking or silently skipping, and
//! bounds each call with the configured timeout.

use crate::errors::SdkError;
use crate::protocol::models::{CustomerInfo, Offerings, Package};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Capability surface of the purchase SDK bridge.
#[async_trait]
pub trait PurchaseSdk: Send + Sync {
    /// Configure the SDK. `app_user_id` of `None` keeps an anonymous id.
    async fn configure(&self, api_key: &str, app_user_id: Option<&str>) -> Result<(), SdkError>;

    /// Current entitlement snapshot.
    async fn customer_info(&self) -> Result<CustomerInfo, SdkError>;

    /// Offerings configured on the vendor dashboard.
    async fn offerings(&self) -> Result<Offerings, SdkError>;

    /// Run the store purchase sheet for a package.
    async fn purchase_package(&self, package: &Package) -> Result<CustomerInfo, SdkError>;

    /// Re-attach store-level purchases to this install.
    async fn restore_purchases(&self) -> Result<CustomerInfo, SdkError>;

    /// Drop the identified user and return to an anonymous id.
    async fn log_out(&self) -> Result<(), SdkError>;
}

/// Identity the SDK was last configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Configured {
    No,
    As(Option<String>),
}

/// Guarded, lazily configured handle to an optional [`PurchaseSdk`].
pub struct GuardedSdk {
    inner: Option<Arc<dyn PurchaseSdk>>,
    api_key: String,
    timeout: Duration,
    configured: Mutex<Configured>,
}

impl GuardedSdk {
    /// Wrap an SDK that may be absent on this run target.
    pub fn new(inner: Option<Arc<dyn PurchaseSdk>>, api_key: String, timeout: Duration) -> Self {
        Self {
            inner,
            api_key,
            timeout,
            configured: Mutex::new(Configured::No),
        }
    }

    /// Whether a native SDK is present at all.
    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    fn sdk(&self) -> Result<&Arc<dyn PurchaseSdk>, SdkError> {
        self.inner.as_ref().ok_or(SdkError::Unavailable)
    }

    async fn bounded<T>(
        &self,
        call: &'static str,
        fut: impl Future<Output = Result<T, SdkError>>,
    ) -> Result<T, SdkError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(call, timeout_ms = self.timeout.as_millis() as u64, "purchase SDK call timed out");
                Err(SdkError::TimedOut)
            }
        }
    }

    /// Configure once; later calls are no-ops unless the identity changes.
    pub async fn ensure_configured(&self, app_user_id: Option<&str>) -> Result<(), SdkError> {
        let sdk = self.sdk()?;
        let mut configured = self.configured.lock().await;
        let wanted = Configured::As(app_user_id.map(str::to_string));

        match &*configured {
            Configured::As(_) if app_user_id.is_none() => return Ok(()),
            current if *current == wanted => return Ok(()),
            _ => {}
        }

        self.bounded("configure", sdk.configure(&self.api_key, app_user_id))
            .await?;
        debug!(identified = app_user_id.is_some(), "purchase SDK configured");
        *configured = wanted;
        Ok(())
    }

    /// Entitlement snapshot, configuring anonymously first if needed.
    pub async fn customer_info(&self) -> Result<CustomerInfo, SdkError> {
        self.ensure_configured(None).await?;
        let sdk = self.sdk()?;
        self.bounded("getCustomerInfo", sdk.customer_info()).await
    }

    /// Current offerings.
    pub async fn offerings(&self) -> Result<Offerings, SdkError> {
        self.ensure_configured(None).await?;
        let sdk = self.sdk()?;
        self.bounded("getOfferings", sdk.offerings()).await
    }

    /// Purchase a package.
    ///
    /// The store sheet waits on the user, so this call is not time-bounded.
    pub async fn purchase_package(&self, package: &Package) -> Result<CustomerInfo, SdkError> {
        self.ensure_configured(None).await?;
        let sdk = self.sdk()?;
        sdk.purchase_package(package).await
    }

    /// Restore purchases.
    pub async fn restore_purchases(&self) -> Result<CustomerInfo, SdkError> {
        self.ensure_configured(None).await?;
        let sdk = self.sdk()?;
        self.bounded("restorePurchases", sdk.restore_purchases()).await
    }

    /// Log the identified user out. A never-configured SDK has nothing to do.
    pub async fn log_out(&self) -> Result<(), SdkError> {
        let sdk = self.sdk()?;
        let mut configured = self.configured.lock().await;
        if !matches!(&*configured, Configured::As(Some(_))) {
            return Ok(());
        }
        self.bounded("logOut", sdk.log_out()).await?;
        *configured = Configured::As(None);
        Ok(())
    }
}
