//! Scripted collaborators for coordinator integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use paywarden::protocol::models::{
    CustomerInfo, EntitlementInfo, Entitlements, Offering, Offerings, Package, StoreProduct,
};
use paywarden::{
    BackendApi, MemoryStore, Navigator, PaywallOffer, PaywardenConfig, PaywardenError,
    PurchaseSdk, SdkError, Session, SubscriptionCoordinator,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub fn config() -> PaywardenConfig {
    let mut config = PaywardenConfig::new("appl_test_key", "https://api.example.com/api");
    config.request_timeout = Duration::from_millis(200);
    config
}

pub fn session() -> Session {
    Session::new("user-42", "bearer-abc")
}

pub fn customer(entitled: bool) -> CustomerInfo {
    let mut active = HashMap::new();
    if entitled {
        active.insert(
            "premium".to_string(),
            EntitlementInfo {
                identifier: "premium".to_string(),
                product_identifier: Some("annual_sub".to_string()),
                is_active: true,
                expiration_date: None,
            },
        );
    }
    CustomerInfo {
        original_app_user_id: Some("$RCAnonymousID:abc123".to_string()),
        entitlements: Entitlements { active },
    }
}

pub fn store_offerings() -> Offerings {
    let package = |id: &str, kind: &str, price: &str| Package {
        identifier: id.to_string(),
        package_type: Some(kind.to_string()),
        product: StoreProduct {
            identifier: format!("{}_sub", kind.to_lowercase()),
            price_string: price.to_string(),
        },
    };
    Offerings {
        current: Some(Offering {
            identifier: "default".to_string(),
            available_packages: vec![
                package("$rc_monthly", "MONTHLY", "$7.99"),
                package("$rc_annual", "ANNUAL", "$79.99"),
            ],
        }),
    }
}

/// Purchase SDK whose answers the test scripts.
pub struct ScriptedSdk {
    pub customer: Mutex<Result<CustomerInfo, SdkError>>,
    pub offerings: Mutex<Result<Offerings, SdkError>>,
    pub purchase: Mutex<Result<CustomerInfo, SdkError>>,
    pub restore: Mutex<Result<CustomerInfo, SdkError>>,
    pub log_out_reply: Mutex<Result<(), SdkError>>,
    pub configured_as: Mutex<Vec<Option<String>>>,
    pub offering_fetches: AtomicUsize,
    pub log_outs: AtomicUsize,
}

impl ScriptedSdk {
    pub fn entitled(entitled: bool) -> Arc<Self> {
        Arc::new(Self {
            customer: Mutex::new(Ok(customer(entitled))),
            offerings: Mutex::new(Ok(store_offerings())),
            purchase: Mutex::new(Ok(customer(true))),
            restore: Mutex::new(Ok(customer(entitled))),
            log_out_reply: Mutex::new(Ok(())),
            configured_as: Mutex::new(Vec::new()),
            offering_fetches: AtomicUsize::new(0),
            log_outs: AtomicUsize::new(0),
        })
    }

    pub fn set_customer(&self, reply: Result<CustomerInfo, SdkError>) {
        *self.customer.lock().unwrap() = reply;
    }

    pub fn set_purchase(&self, reply: Result<CustomerInfo, SdkError>) {
        *self.purchase.lock().unwrap() = reply;
    }

    pub fn set_restore(&self, reply: Result<CustomerInfo, SdkError>) {
        *self.restore.lock().unwrap() = reply;
    }

    pub fn set_log_out(&self, reply: Result<(), SdkError>) {
        *self.log_out_reply.lock().unwrap() = reply;
    }

    pub fn set_offerings(&self, reply: Result<Offerings, SdkError>) {
        *self.offerings.lock().unwrap() = reply;
    }
}

#[async_trait]
impl PurchaseSdk for ScriptedSdk {
    async fn configure(&self, _api_key: &str, app_user_id: Option<&str>) -> Result<(), SdkError> {
        self.configured_as
            .lock()
            .unwrap()
            .push(app_user_id.map(str::to_string));
        Ok(())
    }

    async fn customer_info(&self) -> Result<CustomerInfo, SdkError> {
        self.customer.lock().unwrap().clone()
    }

    async fn offerings(&self) -> Result<Offerings, SdkError> {
        self.offering_fetches.fetch_add(1, Ordering::SeqCst);
        self.offerings.lock().unwrap().clone()
    }

    async fn purchase_package(&self, _package: &Package) -> Result<CustomerInfo, SdkError> {
        self.purchase.lock().unwrap().clone()
    }

    async fn restore_purchases(&self) -> Result<CustomerInfo, SdkError> {
        self.restore.lock().unwrap().clone()
    }

    async fn log_out(&self) -> Result<(), SdkError> {
        self.log_outs.fetch_add(1, Ordering::SeqCst);
        self.log_out_reply.lock().unwrap().clone()
    }
}

/// How the fake backend answers `subscription-status`.
#[derive(Debug, Clone, Copy)]
pub enum BackendReply {
    Premium(bool),
    Down,
    /// HTTP 401 for the session token.
    Rejected,
    Hang,
    /// Signal `entered`, then wait for `release` before answering.
    Gated(bool),
}

pub struct ScriptedBackend {
    pub reply: Mutex<BackendReply>,
    pub status_calls: AtomicUsize,
    pub linked: Mutex<Vec<String>>,
    pub pushed: Mutex<Vec<bool>>,
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedBackend {
    pub fn new(reply: BackendReply) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(reply),
            status_calls: AtomicUsize::new(0),
            linked: Mutex::new(Vec::new()),
            pushed: Mutex::new(Vec::new()),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    pub fn set_reply(&self, reply: BackendReply) {
        *self.reply.lock().unwrap() = reply;
    }
}

#[async_trait]
impl BackendApi for ScriptedBackend {
    async fn subscription_status(&self, _token: &str) -> Result<bool, PaywardenError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let reply = *self.reply.lock().unwrap();
        match reply {
            BackendReply::Premium(value) => Ok(value),
            BackendReply::Down => Err(PaywardenError::BackendStatus { status: 503 }),
            BackendReply::Rejected => Err(PaywardenError::NotAuthenticated),
            BackendReply::Hang => std::future::pending().await,
            BackendReply::Gated(value) => {
                self.entered.notify_one();
                self.release.notified().await;
                Ok(value)
            }
        }
    }

    async fn update_subscription_status(
        &self,
        _token: &str,
        is_premium: bool,
    ) -> Result<(), PaywardenError> {
        self.pushed.lock().unwrap().push(is_premium);
        Ok(())
    }

    async fn link_revenuecat(&self, _token: &str, revenuecat_id: &str) -> Result<(), PaywardenError> {
        self.linked.lock().unwrap().push(revenuecat_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub logins: AtomicUsize,
    pub paywalls: Mutex<Vec<PaywallOffer>>,
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.logins.fetch_add(1, Ordering::SeqCst);
    }

    fn show_paywall(&self, offer: &PaywallOffer) {
        self.paywalls.lock().unwrap().push(offer.clone());
    }
}

pub fn store_with_cache(value: Option<bool>) -> Arc<MemoryStore> {
    use paywarden::KeyValueStore;
    let store = Arc::new(MemoryStore::new());
    if let Some(value) = value {
        store
            .set("cached_subscription_status", &value.to_string())
            .unwrap();
    }
    store
}

pub fn build(
    store: Arc<MemoryStore>,
    sdk: Option<Arc<ScriptedSdk>>,
    backend: Arc<ScriptedBackend>,
) -> SubscriptionCoordinator {
    let sdk = sdk.map(|s| s as Arc<dyn PurchaseSdk>);
    SubscriptionCoordinator::with_backend(config(), store, sdk, backend).unwrap()
}
