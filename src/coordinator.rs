//! Subscription coordinator - the main public API for Paywarden.
//!
//! `SubscriptionCoordinator` owns the one authoritative entitlement value:
//! - Seeded synchronously from the store on construction
//! - Reconciled from the purchase SDK and the backend on refresh
//! - Updated by purchases, restores, and session changes
//! - Published to observers through a `watch` channel
//!
//! Every write goes through `SubscriptionCoordinator::commit`, which
//! persists the value and drops writes from superseded operations.

use crate::cache::format::CachedStatus;
use crate::cache::store::{KeyValueStore, CACHED_STATUS_KEY};
use crate::client::http::{BackendApi, BackendClient};
use crate::clock::{Clock, SystemClock};
use crate::config::{ApiSettings, PaywardenConfig};
use crate::errors::{PurchaseError, RestoreError, SdkError};
use crate::paywall::offer::{Navigator, PaywallOffer, PlanId, UpgradePresentation};
use crate::paywall::teaser::{locked_cards, LockedCards};
use crate::policy::reconcile::{reconcile, Probe};
use crate::protocol::models::{CustomerInfo, Offerings};
use crate::sdk::guard::{GuardedSdk, PurchaseSdk};
use crate::session::Session;
use crate::status::{EntitlementState, StatusSource, SubscriptionStatus};
use crate::PaywardenError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

struct Inner {
    status: SubscriptionStatus,
    /// Last entitlement answer the SDK actually gave.
    last_sdk_snapshot: Option<bool>,
}

/// Single owner of the subscription status.
///
/// Create one per process and share it behind an `Arc`.
pub struct SubscriptionCoordinator {
    config: PaywardenConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
    sdk: GuardedSdk,
    backend: Option<Arc<dyn BackendApi>>,
    seq: AtomicU64,
    inner: Mutex<Inner>,
    status_tx: watch::Sender<SubscriptionStatus>,
    session: RwLock<Option<Session>>,
    offerings: tokio::sync::Mutex<Option<Offerings>>,
}

impl SubscriptionCoordinator {
    /// Create a coordinator talking to the real backend.
    ///
    /// `sdk` is `None` on run targets without the native purchase module.
    ///
    /// # Errors
    /// Returns an error if configuration validation or HTTP client creation fails.
    pub fn new(
        config: PaywardenConfig,
        store: Arc<dyn KeyValueStore>,
        sdk: Option<Arc<dyn PurchaseSdk>>,
    ) -> Result<Self, PaywardenError> {
        config.validate()?;
        let settings = ApiSettings::resolve(&config, store.as_ref());
        let backend: Option<Arc<dyn BackendApi>> = if settings.use_mock_api {
            None
        } else {
            Some(Arc::new(BackendClient::new(&config, &settings)?))
        };
        Ok(Self::assemble(config, Arc::new(SystemClock), store, sdk, backend))
    }

    /// Create a coordinator with a caller-supplied backend.
    ///
    /// The `use_mock_api` store flag still disables backend verification.
    pub fn with_backend(
        config: PaywardenConfig,
        store: Arc<dyn KeyValueStore>,
        sdk: Option<Arc<dyn PurchaseSdk>>,
        backend: Arc<dyn BackendApi>,
    ) -> Result<Self, PaywardenError> {
        config.validate()?;
        let settings = ApiSettings::resolve(&config, store.as_ref());
        let backend = (!settings.use_mock_api).then_some(backend);
        Ok(Self::assemble(config, Arc::new(SystemClock), store, sdk, backend))
    }

    /// Create a coordinator with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        config: PaywardenConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
        sdk: Option<Arc<dyn PurchaseSdk>>,
        backend: Option<Arc<dyn BackendApi>>,
    ) -> Result<Self, PaywardenError> {
        config.validate()?;
        Ok(Self::assemble(config, clock, store, sdk, backend))
    }

    fn assemble(
        config: PaywardenConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
        sdk: Option<Arc<dyn PurchaseSdk>>,
        backend: Option<Arc<dyn BackendApi>>,
    ) -> Self {
        let cached = load_cached_status(store.as_ref());
        let status = cached
            .as_ref()
            .map(CachedStatus::to_status)
            .unwrap_or_default();
        let last_sdk_snapshot = cached.as_ref().and_then(CachedStatus::sdk_snapshot);
        debug!(state = ?status.state, ?last_sdk_snapshot, "seeded subscription status from cache");
        let (status_tx, _) = watch::channel(status.clone());
        let sdk = GuardedSdk::new(sdk, config.sdk_api_key.clone(), config.request_timeout);

        Self {
            config,
            clock,
            store,
            sdk,
            backend,
            seq: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                status,
                last_sdk_snapshot,
            }),
            status_tx,
            session: RwLock::new(None),
            offerings: tokio::sync::Mutex::new(None),
        }
    }

    /// Whether premium features are unlocked right now. Never blocks on I/O.
    pub fn is_subscribed(&self) -> bool {
        self.lock_inner().status.is_entitled()
    }

    /// Current status snapshot.
    pub fn status(&self) -> SubscriptionStatus {
        self.lock_inner().status.clone()
    }

    /// Observe status changes.
    pub fn subscribe(&self) -> watch::Receiver<SubscriptionStatus> {
        self.status_tx.subscribe()
    }

    /// The session the coordinator currently acts for.
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PaywardenConfig {
        &self.config
    }

    /// Cards to blur on today's feed; nothing for entitled users.
    pub fn locked_cards(&self, total: usize, locked: usize) -> LockedCards {
        if self.is_subscribed() {
            return LockedCards::none();
        }
        locked_cards(total, locked, self.clock.today_utc())
    }

    /// Refresh using the current session.
    pub async fn refresh(&self) -> SubscriptionStatus {
        let session = self.session();
        self.refresh_status(session.as_ref()).await
    }

    /// Re-derive the entitlement from the SDK and, with a session, the backend.
    ///
    /// Never fails: unreachable sources degrade to the best local answer.
    /// If a newer operation starts before this one finishes, this result is
    /// discarded and the newer status is returned.
    pub async fn refresh_status(&self, session: Option<&Session>) -> SubscriptionStatus {
        let seq = self.next_seq();
        let cached = self.current_value();

        let (sdk_probe, snapshot) = self.probe_sdk().await;
        if sdk_probe == Probe::Affirmed {
            self.commit(seq, Some((true, StatusSource::Sdk)), snapshot);
        }

        // An absent SDK means backend-only verification; a present but failing
        // one falls back to what it last reported.
        let effective_sdk = match sdk_probe {
            Probe::Unreachable if self.sdk.is_available() => match self.last_sdk_snapshot() {
                Some(known) => Probe::from_answer(known),
                None => Probe::Unreachable,
            },
            probe => probe,
        };

        let backend_probe = self.probe_backend(session).await;
        let decision = reconcile(cached, effective_sdk, backend_probe);

        if let Some(d) = decision.filter(|d| d.disagreement) {
            warn!(
                seq,
                source = %d.source,
                "backend denies entitlement the purchase SDK reports active; keeping access"
            );
        }
        debug!(seq, sdk = ?sdk_probe, backend = ?backend_probe, entitled = ?decision.map(|d| d.entitled), "refresh reconciled");

        self.commit(seq, decision.map(|d| (d.entitled, d.source)), snapshot)
    }

    /// React to a login, logout, or token change.
    ///
    /// Login identifies the user to the SDK, links the SDK id to the backend
    /// account, and refreshes. Logout resets to the anonymous default: not
    /// entitled unless the device itself still holds an entitlement.
    pub async fn on_session_changed(&self, session: Option<Session>) -> SubscriptionStatus {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session.clone();
        *self.offerings.lock().await = None;

        match session {
            Some(session) => {
                if let Err(e) = self.sdk.ensure_configured(Some(&session.user_id)).await {
                    log_sdk_error("configure", &e);
                }
                self.link_account(&session).await;
                self.refresh_status(Some(&session)).await
            }
            None => self.reset_to_anonymous().await,
        }
    }

    /// SDK listener entry point for entitlement changes pushed by the store.
    pub async fn on_customer_info_updated(&self, info: &CustomerInfo) -> SubscriptionStatus {
        let seq = self.next_seq();
        if self.grants_entitlement(info) {
            return self.commit(seq, Some((true, StatusSource::Sdk)), Some(true));
        }
        self.commit(seq, None, Some(false));
        self.refresh().await
    }

    /// Route to login or show the upgrade surface.
    ///
    /// Anonymous users are never shown the paywall. Offerings are cached for
    /// the session; if they cannot be fetched the fallback prices are shown.
    pub async fn present_upgrade(&self, navigator: &dyn Navigator) -> UpgradePresentation {
        let Some(session) = self.session() else {
            info!("upgrade requested without a session; redirecting to login");
            navigator.redirect_to_login();
            return UpgradePresentation::RedirectedToLogin;
        };

        if let Err(e) = self.sdk.ensure_configured(Some(&session.user_id)).await {
            log_sdk_error("configure", &e);
        }

        let offer = match self.current_offerings().await {
            Ok(offerings) => PaywallOffer::from_offerings(Some(&offerings), &self.config),
            Err(e) => {
                log_sdk_error("getOfferings", &e);
                PaywallOffer::fallback(&self.config)
            }
        };
        navigator.show_paywall(&offer);
        UpgradePresentation::Paywall(offer)
    }

    /// Buy a plan.
    ///
    /// Only a receipt with an active entitlement changes the status, and only
    /// towards entitled. Cancellation comes back as [`PurchaseError::Cancelled`].
    pub async fn purchase(&self, plan: PlanId) -> Result<SubscriptionStatus, PurchaseError> {
        if !self.sdk.is_available() {
            return Err(PurchaseError::SdkUnavailable);
        }

        let offerings = self.current_offerings().await?;
        let package = plan
            .find_package(&offerings)
            .cloned()
            .ok_or_else(|| PurchaseError::UnknownPlan(plan.to_string()))?;

        let info = match self.sdk.purchase_package(&package).await {
            Ok(info) => info,
            Err(SdkError::Cancelled) => {
                debug!(%plan, "purchase cancelled by user");
                return Err(PurchaseError::Cancelled);
            }
            Err(e) => {
                warn!(%plan, error = %e, "purchase failed");
                return Err(e.into());
            }
        };

        let seq = self.next_seq();
        if !self.grants_entitlement(&info) {
            warn!(
                %plan,
                package = %package.identifier,
                "purchase completed but no entitlement is active"
            );
            self.commit(seq, None, Some(false));
            return Err(PurchaseError::NoEntitlementGranted);
        }

        info!(%plan, "purchase confirmed");
        let status = self.commit(seq, Some((true, StatusSource::Sdk)), Some(true));
        self.push_entitlement_to_backend().await;
        Ok(status)
    }

    /// Restore store purchases. `Ok(false)` means nothing was found.
    pub async fn restore(&self) -> Result<bool, RestoreError> {
        let info = self.sdk.restore_purchases().await.map_err(|e| {
            log_sdk_error("restorePurchases", &e);
            RestoreError::from(e)
        })?;

        let seq = self.next_seq();
        if !self.grants_entitlement(&info) {
            info!("restore found no active subscription");
            self.commit(seq, None, Some(false));
            self.refresh().await;
            return Ok(false);
        }

        info!("restore found an active subscription");
        self.commit(seq, Some((true, StatusSource::Sdk)), Some(true));
        self.push_entitlement_to_backend().await;
        Ok(true)
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_value(&self) -> Option<bool> {
        match self.lock_inner().status.state {
            EntitlementState::Unknown => None,
            state => Some(state == EntitlementState::Entitled),
        }
    }

    fn last_sdk_snapshot(&self) -> Option<bool> {
        self.lock_inner().last_sdk_snapshot
    }

    /// The single writer. Drops the write if `seq` is no longer the latest.
    fn commit(
        &self,
        seq: u64,
        value: Option<(bool, StatusSource)>,
        sdk_snapshot: Option<bool>,
    ) -> SubscriptionStatus {
        let mut inner = self.lock_inner();
        let latest = self.seq.load(Ordering::SeqCst);
        if seq != latest {
            debug!(seq, latest, "discarding superseded status update");
            return inner.status.clone();
        }

        if sdk_snapshot.is_some() {
            inner.last_sdk_snapshot = sdk_snapshot;
        }

        if let Some((entitled, source)) = value {
            let record = CachedStatus::new(entitled, source, self.clock.as_ref())
                .with_sdk_snapshot(inner.last_sdk_snapshot);
            match record.to_json() {
                Ok(json) => {
                    if let Err(e) = self.store.set(CACHED_STATUS_KEY, &json) {
                        warn!(error = %e, "failed to persist subscription status");
                    }
                }
                Err(e) => warn!(error = %e, "failed to encode subscription status"),
            }

            let status = SubscriptionStatus {
                state: EntitlementState::from_bool(entitled),
                source: Some(source),
                last_checked_at: record.checked_at,
            };
            if status.state != inner.status.state {
                info!(seq, entitled, %source, "subscription status changed");
            }
            inner.status = status.clone();
            self.status_tx.send_replace(status);
        }

        inner.status.clone()
    }

    fn grants_entitlement(&self, info: &CustomerInfo) -> bool {
        info.has_active_entitlement(self.config.entitlement_id.as_deref())
    }

    async fn probe_sdk(&self) -> (Probe, Option<bool>) {
        match self.sdk.customer_info().await {
            Ok(info) => {
                let entitled = self.grants_entitlement(&info);
                (Probe::from_answer(entitled), Some(entitled))
            }
            Err(e) => {
                log_sdk_error("getCustomerInfo", &e);
                (Probe::Unreachable, None)
            }
        }
    }

    async fn probe_backend(&self, session: Option<&Session>) -> Probe {
        let (Some(backend), Some(session)) = (self.backend.as_ref(), session) else {
            return Probe::Skipped;
        };

        match self
            .bounded(backend.subscription_status(&session.token))
            .await
        {
            Ok(entitled) => Probe::from_answer(entitled),
            Err(PaywardenError::NotAuthenticated) => {
                warn!(user_id = %session.user_id, "backend rejected session token; keeping local answer");
                Probe::Unreachable
            }
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "backend status check failed; keeping local answer");
                Probe::Unreachable
            }
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, PaywardenError>>,
    ) -> Result<T, PaywardenError> {
        match tokio::time::timeout(self.config.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(PaywardenError::NetworkUnavailable(
                "request timed out".to_string(),
            )),
        }
    }

    async fn current_offerings(&self) -> Result<Offerings, SdkError> {
        let mut cached = self.offerings.lock().await;
        if let Some(offerings) = cached.as_ref() {
            return Ok(offerings.clone());
        }
        let fetched = self.sdk.offerings().await?;
        *cached = Some(fetched.clone());
        Ok(fetched)
    }

    async fn link_account(&self, session: &Session) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };

        let revenuecat_id = match self.sdk.customer_info().await {
            Ok(info) => info
                .original_app_user_id
                .unwrap_or_else(|| session.user_id.clone()),
            Err(SdkError::Unavailable) => return,
            Err(_) => session.user_id.clone(),
        };

        match self
            .bounded(backend.link_revenuecat(&session.token, &revenuecat_id))
            .await
        {
            Ok(()) => debug!(user_id = %session.user_id, "linked purchase SDK id to account"),
            Err(e) => warn!(error = %e, "failed to link purchase SDK id to account"),
        }
    }

    async fn push_entitlement_to_backend(&self) {
        let (Some(backend), Some(session)) = (self.backend.as_ref(), self.session()) else {
            return;
        };
        if let Err(e) = self
            .bounded(backend.update_subscription_status(&session.token, true))
            .await
        {
            warn!(error = %e, "failed to record entitlement with backend");
        }
    }

    async fn reset_to_anonymous(&self) -> SubscriptionStatus {
        let logged_out = match self.sdk.log_out().await {
            Ok(()) | Err(SdkError::Unavailable) => true,
            Err(e) => {
                log_sdk_error("logOut", &e);
                false
            }
        };

        let seq = self.next_seq();
        // Still identified as the previous user: their receipts are not the device's.
        let (probe, snapshot) = if logged_out {
            self.probe_sdk().await
        } else {
            (Probe::Unreachable, None)
        };
        let entitled = match probe {
            Probe::Affirmed => true,
            Probe::Unreachable => self.last_sdk_snapshot().unwrap_or(false),
            _ => false,
        };
        self.commit(seq, Some((entitled, StatusSource::Sdk)), snapshot)
    }
}

fn load_cached_status(store: &dyn KeyValueStore) -> Option<CachedStatus> {
    match store.get(CACHED_STATUS_KEY) {
        Ok(Some(raw)) => match CachedStatus::parse(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cached subscription status");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "failed to read cached subscription status");
            None
        }
    }
}

fn log_sdk_error(call: &'static str, err: &SdkError) {
    match err {
        SdkError::Unavailable => debug!(call, "purchase SDK not available on this platform"),
        other => warn!(call, error = %other, "purchase SDK call failed"),
    }
}
