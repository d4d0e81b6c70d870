//! Shared application state.

/// Match lifecycle rules.
pub mod lifecycle;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::match_store::MatchStore, error::ServiceError,
    services::notifier::NotificationGateway,
};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: installed store, degraded flag, per-match
/// gates, runtime configuration and the notification gateway.
pub struct AppState {
    store: RwLock<Option<Arc<dyn MatchStore>>>,
    degraded: watch::Sender<bool>,
    match_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    config: AppConfig,
    gateway: Arc<dyn NotificationGateway>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig, gateway: Arc<dyn NotificationGateway>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            match_gates: DashMap::new(),
            config,
            gateway,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the notification gateway.
    pub fn gateway(&self) -> Arc<dyn NotificationGateway> {
        self.gateway.clone()
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current store or fail with [`ServiceError::Degraded`].
    pub async fn require_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn MatchStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Mutex serializing subscription operations on one match.
    ///
    /// Every read-count-then-write sequence must hold this gate so two
    /// concurrent joins cannot both observe the last free seat. Matches are
    /// independent; gates are per match id.
    pub fn match_gate(&self, match_id: Uuid) -> Arc<Mutex<()>> {
        self.match_gates
            .entry(match_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the gate of a deleted match.
    pub fn discard_match_gate(&self, match_id: Uuid) {
        self.match_gates.remove(&match_id);
    }
}
