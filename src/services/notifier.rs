//! Push delivery seam.
//!
//! The reminder scheduler persists notification records itself; delivering
//! them to devices is the job of an external fan-out service reached through
//! [`NotificationGateway`]. Delivery is fire-and-forget: failures are logged
//! and never retried by this engine.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dao::models::{NotificationEntity, ResourceKind};

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// One push message handed to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    /// Recipient user.
    pub user_id: Uuid,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Match or event the message refers to.
    pub resource_id: Uuid,
    /// Whether `resource_id` names a match or an event.
    pub resource_kind: ResourceKind,
}

impl From<&NotificationEntity> for PushMessage {
    fn from(value: &NotificationEntity) -> Self {
        Self {
            user_id: value.user_id,
            title: value.title.clone(),
            body: value.body.clone(),
            resource_id: value.resource_id,
            resource_kind: value.resource_kind,
        }
    }
}

/// External push fan-out service.
pub trait NotificationGateway: Send + Sync {
    /// Hand a batch off for asynchronous delivery. Never fails from the
    /// caller's perspective; implementations log their own errors.
    fn deliver(&self, batch: Vec<PushMessage>) -> BoxFuture<'static, ()>;
}

/// Gateway client POSTing batches to the configured fan-out endpoint.
pub struct HttpPushGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpPushGateway {
    /// Build a client for the given endpoint.
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, url }
    }
}

impl NotificationGateway for HttpPushGateway {
    fn deliver(&self, batch: Vec<PushMessage>) -> BoxFuture<'static, ()> {
        let client = self.client.clone();
        let url = self.url.clone();
        Box::pin(async move {
            let count = batch.len();
            match client.post(&url).json(&batch).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(count, "push batch accepted by gateway");
                }
                Ok(response) => {
                    warn!(
                        count,
                        status = %response.status(),
                        "push gateway rejected batch"
                    );
                }
                Err(err) => {
                    warn!(count, error = %err, "failed to reach push gateway");
                }
            }
        })
    }
}

/// Fallback gateway used when no endpoint is configured: log and drop.
#[derive(Default)]
pub struct LogOnlyGateway;

impl NotificationGateway for LogOnlyGateway {
    fn deliver(&self, batch: Vec<PushMessage>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            debug!(count = batch.len(), "no push gateway configured; dropping batch");
        })
    }
}
