//! In-process publication of committed lifecycle changes.
//!
//! Subscribers hold a [`VisitSubscription`]; dropping it (or calling
//! [`VisitSubscription::unsubscribe`]) detaches it from the bus.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use super::domain::{VisitRequest, VisitRequestId, VisitStatus};

pub const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitEventKind {
    Submitted,
    Approved,
    Rejected,
    Rescheduled,
    Resubmitted,
    Cancelled,
    CredentialConsumed,
    CredentialRevoked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitEvent {
    pub kind: VisitEventKind,
    pub visit_id: VisitRequestId,
    pub client_id: String,
    pub status: VisitStatus,
    pub at: DateTime<Utc>,
}

impl VisitEvent {
    pub fn for_request(kind: VisitEventKind, request: &VisitRequest, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            visit_id: request.id.clone(),
            client_id: request.client_id.clone(),
            status: request.status,
            at,
        }
    }
}

/// Broadcast channel carrying [`VisitEvent`]s.
#[derive(Debug, Clone)]
pub struct VisitEventBus {
    tx: broadcast::Sender<VisitEvent>,
}

impl VisitEventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many subscribers the event reached.
    pub fn publish(&self, event: VisitEvent) -> usize {
        let (kind, visit_id) = (event.kind, event.visit_id.clone());
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(?kind, visit_id = %visit_id, receivers, "visit event published");
                receivers
            }
            Err(_) => {
                debug!(?kind, visit_id = %visit_id, "no event subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> VisitSubscription {
        VisitSubscription {
            receiver: self.tx.subscribe(),
            client_filter: None,
        }
    }

    /// Subscription limited to one client's requests.
    pub fn subscribe_client(&self, client_id: impl Into<String>) -> VisitSubscription {
        VisitSubscription {
            receiver: self.tx.subscribe(),
            client_filter: Some(client_id.into()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for VisitEventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct VisitSubscription {
    receiver: broadcast::Receiver<VisitEvent>,
    client_filter: Option<String>,
}

impl VisitSubscription {
    /// Next matching event, or `None` once the bus is gone. Events lost to a
    /// slow reader are skipped.
    pub async fn recv(&mut self) -> Option<VisitEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "visit subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event already buffered, without waiting.
    pub fn try_recv(&mut self) -> Option<VisitEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "visit subscription lagged");
                }
                Err(_) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }

    fn accepts(&self, event: &VisitEvent) -> bool {
        self.client_filter
            .as_deref()
            .map_or(true, |client_id| event.client_id == client_id)
    }
}
