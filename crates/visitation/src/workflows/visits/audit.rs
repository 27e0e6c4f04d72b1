use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{AuditLogEntry, VisitRequest};
use super::repository::{AuditLogRepository, RepositoryError};

/// Writes one append-only entry per reviewer decision.
pub struct AuditLogEmitter<S> {
    store: Arc<S>,
}

impl<S> AuditLogEmitter<S>
where
    S: AuditLogRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record the decision carried by `request.status`, snapshotting the
    /// request so the entry stays readable after later changes.
    pub fn record(
        &self,
        request: &VisitRequest,
        officer_name: &str,
        at: DateTime<Utc>,
    ) -> Result<AuditLogEntry, RepositoryError> {
        self.store.append(snapshot(request, officer_name, at))
    }

    pub fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.store.between(from, to)
    }

    pub fn by_officer(&self, officer_name: &str) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.store.by_officer(officer_name)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.store.recent(limit)
    }
}

fn snapshot(request: &VisitRequest, officer_name: &str, at: DateTime<Utc>) -> AuditLogEntry {
    AuditLogEntry {
        id: 0,
        officer_name: officer_name.to_string(),
        action: request.status,
        client_name: request.client_name.clone(),
        inmate_name: request.inmate_name.clone(),
        visit_date: request.visit_date,
        visit_time: request.visit_time,
        purpose: request.reason.clone(),
        relationship: request.relationship.clone(),
        visit_request_id: request.id.clone(),
        rejection_reason: request.rejection_reason.clone(),
        reschedule_reason: request.reschedule_reason.clone(),
        timestamp: at,
    }
}
