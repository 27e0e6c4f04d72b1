//! In-process collaborators backing the HTTP service, the demo and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    AuditLogEntry, EntryCredential, InmateRecord, VisitRequest, VisitRequestId, VisitStatus,
};
use super::gateway::{InmateRegistry, Notification, NotificationError, Notifier, RegistryError};
use super::repository::{
    AuditLogRepository, CredentialRepository, RepositoryError, VisitRepository,
};

#[derive(Debug, Default)]
struct MemoryState {
    next_visit: u64,
    requests: HashMap<VisitRequestId, VisitRequest>,
    credentials: HashMap<VisitRequestId, EntryCredential>,
    audit: Vec<AuditLogEntry>,
}

/// Record store keeping requests, credentials and the audit log behind one
/// mutex, so every conditional write is atomic.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

impl VisitRepository for MemoryRecordStore {
    fn create(&self, mut request: VisitRequest) -> Result<VisitRequest, RepositoryError> {
        let mut state = self.lock()?;
        state.next_visit += 1;
        request.id = VisitRequestId(format!("visit-{:06}", state.next_visit));
        request.revision = 1;
        request.updated_at = request.submitted_at;
        state.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch(&self, id: &VisitRequestId) -> Result<Option<VisitRequest>, RepositoryError> {
        Ok(self.lock()?.requests.get(id).cloned())
    }

    fn update_if(&self, mut request: VisitRequest) -> Result<VisitRequest, RepositoryError> {
        let mut state = self.lock()?;
        let stored = state
            .requests
            .get(&request.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != request.revision {
            return Err(RepositoryError::PreconditionFailed);
        }

        request.revision = stored.revision + 1;
        request.updated_at = request.updated_at.max(stored.updated_at);
        state.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn by_client(&self, client_id: &str) -> Result<Vec<VisitRequest>, RepositoryError> {
        let state = self.lock()?;
        let mut requests: Vec<VisitRequest> = state
            .requests
            .values()
            .filter(|request| request.client_id == client_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(requests)
    }

    fn pending(&self, limit: usize) -> Result<Vec<VisitRequest>, RepositoryError> {
        let state = self.lock()?;
        let mut requests: Vec<VisitRequest> = state
            .requests
            .values()
            .filter(|request| request.status == VisitStatus::Pending)
            .filter(|request| !request.is_replaced)
            .cloned()
            .collect();
        requests.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        requests.truncate(limit);
        Ok(requests)
    }
}

impl CredentialRepository for MemoryRecordStore {
    fn insert_if_absent(
        &self,
        credential: EntryCredential,
    ) -> Result<EntryCredential, RepositoryError> {
        let mut state = self.lock()?;
        if state.credentials.contains_key(&credential.visit_id) {
            return Err(RepositoryError::Conflict);
        }
        state
            .credentials
            .insert(credential.visit_id.clone(), credential.clone());
        Ok(credential)
    }

    fn fetch_credential(
        &self,
        visit_id: &VisitRequestId,
    ) -> Result<Option<EntryCredential>, RepositoryError> {
        Ok(self.lock()?.credentials.get(visit_id).cloned())
    }

    fn consume(
        &self,
        visit_id: &VisitRequestId,
        scanned_at: DateTime<Utc>,
        scanned_by: &str,
    ) -> Result<EntryCredential, RepositoryError> {
        let mut state = self.lock()?;
        let credential = state
            .credentials
            .get_mut(visit_id)
            .ok_or(RepositoryError::NotFound)?;
        if !credential.is_valid || credential.scanned_at.is_some() {
            return Err(RepositoryError::PreconditionFailed);
        }

        credential.scanned_at = Some(scanned_at);
        credential.scanned_by = Some(scanned_by.to_string());
        Ok(credential.clone())
    }

    fn invalidate(&self, visit_id: &VisitRequestId) -> Result<EntryCredential, RepositoryError> {
        let mut state = self.lock()?;
        let credential = state
            .credentials
            .get_mut(visit_id)
            .ok_or(RepositoryError::NotFound)?;
        credential.is_valid = false;
        Ok(credential.clone())
    }
}

impl AuditLogRepository for MemoryRecordStore {
    fn append(&self, mut entry: AuditLogEntry) -> Result<AuditLogEntry, RepositoryError> {
        let mut state = self.lock()?;
        entry.id = state.audit.len() as u64 + 1;
        state.audit.push(entry.clone());
        Ok(entry)
    }

    fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        let state = self.lock()?;
        Ok(newest_first(
            state
                .audit
                .iter()
                .filter(|entry| entry.timestamp >= from && entry.timestamp <= to),
        ))
    }

    fn by_officer(&self, officer_name: &str) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        let state = self.lock()?;
        Ok(newest_first(
            state
                .audit
                .iter()
                .filter(|entry| entry.officer_name == officer_name),
        ))
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        let state = self.lock()?;
        let mut entries = newest_first(state.audit.iter());
        entries.truncate(limit);
        Ok(entries)
    }
}

fn newest_first<'a>(entries: impl Iterator<Item = &'a AuditLogEntry>) -> Vec<AuditLogEntry> {
    let mut entries: Vec<AuditLogEntry> = entries.cloned().collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
    entries
}

/// Registry seeded up front, keyed by inmate number.
#[derive(Debug, Default, Clone)]
pub struct StaticInmateRegistry {
    records: HashMap<String, InmateRecord>,
}

impl StaticInmateRegistry {
    pub fn new(records: impl IntoIterator<Item = InmateRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.inmate_number.clone(), record))
                .collect(),
        }
    }
}

impl InmateRegistry for StaticInmateRegistry {
    fn lookup(&self, inmate_number: &str) -> Result<Option<InmateRecord>, RegistryError> {
        Ok(self.records.get(inmate_number.trim()).cloned())
    }
}

/// Notifier that keeps every notification for later inspection.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .map_err(|_| NotificationError::Transport("notifier lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}
