use chrono::{DateTime, Utc};

use super::domain::{AuditLogEntry, EntryCredential, VisitRequest, VisitRequestId};

/// Storage for visit requests.
pub trait VisitRepository: Send + Sync {
    /// Persist a new request. The store assigns `id`, sets `revision` to 1,
    /// and stamps `updated_at` from `submitted_at`.
    fn create(&self, request: VisitRequest) -> Result<VisitRequest, RepositoryError>;

    fn fetch(&self, id: &VisitRequestId) -> Result<Option<VisitRequest>, RepositoryError>;

    /// Conditional write. Succeeds only while the stored revision still equals
    /// `request.revision`; otherwise fails with
    /// [`RepositoryError::PreconditionFailed`]. The stored revision is bumped
    /// and `updated_at` never moves backwards.
    fn update_if(&self, request: VisitRequest) -> Result<VisitRequest, RepositoryError>;

    /// A client's requests, newest first.
    fn by_client(&self, client_id: &str) -> Result<Vec<VisitRequest>, RepositoryError>;

    /// Pending, unreplaced requests, oldest first.
    fn pending(&self, limit: usize) -> Result<Vec<VisitRequest>, RepositoryError>;
}

/// Storage for canonical entry credentials, keyed by visit id.
pub trait CredentialRepository: Send + Sync {
    /// Insert unless a credential already exists for the visit, in which case
    /// [`RepositoryError::Conflict`] is returned and nothing changes.
    fn insert_if_absent(
        &self,
        credential: EntryCredential,
    ) -> Result<EntryCredential, RepositoryError>;

    fn fetch_credential(
        &self,
        visit_id: &VisitRequestId,
    ) -> Result<Option<EntryCredential>, RepositoryError>;

    /// Atomically mark the credential scanned. Fails with
    /// [`RepositoryError::PreconditionFailed`] when it is already scanned or
    /// no longer valid.
    fn consume(
        &self,
        visit_id: &VisitRequestId,
        scanned_at: DateTime<Utc>,
        scanned_by: &str,
    ) -> Result<EntryCredential, RepositoryError>;

    /// Clear `is_valid`. Idempotent.
    fn invalidate(&self, visit_id: &VisitRequestId) -> Result<EntryCredential, RepositoryError>;
}

/// Append-only storage for reviewer decisions. Queries return newest first.
pub trait AuditLogRepository: Send + Sync {
    /// Append an entry; the store assigns `id`.
    fn append(&self, entry: AuditLogEntry) -> Result<AuditLogEntry, RepositoryError>;

    /// Entries with `from <= timestamp <= to`.
    fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError>;

    fn by_officer(&self, officer_name: &str) -> Result<Vec<AuditLogEntry>, RepositoryError>;

    fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, RepositoryError>;
}

/// Error enumeration for record store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    PreconditionFailed,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
