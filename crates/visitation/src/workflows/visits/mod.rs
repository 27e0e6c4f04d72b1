//! Visit request lifecycle: intake policy, reviewer decisions, entry
//! credentials, and the checkpoint scan.

pub mod audit;
pub mod credential;
pub mod domain;
pub mod events;
pub mod gateway;
pub mod memory;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use audit::AuditLogEmitter;
pub use credential::{
    credential_expiry, CredentialIssuer, CredentialPayload, CredentialVerifier, IssuedCredential,
    JsonCredentialRenderer, ScanDecision, ScanDenial, EARLY_ENTRY_MINUTES, ENTRY_GRACE_MINUTES,
};
pub use domain::{
    AuditLogEntry, ClientIdentity, EntryCredential, InmateRecord, ReviewerIdentity, VisitAction,
    VisitDraft, VisitRequest, VisitRequestId, VisitStatus, VisitStatusView,
};
pub use events::{VisitEvent, VisitEventBus, VisitEventKind, VisitSubscription};
pub use gateway::{
    Clock, CredentialRenderer, CredentialRendering, FixedClock, InmateRegistry, Notification,
    NotificationError, NotificationKind, Notifier, RegistryError, RenderError, SystemClock,
};
pub use memory::{MemoryNotifier, MemoryRecordStore, StaticInmateRegistry};
pub use policy::{
    classify_relationship, schedule_hint, PolicyValidator, PolicyViolation, RelationshipCategory,
    ScheduleHint, ValidatedVisit, VisitingHours,
};
pub use repository::{
    AuditLogRepository, CredentialRepository, RepositoryError, VisitRepository,
};
pub use router::visit_router;
pub use service::{
    GuardViolation, SideEffectWarning, TransitionOutcome, VisitLifecycleService,
    VisitServiceError, ADMIN_TARGET,
};
