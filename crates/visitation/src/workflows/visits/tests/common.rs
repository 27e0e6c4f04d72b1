use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

use crate::config::FacilityConfig;
use crate::workflows::visits::credential::CredentialPayload;
use crate::workflows::visits::domain::{
    AuditLogEntry, ClientIdentity, EntryCredential, InmateRecord, ReviewerIdentity, VisitDraft,
    VisitRequest, VisitRequestId,
};
use crate::workflows::visits::gateway::{
    Clock, CredentialRenderer, CredentialRendering, FixedClock, InmateRegistry, Notification,
    NotificationError, Notifier, RegistryError, RenderError,
};
use crate::workflows::visits::memory::{MemoryNotifier, MemoryRecordStore, StaticInmateRegistry};
use crate::workflows::visits::repository::{
    AuditLogRepository, CredentialRepository, RepositoryError, VisitRepository,
};
use crate::workflows::visits::{JsonCredentialRenderer, VisitLifecycleService};

pub(super) const ACTIVE_INMATE: &str = "PDL-1001";
pub(super) const INACTIVE_INMATE: &str = "PDL-2002";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// Monday 2025-10-06; the facility-local "today" for every test.
pub(super) fn today() -> NaiveDate {
    date(2025, 10, 6)
}

pub(super) fn wednesday() -> NaiveDate {
    date(2025, 10, 8)
}

pub(super) fn thursday() -> NaiveDate {
    date(2025, 10, 9)
}

pub(super) fn friday() -> NaiveDate {
    date(2025, 10, 10)
}

pub(super) fn saturday() -> NaiveDate {
    date(2025, 10, 11)
}

pub(super) fn next_monday() -> NaiveDate {
    date(2025, 10, 13)
}

pub(super) fn facility() -> FacilityConfig {
    FacilityConfig::default()
}

/// Instant for a facility wall-clock reading.
pub(super) fn local(day: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    facility().to_utc(day.and_time(time(hour, minute)))
}

pub(super) fn registry() -> StaticInmateRegistry {
    StaticInmateRegistry::new([
        InmateRecord {
            id: "inmate-1".to_string(),
            inmate_number: ACTIVE_INMATE.to_string(),
            name: "Juan Dela Cruz".to_string(),
            active: true,
        },
        InmateRecord {
            id: "inmate-2".to_string(),
            inmate_number: INACTIVE_INMATE.to_string(),
            name: "Pedro Santos".to_string(),
            active: false,
        },
    ])
}

pub(super) fn client() -> ClientIdentity {
    ClientIdentity {
        id: "client-1".to_string(),
        name: "Maria Dela Cruz".to_string(),
        email: "maria@example.com".to_string(),
    }
}

pub(super) fn other_client() -> ClientIdentity {
    ClientIdentity {
        id: "client-2".to_string(),
        name: "Ana Reyes".to_string(),
        email: "ana@example.com".to_string(),
    }
}

pub(super) fn reviewer() -> ReviewerIdentity {
    ReviewerIdentity::new("Officer Reyes")
}

pub(super) fn draft(day: NaiveDate, at: NaiveTime, relationship: &str) -> VisitDraft {
    VisitDraft {
        inmate_number: ACTIVE_INMATE.to_string(),
        visit_date: Some(day),
        visit_time: Some(at),
        relationship: relationship.to_string(),
        reason: "Weekly check-in".to_string(),
    }
}

/// Friend visiting on Wednesday at 10:00.
pub(super) fn friend_draft() -> VisitDraft {
    draft(wednesday(), time(10, 0), "Friend")
}

pub(super) struct Harness<S = MemoryRecordStore, N = MemoryNotifier> {
    pub(super) service: VisitLifecycleService<S, N>,
    pub(super) store: Arc<S>,
    pub(super) notifier: Arc<N>,
    pub(super) clock: Arc<FixedClock>,
}

impl<S, N> Harness<S, N>
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    pub(super) fn at(&self, day: NaiveDate, hour: u32, minute: u32) {
        self.clock.set(local(day, hour, minute));
    }

    pub(super) fn submit_friend_visit(&self) -> VisitRequest {
        self.service
            .submit(&client(), friend_draft())
            .expect("friend visit is valid")
            .request
    }

    pub(super) fn approved_visit(&self) -> (VisitRequest, CredentialPayload) {
        let request = self.submit_friend_visit();
        let outcome = self
            .service
            .approve(&request.id, &reviewer())
            .expect("approval succeeds");
        let payload = outcome
            .credential
            .expect("credential issued")
            .payload;
        (outcome.request, payload)
    }

    pub(super) fn rescheduled_visit(&self) -> VisitRequest {
        let request = self.submit_friend_visit();
        self.service
            .reschedule(&request.id, &reviewer(), "Slot is fully booked")
            .expect("reschedule succeeds")
            .request
    }
}

pub(super) fn harness() -> Harness {
    harness_with(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(MemoryNotifier::default()),
        Arc::new(JsonCredentialRenderer),
    )
}

pub(super) fn harness_with<S, N>(
    store: Arc<S>,
    notifier: Arc<N>,
    renderer: Arc<dyn CredentialRenderer>,
) -> Harness<S, N>
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    let clock = Arc::new(FixedClock::new(local(today(), 9, 0)));
    let service = VisitLifecycleService::new(
        store.clone(),
        notifier.clone(),
        Arc::new(registry()),
        renderer,
        facility(),
    )
    .with_clock(clock.clone() as Arc<dyn Clock>);

    Harness {
        service,
        store,
        notifier,
        clock,
    }
}

pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("push gateway offline".to_string()))
    }
}

pub(super) struct FailingRenderer;

impl CredentialRenderer for FailingRenderer {
    fn encode(&self, _payload: &CredentialPayload) -> Result<CredentialRendering, RenderError> {
        Err(RenderError::Encoding("qr encoder crashed".to_string()))
    }
}

pub(super) struct UnavailableRegistry;

impl InmateRegistry for UnavailableRegistry {
    fn lookup(&self, _inmate_number: &str) -> Result<Option<InmateRecord>, RegistryError> {
        Err(RegistryError::Unavailable("registry offline".to_string()))
    }
}

/// Memory store with switchable faults.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: MemoryRecordStore,
    /// Number of upcoming `update_if` calls to fail as stale.
    pub(super) stale_updates: AtomicUsize,
    pub(super) fail_audit: AtomicBool,
    pub(super) fail_credentials: AtomicBool,
}

impl FlakyStore {
    pub(super) fn fail_next_updates(&self, count: usize) {
        self.stale_updates.store(count, Ordering::SeqCst);
    }

    pub(super) fn set_fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    pub(super) fn set_fail_credentials(&self, fail: bool) {
        self.fail_credentials.store(fail, Ordering::SeqCst);
    }

    fn offline() -> RepositoryError {
        RepositoryError::Unavailable("database offline".to_string())
    }
}

impl VisitRepository for FlakyStore {
    fn create(&self, request: VisitRequest) -> Result<VisitRequest, RepositoryError> {
        self.inner.create(request)
    }

    fn fetch(&self, id: &VisitRequestId) -> Result<Option<VisitRequest>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update_if(&self, request: VisitRequest) -> Result<VisitRequest, RepositoryError> {
        let stale = self
            .stale_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if stale {
            return Err(RepositoryError::PreconditionFailed);
        }
        self.inner.update_if(request)
    }

    fn by_client(&self, client_id: &str) -> Result<Vec<VisitRequest>, RepositoryError> {
        self.inner.by_client(client_id)
    }

    fn pending(&self, limit: usize) -> Result<Vec<VisitRequest>, RepositoryError> {
        self.inner.pending(limit)
    }
}

impl CredentialRepository for FlakyStore {
    fn insert_if_absent(
        &self,
        credential: EntryCredential,
    ) -> Result<EntryCredential, RepositoryError> {
        if self.fail_credentials.load(Ordering::SeqCst) {
            return Err(Self::offline());
        }
        self.inner.insert_if_absent(credential)
    }

    fn fetch_credential(
        &self,
        visit_id: &VisitRequestId,
    ) -> Result<Option<EntryCredential>, RepositoryError> {
        self.inner.fetch_credential(visit_id)
    }

    fn consume(
        &self,
        visit_id: &VisitRequestId,
        scanned_at: DateTime<Utc>,
        scanned_by: &str,
    ) -> Result<EntryCredential, RepositoryError> {
        self.inner.consume(visit_id, scanned_at, scanned_by)
    }

    fn invalidate(&self, visit_id: &VisitRequestId) -> Result<EntryCredential, RepositoryError> {
        self.inner.invalidate(visit_id)
    }
}

impl AuditLogRepository for FlakyStore {
    fn append(&self, entry: AuditLogEntry) -> Result<AuditLogEntry, RepositoryError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(Self::offline());
        }
        self.inner.append(entry)
    }

    fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.inner.between(from, to)
    }

    fn by_officer(&self, officer_name: &str) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.inner.by_officer(officer_name)
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        self.inner.recent(limit)
    }
}

/// Store whose every call fails.
pub(super) struct UnavailableStore;

impl VisitRepository for UnavailableStore {
    fn create(&self, _request: VisitRequest) -> Result<VisitRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &VisitRequestId) -> Result<Option<VisitRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_if(&self, _request: VisitRequest) -> Result<VisitRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_client(&self, _client_id: &str) -> Result<Vec<VisitRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self, _limit: usize) -> Result<Vec<VisitRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl CredentialRepository for UnavailableStore {
    fn insert_if_absent(
        &self,
        _credential: EntryCredential,
    ) -> Result<EntryCredential, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_credential(
        &self,
        _visit_id: &VisitRequestId,
    ) -> Result<Option<EntryCredential>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn consume(
        &self,
        _visit_id: &VisitRequestId,
        _scanned_at: DateTime<Utc>,
        _scanned_by: &str,
    ) -> Result<EntryCredential, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn invalidate(&self, _visit_id: &VisitRequestId) -> Result<EntryCredential, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl AuditLogRepository for UnavailableStore {
    fn append(&self, _entry: AuditLogEntry) -> Result<AuditLogEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn between(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_officer(&self, _officer_name: &str) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
