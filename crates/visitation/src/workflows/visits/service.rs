use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::audit::AuditLogEmitter;
use super::credential::{
    CredentialIssuer, CredentialPayload, CredentialVerifier, IssuedCredential, ScanDecision,
};
use super::domain::{
    hhmm, AuditLogEntry, ClientIdentity, EntryCredential, ReviewerIdentity, VisitAction,
    VisitDraft, VisitRequest, VisitRequestId, VisitStatus,
};
use super::events::{VisitEvent, VisitEventBus, VisitEventKind, VisitSubscription};
use super::gateway::{
    Clock, CredentialRenderer, InmateRegistry, Notification, NotificationKind, Notifier,
    RegistryError, RenderError, SystemClock,
};
use super::policy::{PolicyError, PolicyValidator, PolicyViolation, ValidatedVisit};
use super::repository::{
    AuditLogRepository, CredentialRepository, RepositoryError, VisitRepository,
};
use crate::config::FacilityConfig;

/// Notification target for facility staff.
pub const ADMIN_TARGET: &str = "admin";

/// Service composing the policy validator, record store, credential issuer
/// and verifier, audit log, and outbound collaborators.
pub struct VisitLifecycleService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    registry: Arc<dyn InmateRegistry>,
    clock: Arc<dyn Clock>,
    facility: FacilityConfig,
    validator: PolicyValidator,
    audit: AuditLogEmitter<S>,
    issuer: CredentialIssuer<S>,
    verifier: CredentialVerifier<S>,
    events: VisitEventBus,
}

/// Result of a committed transition. Warnings describe side effects that
/// failed after the commit; the transition itself stands.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub request: VisitRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<IssuedCredential>,
    pub warnings: Vec<SideEffectWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SideEffectWarning {
    Notification(String),
    Audit(String),
    CredentialPersistence(String),
    Rendering(String),
}

impl<S, N> VisitLifecycleService<S, N>
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        registry: Arc<dyn InmateRegistry>,
        renderer: Arc<dyn CredentialRenderer>,
        facility: FacilityConfig,
    ) -> Self {
        Self {
            audit: AuditLogEmitter::new(store.clone()),
            issuer: CredentialIssuer::new(store.clone(), renderer, facility.clone()),
            verifier: CredentialVerifier::new(store.clone(), facility.clone()),
            store,
            notifier,
            registry,
            clock: Arc::new(SystemClock),
            facility,
            validator: PolicyValidator::new(),
            events: VisitEventBus::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn facility(&self) -> &FacilityConfig {
        &self.facility
    }

    pub fn validator(&self) -> &PolicyValidator {
        &self.validator
    }

    /// Validate a client's draft and store it as a pending request.
    pub fn submit(
        &self,
        client: &ClientIdentity,
        draft: VisitDraft,
    ) -> Result<TransitionOutcome, VisitServiceError> {
        require_client(client)?;
        let now = self.clock.now();
        let validated = self.validate(&draft, now)?;

        let request = self
            .store
            .create(new_request(client, validated, now))?;
        info!(visit_id = %request.id, client_id = %request.client_id, "visit request submitted");

        let mut warnings = Vec::new();
        self.notify(
            Notification {
                target_id: ADMIN_TARGET.to_string(),
                title: "New visit request".to_string(),
                message: format!(
                    "{} requested a visit with {} on {} at {}.",
                    request.client_name,
                    request.inmate_name,
                    request.visit_date,
                    hhmm::format(&request.visit_time)
                ),
                kind: NotificationKind::VisitRequested,
                payload: json!({ "visitId": request.id, "status": request.status }),
            },
            &mut warnings,
        );
        self.publish(VisitEventKind::Submitted, &request, now);

        Ok(TransitionOutcome {
            request,
            credential: None,
            warnings,
        })
    }

    /// Approve a pending request and issue its entry credential.
    pub fn approve(
        &self,
        id: &VisitRequestId,
        reviewer: &ReviewerIdentity,
    ) -> Result<TransitionOutcome, VisitServiceError> {
        let officer = require_reviewer(reviewer)?;
        let now = self.clock.now();
        let request = self.decide(id, VisitAction::Approve, officer, None, now)?;

        let mut warnings = Vec::new();
        self.record_audit(&request, officer, now, &mut warnings);

        let credential = match self.issuer.persist(&request, now) {
            Ok(credential) => {
                let (issued, failure) = self.issuer.render(credential);
                if let Some(err) = failure {
                    warn!(visit_id = %request.id, error = %err, "credential rendering failed");
                    warnings.push(SideEffectWarning::Rendering(err.to_string()));
                }
                Some(issued)
            }
            Err(err) => {
                warn!(visit_id = %request.id, error = %err, "credential issuance failed");
                warnings.push(SideEffectWarning::CredentialPersistence(err.to_string()));
                None
            }
        };

        let payload = credential
            .as_ref()
            .and_then(|issued| serde_json::to_value(&issued.payload).ok());
        self.notify(
            Notification {
                target_id: request.client_id.clone(),
                title: "Visit approved".to_string(),
                message: format!(
                    "Your visit with {} on {} at {} has been approved. Present your entry credential at the checkpoint.",
                    request.inmate_name,
                    request.visit_date,
                    hhmm::format(&request.visit_time)
                ),
                kind: NotificationKind::VisitApproved,
                payload: json!({
                    "visitId": request.id,
                    "status": request.status,
                    "credential": payload,
                }),
            },
            &mut warnings,
        );
        self.publish(VisitEventKind::Approved, &request, now);

        Ok(TransitionOutcome {
            request,
            credential,
            warnings,
        })
    }

    pub fn reject(
        &self,
        id: &VisitRequestId,
        reviewer: &ReviewerIdentity,
        reason: &str,
    ) -> Result<TransitionOutcome, VisitServiceError> {
        let officer = require_reviewer(reviewer)?;
        let reason = require_reason(reason, "rejection reason")?;
        let now = self.clock.now();
        let request = self.decide(id, VisitAction::Reject, officer, Some(reason), now)?;

        let mut warnings = Vec::new();
        self.record_audit(&request, officer, now, &mut warnings);
        self.notify(
            Notification {
                target_id: request.client_id.clone(),
                title: "Visit rejected".to_string(),
                message: format!(
                    "Your visit with {} on {} was rejected: {}",
                    request.inmate_name,
                    request.visit_date,
                    request.rejection_reason.as_deref().unwrap_or_default()
                ),
                kind: NotificationKind::VisitRejected,
                payload: json!({
                    "visitId": request.id,
                    "status": request.status,
                    "reason": request.rejection_reason,
                }),
            },
            &mut warnings,
        );
        self.publish(VisitEventKind::Rejected, &request, now);

        Ok(TransitionOutcome {
            request,
            credential: None,
            warnings,
        })
    }

    /// Ask the client to pick another slot. The client answers with
    /// [`VisitLifecycleService::resubmit`].
    pub fn reschedule(
        &self,
        id: &VisitRequestId,
        reviewer: &ReviewerIdentity,
        reason: &str,
    ) -> Result<TransitionOutcome, VisitServiceError> {
        let officer = require_reviewer(reviewer)?;
        let reason = require_reason(reason, "reschedule reason")?;
        let now = self.clock.now();
        let request = self.decide(id, VisitAction::Reschedule, officer, Some(reason), now)?;

        let mut warnings = Vec::new();
        self.record_audit(&request, officer, now, &mut warnings);
        self.notify(
            Notification {
                target_id: request.client_id.clone(),
                title: "Visit needs rescheduling".to_string(),
                message: format!(
                    "Your visit with {} on {} needs a new date or time: {}",
                    request.inmate_name,
                    request.visit_date,
                    request.reschedule_reason.as_deref().unwrap_or_default()
                ),
                kind: NotificationKind::VisitRescheduled,
                payload: json!({
                    "visitId": request.id,
                    "status": request.status,
                    "reason": request.reschedule_reason,
                    "draft": VisitDraft::from_request(&request),
                }),
            },
            &mut warnings,
        );
        self.publish(VisitEventKind::Rescheduled, &request, now);

        Ok(TransitionOutcome {
            request,
            credential: None,
            warnings,
        })
    }

    /// Replace a rescheduled request with a fresh pending one. The original
    /// keeps its status and is marked replaced.
    pub fn resubmit(
        &self,
        original_id: &VisitRequestId,
        client: &ClientIdentity,
        draft: VisitDraft,
    ) -> Result<TransitionOutcome, VisitServiceError> {
        require_client(client)?;
        let original = self.load(original_id)?;
        if original.client_id != client.id {
            return Err(GuardViolation::NotOwner {
                id: original.id.clone(),
            }
            .into());
        }
        if original.is_replaced {
            return Err(GuardViolation::AlreadyReplaced {
                id: original.id.clone(),
                replaced_by: original.replaced_by.clone(),
            }
            .into());
        }
        if original.status != VisitStatus::Rescheduled {
            return Err(GuardViolation::InvalidTransition {
                id: original.id.clone(),
                from: original.status,
                action: VisitAction::Resubmit,
            }
            .into());
        }

        let now = self.clock.now();
        let validated = self.validate(&draft, now)?;
        let mut replacement = new_request(client, validated, now);
        replacement.original_request_id = Some(original.id.clone());
        let created = self.store.create(replacement)?;

        let mut replaced = original;
        replaced.is_replaced = true;
        replaced.replaced_by = Some(created.id.clone());
        replaced.replaced_at = Some(now);
        replaced.updated_at = now;
        if let Err(err) = self.store.update_if(replaced) {
            self.withdraw(created, now);
            return Err(match err {
                RepositoryError::PreconditionFailed => GuardViolation::ConcurrentUpdate {
                    id: original_id.clone(),
                }
                .into(),
                other => other.into(),
            });
        }
        info!(
            visit_id = %created.id,
            original_id = %original_id,
            "visit request resubmitted"
        );

        let mut warnings = Vec::new();
        self.notify(
            Notification {
                target_id: ADMIN_TARGET.to_string(),
                title: "Visit request resubmitted".to_string(),
                message: format!(
                    "{} resubmitted their visit with {} for {} at {}.",
                    created.client_name,
                    created.inmate_name,
                    created.visit_date,
                    hhmm::format(&created.visit_time)
                ),
                kind: NotificationKind::VisitResubmitted,
                payload: json!({
                    "visitId": created.id,
                    "originalRequestId": original_id,
                    "status": created.status,
                }),
            },
            &mut warnings,
        );
        self.publish(VisitEventKind::Resubmitted, &created, now);

        Ok(TransitionOutcome {
            request: created,
            credential: None,
            warnings,
        })
    }

    /// Client withdrawal of a pending request. Not a reviewer decision, so
    /// nothing is written to the audit log.
    pub fn cancel(
        &self,
        id: &VisitRequestId,
        client: &ClientIdentity,
    ) -> Result<TransitionOutcome, VisitServiceError> {
        require_client(client)?;
        let mut request = self.load(id)?;
        if request.client_id != client.id {
            return Err(GuardViolation::NotOwner { id: id.clone() }.into());
        }
        ensure_open(&request, VisitAction::Cancel)?;

        let now = self.clock.now();
        request.status = VisitStatus::Cancelled;
        request.updated_at = now;
        let request = self.commit(request)?;
        info!(visit_id = %request.id, "visit request cancelled");

        let mut warnings = Vec::new();
        self.notify(
            Notification {
                target_id: ADMIN_TARGET.to_string(),
                title: "Visit request cancelled".to_string(),
                message: format!(
                    "{} cancelled their visit with {} on {}.",
                    request.client_name, request.inmate_name, request.visit_date
                ),
                kind: NotificationKind::VisitCancelled,
                payload: json!({ "visitId": request.id, "status": request.status }),
            },
            &mut warnings,
        );
        self.publish(VisitEventKind::Cancelled, &request, now);

        Ok(TransitionOutcome {
            request,
            credential: None,
            warnings,
        })
    }

    pub fn get(&self, id: &VisitRequestId) -> Result<VisitRequest, VisitServiceError> {
        self.load(id)
    }

    pub fn list_for_client(&self, client_id: &str) -> Result<Vec<VisitRequest>, VisitServiceError> {
        Ok(self.store.by_client(client_id)?)
    }

    /// Review queue, oldest first.
    pub fn pending_queue(&self, limit: usize) -> Result<Vec<VisitRequest>, VisitServiceError> {
        Ok(self.store.pending(limit)?)
    }

    /// Check a presented credential without consuming it.
    pub fn verify_credential(
        &self,
        payload: &CredentialPayload,
    ) -> Result<ScanDecision, VisitServiceError> {
        Ok(self.verifier.verify(payload, self.clock.now())?)
    }

    /// Verify and, when admitted, mark the credential used. Of two concurrent
    /// scans only one is admitted; the other sees `AlreadyUsed`.
    pub fn admit_credential(
        &self,
        payload: &CredentialPayload,
        scanned_by: &str,
    ) -> Result<ScanDecision, VisitServiceError> {
        let scanned_by = scanned_by.trim();
        if scanned_by.is_empty() {
            return Err(VisitServiceError::InvalidInput(
                "checkpoint officer is required".to_string(),
            ));
        }

        let now = self.clock.now();
        let credential = match self.verifier.verify(payload, now)? {
            ScanDecision::Admit { credential } => credential,
            denied => {
                if let Some(reason) = denied.denial() {
                    info!(visit_id = %payload.visit_id, reason = %reason.message(), "entry denied");
                }
                return Ok(denied);
            }
        };

        match self.store.consume(&credential.visit_id, now, scanned_by) {
            Ok(consumed) => {
                info!(visit_id = %consumed.visit_id, scanned_by, "entry credential consumed");
                self.publish_credential(VisitEventKind::CredentialConsumed, &consumed, now);
                Ok(ScanDecision::Admit {
                    credential: consumed,
                })
            }
            Err(RepositoryError::PreconditionFailed) => {
                let current = self
                    .store
                    .fetch_credential(&credential.visit_id)?
                    .ok_or_else(|| VisitServiceError::CredentialNotFound(credential.visit_id))?;
                Ok(self.verifier.evaluate(current, now))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Reviewer revocation of an issued credential.
    pub fn revoke_credential(
        &self,
        visit_id: &VisitRequestId,
        reviewer: &ReviewerIdentity,
    ) -> Result<EntryCredential, VisitServiceError> {
        let officer = require_reviewer(reviewer)?;
        let credential = self.store.invalidate(visit_id).map_err(|err| match err {
            RepositoryError::NotFound => VisitServiceError::CredentialNotFound(visit_id.clone()),
            other => other.into(),
        })?;
        info!(visit_id = %visit_id, officer, "entry credential revoked");
        self.publish_credential(VisitEventKind::CredentialRevoked, &credential, self.clock.now());
        Ok(credential)
    }

    /// Render an approved visit's credential again, issuing the canonical
    /// record first when the original issuance never completed.
    pub fn reissue_credential(
        &self,
        visit_id: &VisitRequestId,
        reviewer: &ReviewerIdentity,
    ) -> Result<IssuedCredential, VisitServiceError> {
        let officer = require_reviewer(reviewer)?;
        let request = self.load(visit_id)?;
        if request.status != VisitStatus::Approved {
            return Err(GuardViolation::InvalidTransition {
                id: request.id,
                from: request.status,
                action: VisitAction::ReissueCredential,
            }
            .into());
        }

        let credential = match self.store.fetch_credential(visit_id)? {
            Some(credential) if !credential.is_valid => {
                return Err(GuardViolation::CredentialRevoked {
                    id: visit_id.clone(),
                }
                .into());
            }
            Some(credential) => credential,
            None => {
                let approved_at = request.reviewed_at.unwrap_or_else(|| self.clock.now());
                match self.issuer.persist(&request, approved_at) {
                    Ok(credential) => credential,
                    Err(RepositoryError::Conflict) => self
                        .store
                        .fetch_credential(visit_id)?
                        .ok_or_else(|| VisitServiceError::CredentialNotFound(visit_id.clone()))?,
                    Err(err) => return Err(err.into()),
                }
            }
        };

        let (issued, failure) = self.issuer.render(credential);
        match failure {
            Some(err) => Err(err.into()),
            None => {
                info!(visit_id = %visit_id, officer, "entry credential reissued");
                Ok(issued)
            }
        }
    }

    pub fn audit_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, VisitServiceError> {
        Ok(self.audit.between(from, to)?)
    }

    pub fn audit_by_officer(
        &self,
        officer_name: &str,
    ) -> Result<Vec<AuditLogEntry>, VisitServiceError> {
        Ok(self.audit.by_officer(officer_name.trim())?)
    }

    pub fn audit_recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, VisitServiceError> {
        Ok(self.audit.recent(limit)?)
    }

    pub fn subscribe(&self) -> VisitSubscription {
        self.events.subscribe()
    }

    pub fn subscribe_client(&self, client_id: impl Into<String>) -> VisitSubscription {
        self.events.subscribe_client(client_id)
    }

    fn validate(
        &self,
        draft: &VisitDraft,
        now: DateTime<Utc>,
    ) -> Result<ValidatedVisit, VisitServiceError> {
        let today = self.facility.local(now).date();
        Ok(self
            .validator
            .validate(draft, self.registry.as_ref(), today)?)
    }

    fn load(&self, id: &VisitRequestId) -> Result<VisitRequest, VisitServiceError> {
        self.store
            .fetch(id)?
            .ok_or_else(|| VisitServiceError::NotFound(id.clone()))
    }

    /// Conditional write of a request read earlier in the same operation.
    fn commit(&self, request: VisitRequest) -> Result<VisitRequest, VisitServiceError> {
        let id = request.id.clone();
        self.store.update_if(request).map_err(|err| match err {
            RepositoryError::PreconditionFailed => {
                VisitServiceError::from(GuardViolation::ConcurrentUpdate { id })
            }
            other => VisitServiceError::from(other),
        })
    }

    /// Apply a reviewer decision to a pending request.
    fn decide(
        &self,
        id: &VisitRequestId,
        action: VisitAction,
        officer: &str,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<VisitRequest, VisitServiceError> {
        let mut request = self.load(id)?;
        ensure_open(&request, action)?;

        match action {
            VisitAction::Approve => request.status = VisitStatus::Approved,
            VisitAction::Reject => {
                request.status = VisitStatus::Rejected;
                request.rejection_reason = reason;
            }
            VisitAction::Reschedule => {
                request.status = VisitStatus::Rescheduled;
                request.reschedule_reason = reason;
            }
            other => {
                return Err(VisitServiceError::InvalidInput(format!(
                    "{other} is not a reviewer decision"
                )))
            }
        }
        request.reviewed_by = Some(officer.to_string());
        request.reviewed_at = Some(at);
        request.updated_at = at;

        let request = self.commit(request)?;
        info!(
            visit_id = %request.id,
            status = %request.status,
            officer,
            "visit request reviewed"
        );
        Ok(request)
    }

    /// Compensate for a resubmission whose original could not be marked
    /// replaced.
    fn withdraw(&self, mut orphan: VisitRequest, at: DateTime<Utc>) {
        orphan.status = VisitStatus::Cancelled;
        orphan.updated_at = at;
        if let Err(err) = self.store.update_if(orphan) {
            warn!(error = %err, "failed to withdraw orphaned resubmission");
        }
    }

    fn record_audit(
        &self,
        request: &VisitRequest,
        officer: &str,
        at: DateTime<Utc>,
        warnings: &mut Vec<SideEffectWarning>,
    ) {
        if let Err(err) = self.audit.record(request, officer, at) {
            warn!(visit_id = %request.id, error = %err, "audit log append failed");
            warnings.push(SideEffectWarning::Audit(err.to_string()));
        }
    }

    fn notify(&self, notification: Notification, warnings: &mut Vec<SideEffectWarning>) {
        let target = notification.target_id.clone();
        if let Err(err) = self.notifier.send(notification) {
            warn!(target = %target, error = %err, "notification delivery failed");
            warnings.push(SideEffectWarning::Notification(err.to_string()));
        }
    }

    fn publish(&self, kind: VisitEventKind, request: &VisitRequest, at: DateTime<Utc>) {
        self.events.publish(VisitEvent::for_request(kind, request, at));
    }

    fn publish_credential(
        &self,
        kind: VisitEventKind,
        credential: &EntryCredential,
        at: DateTime<Utc>,
    ) {
        self.events.publish(VisitEvent {
            kind,
            visit_id: credential.visit_id.clone(),
            client_id: credential.client_id.clone(),
            status: VisitStatus::Approved,
            at,
        });
    }
}

fn new_request(client: &ClientIdentity, visit: ValidatedVisit, at: DateTime<Utc>) -> VisitRequest {
    VisitRequest {
        id: VisitRequestId::unassigned(),
        client_id: client.id.trim().to_string(),
        client_name: client.name.trim().to_string(),
        client_email: client.email.trim().to_string(),
        inmate_id: visit.inmate.id,
        inmate_number: visit.inmate.inmate_number,
        inmate_name: visit.inmate.name,
        visit_date: visit.visit_date,
        visit_time: visit.visit_time,
        relationship: visit.relationship,
        reason: visit.reason,
        status: VisitStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
        rejection_reason: None,
        reschedule_reason: None,
        original_request_id: None,
        replaced_by: None,
        replaced_at: None,
        is_replaced: false,
        submitted_at: at,
        updated_at: at,
        revision: 0,
    }
}

fn ensure_open(request: &VisitRequest, action: VisitAction) -> Result<(), GuardViolation> {
    if request.is_replaced {
        return Err(GuardViolation::AlreadyReplaced {
            id: request.id.clone(),
            replaced_by: request.replaced_by.clone(),
        });
    }
    if request.status != VisitStatus::Pending {
        return Err(GuardViolation::InvalidTransition {
            id: request.id.clone(),
            from: request.status,
            action,
        });
    }
    Ok(())
}

fn require_client(client: &ClientIdentity) -> Result<(), VisitServiceError> {
    if client.is_complete() {
        Ok(())
    } else {
        Err(VisitServiceError::InvalidInput(
            "client id and name are required".to_string(),
        ))
    }
}

fn require_reviewer(reviewer: &ReviewerIdentity) -> Result<&str, VisitServiceError> {
    if reviewer.is_blank() {
        Err(VisitServiceError::InvalidInput(
            "reviewer name is required".to_string(),
        ))
    } else {
        Ok(reviewer.name.trim())
    }
}

fn require_reason(reason: &str, field: &str) -> Result<String, VisitServiceError> {
    let reason = reason.trim();
    if reason.is_empty() {
        Err(VisitServiceError::InvalidInput(format!("{field} is required")))
    } else {
        Ok(reason.to_string())
    }
}

/// A transition the current record does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardViolation {
    #[error("cannot {action} visit request {id}: it is already {from}")]
    InvalidTransition {
        id: VisitRequestId,
        from: VisitStatus,
        action: VisitAction,
    },
    #[error("visit request {id} was already replaced by a resubmission")]
    AlreadyReplaced {
        id: VisitRequestId,
        replaced_by: Option<VisitRequestId>,
    },
    #[error("visit request {id} was changed by someone else; reload it and try again")]
    ConcurrentUpdate { id: VisitRequestId },
    #[error("visit request {id} belongs to another client")]
    NotOwner { id: VisitRequestId },
    #[error("the entry credential for visit request {id} was revoked and cannot be reissued")]
    CredentialRevoked { id: VisitRequestId },
}

/// Error raised by the lifecycle service.
#[derive(Debug, thiserror::Error)]
pub enum VisitServiceError {
    #[error(transparent)]
    Validation(#[from] PolicyViolation),
    #[error(transparent)]
    Guard(#[from] GuardViolation),
    #[error("visit request {0} not found")]
    NotFound(VisitRequestId),
    #[error("no entry credential exists for visit {0}")]
    CredentialNotFound(VisitRequestId),
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Rendering(#[from] RenderError),
}

impl From<PolicyError> for VisitServiceError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Violation(violation) => VisitServiceError::Validation(violation),
            PolicyError::Registry(registry) => VisitServiceError::Registry(registry),
        }
    }
}
