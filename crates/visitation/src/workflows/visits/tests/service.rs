use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use super::common::*;
use crate::workflows::visits::credential::CredentialPayload;
use crate::workflows::visits::domain::{
    ReviewerIdentity, VisitDraft, VisitRequest, VisitRequestId, VisitStatus,
};
use crate::workflows::visits::gateway::NotificationKind;
use crate::workflows::visits::memory::MemoryNotifier;
use crate::workflows::visits::policy::PolicyViolation;
use crate::workflows::visits::repository::{
    AuditLogRepository, CredentialRepository, VisitRepository,
};
use crate::workflows::visits::{
    GuardViolation, JsonCredentialRenderer, SideEffectWarning, VisitAction, VisitEventKind,
    VisitServiceError, ADMIN_TARGET,
};

#[test]
fn submit_stores_pending_request_and_alerts_staff() {
    let h = harness();
    let outcome = h
        .service
        .submit(&client(), friend_draft())
        .expect("submission accepted");

    let request = outcome.request;
    assert_eq!(request.id, VisitRequestId("visit-000001".to_string()));
    assert_eq!(request.status, VisitStatus::Pending);
    assert_eq!(request.inmate_name, "Juan Dela Cruz");
    assert_eq!(request.submitted_at, local(today(), 9, 0));
    assert_eq!(request.revision, 1);
    assert!(outcome.warnings.is_empty());

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].target_id, ADMIN_TARGET);
    assert_eq!(events[0].kind, NotificationKind::VisitRequested);

    assert!(h.store.recent(10).expect("audit readable").is_empty());
}

#[test]
fn submit_rejects_policy_violations_without_storing() {
    let h = harness();
    let result = h
        .service
        .submit(&client(), draft(thursday(), time(10, 0), "Friend"));

    match result {
        Err(VisitServiceError::Validation(PolicyViolation::FriendsOnlyDay { .. })) => {}
        other => panic!("expected friends-only violation, got {other:?}"),
    }
    assert!(h.store.by_client("client-1").expect("store readable").is_empty());
    assert!(h.notifier.events().is_empty());
}

#[test]
fn submit_requires_client_identity() {
    let h = harness();
    let mut anonymous = client();
    anonymous.id = " ".to_string();

    assert!(matches!(
        h.service.submit(&anonymous, friend_draft()),
        Err(VisitServiceError::InvalidInput(_))
    ));
}

#[test]
fn submit_surfaces_registry_outage() {
    let store = Arc::new(crate::workflows::visits::MemoryRecordStore::new());
    let service = crate::workflows::visits::VisitLifecycleService::new(
        store,
        Arc::new(MemoryNotifier::default()),
        Arc::new(UnavailableRegistry),
        Arc::new(JsonCredentialRenderer),
        facility(),
    );

    assert!(matches!(
        service.submit(&client(), friend_draft()),
        Err(VisitServiceError::Registry(_))
    ));
}

#[test]
fn approve_records_audit_and_issues_credential() {
    let h = harness();
    let request = h.submit_friend_visit();
    h.clock.advance(Duration::minutes(30));

    let outcome = h
        .service
        .approve(&request.id, &reviewer())
        .expect("approval succeeds");
    assert!(outcome.warnings.is_empty());

    let approved = &outcome.request;
    assert_eq!(approved.status, VisitStatus::Approved);
    assert_eq!(approved.reviewed_by.as_deref(), Some("Officer Reyes"));
    assert_eq!(approved.reviewed_at, Some(local(today(), 9, 30)));
    assert!(approved.reasons_match_status());

    let issued = outcome.credential.expect("credential issued");
    assert_eq!(issued.payload.visit_id, request.id);
    assert_eq!(issued.payload.status.as_deref(), Some("approved"));
    assert_eq!(issued.payload.facility.as_deref(), Some("Municipal Jail"));
    assert_eq!(
        issued.payload.expires_at.map(|at| at.to_rfc3339()),
        Some("2025-10-08T16:00:00+00:00".to_string())
    );
    let rendering = issued.rendering.expect("rendered");
    assert_eq!(rendering.media_type, "application/json");
    assert!(rendering.content.contains("\"visitId\":\"visit-000001\""));

    let stored = h
        .store
        .fetch_credential(&request.id)
        .expect("store readable")
        .expect("credential persisted");
    assert!(stored.is_valid);
    assert_eq!(stored.approved_at, local(today(), 9, 30));

    let audit = h.store.recent(10).expect("audit readable");
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, VisitStatus::Approved);
    assert_eq!(audit[0].officer_name, "Officer Reyes");

    let notification = h
        .notifier
        .events()
        .into_iter()
        .find(|event| event.kind == NotificationKind::VisitApproved)
        .expect("client notified");
    assert_eq!(notification.target_id, "client-1");
    assert_eq!(
        notification.payload["credential"]["visitId"],
        json!("visit-000001")
    );
}

#[test]
fn second_approval_is_a_guard_violation() {
    let h = harness();
    let (request, _) = h.approved_visit();

    match h.service.approve(&request.id, &ReviewerIdentity::new("Officer Cruz")) {
        Err(VisitServiceError::Guard(GuardViolation::InvalidTransition { from, action, .. })) => {
            assert_eq!(from, VisitStatus::Approved);
            assert_eq!(action, VisitAction::Approve);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert_eq!(h.store.recent(10).expect("audit readable").len(), 1);
}

#[test]
fn reviewer_decisions_require_reviewer_and_reason() {
    let h = harness();
    let request = h.submit_friend_visit();

    assert!(matches!(
        h.service.approve(&request.id, &ReviewerIdentity::new("  ")),
        Err(VisitServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        h.service.reject(&request.id, &reviewer(), " "),
        Err(VisitServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        h.service.reschedule(&request.id, &reviewer(), ""),
        Err(VisitServiceError::InvalidInput(_))
    ));

    let untouched = h.service.get(&request.id).expect("request exists");
    assert_eq!(untouched.status, VisitStatus::Pending);
}

#[test]
fn reject_keeps_reason_on_request_and_audit() {
    let h = harness();
    let request = h.submit_friend_visit();

    let outcome = h
        .service
        .reject(&request.id, &reviewer(), "  Visitor is on the banned list ")
        .expect("rejection succeeds");
    assert_eq!(outcome.request.status, VisitStatus::Rejected);
    assert_eq!(
        outcome.request.rejection_reason.as_deref(),
        Some("Visitor is on the banned list")
    );
    assert!(outcome.request.reasons_match_status());
    assert!(outcome.credential.is_none());

    let audit = h.store.recent(10).expect("audit readable");
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, VisitStatus::Rejected);
    assert_eq!(
        audit[0].rejection_reason.as_deref(),
        Some("Visitor is on the banned list")
    );
    assert!(h
        .store
        .fetch_credential(&request.id)
        .expect("store readable")
        .is_none());
}

#[test]
fn resubmission_replaces_the_rescheduled_request() {
    let h = harness();
    let original = h.rescheduled_visit();
    assert_eq!(original.reschedule_reason.as_deref(), Some("Slot is fully booked"));

    h.clock.advance(Duration::hours(1));
    let outcome = h
        .service
        .resubmit(&original.id, &client(), draft(wednesday(), time(13, 0), "Friend"))
        .expect("resubmission accepted");

    let replacement = outcome.request;
    assert_eq!(replacement.status, VisitStatus::Pending);
    assert_eq!(replacement.original_request_id, Some(original.id.clone()));
    assert_eq!(replacement.visit_time, time(13, 0));

    let original = h.service.get(&original.id).expect("original kept");
    assert_eq!(original.status, VisitStatus::Rescheduled);
    assert!(original.is_replaced);
    assert_eq!(original.replaced_by, Some(replacement.id.clone()));
    assert_eq!(original.replaced_at, Some(local(today(), 10, 0)));

    let queue = h.service.pending_queue(10).expect("queue readable");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, replacement.id);

    assert!(h
        .notifier
        .events()
        .iter()
        .any(|event| event.kind == NotificationKind::VisitResubmitted
            && event.target_id == ADMIN_TARGET));
}

#[test]
fn replaced_request_cannot_be_resubmitted_or_reviewed() {
    let h = harness();
    let original = h.rescheduled_visit();
    h.service
        .resubmit(&original.id, &client(), friend_draft())
        .expect("first resubmission accepted");

    match h.service.resubmit(&original.id, &client(), friend_draft()) {
        Err(VisitServiceError::Guard(GuardViolation::AlreadyReplaced { replaced_by, .. })) => {
            assert_eq!(replaced_by, Some(VisitRequestId("visit-000002".to_string())));
        }
        other => panic!("expected already replaced, got {other:?}"),
    }
    assert!(matches!(
        h.service.approve(&original.id, &reviewer()),
        Err(VisitServiceError::Guard(GuardViolation::AlreadyReplaced { .. }))
    ));
}

#[test]
fn resubmission_is_limited_to_owner_and_rescheduled_state() {
    let h = harness();
    let original = h.rescheduled_visit();
    assert!(matches!(
        h.service.resubmit(&original.id, &other_client(), friend_draft()),
        Err(VisitServiceError::Guard(GuardViolation::NotOwner { .. }))
    ));

    let pending = h.submit_friend_visit();
    assert!(matches!(
        h.service.resubmit(&pending.id, &client(), friend_draft()),
        Err(VisitServiceError::Guard(GuardViolation::InvalidTransition {
            action: VisitAction::Resubmit,
            ..
        }))
    ));
}

#[test]
fn invalid_resubmission_leaves_original_untouched() {
    let h = harness();
    let original = h.rescheduled_visit();

    let result = h.service.resubmit(
        &original.id,
        &client(),
        draft(next_monday(), time(10, 0), "Friend"),
    );
    assert!(matches!(
        result,
        Err(VisitServiceError::Validation(PolicyViolation::NoVisitDay { .. }))
    ));

    let stored = h.service.get(&original.id).expect("original kept");
    assert!(!stored.is_replaced);
    assert_eq!(stored.revision, original.revision);
}

#[test]
fn legacy_reschedule_spelling_is_resubmittable() {
    let h = harness();
    let legacy: VisitRequest = serde_json::from_value(json!({
        "id": "",
        "client_id": "client-1",
        "client_name": "Maria Dela Cruz",
        "client_email": "maria@example.com",
        "inmate_id": "inmate-1",
        "inmate_number": ACTIVE_INMATE,
        "inmate_name": "Juan Dela Cruz",
        "visit_date": "2025-10-08",
        "visit_time": "10:00",
        "relationship": "Friend",
        "reason": "Weekly check-in",
        "status": "reschedule",
        "reviewed_by": "Officer Reyes",
        "reschedule_reason": "Slot is fully booked",
        "submitted_at": "2025-10-01T01:00:00Z",
        "updated_at": "2025-10-01T01:00:00Z"
    }))
    .expect("legacy record parses");
    assert_eq!(legacy.status, VisitStatus::Rescheduled);

    let stored = h.store.create(legacy).expect("legacy record stored");
    let outcome = h
        .service
        .resubmit(&stored.id, &client(), friend_draft())
        .expect("legacy rescheduled request can be resubmitted");
    assert_eq!(outcome.request.original_request_id, Some(stored.id));
}

#[test]
fn cancel_is_owner_only_and_unaudited() {
    let h = harness();
    let request = h.submit_friend_visit();

    assert!(matches!(
        h.service.cancel(&request.id, &other_client()),
        Err(VisitServiceError::Guard(GuardViolation::NotOwner { .. }))
    ));

    let outcome = h
        .service
        .cancel(&request.id, &client())
        .expect("owner can cancel");
    assert_eq!(outcome.request.status, VisitStatus::Cancelled);
    assert!(h.store.recent(10).expect("audit readable").is_empty());

    assert!(matches!(
        h.service.cancel(&request.id, &client()),
        Err(VisitServiceError::Guard(GuardViolation::InvalidTransition {
            from: VisitStatus::Cancelled,
            ..
        }))
    ));
}

#[test]
fn stale_revision_surfaces_as_concurrent_update() {
    let store = Arc::new(FlakyStore::default());
    let h = harness_with(
        store.clone(),
        Arc::new(MemoryNotifier::default()),
        Arc::new(JsonCredentialRenderer),
    );
    let request = h.submit_friend_visit();

    store.fail_next_updates(1);
    match h.service.approve(&request.id, &reviewer()) {
        Err(VisitServiceError::Guard(GuardViolation::ConcurrentUpdate { id })) => {
            assert_eq!(id, request.id)
        }
        other => panic!("expected concurrent update, got {other:?}"),
    }
    assert!(store.inner.recent(10).expect("audit readable").is_empty());
    assert!(store
        .inner
        .fetch_credential(&request.id)
        .expect("store readable")
        .is_none());
}

#[test]
fn lost_resubmission_race_withdraws_the_new_request() {
    let store = Arc::new(FlakyStore::default());
    let h = harness_with(
        store.clone(),
        Arc::new(MemoryNotifier::default()),
        Arc::new(JsonCredentialRenderer),
    );
    let original = h.rescheduled_visit();

    store.fail_next_updates(1);
    assert!(matches!(
        h.service.resubmit(&original.id, &client(), friend_draft()),
        Err(VisitServiceError::Guard(GuardViolation::ConcurrentUpdate { .. }))
    ));

    let orphan = h
        .service
        .get(&VisitRequestId("visit-000002".to_string()))
        .expect("orphan stored");
    assert_eq!(orphan.status, VisitStatus::Cancelled);
    assert!(h.service.pending_queue(10).expect("queue readable").is_empty());
}

#[test]
fn notification_failure_does_not_undo_approval() {
    let h = harness_with(
        Arc::new(crate::workflows::visits::MemoryRecordStore::new()),
        Arc::new(FailingNotifier),
        Arc::new(JsonCredentialRenderer),
    );
    let request = h.submit_friend_visit();

    let outcome = h
        .service
        .approve(&request.id, &reviewer())
        .expect("approval commits");
    assert_eq!(outcome.request.status, VisitStatus::Approved);
    assert!(outcome.credential.is_some());
    assert!(matches!(
        outcome.warnings.as_slice(),
        [SideEffectWarning::Notification(_)]
    ));
}

#[test]
fn audit_failure_is_reported_as_warning() {
    let store = Arc::new(FlakyStore::default());
    let h = harness_with(
        store.clone(),
        Arc::new(MemoryNotifier::default()),
        Arc::new(JsonCredentialRenderer),
    );
    let request = h.submit_friend_visit();

    store.set_fail_audit(true);
    let outcome = h
        .service
        .reject(&request.id, &reviewer(), "Incomplete documents")
        .expect("rejection commits");
    assert_eq!(outcome.request.status, VisitStatus::Rejected);
    assert!(matches!(
        outcome.warnings.as_slice(),
        [SideEffectWarning::Audit(_)]
    ));
}

#[test]
fn failed_issuance_can_be_reissued_later() {
    let store = Arc::new(FlakyStore::default());
    let h = harness_with(
        store.clone(),
        Arc::new(MemoryNotifier::default()),
        Arc::new(JsonCredentialRenderer),
    );
    let request = h.submit_friend_visit();

    store.set_fail_credentials(true);
    let outcome = h
        .service
        .approve(&request.id, &reviewer())
        .expect("approval commits");
    assert_eq!(outcome.request.status, VisitStatus::Approved);
    assert!(outcome.credential.is_none());
    assert!(matches!(
        outcome.warnings.as_slice(),
        [SideEffectWarning::CredentialPersistence(_)]
    ));

    store.set_fail_credentials(false);
    h.clock.advance(Duration::hours(2));
    let issued = h
        .service
        .reissue_credential(&request.id, &reviewer())
        .expect("reissue succeeds");
    assert_eq!(issued.credential.approved_at, local(today(), 9, 0));
    assert!(issued.rendering.is_some());

    let again = h
        .service
        .reissue_credential(&request.id, &reviewer())
        .expect("reissue is repeatable");
    assert_eq!(again.credential, issued.credential);
}

#[test]
fn rendering_failure_keeps_canonical_credential() {
    let h = harness_with(
        Arc::new(crate::workflows::visits::MemoryRecordStore::new()),
        Arc::new(MemoryNotifier::default()),
        Arc::new(FailingRenderer),
    );
    let request = h.submit_friend_visit();

    let outcome = h
        .service
        .approve(&request.id, &reviewer())
        .expect("approval commits");
    let issued = outcome.credential.expect("canonical record kept");
    assert!(issued.rendering.is_none());
    assert!(matches!(
        outcome.warnings.as_slice(),
        [SideEffectWarning::Rendering(_)]
    ));
    assert!(h
        .store
        .fetch_credential(&request.id)
        .expect("store readable")
        .is_some());

    assert!(matches!(
        h.service.reissue_credential(&request.id, &reviewer()),
        Err(VisitServiceError::Rendering(_))
    ));
}

#[test]
fn reissue_requires_an_approved_visit() {
    let h = harness();
    let request = h.submit_friend_visit();

    assert!(matches!(
        h.service.reissue_credential(&request.id, &reviewer()),
        Err(VisitServiceError::Guard(GuardViolation::InvalidTransition {
            action: VisitAction::ReissueCredential,
            ..
        }))
    ));
    assert!(matches!(
        h.service
            .reissue_credential(&VisitRequestId("visit-999999".to_string()), &reviewer()),
        Err(VisitServiceError::NotFound(_))
    ));
}

#[test]
fn reissue_names_the_reviewer_and_refuses_revoked_credentials() {
    let h = harness();
    let (request, _) = h.approved_visit();

    assert!(matches!(
        h.service
            .reissue_credential(&request.id, &ReviewerIdentity::new("  ")),
        Err(VisitServiceError::InvalidInput(_))
    ));
    h.service
        .reissue_credential(&request.id, &reviewer())
        .expect("valid credential reissues");

    h.service
        .revoke_credential(&request.id, &reviewer())
        .expect("revocation succeeds");
    match h.service.reissue_credential(&request.id, &reviewer()) {
        Err(VisitServiceError::Guard(GuardViolation::CredentialRevoked { id })) => {
            assert_eq!(id, request.id)
        }
        other => panic!("expected revoked credential refusal, got {other:?}"),
    }
}

#[test]
fn visit_time_with_seconds_round_trips_through_request_and_credential() {
    let h = harness();
    let draft: VisitDraft = serde_json::from_value(json!({
        "inmate_number": ACTIVE_INMATE,
        "visit_date": "2025-10-08",
        "visit_time": "10:00:30",
        "relationship": "Friend",
        "reason": "Weekly check-in"
    }))
    .expect("form parses");
    let stored = h
        .service
        .submit(&client(), draft)
        .expect("submission accepted")
        .request;
    assert_eq!(stored.visit_time, time(10, 0));

    let reloaded: VisitRequest =
        serde_json::from_value(serde_json::to_value(&stored).expect("serializes"))
            .expect("deserializes");
    assert_eq!(reloaded, stored);

    let issued = h
        .service
        .approve(&stored.id, &reviewer())
        .expect("approval commits")
        .credential
        .expect("credential issued");
    assert_eq!(issued.payload.visit_time, Some(issued.credential.visit_time));
    let presented: CredentialPayload =
        serde_json::from_value(serde_json::to_value(&issued.payload).expect("serializes"))
            .expect("deserializes");
    assert_eq!(presented, issued.payload);
}

#[test]
fn seconds_in_a_programmatic_draft_are_dropped() {
    let h = harness();
    let at = chrono::NaiveTime::from_hms_opt(10, 0, 30).expect("valid time");
    let stored = h
        .service
        .submit(&client(), draft(wednesday(), at, "Friend"))
        .expect("submission accepted")
        .request;
    assert_eq!(stored.visit_time, time(10, 0));
}

#[test]
fn client_history_is_newest_first_and_queue_oldest_first() {
    let h = harness();
    let first = h.submit_friend_visit();
    h.clock.advance(Duration::minutes(5));
    let second = h
        .service
        .submit(&client(), draft(friday(), time(11, 0), "Sister"))
        .expect("relative visit accepted")
        .request;
    h.clock.advance(Duration::minutes(5));
    let other = h
        .service
        .submit(&other_client(), draft(saturday(), time(9, 0), "Husband"))
        .expect("conjugal visit accepted")
        .request;

    let history = h.service.list_for_client("client-1").expect("history");
    let ids: Vec<_> = history.iter().map(|request| request.id.clone()).collect();
    assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);

    h.service
        .approve(&second.id, &reviewer())
        .expect("approval succeeds");
    let queue = h.service.pending_queue(10).expect("queue");
    let ids: Vec<_> = queue.iter().map(|request| request.id.clone()).collect();
    assert_eq!(ids, vec![first.id, other.id]);
    assert_eq!(h.service.pending_queue(1).expect("queue").len(), 1);
}

#[test]
fn committed_transitions_are_published() {
    let h = harness();
    let mut all = h.service.subscribe();
    let mut mine = h.service.subscribe_client("client-2");

    let (request, _) = h.approved_visit();

    let submitted = all.try_recv().expect("submitted event");
    assert_eq!(submitted.kind, VisitEventKind::Submitted);
    let approved = all.try_recv().expect("approved event");
    assert_eq!(approved.kind, VisitEventKind::Approved);
    assert_eq!(approved.visit_id, request.id);
    assert_eq!(approved.status, VisitStatus::Approved);
    assert!(all.try_recv().is_none());

    assert!(mine.try_recv().is_none());
}

#[test]
fn unknown_request_is_not_found() {
    let h = harness();
    assert!(matches!(
        h.service.get(&VisitRequestId("visit-404".to_string())),
        Err(VisitServiceError::NotFound(_))
    ));
    assert!(matches!(
        h.service
            .reject(&VisitRequestId("visit-404".to_string()), &reviewer(), "n/a"),
        Err(VisitServiceError::NotFound(_))
    ));
}
