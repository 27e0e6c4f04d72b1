use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::credential::{CredentialPayload, ScanDecision};
use super::domain::{ClientIdentity, ReviewerIdentity, VisitDraft, VisitRequestId, VisitStatusView};
use super::gateway::Notifier;
use super::policy::schedule_hint;
use super::repository::{AuditLogRepository, CredentialRepository, VisitRepository};
use super::service::{VisitLifecycleService, VisitServiceError};

type SharedService<S, N> = Arc<VisitLifecycleService<S, N>>;

const DEFAULT_LIMIT: usize = 50;

/// Router exposing the visit lifecycle, checkpoint scanning, and audit
/// queries over HTTP.
pub fn visit_router<S, N>(service: SharedService<S, N>) -> Router
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/visits",
            post(submit_handler::<S, N>).get(client_list_handler::<S, N>),
        )
        .route("/api/v1/visits/:visit_id", get(detail_handler::<S, N>))
        .route(
            "/api/v1/visits/:visit_id/approve",
            post(approve_handler::<S, N>),
        )
        .route(
            "/api/v1/visits/:visit_id/reject",
            post(reject_handler::<S, N>),
        )
        .route(
            "/api/v1/visits/:visit_id/reschedule",
            post(reschedule_handler::<S, N>),
        )
        .route(
            "/api/v1/visits/:visit_id/resubmit",
            post(resubmit_handler::<S, N>),
        )
        .route(
            "/api/v1/visits/:visit_id/cancel",
            post(cancel_handler::<S, N>),
        )
        .route(
            "/api/v1/visits/:visit_id/credential/reissue",
            post(reissue_handler::<S, N>),
        )
        .route(
            "/api/v1/visits/:visit_id/credential/revoke",
            post(revoke_handler::<S, N>),
        )
        .route("/api/v1/review/pending", get(pending_handler::<S, N>))
        .route("/api/v1/credentials/verify", post(verify_handler::<S, N>))
        .route("/api/v1/credentials/admit", post(admit_handler::<S, N>))
        .route("/api/v1/audit", get(audit_range_handler::<S, N>))
        .route("/api/v1/audit/recent", get(audit_recent_handler::<S, N>))
        .route(
            "/api/v1/audit/officer/:officer_name",
            get(audit_officer_handler::<S, N>),
        )
        .route("/api/v1/policy/schedule-hint", get(schedule_hint_handler))
        .with_state(service)
}

/// HTTP status for a service failure.
pub fn status_for(error: &VisitServiceError) -> StatusCode {
    match error {
        VisitServiceError::Validation(_) | VisitServiceError::InvalidInput(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        VisitServiceError::Guard(_) => StatusCode::CONFLICT,
        VisitServiceError::NotFound(_) | VisitServiceError::CredentialNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        VisitServiceError::Repository(_)
        | VisitServiceError::Registry(_)
        | VisitServiceError::Rendering(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: VisitServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_for(&error), Json(payload)).into_response()
}

fn scan_response(decision: ScanDecision) -> Response {
    let payload = match decision {
        ScanDecision::Admit { credential } => json!({
            "admitted": true,
            "message": "Entry granted.",
            "credential": credential,
        }),
        ScanDecision::Deny { reason } => json!({
            "admitted": false,
            "message": reason.message(),
            "denial": reason,
        }),
    };
    (StatusCode::OK, Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitBody {
    pub client: ClientIdentity,
    pub draft: VisitDraft,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionBody {
    pub officer_name: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClientBody {
    pub client: ClientIdentity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfficerBody {
    pub officer_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdmitBody {
    pub payload: CredentialPayload,
    pub scanned_by: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClientQuery {
    pub client_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HintQuery {
    pub relationship: String,
}

pub(crate) async fn submit_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Json(body): Json<SubmitBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.submit(&body.client, body.draft) {
        Ok(outcome) => (StatusCode::ACCEPTED, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn detail_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(visit_id): Path<String>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.get(&VisitRequestId(visit_id)) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn client_list_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<ClientQuery>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.list_for_client(&query.client_id) {
        Ok(requests) => {
            let views: Vec<VisitStatusView> =
                requests.iter().map(|request| request.status_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn pending_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.pending_queue(query.limit.unwrap_or(DEFAULT_LIMIT)) {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(visit_id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    let reviewer = ReviewerIdentity::new(body.officer_name);
    match service.approve(&VisitRequestId(visit_id), &reviewer) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(visit_id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    let reviewer = ReviewerIdentity::new(body.officer_name);
    match service.reject(&VisitRequestId(visit_id), &reviewer, &body.reason) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reschedule_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(visit_id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    let reviewer = ReviewerIdentity::new(body.officer_name);
    match service.reschedule(&VisitRequestId(visit_id), &reviewer, &body.reason) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn resubmit_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(visit_id): Path<String>,
    Json(body): Json<SubmitBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.resubmit(&VisitRequestId(visit_id), &body.client, body.draft) {
        Ok(outcome) => (StatusCode::ACCEPTED, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(visit_id): Path<String>,
    Json(body): Json<ClientBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.cancel(&VisitRequestId(visit_id), &body.client) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reissue_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(visit_id): Path<String>,
    Json(body): Json<OfficerBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    let reviewer = ReviewerIdentity::new(body.officer_name);
    match service.reissue_credential(&VisitRequestId(visit_id), &reviewer) {
        Ok(issued) => (StatusCode::OK, Json(issued)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn revoke_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(visit_id): Path<String>,
    Json(body): Json<OfficerBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    let reviewer = ReviewerIdentity::new(body.officer_name);
    match service.revoke_credential(&VisitRequestId(visit_id), &reviewer) {
        Ok(credential) => (StatusCode::OK, Json(credential)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Json(payload): Json<CredentialPayload>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.verify_credential(&payload) {
        Ok(decision) => scan_response(decision),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn admit_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Json(body): Json<AdmitBody>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.admit_credential(&body.payload, &body.scanned_by) {
        Ok(decision) => scan_response(decision),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn audit_range_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<RangeQuery>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.audit_between(query.from, query.to) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn audit_recent_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.audit_recent(query.limit.unwrap_or(DEFAULT_LIMIT)) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn audit_officer_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(officer_name): Path<String>,
) -> Response
where
    S: VisitRepository + CredentialRepository + AuditLogRepository + 'static,
    N: Notifier + 'static,
{
    match service.audit_by_officer(&officer_name) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn schedule_hint_handler(Query(query): Query<HintQuery>) -> Response {
    (StatusCode::OK, Json(schedule_hint(&query.relationship))).into_response()
}
