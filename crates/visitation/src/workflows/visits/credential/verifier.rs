use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{canonical_credential, CredentialPayload};
use crate::config::FacilityConfig;
use crate::workflows::visits::domain::{EntryCredential, VisitRequest, VisitStatus};
use crate::workflows::visits::repository::{
    CredentialRepository, RepositoryError, VisitRepository,
};

/// Minutes before the scheduled start from which a credential is honoured.
pub const EARLY_ENTRY_MINUTES: i64 = 15;
/// Minutes after the scheduled start until which a credential is honoured.
pub const ENTRY_GRACE_MINUTES: i64 = 60;

/// Outcome of checking a presented credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDecision {
    Admit { credential: EntryCredential },
    Deny { reason: ScanDenial },
}

impl ScanDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, ScanDecision::Admit { .. })
    }

    pub fn denial(&self) -> Option<&ScanDenial> {
        match self {
            ScanDecision::Admit { .. } => None,
            ScanDecision::Deny { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ScanDenial {
    NotFound,
    NotApproved {
        status: VisitStatus,
    },
    DataMismatch {
        fields: Vec<&'static str>,
    },
    Invalidated,
    TooEarly {
        allowed_from: NaiveDateTime,
    },
    Expired {
        scheduled_for: NaiveDateTime,
        honoured_until: NaiveDateTime,
    },
    AlreadyUsed {
        scanned_at: DateTime<Utc>,
        scanned_by: Option<String>,
    },
}

impl ScanDenial {
    /// Message shown to the checkpoint officer.
    pub fn message(&self) -> String {
        match self {
            ScanDenial::NotFound => "No visit request matches this credential.".to_string(),
            ScanDenial::NotApproved { status } => {
                format!("This visit has not been approved (current status: {status}).")
            }
            ScanDenial::DataMismatch { fields } => format!(
                "Credential details do not match the approved visit ({}).",
                fields.join(", ")
            ),
            ScanDenial::Invalidated => "This credential has been revoked.".to_string(),
            ScanDenial::TooEarly { allowed_from } => format!(
                "Too early for this visit. Entry opens at {}.",
                allowed_from.format("%Y-%m-%d %H:%M")
            ),
            ScanDenial::Expired { scheduled_for, .. } => format!(
                "This credential has expired. The visit was scheduled for {}.",
                scheduled_for.format("%Y-%m-%d %H:%M")
            ),
            ScanDenial::AlreadyUsed {
                scanned_at,
                scanned_by,
            } => match scanned_by {
                Some(officer) => format!(
                    "This credential was already used at {} (scanned by {officer}).",
                    scanned_at.format("%Y-%m-%d %H:%M UTC")
                ),
                None => format!(
                    "This credential was already used at {}.",
                    scanned_at.format("%Y-%m-%d %H:%M UTC")
                ),
            },
        }
    }
}

enum Resolution {
    Found(EntryCredential),
    Denied(ScanDenial),
}

/// Checks presented payloads against the canonical credential record.
///
/// The payload is only trusted as a key: every decision is taken against the
/// stored credential. Payloads issued before canonical records existed are
/// honoured once by synthesizing the record from the approved request.
pub struct CredentialVerifier<S> {
    store: Arc<S>,
    facility: FacilityConfig,
}

impl<S> CredentialVerifier<S>
where
    S: CredentialRepository + VisitRepository,
{
    pub fn new(store: Arc<S>, facility: FacilityConfig) -> Self {
        Self { store, facility }
    }

    pub fn verify(
        &self,
        payload: &CredentialPayload,
        now: DateTime<Utc>,
    ) -> Result<ScanDecision, RepositoryError> {
        let credential = match self.resolve(payload, now)? {
            Resolution::Found(credential) => credential,
            Resolution::Denied(reason) => return Ok(ScanDecision::Deny { reason }),
        };

        Ok(self.evaluate(credential, now))
    }

    /// Apply the validity, time window, and replay rules to a stored record.
    pub fn evaluate(&self, credential: EntryCredential, now: DateTime<Utc>) -> ScanDecision {
        if !credential.is_valid {
            return ScanDecision::Deny {
                reason: ScanDenial::Invalidated,
            };
        }

        let scheduled_for = credential.visit_datetime();
        let allowed_from = scheduled_for - Duration::minutes(EARLY_ENTRY_MINUTES);
        let honoured_until = scheduled_for + Duration::minutes(ENTRY_GRACE_MINUTES);
        let local_now = self.facility.local(now);

        if local_now < allowed_from {
            return ScanDecision::Deny {
                reason: ScanDenial::TooEarly { allowed_from },
            };
        }
        if local_now > honoured_until {
            return ScanDecision::Deny {
                reason: ScanDenial::Expired {
                    scheduled_for,
                    honoured_until,
                },
            };
        }

        if let Some(scanned_at) = credential.scanned_at {
            return ScanDecision::Deny {
                reason: ScanDenial::AlreadyUsed {
                    scanned_at,
                    scanned_by: credential.scanned_by,
                },
            };
        }

        ScanDecision::Admit { credential }
    }

    fn resolve(
        &self,
        payload: &CredentialPayload,
        now: DateTime<Utc>,
    ) -> Result<Resolution, RepositoryError> {
        if let Some(credential) = self.store.fetch_credential(&payload.visit_id)? {
            let fields = payload.mismatched_fields(&credential);
            if !fields.is_empty() {
                debug!(visit_id = %payload.visit_id, ?fields, "credential payload mismatch");
                return Ok(Resolution::Denied(ScanDenial::DataMismatch { fields }));
            }
            return Ok(Resolution::Found(credential));
        }

        let Some(request) = self.store.fetch(&payload.visit_id)? else {
            return Ok(Resolution::Denied(ScanDenial::NotFound));
        };
        if request.status != VisitStatus::Approved {
            return Ok(Resolution::Denied(ScanDenial::NotApproved {
                status: request.status,
            }));
        }
        let fields = request_mismatches(payload, &request);
        if !fields.is_empty() {
            return Ok(Resolution::Denied(ScanDenial::DataMismatch { fields }));
        }

        let approved_at = request.reviewed_at.unwrap_or(now);
        let credential = canonical_credential(&request, approved_at, &self.facility);
        match self.store.insert_if_absent(credential) {
            Ok(credential) => {
                info!(visit_id = %request.id, "created canonical credential for legacy payload");
                Ok(Resolution::Found(credential))
            }
            // Another checkpoint created it first.
            Err(RepositoryError::Conflict) => self
                .store
                .fetch_credential(&request.id)?
                .map(Resolution::Found)
                .ok_or(RepositoryError::NotFound),
            Err(err) => Err(err),
        }
    }
}

fn request_mismatches(payload: &CredentialPayload, request: &VisitRequest) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if payload.client_name != request.client_name {
        fields.push("clientName");
    }
    if payload.inmate_name != request.inmate_name {
        fields.push("inmateName");
    }
    if payload.visit_date != request.visit_date {
        fields.push("visitDate");
    }
    fields
}
