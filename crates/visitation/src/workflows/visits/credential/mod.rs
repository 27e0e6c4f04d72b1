//! Entry credentials: the payload handed to an approved visitor and
//! re-presented at the checkpoint.

mod issuer;
mod verifier;

pub use issuer::{CredentialIssuer, IssuedCredential};
pub use verifier::{
    CredentialVerifier, ScanDecision, ScanDenial, EARLY_ENTRY_MINUTES, ENTRY_GRACE_MINUTES,
};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{hhmm, EntryCredential, VisitRequest, VisitRequestId};
use super::gateway::{CredentialRenderer, CredentialRendering, RenderError};
use crate::config::FacilityConfig;

pub const CREDENTIAL_STATUS: &str = "approved";

/// Wire shape of a credential. Crosses a trust boundary, so field names and
/// encodings are fixed. Older credentials may omit the optional fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    pub visit_id: VisitRequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub client_name: String,
    pub visit_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hhmm::option")]
    pub visit_time: Option<NaiveTime>,
    pub inmate_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CredentialPayload {
    pub fn from_credential(credential: &EntryCredential, facility: &FacilityConfig) -> Self {
        Self {
            visit_id: credential.visit_id.clone(),
            client_id: Some(credential.client_id.clone()),
            client_name: credential.client_name.clone(),
            visit_date: credential.visit_date,
            visit_time: Some(credential.visit_time),
            inmate_name: credential.inmate_name.clone(),
            approved_at: Some(credential.approved_at),
            expires_at: Some(credential.expires_at),
            status: Some(CREDENTIAL_STATUS.to_string()),
            facility: Some(facility.name.clone()),
            version: Some(facility.credential_version.clone()),
        }
    }

    /// Fields of the payload that disagree with the stored credential.
    pub fn mismatched_fields(&self, credential: &EntryCredential) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.client_name != credential.client_name {
            fields.push("clientName");
        }
        if self.inmate_name != credential.inmate_name {
            fields.push("inmateName");
        }
        if self.visit_date != credential.visit_date {
            fields.push("visitDate");
        }
        fields
    }
}

/// Canonical credential for an approved request.
pub fn canonical_credential(
    request: &VisitRequest,
    approved_at: DateTime<Utc>,
    facility: &FacilityConfig,
) -> EntryCredential {
    EntryCredential {
        visit_id: request.id.clone(),
        client_id: request.client_id.clone(),
        client_name: request.client_name.clone(),
        visit_date: request.visit_date,
        visit_time: request.visit_time,
        inmate_name: request.inmate_name.clone(),
        approved_at,
        expires_at: credential_expiry(request.visit_date, facility),
        is_valid: true,
        scanned_at: None,
        scanned_by: None,
    }
}

/// End of the visit's calendar day at the facility: local midnight of the
/// visit date plus 24 hours.
pub fn credential_expiry(visit_date: NaiveDate, facility: &FacilityConfig) -> DateTime<Utc> {
    facility.to_utc(visit_date.and_time(NaiveTime::MIN)) + Duration::hours(24)
}

/// Renders the payload as its JSON text, the exact content a QR encoder
/// would embed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCredentialRenderer;

impl CredentialRenderer for JsonCredentialRenderer {
    fn encode(&self, payload: &CredentialPayload) -> Result<CredentialRendering, RenderError> {
        let content =
            serde_json::to_string(payload).map_err(|err| RenderError::Encoding(err.to_string()))?;
        Ok(CredentialRendering {
            media_type: "application/json".to_string(),
            content,
        })
    }
}
