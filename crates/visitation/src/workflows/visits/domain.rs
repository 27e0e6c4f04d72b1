use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for visit requests. Assigned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitRequestId(pub String);

impl VisitRequestId {
    /// Placeholder carried by a request until the store assigns its id.
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a visit request.
///
/// Older records spell the reschedule state `"reschedule"`; the serde alias
/// and [`FromStr`] fold it into [`VisitStatus::Rescheduled`] so no other code
/// ever sees the legacy spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(alias = "reschedule")]
    Rescheduled,
    Cancelled,
}

impl VisitStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Pending,
            Self::Approved,
            Self::Rejected,
            Self::Rescheduled,
            Self::Cancelled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            VisitStatus::Pending => "pending",
            VisitStatus::Approved => "approved",
            VisitStatus::Rejected => "rejected",
            VisitStatus::Rescheduled => "rescheduled",
            VisitStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, VisitStatus::Pending)
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visit status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for VisitStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "rescheduled" | "reschedule" => Ok(Self::Rescheduled),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus(raw.to_string())),
        }
    }
}

/// Reviewer and client actions that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitAction {
    Approve,
    Reject,
    Reschedule,
    Resubmit,
    Cancel,
    ReissueCredential,
}

impl VisitAction {
    pub const fn label(self) -> &'static str {
        match self {
            VisitAction::Approve => "approve",
            VisitAction::Reject => "reject",
            VisitAction::Reschedule => "reschedule",
            VisitAction::Resubmit => "resubmit",
            VisitAction::Cancel => "cancel",
            VisitAction::ReissueCredential => "reissue the credential of",
        }
    }
}

impl fmt::Display for VisitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Visiting relative or friend, as identified by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl ClientIdentity {
    pub fn is_complete(&self) -> bool {
        !self.id.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// Staff member deciding on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerIdentity {
    pub name: String,
}

impl ReviewerIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Registry entry for a person deprived of liberty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InmateRecord {
    pub id: String,
    pub inmate_number: String,
    pub name: String,
    pub active: bool,
}

/// The client's visit form before policy validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitDraft {
    #[serde(default)]
    pub inmate_number: String,
    #[serde(default)]
    pub visit_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm::option")]
    pub visit_time: Option<NaiveTime>,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub reason: String,
}

impl VisitDraft {
    /// Prefill a form from an earlier request, as offered on resubmission.
    pub fn from_request(request: &VisitRequest) -> Self {
        Self {
            inmate_number: request.inmate_number.clone(),
            visit_date: Some(request.visit_date),
            visit_time: Some(request.visit_time),
            relationship: request.relationship.clone(),
            reason: request.reason.clone(),
        }
    }
}

/// A stored visit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRequest {
    pub id: VisitRequestId,
    pub client_id: String,
    pub client_name: String,
    pub client_email: String,
    pub inmate_id: String,
    pub inmate_number: String,
    pub inmate_name: String,
    pub visit_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub visit_time: NaiveTime,
    pub relationship: String,
    pub reason: String,
    pub status: VisitStatus,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub reschedule_reason: Option<String>,
    #[serde(default)]
    pub original_request_id: Option<VisitRequestId>,
    #[serde(default)]
    pub replaced_by: Option<VisitRequestId>,
    #[serde(default)]
    pub replaced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_replaced: bool,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token; bumped by the store on every write.
    #[serde(default)]
    pub revision: u64,
}

impl VisitRequest {
    /// Scheduled start of the visit in facility-local time.
    pub fn visit_datetime(&self) -> NaiveDateTime {
        self.visit_date.and_time(self.visit_time)
    }

    /// Reasons are present exactly for the status they explain.
    pub fn reasons_match_status(&self) -> bool {
        let rejected = self.status == VisitStatus::Rejected;
        let rescheduled = self.status == VisitStatus::Rescheduled;
        rejected == self.rejection_reason.is_some()
            && rescheduled == self.reschedule_reason.is_some()
    }

    pub fn decision_reason(&self) -> Option<&str> {
        match self.status {
            VisitStatus::Rejected => self.rejection_reason.as_deref(),
            VisitStatus::Rescheduled => self.reschedule_reason.as_deref(),
            _ => None,
        }
    }

    pub fn status_view(&self) -> VisitStatusView {
        VisitStatusView {
            id: self.id.clone(),
            status: self.status.label(),
            reviewed_by: self.reviewed_by.clone(),
            reason: self.decision_reason().map(str::to_string),
            is_replaced: self.is_replaced,
            replaced_by: self.replaced_by.clone(),
            original_request_id: self.original_request_id.clone(),
        }
    }
}

/// Compact status projection for list responses.
#[derive(Debug, Clone, Serialize)]
pub struct VisitStatusView {
    pub id: VisitRequestId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub is_replaced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<VisitRequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_request_id: Option<VisitRequestId>,
}

/// Canonical entry credential; one per approved visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCredential {
    pub visit_id: VisitRequestId,
    pub client_id: String,
    pub client_name: String,
    pub visit_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub visit_time: NaiveTime,
    pub inmate_name: String,
    pub approved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_valid: bool,
    #[serde(default)]
    pub scanned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scanned_by: Option<String>,
}

impl EntryCredential {
    pub fn visit_datetime(&self) -> NaiveDateTime {
        self.visit_date.and_time(self.visit_time)
    }

    pub fn is_consumed(&self) -> bool {
        self.scanned_at.is_some()
    }
}

/// Append-only record of a reviewer decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Store-assigned sequence number.
    pub id: u64,
    pub officer_name: String,
    pub action: VisitStatus,
    pub client_name: String,
    pub inmate_name: String,
    pub visit_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub visit_time: NaiveTime,
    pub purpose: String,
    pub relationship: String,
    pub visit_request_id: VisitRequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reschedule_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// `HH:MM` (24-hour) encoding for time-of-day fields. Seconds are accepted
/// on input and dropped.
pub mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map(truncate)
    }

    /// Drop seconds so a stored time equals its `HH:MM` encoding.
    pub fn truncate(time: NaiveTime) -> NaiveTime {
        time.with_second(0)
            .and_then(|time| time.with_nanosecond(0))
            .unwrap_or(time)
    }

    pub fn format(time: &NaiveTime) -> String {
        time.format(FORMAT).to_string()
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(time) => serializer.serialize_str(&super::format(time)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw {
                Some(value) if !value.trim().is_empty() => super::parse(&value)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}
