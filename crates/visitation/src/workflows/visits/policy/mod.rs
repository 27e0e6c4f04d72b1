//! Intake policy for visit requests.
//!
//! Checks run in a fixed order and stop at the first failure so the client
//! always sees one specific, correctable reason.

mod relationship;
mod schedule;

pub use relationship::{classify_relationship, RelationshipCategory, RelationshipClassification};
pub use schedule::{allowed_category, days_for, weekday_name, VisitingHours};

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use super::domain::{hhmm, InmateRecord, VisitDraft};
use super::gateway::{InmateRegistry, RegistryError};

/// User-correctable reasons a draft cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("no PDL is registered under inmate number '{inmate_number}'")]
    InmateNotFound { inmate_number: String },
    #[error("{name} is not currently accepting visits (inmate record is inactive)")]
    InmateInactive { name: String },
    #[error("visit date {date} is in the past; choose today or a later date")]
    DateInPast { date: NaiveDate },
    #[error("visit time {} is outside visiting hours (07:00 to 15:00)", .time.format("%H:%M"))]
    OutsideVisitingHours { time: NaiveTime },
    #[error("visits are not allowed on Mondays and Tuesdays ({} selected)", day_name(.weekday))]
    NoVisitDay { weekday: Weekday },
    #[error(
        "Wednesday is designated for friends only ({} selected). Relatives may visit on Thursday or Friday, and spouses on Saturday or Sunday.",
        day_name(.weekday)
    )]
    FriendsOnlyDay { weekday: Weekday },
    #[error(
        "Thursday and Friday are designated for relatives only ({} selected). Friends may visit on Wednesday, and spouses on Saturday or Sunday.",
        day_name(.weekday)
    )]
    RelativesOnlyDay { weekday: Weekday },
    #[error(
        "Saturday and Sunday are designated for conjugal visits only ({} selected). Friends may visit on Wednesday, and relatives on Thursday or Friday.",
        day_name(.weekday)
    )]
    ConjugalOnlyDay { weekday: Weekday },
    #[error(
        "relationship '{relationship}' is not recognized; describe the visitor as a friend, a relative (for example mother or cousin), or a spouse"
    )]
    UnclassifiedRelationship { relationship: String },
}

/// Validator failure: either a policy rule or the registry lookup itself.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error(transparent)]
    Violation(#[from] PolicyViolation),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// A draft that passed every intake rule, with the resolved inmate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedVisit {
    pub inmate: InmateRecord,
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub relationship: String,
    pub reason: String,
    pub category: RelationshipCategory,
}

/// Stateless intake validator.
#[derive(Debug, Clone, Default)]
pub struct PolicyValidator {
    hours: VisitingHours,
}

impl PolicyValidator {
    pub fn new() -> Self {
        Self {
            hours: VisitingHours::standard(),
        }
    }

    pub fn hours(&self) -> VisitingHours {
        self.hours
    }

    /// Validate a draft as of the facility-local calendar date `today`.
    pub fn validate(
        &self,
        draft: &VisitDraft,
        registry: &dyn InmateRegistry,
        today: NaiveDate,
    ) -> Result<ValidatedVisit, PolicyError> {
        let inmate_number = required_text(&draft.inmate_number, "inmate number")?;
        let visit_date = draft.visit_date.ok_or(PolicyViolation::MissingField {
            field: "visit date",
        })?;
        let visit_time = draft
            .visit_time
            .map(hhmm::truncate)
            .ok_or(PolicyViolation::MissingField {
                field: "visit time",
            })?;
        let relationship = required_text(&draft.relationship, "relationship")?;
        let reason = required_text(&draft.reason, "reason for visit")?;

        let inmate = registry
            .lookup(inmate_number)?
            .ok_or_else(|| PolicyViolation::InmateNotFound {
                inmate_number: inmate_number.to_string(),
            })?;
        if !inmate.active {
            return Err(PolicyViolation::InmateInactive { name: inmate.name }.into());
        }

        if visit_date < today {
            return Err(PolicyViolation::DateInPast { date: visit_date }.into());
        }

        if !self.hours.contains(visit_time) {
            return Err(PolicyViolation::OutsideVisitingHours { time: visit_time }.into());
        }

        let classification = classify_relationship(relationship);
        let category = schedule::check_day(visit_date, relationship, &classification)?;

        Ok(ValidatedVisit {
            inmate,
            visit_date,
            visit_time,
            relationship: relationship.to_string(),
            reason: reason.to_string(),
            category,
        })
    }
}

/// Which days a stated relationship may book, for display before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleHint {
    pub relationship: String,
    pub classification: RelationshipClassification,
    pub category: Option<RelationshipCategory>,
    pub days: Vec<&'static str>,
}

pub fn schedule_hint(relationship: &str) -> ScheduleHint {
    let classification = classify_relationship(relationship);
    let category = classification.sole();
    let days = category
        .map(|category| days_for(category).into_iter().map(weekday_name).collect())
        .unwrap_or_default();

    ScheduleHint {
        relationship: relationship.trim().to_string(),
        classification,
        category,
        days,
    }
}

fn required_text<'a>(value: &'a str, field: &'static str) -> Result<&'a str, PolicyViolation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(PolicyViolation::MissingField { field })
    } else {
        Ok(trimmed)
    }
}

fn day_name(weekday: &Weekday) -> &'static str {
    weekday_name(*weekday)
}
