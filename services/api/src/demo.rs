use crate::infra::{demo_registry, in_memory_service, parse_date, parse_time};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use clap::Args;
use std::sync::Arc;
use visitation::config::AppConfig;
use visitation::error::AppError;
use visitation::workflows::visits::policy::days_for;
use visitation::workflows::visits::{
    schedule_hint, ClientIdentity, Clock, FixedClock, PolicyValidator, ReviewerIdentity,
    ScanDecision, VisitDraft, VisitServiceError,
};

const DEMO_INMATE: &str = "PDL-1001";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Facility-local date the demo starts on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Relationship the demo visitor states on the request form.
    #[arg(long, default_value = "Friend")]
    pub(crate) relationship: String,
    /// Skip the reschedule and resubmission round trip.
    #[arg(long)]
    pub(crate) skip_reschedule: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PolicyCheckArgs {
    /// Relationship as the visitor would write it (e.g. "Mother", "Wife")
    #[arg(long)]
    pub(crate) relationship: String,
    /// Requested visit date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: NaiveDate,
    /// Requested visit time (HH:MM, facility-local)
    #[arg(long, value_parser = parse_time)]
    pub(crate) time: NaiveTime,
    /// Inmate number to look up in the demo roster
    #[arg(long, default_value = DEMO_INMATE)]
    pub(crate) inmate: String,
    /// Evaluation date for the past-date rule (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_policy_check(args: PolicyCheckArgs) -> Result<(), AppError> {
    let PolicyCheckArgs {
        relationship,
        date,
        time,
        inmate,
        today,
    } = args;

    let facility = AppConfig::load()?.facility;
    let today = today.unwrap_or_else(|| facility.local(Utc::now()).date());
    let draft = VisitDraft {
        inmate_number: inmate,
        visit_date: Some(date),
        visit_time: Some(time),
        relationship: relationship.clone(),
        reason: "Policy check".to_string(),
    };

    let hint = schedule_hint(&relationship);
    match &hint.category {
        Some(category) => println!(
            "'{}' is treated as {} and may book: {}",
            hint.relationship,
            category.label(),
            hint.days.join(", ")
        ),
        None => println!(
            "'{}' does not map to a single visiting category",
            hint.relationship
        ),
    }

    match PolicyValidator::new().validate(&draft, &demo_registry(), today) {
        Ok(validated) => println!(
            "Allowed: {} visit with {} on {} at {}",
            validated.category.label(),
            validated.inmate.name,
            validated.visit_date,
            validated.visit_time.format("%H:%M")
        ),
        Err(err) => match VisitServiceError::from(err) {
            VisitServiceError::Validation(violation) => println!("Not allowed: {violation}"),
            other => return Err(other.into()),
        },
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        relationship,
        skip_reschedule,
    } = args;

    let facility = AppConfig::load()?.facility;
    let today = today.unwrap_or_else(|| facility.local(Utc::now()).date());
    let clock = Arc::new(FixedClock::new(facility.to_utc(today.and_time(at(8, 0)))));
    let (service, notifier) =
        in_memory_service(facility.clone(), clock.clone() as Arc<dyn Clock>);

    let client = ClientIdentity {
        id: "demo-client".to_string(),
        name: "Maria Dela Cruz".to_string(),
        email: "maria@example.com".to_string(),
    };
    let reviewer = ReviewerIdentity::new("Officer Reyes");
    let checkpoint = "Main Gate";

    println!("Visitation lifecycle demo ({})", facility.name);
    println!("Starting {} at 08:00 facility time", today);

    let hint = schedule_hint(&relationship);
    let Some(category) = hint.category else {
        println!(
            "'{}' does not map to a single visiting category; try Friend, Mother, or Wife",
            hint.relationship
        );
        return Ok(());
    };
    println!(
        "'{}' visits are {} visits on {}",
        hint.relationship,
        category.label(),
        hint.days.join(", ")
    );

    let allowed = days_for(category);
    let visit_date = next_matching(today, |weekday| allowed.contains(&weekday));
    let closed_day = next_matching(today, |weekday| weekday == Weekday::Mon);

    println!("\nSubmitting for {} (a Monday)", closed_day);
    match service.submit(&client, draft(&relationship, closed_day, at(10, 0))) {
        Ok(outcome) => println!("- unexpectedly accepted as {}", outcome.request.id),
        Err(VisitServiceError::Validation(violation)) => println!("- refused: {violation}"),
        Err(err) => return Err(err.into()),
    }

    println!("\nSubmitting for {} at 10:00", visit_date);
    let mut request = service
        .submit(&client, draft(&relationship, visit_date, at(10, 0)))?
        .request;
    println!("- {} is {}", request.id, request.status);

    if !skip_reschedule {
        clock.advance(Duration::minutes(30));
        let rescheduled = service
            .reschedule(&request.id, &reviewer, "Morning slots are fully booked")?
            .request;
        println!(
            "- {} asked for a new time: {}",
            reviewer.name,
            rescheduled.decision_reason().unwrap_or_default()
        );

        clock.advance(Duration::minutes(30));
        request = service
            .resubmit(
                &rescheduled.id,
                &client,
                draft(&relationship, visit_date, at(13, 0)),
            )?
            .request;
        println!(
            "- resubmitted as {} for {} at 13:00",
            request.id, request.visit_date
        );
    }

    clock.advance(Duration::minutes(30));
    let approval = service.approve(&request.id, &reviewer)?;
    println!("\n{} approved {}", reviewer.name, approval.request.id);
    for warning in &approval.warnings {
        println!("- warning: {warning:?}");
    }
    let Some(issued) = approval.credential else {
        println!("- no credential was issued; run a reissue once the store recovers");
        return Ok(());
    };
    println!(
        "- credential honoured until {}",
        facility
            .local(issued.credential.expires_at)
            .format("%Y-%m-%d %H:%M")
    );
    if let Some(rendering) = &issued.rendering {
        println!("- QR content ({}): {}", rendering.media_type, rendering.content);
    }

    let visit_at = facility.to_utc(request.visit_datetime());
    println!("\nCheckpoint scans at {}", checkpoint);
    for (label, offset) in [
        ("45 minutes early", Duration::minutes(-45)),
        ("10 minutes early", Duration::minutes(-10)),
        ("replayed 5 minutes later", Duration::minutes(-5)),
    ] {
        clock.set(visit_at + offset);
        let decision = service.admit_credential(&issued.payload, checkpoint)?;
        println!("- {}: {}", label, describe(&decision));
    }

    println!("\nAudit trail (newest first)");
    for entry in service.audit_recent(10)? {
        println!(
            "- {} {} {} ({})",
            entry.timestamp.format("%Y-%m-%d %H:%M UTC"),
            entry.officer_name,
            entry.action,
            entry.visit_request_id
        );
    }

    println!("\nNotifications sent");
    for notification in notifier.events() {
        println!("- to {}: {}", notification.target_id, notification.title);
    }

    Ok(())
}

fn describe(decision: &ScanDecision) -> String {
    match decision {
        ScanDecision::Admit { credential } => format!(
            "admitted {} for {}",
            credential.client_name, credential.inmate_name
        ),
        ScanDecision::Deny { reason } => format!("denied. {}", reason.message()),
    }
}

fn draft(relationship: &str, visit_date: NaiveDate, visit_time: NaiveTime) -> VisitDraft {
    VisitDraft {
        inmate_number: DEMO_INMATE.to_string(),
        visit_date: Some(visit_date),
        visit_time: Some(visit_time),
        relationship: relationship.to_string(),
        reason: "Family update".to_string(),
    }
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// First date after `today` whose weekday passes `accept`.
fn next_matching(today: NaiveDate, accept: impl Fn(Weekday) -> bool) -> NaiveDate {
    (1..=7)
        .map(|days| today + Duration::days(days))
        .find(|date| accept(date.weekday()))
        .unwrap_or(today)
}
