use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

use super::relationship::{RelationshipCategory, RelationshipClassification};
use super::PolicyViolation;

/// Daily window in which visits may be booked (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitingHours {
    pub opens: NaiveTime,
    pub closes: NaiveTime,
}

impl VisitingHours {
    pub fn standard() -> Self {
        Self {
            opens: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            closes: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.opens && time <= self.closes
    }
}

impl Default for VisitingHours {
    fn default() -> Self {
        Self::standard()
    }
}

/// The relationship category a weekday is reserved for. Monday and Tuesday
/// admit no visits at all.
pub fn allowed_category(weekday: Weekday) -> Option<RelationshipCategory> {
    match weekday {
        Weekday::Mon | Weekday::Tue => None,
        Weekday::Wed => Some(RelationshipCategory::Friend),
        Weekday::Thu | Weekday::Fri => Some(RelationshipCategory::Relative),
        Weekday::Sat | Weekday::Sun => Some(RelationshipCategory::Conjugal),
    }
}

/// Weekdays on which a category may visit.
pub fn days_for(category: RelationshipCategory) -> Vec<Weekday> {
    [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
    .into_iter()
    .filter(|weekday| allowed_category(*weekday) == Some(category))
    .collect()
}

pub const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub(crate) fn check_day(
    date: NaiveDate,
    relationship: &str,
    classification: &RelationshipClassification,
) -> Result<RelationshipCategory, PolicyViolation> {
    let weekday = date.weekday();
    let Some(required) = allowed_category(weekday) else {
        return Err(PolicyViolation::NoVisitDay { weekday });
    };

    if classification.sole() == Some(required) {
        return Ok(required);
    }

    // Report the visitor's own category when it conflicts with the day, so a
    // friend booking a Thursday is pointed at Wednesday.
    let conflicting = [
        RelationshipCategory::Friend,
        RelationshipCategory::Relative,
        RelationshipCategory::Conjugal,
    ]
    .into_iter()
    .find(|category| *category != required && classification.matches(*category));

    match conflicting {
        Some(category) => Err(designated_day_violation(category, weekday)),
        None if required != RelationshipCategory::Conjugal => {
            Err(PolicyViolation::UnclassifiedRelationship {
                relationship: relationship.to_string(),
            })
        }
        None => Err(designated_day_violation(required, weekday)),
    }
}

fn designated_day_violation(category: RelationshipCategory, weekday: Weekday) -> PolicyViolation {
    match category {
        RelationshipCategory::Friend => PolicyViolation::FriendsOnlyDay { weekday },
        RelationshipCategory::Relative => PolicyViolation::RelativesOnlyDay { weekday },
        RelationshipCategory::Conjugal => PolicyViolation::ConjugalOnlyDay { weekday },
    }
}
