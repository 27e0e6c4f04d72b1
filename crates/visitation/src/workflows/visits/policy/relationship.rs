use serde::{Deserialize, Serialize};

/// Category a visitor's stated relationship falls into; each category owns
/// specific visiting days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipCategory {
    Friend,
    Relative,
    Conjugal,
}

impl RelationshipCategory {
    pub const fn label(self) -> &'static str {
        match self {
            RelationshipCategory::Friend => "friend",
            RelationshipCategory::Relative => "relative",
            RelationshipCategory::Conjugal => "conjugal",
        }
    }
}

const FRIEND_TERMS: [&str; 1] = ["friend"];

const CONJUGAL_TERMS: [&str; 3] = ["spouse", "wife", "husband"];

const RELATIVE_TERMS: [&str; 16] = [
    "brother",
    "sister",
    "mother",
    "father",
    "son",
    "daughter",
    "parent",
    "child",
    "sibling",
    "relative",
    "aunt",
    "uncle",
    "cousin",
    "grandparent",
    "grandson",
    "granddaughter",
];

/// Which category vocabularies the relationship text matched.
///
/// Matching is a case-insensitive substring test, so one text can hit more
/// than one vocabulary ("boyfriend's brother"). Day rules only accept a text
/// that matches exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipClassification {
    pub friend: bool,
    pub relative: bool,
    pub conjugal: bool,
}

impl RelationshipClassification {
    pub fn matches(&self, category: RelationshipCategory) -> bool {
        match category {
            RelationshipCategory::Friend => self.friend,
            RelationshipCategory::Relative => self.relative,
            RelationshipCategory::Conjugal => self.conjugal,
        }
    }

    /// The single matched category, if the text matched exactly one.
    pub fn sole(&self) -> Option<RelationshipCategory> {
        match (self.friend, self.relative, self.conjugal) {
            (true, false, false) => Some(RelationshipCategory::Friend),
            (false, true, false) => Some(RelationshipCategory::Relative),
            (false, false, true) => Some(RelationshipCategory::Conjugal),
            _ => None,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        !(self.friend || self.relative || self.conjugal)
    }

    pub fn categories(&self) -> Vec<RelationshipCategory> {
        [
            RelationshipCategory::Friend,
            RelationshipCategory::Relative,
            RelationshipCategory::Conjugal,
        ]
        .into_iter()
        .filter(|category| self.matches(*category))
        .collect()
    }
}

pub fn classify_relationship(text: &str) -> RelationshipClassification {
    let normalized = text.trim().to_lowercase();
    let contains_any = |terms: &[&str]| terms.iter().any(|term| normalized.contains(term));

    RelationshipClassification {
        friend: contains_any(&FRIEND_TERMS),
        relative: contains_any(&RELATIVE_TERMS),
        conjugal: contains_any(&CONJUGAL_TERMS),
    }
}
