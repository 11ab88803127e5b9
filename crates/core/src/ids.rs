use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a custom event, unique across a whole schedule collection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomEventId(u64);

impl CustomEventId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// The id immediately after this one.
    pub fn successor(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for CustomEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomEventId({})", self.0)
    }
}

impl fmt::Display for CustomEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CustomEventId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A course section within a term. Unique per schedule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionKey {
    pub section_code: String,
    pub term: String,
}

impl SectionKey {
    pub fn new(section_code: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            section_code: section_code.into(),
            term: term.into(),
        }
    }

    pub fn matches(&self, section_code: &str, term: &str) -> bool {
        self.section_code == section_code && self.term == term
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.section_code, self.term)
    }
}
