use serde::{Deserialize, Serialize};

use crate::ids::SectionKey;
use crate::time::{Days, TimeRange};

/// One recurring meeting of a section. `time: None` means the time is TBA.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub days: Days,
    #[serde(default)]
    pub time: Option<TimeRange>,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalExam {
    /// Day of week, Sunday = 0.
    pub day: u8,
    pub time: TimeRange,
    #[serde(default)]
    pub location: String,
}

/// A section added to a schedule. `(section_code, term)` is unique within a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleCourse {
    pub section_code: String,
    pub term: String,
    pub color: String,
    pub dept_code: String,
    pub course_number: String,
    pub course_title: String,
    pub section_type: String,
    pub instructors: Vec<String>,
    pub meetings: Vec<Meeting>,
    pub final_exam: Option<FinalExam>,
}

impl ScheduleCourse {
    pub fn new(section_code: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            section_code: section_code.into(),
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> SectionKey {
        SectionKey::new(self.section_code.clone(), self.term.clone())
    }

    pub fn is_section(&self, section_code: &str, term: &str) -> bool {
        self.section_code == section_code && self.term == term
    }

    /// Display title used on calendar entries, e.g. `I&C SCI 31`.
    pub fn display_title(&self) -> String {
        match (self.dept_code.is_empty(), self.course_number.is_empty()) {
            (false, false) => format!("{} {}", self.dept_code, self.course_number),
            (false, true) => self.dept_code.clone(),
            _ => self.section_code.clone(),
        }
    }

    pub fn timed_meetings(&self) -> impl Iterator<Item = (&Meeting, TimeRange)> {
        self.meetings
            .iter()
            .filter_map(|meeting| meeting.time.map(|time| (meeting, time)))
    }
}
