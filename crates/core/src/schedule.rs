use serde::{Deserialize, Serialize};

use crate::course::ScheduleCourse;
use crate::custom_event::CustomEvent;
use crate::error::CoreError;
use crate::ids::CustomEventId;

/// A named set of courses and custom events. Custom events are held by id;
/// the event bodies live once in the owning collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub name: String,
    #[serde(default)]
    pub courses: Vec<ScheduleCourse>,
    #[serde(default)]
    pub custom_events: Vec<CustomEventId>,
    #[serde(default)]
    pub note: String,
}

impl Schedule {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn find_course(&self, section_code: &str, term: &str) -> Option<&ScheduleCourse> {
        self.courses.iter().find(|c| c.is_section(section_code, term))
    }

    pub fn has_course(&self, section_code: &str, term: &str) -> bool {
        self.find_course(section_code, term).is_some()
    }

    pub fn has_custom_event(&self, id: CustomEventId) -> bool {
        self.custom_events.contains(&id)
    }
}

/// Everything the persistence backend stores for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSaveState {
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub custom_events: Vec<CustomEvent>,
    #[serde(default)]
    pub current_schedule_index: usize,
}

impl ScheduleSaveState {
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn schedule_names(&self) -> Vec<&str> {
        self.schedules.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_state_json_roundtrip_keeps_shared_event_ids() {
        let mut first = Schedule::named("Schedule 1");
        first.courses.push(ScheduleCourse::new("34130", "2024-Fall"));
        first.custom_events.push(CustomEventId::new(3));
        let mut second = Schedule::named("Schedule 2");
        second.custom_events.push(CustomEventId::new(3));

        let state = ScheduleSaveState {
            schedules: vec![first, second],
            custom_events: Vec::new(),
            current_schedule_index: 1,
        };
        let text = state.to_json().unwrap();
        assert!(text.contains("\"currentScheduleIndex\":1"));
        let back = ScheduleSaveState::from_json(&text).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.schedule_names(), vec!["Schedule 1", "Schedule 2"]);
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        let err = ScheduleSaveState::from_json("{not json").unwrap_err();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
