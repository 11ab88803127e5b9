use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::CustomEventId;
use crate::time::{ClockTime, Days, TimeRange};

/// A user-defined recurring calendar entry. One event may appear in several
/// schedules at once; `schedule_indices` lists the schedules it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEvent {
    pub custom_event_id: CustomEventId,
    pub title: String,
    pub start: ClockTime,
    pub end: ClockTime,
    pub days: Days,
    pub color: String,
    #[serde(default)]
    pub schedule_indices: BTreeSet<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
}

impl CustomEvent {
    pub fn new(
        custom_event_id: CustomEventId,
        title: impl Into<String>,
        start: ClockTime,
        end: ClockTime,
        days: Days,
    ) -> Self {
        Self {
            custom_event_id,
            title: title.into(),
            start,
            end,
            days,
            color: String::new(),
            schedule_indices: BTreeSet::new(),
            building: None,
        }
    }

    /// The event's time as a range, or `None` when `end` is not after `start`.
    pub fn time_range(&self) -> Option<TimeRange> {
        TimeRange::new(self.start, self.end).ok()
    }

    /// Replace every user-editable field with `edited`'s, keeping the id and
    /// schedule membership.
    pub fn apply_edit(&mut self, edited: &CustomEvent) {
        self.title = edited.title.clone();
        self.start = edited.start;
        self.end = edited.end;
        self.days = edited.days;
        self.color = edited.color.clone();
        self.building = edited.building.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_is_camel_case() {
        let event = CustomEvent::new(
            CustomEventId::new(7),
            "Gym",
            "07:00".parse().unwrap(),
            "08:00".parse().unwrap(),
            [false, true, false, true, false, true, false],
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["customEventId"], 7);
        assert_eq!(json["start"], "07:00");
        assert_eq!(json["scheduleIndices"], serde_json::json!([]));
        assert!(json.get("building").is_none());
    }

    #[test]
    fn inverted_times_have_no_range() {
        let event = CustomEvent::new(
            CustomEventId::new(1),
            "Odd",
            "10:00".parse().unwrap(),
            "09:00".parse().unwrap(),
            [true; 7],
        );
        assert!(event.time_range().is_none());
    }
}
