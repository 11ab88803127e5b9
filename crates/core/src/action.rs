use serde::{Deserialize, Serialize};

use crate::course::ScheduleCourse;
use crate::custom_event::CustomEvent;
use crate::error::CoreError;
use crate::ids::CustomEventId;

/// A recorded schedule mutation, carrying exactly what is needed to execute
/// it again. Serialized as `{"type": "<tag>", ...fields}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    AddCourse {
        course: ScheduleCourse,
        /// Equal to the schedule count to mean "every schedule".
        schedule_index: usize,
    },
    DeleteCourse {
        section_code: String,
        term: String,
    },
    AddCustomEvent {
        custom_event: CustomEvent,
        schedule_indices: Vec<usize>,
    },
    DeleteCustomEvent {
        custom_event_id: CustomEventId,
    },
    EditCustomEvent {
        edited_custom_event: CustomEvent,
        new_schedule_indices: Vec<usize>,
    },
    ChangeCustomEventColor {
        custom_event_id: CustomEventId,
        new_color: String,
    },
    ChangeCourseColor {
        section_code: String,
        term: String,
        new_color: String,
    },
    ClearSchedule,
    AddSchedule {
        new_schedule_name: String,
    },
    RenameSchedule {
        schedule_index: usize,
        new_schedule_name: String,
    },
    DeleteSchedule {
        schedule_index: usize,
    },
    CopySchedule {
        schedule_index: usize,
        new_schedule_name: String,
    },
    UpdateScheduleNote {
        schedule_index: usize,
        new_schedule_note: String,
    },
    #[serde(rename = "undoAction")]
    Undo,
}

impl Action {
    pub const TAGS: [&'static str; 14] = [
        "addCourse",
        "deleteCourse",
        "addCustomEvent",
        "deleteCustomEvent",
        "editCustomEvent",
        "changeCustomEventColor",
        "changeCourseColor",
        "clearSchedule",
        "addSchedule",
        "renameSchedule",
        "deleteSchedule",
        "copySchedule",
        "updateScheduleNote",
        "undoAction",
    ];

    /// The `type` tag this action is stored under.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AddCourse { .. } => "addCourse",
            Self::DeleteCourse { .. } => "deleteCourse",
            Self::AddCustomEvent { .. } => "addCustomEvent",
            Self::DeleteCustomEvent { .. } => "deleteCustomEvent",
            Self::EditCustomEvent { .. } => "editCustomEvent",
            Self::ChangeCustomEventColor { .. } => "changeCustomEventColor",
            Self::ChangeCourseColor { .. } => "changeCourseColor",
            Self::ClearSchedule => "clearSchedule",
            Self::AddSchedule { .. } => "addSchedule",
            Self::RenameSchedule { .. } => "renameSchedule",
            Self::DeleteSchedule { .. } => "deleteSchedule",
            Self::CopySchedule { .. } => "copySchedule",
            Self::UpdateScheduleNote { .. } => "updateScheduleNote",
            Self::Undo => "undoAction",
        }
    }

    pub fn is_known_tag(tag: &str) -> bool {
        Self::TAGS.contains(&tag)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Decode one record of a stored action array.
    pub fn from_record(record: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(record).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}
