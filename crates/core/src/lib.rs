pub mod action;
pub mod course;
pub mod custom_event;
pub mod error;
pub mod ids;
pub mod names;
pub mod schedule;
pub mod time;

pub use action::Action;
pub use course::{FinalExam, Meeting, ScheduleCourse};
pub use custom_event::CustomEvent;
pub use error::CoreError;
pub use ids::*;
pub use schedule::{Schedule, ScheduleSaveState};
pub use time::{ClockTime, Days, TimeRange};
