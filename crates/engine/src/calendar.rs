//! Calendar views of the active schedule.

use courseplan_core::time::active_days;
use courseplan_core::{ClockTime, CustomEvent, CustomEventId, ScheduleCourse, SectionKey};

use crate::collection::ScheduleCollection;

/// One block on the weekly calendar. `day` is Sunday = 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarEvent {
    Course {
        section: SectionKey,
        title: String,
        section_type: String,
        instructors: Vec<String>,
        location: String,
        color: String,
        day: usize,
        start: ClockTime,
        end: ClockTime,
    },
    Final {
        section: SectionKey,
        title: String,
        location: String,
        color: String,
        day: usize,
        start: ClockTime,
        end: ClockTime,
    },
    Custom {
        custom_event_id: CustomEventId,
        title: String,
        building: Option<String>,
        color: String,
        day: usize,
        start: ClockTime,
        end: ClockTime,
    },
}

impl CalendarEvent {
    pub fn day(&self) -> usize {
        match self {
            Self::Course { day, .. } | Self::Final { day, .. } | Self::Custom { day, .. } => *day,
        }
    }

    pub fn start(&self) -> ClockTime {
        match self {
            Self::Course { start, .. } | Self::Final { start, .. } | Self::Custom { start, .. } => {
                *start
            }
        }
    }

    pub fn end(&self) -> ClockTime {
        match self {
            Self::Course { end, .. } | Self::Final { end, .. } | Self::Custom { end, .. } => *end,
        }
    }

    pub fn color(&self) -> &str {
        match self {
            Self::Course { color, .. } | Self::Final { color, .. } | Self::Custom { color, .. } => {
                color
            }
        }
    }
}

/// Calendar blocks for every timed meeting of `course`. TBA meetings are skipped.
pub fn course_blocks(course: &ScheduleCourse) -> Vec<CalendarEvent> {
    let title = course.display_title();
    course
        .timed_meetings()
        .flat_map(|(meeting, time)| {
            let title = title.clone();
            active_days(&meeting.days).map(move |day| CalendarEvent::Course {
                section: course.key(),
                title: title.clone(),
                section_type: course.section_type.clone(),
                instructors: course.instructors.clone(),
                location: meeting.location.clone(),
                color: course.color.clone(),
                day,
                start: time.start,
                end: time.end,
            })
        })
        .collect()
}

pub fn final_block(course: &ScheduleCourse) -> Option<CalendarEvent> {
    let exam = course.final_exam.as_ref()?;
    Some(CalendarEvent::Final {
        section: course.key(),
        title: course.display_title(),
        location: exam.location.clone(),
        color: course.color.clone(),
        day: usize::from(exam.day),
        start: exam.time.start,
        end: exam.time.end,
    })
}

pub fn custom_blocks(event: &CustomEvent) -> Vec<CalendarEvent> {
    active_days(&event.days)
        .map(|day| CalendarEvent::Custom {
            custom_event_id: event.custom_event_id,
            title: event.title.clone(),
            building: event.building.clone(),
            color: event.color.clone(),
            day,
            start: event.start,
            end: event.end,
        })
        .collect()
}

impl ScheduleCollection {
    pub fn get_calendarized_course_events(&self) -> Vec<CalendarEvent> {
        self.get_current_courses()
            .iter()
            .flat_map(course_blocks)
            .collect()
    }

    pub fn get_calendarized_custom_events(&self) -> Vec<CalendarEvent> {
        self.custom_events_in(self.get_current_schedule_index())
            .into_iter()
            .flat_map(custom_blocks)
            .collect()
    }

    /// Course meetings followed by custom events of the active schedule.
    pub fn get_calendarized_events(&self) -> Vec<CalendarEvent> {
        let mut events = self.get_calendarized_course_events();
        events.extend(self.get_calendarized_custom_events());
        events
    }

    pub fn get_calendarized_finals(&self) -> Vec<CalendarEvent> {
        self.get_current_courses()
            .iter()
            .filter_map(final_block)
            .collect()
    }

    pub fn get_events_with_finals(&self) -> Vec<CalendarEvent> {
        let mut events = self.get_calendarized_events();
        events.extend(self.get_calendarized_finals());
        events
    }
}
