//! Courses and custom events for tests.

use courseplan_core::{ClockTime, CustomEvent, CustomEventId, Days, FinalExam, Meeting, ScheduleCourse, TimeRange};

pub const TERM: &str = "2024-Fall";

pub const MWF: Days = [false, true, false, true, false, true, false];
pub const TTH: Days = [false, false, true, false, true, false, false];

fn time(text: &str) -> ClockTime {
    text.parse().unwrap_or_else(|e| panic!("bad fixture time {text}: {e}"))
}

/// A section with no details.
pub fn course(section_code: &str) -> ScheduleCourse {
    ScheduleCourse::new(section_code, TERM)
}

/// A section meeting on `days` from `start` to `end`, with a Thursday final.
pub fn lecture(section_code: &str, days: Days, start: &str, end: &str) -> ScheduleCourse {
    let mut course = course(section_code);
    course.dept_code = "I&C SCI".into();
    course.course_number = section_code.into();
    course.section_type = "Lec".into();
    course.instructors = vec!["STAFF".into()];
    course.meetings = vec![Meeting {
        days,
        time: Some(TimeRange::new(time(start), time(end)).unwrap_or_else(|e| panic!("{e}"))),
        location: "SSL 270".into(),
    }];
    course.final_exam = Some(FinalExam {
        day: 4,
        time: TimeRange::new(time("08:00"), time("10:00")).unwrap_or_else(|e| panic!("{e}")),
        location: "SSL 270".into(),
    });
    course
}

pub fn custom_event(id: u64, title: &str, days: Days, start: &str, end: &str) -> CustomEvent {
    CustomEvent::new(CustomEventId::new(id), title, time(start), time(end), days)
}
