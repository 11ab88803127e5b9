//! Meeting-time overlap detection for the active schedule.

use courseplan_core::time::shares_day;
use courseplan_core::{CustomEventId, Days, Meeting, SectionKey, TimeRange};

use crate::collection::ScheduleCollection;

/// Something on the calendar that a candidate can clash with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Occupant {
    Course(SectionKey),
    CustomEvent(CustomEventId),
}

/// Two occupants of the active schedule whose times overlap on a shared day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub first: Occupant,
    pub second: Occupant,
}

struct Slot {
    occupant: Occupant,
    days: Days,
    time: TimeRange,
}

fn clashes(days: &Days, time: &TimeRange, slot: &Slot) -> bool {
    shares_day(days, &slot.days) && time.overlaps(&slot.time)
}

impl ScheduleCollection {
    fn occupied_slots(&self) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .get_current_courses()
            .iter()
            .flat_map(|course| {
                course.timed_meetings().map(move |(meeting, time)| Slot {
                    occupant: Occupant::Course(course.key()),
                    days: meeting.days,
                    time,
                })
            })
            .collect();
        slots.extend(
            self.custom_events_in(self.get_current_schedule_index())
                .into_iter()
                .filter_map(|event| {
                    Some(Slot {
                        occupant: Occupant::CustomEvent(event.custom_event_id),
                        days: event.days,
                        time: event.time_range()?,
                    })
                }),
        );
        slots
    }

    /// Whether any timed `candidate` meeting overlaps a course meeting or a
    /// custom event of the active schedule. Meetings of `candidate_key`
    /// itself are ignored.
    pub fn conflicts_with(&self, candidate: &[Meeting], candidate_key: &SectionKey) -> bool {
        let slots = self.occupied_slots();
        candidate
            .iter()
            .filter_map(|meeting| meeting.time.map(|time| (meeting.days, time)))
            .any(|(days, time)| {
                slots.iter().any(|slot| {
                    !matches!(&slot.occupant, Occupant::Course(key) if key == candidate_key)
                        && clashes(&days, &time, slot)
                })
            })
    }

    /// Every overlapping pair in the active schedule, each reported once.
    pub fn schedule_conflicts(&self) -> Vec<Conflict> {
        let slots = self.occupied_slots();
        let mut conflicts: Vec<Conflict> = Vec::new();
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                if a.occupant == b.occupant || !clashes(&a.days, &a.time, b) {
                    continue;
                }
                let (first, second) = if a.occupant <= b.occupant {
                    (a.occupant.clone(), b.occupant.clone())
                } else {
                    (b.occupant.clone(), a.occupant.clone())
                };
                let conflict = Conflict { first, second };
                if !conflicts.contains(&conflict) {
                    conflicts.push(conflict);
                }
            }
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use courseplan_core::{ClockTime, CustomEvent, ScheduleCourse};

    const MW: Days = [false, true, false, true, false, false, false];
    const TTH: Days = [false, false, true, false, true, false, false];

    fn meeting(days: Days, start: &str, end: &str) -> Meeting {
        Meeting {
            days,
            time: Some(TimeRange::parse(start, end).unwrap()),
            location: String::new(),
        }
    }

    fn course(code: &str, meetings: Vec<Meeting>) -> ScheduleCourse {
        let mut course = ScheduleCourse::new(code, "2024-Fall");
        course.meetings = meetings;
        course
    }

    fn collection() -> ScheduleCollection {
        let mut c = ScheduleCollection::new(&EngineConfig::default());
        c.add_course(course("100", vec![meeting(MW, "10:00", "10:50")]), 0)
            .unwrap();
        c
    }

    #[test]
    fn overlapping_candidate_conflicts() {
        let c = collection();
        let key = SectionKey::new("200", "2024-Fall");
        assert!(c.conflicts_with(&[meeting(MW, "10:30", "11:20")], &key));
        assert!(!c.conflicts_with(&[meeting(TTH, "10:30", "11:20")], &key));
        // Back-to-back is not a conflict.
        assert!(!c.conflicts_with(&[meeting(MW, "10:50", "11:40")], &key));
    }

    #[test]
    fn same_section_and_tba_never_conflict() {
        let c = collection();
        let own = SectionKey::new("100", "2024-Fall");
        assert!(!c.conflicts_with(&[meeting(MW, "10:00", "10:50")], &own));
        let tba = Meeting {
            days: MW,
            time: None,
            location: String::new(),
        };
        assert!(!c.conflicts_with(&[tba], &SectionKey::new("300", "2024-Fall")));
    }

    #[test]
    fn custom_events_count_as_occupied() {
        let mut c = collection();
        let gym = CustomEvent::new(
            CustomEventId::new(1),
            "Gym",
            ClockTime::new(12, 0).unwrap(),
            ClockTime::new(13, 0).unwrap(),
            TTH,
        );
        c.add_custom_event(gym, &[0]).unwrap();
        let key = SectionKey::new("200", "2024-Fall");
        assert!(c.conflicts_with(&[meeting(TTH, "12:30", "13:20")], &key));

        c.add_course(course("200", vec![meeting(TTH, "12:30", "13:20")]), 0)
            .unwrap();
        assert_eq!(
            c.schedule_conflicts(),
            vec![Conflict {
                first: Occupant::Course(key),
                second: Occupant::CustomEvent(CustomEventId::new(1)),
            }]
        );
    }
}
