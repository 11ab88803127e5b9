use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CoreError;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Which days of the week an entry repeats on, Sunday first.
pub type Days = [bool; 7];

pub const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A wall-clock time of day with minute precision, written as `HH:MM`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    pub fn new(hour: u16, minute: u16) -> Result<Self, CoreError> {
        if hour >= 24 || minute >= 60 {
            return Err(CoreError::InvalidClockTime(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self {
            minutes: hour * 60 + minute,
        })
    }

    pub fn from_minutes(minutes: u16) -> Result<Self, CoreError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(CoreError::InvalidClockTime(format!("{minutes} minutes")));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u16 {
        self.minutes
    }

    pub fn hour(&self) -> u16 {
        self.minutes / 60
    }

    pub fn minute(&self) -> u16 {
        self.minutes % 60
    }
}

impl FromStr for ClockTime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidClockTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({self})")
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Half-open interval `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self, CoreError> {
        if start >= end {
            return Err(CoreError::InvalidTimeRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        Self::new(start.parse()?, end.parse()?)
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Indices of the days set in `days`.
pub fn active_days(days: &Days) -> impl Iterator<Item = usize> + '_ {
    days.iter()
        .enumerate()
        .filter_map(|(index, on)| on.then_some(index))
}

pub fn shares_day(a: &Days, b: &Days) -> bool {
    a.iter().zip(b.iter()).any(|(x, y)| *x && *y)
}
