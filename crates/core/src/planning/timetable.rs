//! Timetable slots and clash detection.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use scholaris_shared::types::{ClassId, UserId};

use super::error::PlanningError;

/// Day of the school week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
    /// Saturday.
    Saturday,
    /// Sunday.
    Sunday,
}

/// A half-open period `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    /// Creates a slot that ends after it starts.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, PlanningError> {
        if end <= start {
            return Err(PlanningError::EndBeforeStart);
        }
        Ok(Self { start, end })
    }

    /// Start time.
    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// End time.
    #[must_use]
    pub const fn end(&self) -> NaiveTime {
        self.end
    }

    /// Returns true if the two slots share any instant. Back-to-back slots
    /// do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A timetable entry as far as clash detection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledSlot {
    /// Entry ID.
    pub id: Uuid,
    /// Class taught.
    pub class_id: ClassId,
    /// Teacher teaching.
    pub teacher_id: UserId,
    /// Day.
    pub day: Weekday,
    /// Period.
    pub slot: TimeSlot,
}

/// An existing entry the candidate collides with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clash {
    /// The class already has a lesson then.
    Class(Uuid),
    /// The teacher is already teaching then.
    Teacher(Uuid),
}

impl ScheduledSlot {
    /// First entry in `existing` that overlaps this one for the same class
    /// or teacher. An entry with the same ID is the one being replaced and
    /// is skipped.
    #[must_use]
    pub fn find_clash(&self, existing: &[Self]) -> Option<Clash> {
        existing
            .iter()
            .filter(|other| other.id != self.id && other.day == self.day)
            .filter(|other| other.slot.overlaps(&self.slot))
            .find_map(|other| {
                if other.class_id == self.class_id {
                    Some(Clash::Class(other.id))
                } else if other.teacher_id == self.teacher_id {
                    Some(Clash::Teacher(other.id))
                } else {
                    None
                }
            })
    }
}
