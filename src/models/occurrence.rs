//! Resolved occurrences.
//!
//! An occurrence is what actually happens for one entry on one calendar
//! date once exceptions have been applied.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{Axis, EntryId, ExceptionId, ResourceRef, TimeSlot};

/// Outcome of resolving an entry on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    /// Meets as planned.
    Scheduled,
    /// Does not meet (cancelled, holiday, exam, event).
    Cancelled,
    /// Meets in a replacement slot and/or room.
    Moved,
    /// Extra session outside the recurring pattern.
    Makeup,
}

impl OccurrenceStatus {
    /// Whether the session occupies its resources.
    pub fn is_busy(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// A concrete session instance on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Occurrence {
    /// The calendar date.
    pub date: NaiveDate,
    /// Source entry.
    pub entry_id: EntryId,
    /// Exception that shaped this occurrence, if any.
    pub exception_id: Option<ExceptionId>,
    /// Course reference.
    pub course_id: String,
    /// Section label.
    pub section: Option<String>,
    /// Effective slot (replacement slot for moved and makeup sessions).
    pub slot: TimeSlot,
    /// Effective room.
    pub room_id: Option<String>,
    /// Instructor.
    pub instructor_id: Option<String>,
    /// Resolution status.
    pub status: OccurrenceStatus,
}

impl Occurrence {
    /// Effective start time.
    #[inline]
    pub fn start(&self) -> NaiveTime {
        self.slot.start()
    }

    /// Effective end time.
    #[inline]
    pub fn end(&self) -> NaiveTime {
        self.slot.end()
    }

    /// Whether the session occupies its resources.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    /// The resource claimed on an axis, if assigned.
    pub fn resource_on(&self, axis: Axis) -> Option<ResourceRef> {
        let id = match axis {
            Axis::Room => self.room_id.as_ref(),
            Axis::Instructor => self.instructor_id.as_ref(),
        };
        id.map(|id| ResourceRef::on(axis, id.clone()))
    }

    /// Whether the occurrence claims the resource as room or instructor.
    pub fn claims(&self, resource: &ResourceRef) -> bool {
        match resource {
            ResourceRef::Room(id) => self.room_id.as_deref() == Some(id.as_str()),
            ResourceRef::Instructor(id) => self.instructor_id.as_deref() == Some(id.as_str()),
        }
    }
}
