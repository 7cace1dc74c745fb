//! Schedule entry model.
//!
//! A schedule entry binds a course section to a weekly time slot, an
//! optional room and an optional instructor for a validity window inside a
//! term. Entries are created and changed only through the conflict gate of
//! the [`Timetable`](crate::timetable::Timetable) and are never deleted:
//! deactivation keeps their history for exceptions and past occurrences.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::{Axis, DateWindow, ResourceRef};

/// Store-assigned entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A recurring allocation of a course to a slot, room and instructor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// Entry identifier.
    pub id: EntryId,
    /// Owning term.
    pub term_id: String,
    /// Course reference (external catalog).
    pub course_id: String,
    /// Time grid slot.
    pub slot_id: String,
    /// Room, or `None` while unassigned.
    pub room_id: Option<String>,
    /// Instructor, or `None` while unassigned.
    pub instructor_id: Option<String>,
    /// Section or batch label.
    pub section: Option<String>,
    /// Weekly recurrence; a one-off entry meets only on `valid_from`.
    pub is_recurring: bool,
    /// First day the entry applies.
    pub valid_from: NaiveDate,
    /// Last day the entry applies; `None` runs through the term end.
    pub valid_to: Option<NaiveDate>,
    /// Whether the entry takes part in conflict checks.
    pub active: bool,
    /// First date on which a deactivated entry no longer meets.
    pub deactivated_from: Option<NaiveDate>,
}

impl ScheduleEntry {
    /// The resource claimed on an axis, if assigned.
    pub fn resource_on(&self, axis: Axis) -> Option<ResourceRef> {
        let id = match axis {
            Axis::Room => self.room_id.as_ref(),
            Axis::Instructor => self.instructor_id.as_ref(),
        };
        id.map(|id| ResourceRef::on(axis, id.clone()))
    }

    /// Whether the entry claims this resource as room or instructor.
    pub fn references(&self, resource: &ResourceRef) -> bool {
        match resource {
            ResourceRef::Room(id) => self.room_id.as_deref() == Some(id.as_str()),
            ResourceRef::Instructor(id) => self.instructor_id.as_deref() == Some(id.as_str()),
        }
    }

    /// The dates the entry applies to, given its term's last day.
    pub fn effective_window(&self, term_end: NaiveDate) -> DateWindow {
        if self.is_recurring {
            DateWindow::new(self.valid_from, self.valid_to.unwrap_or(term_end))
        } else {
            DateWindow::single(self.valid_from)
        }
    }

    /// Whether the entry still meets on `date` (active, or deactivated later).
    pub fn is_live_on(&self, date: NaiveDate) -> bool {
        self.active || self.deactivated_from.is_some_and(|cutoff| date < cutoff)
    }
}

/// A candidate allocation submitted to `create_entry`.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    /// Term to book into.
    pub term_id: String,
    /// Course reference.
    pub course_id: String,
    /// Time grid slot.
    pub slot_id: String,
    /// Room, or `None`.
    pub room_id: Option<String>,
    /// Instructor, or `None`.
    pub instructor_id: Option<String>,
    /// Section or batch label.
    pub section: Option<String>,
    /// Weekly recurrence (default `true`).
    pub is_recurring: bool,
    /// First day.
    pub valid_from: NaiveDate,
    /// Last day, or term end.
    pub valid_to: Option<NaiveDate>,
    /// Abort instead of committing after this instant.
    pub deadline: Option<Instant>,
}

impl EntryDraft {
    /// Creates a recurring, unassigned draft running from `valid_from` to term end.
    pub fn new(
        term_id: impl Into<String>,
        course_id: impl Into<String>,
        slot_id: impl Into<String>,
        valid_from: NaiveDate,
    ) -> Self {
        Self {
            term_id: term_id.into(),
            course_id: course_id.into(),
            slot_id: slot_id.into(),
            room_id: None,
            instructor_id: None,
            section: None,
            is_recurring: true,
            valid_from,
            valid_to: None,
            deadline: None,
        }
    }

    /// Assigns a room.
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    /// Assigns an instructor.
    pub fn with_instructor(mut self, instructor_id: impl Into<String>) -> Self {
        self.instructor_id = Some(instructor_id.into());
        self
    }

    /// Sets the section label.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Sets the last valid day.
    pub fn until(mut self, valid_to: NaiveDate) -> Self {
        self.valid_to = Some(valid_to);
        self
    }

    /// Makes the entry a single session on `valid_from`.
    pub fn one_off(mut self) -> Self {
        self.is_recurring = false;
        self
    }

    /// Sets a commit deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Materializes the draft as an active entry.
    pub fn into_entry(self, id: EntryId) -> ScheduleEntry {
        ScheduleEntry {
            id,
            term_id: self.term_id,
            course_id: self.course_id,
            slot_id: self.slot_id,
            room_id: self.room_id,
            instructor_id: self.instructor_id,
            section: self.section,
            is_recurring: self.is_recurring,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            active: true,
            deactivated_from: None,
        }
    }
}

/// A patch applied by `update_entry`. Unset fields keep their value.
///
/// Nullable fields use `Option<Option<_>>`: `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct EntryChanges {
    pub course_id: Option<String>,
    pub slot_id: Option<String>,
    pub room_id: Option<Option<String>>,
    pub instructor_id: Option<Option<String>>,
    pub section: Option<Option<String>>,
    pub is_recurring: Option<bool>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<Option<NaiveDate>>,
    /// Abort instead of committing after this instant.
    pub deadline: Option<Instant>,
}

impl EntryChanges {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn with_slot(mut self, slot_id: impl Into<String>) -> Self {
        self.slot_id = Some(slot_id.into());
        self
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(Some(room_id.into()));
        self
    }

    /// Unassigns the room.
    pub fn without_room(mut self) -> Self {
        self.room_id = Some(None);
        self
    }

    pub fn with_instructor(mut self, instructor_id: impl Into<String>) -> Self {
        self.instructor_id = Some(Some(instructor_id.into()));
        self
    }

    /// Unassigns the instructor.
    pub fn without_instructor(mut self) -> Self {
        self.instructor_id = Some(None);
        self
    }

    pub fn with_section(mut self, section: Option<String>) -> Self {
        self.section = Some(section);
        self
    }

    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = Some(is_recurring);
        self
    }

    pub fn with_valid_from(mut self, valid_from: NaiveDate) -> Self {
        self.valid_from = Some(valid_from);
        self
    }

    /// Sets or clears (`None` = term end) the last valid day.
    pub fn with_valid_to(mut self, valid_to: Option<NaiveDate>) -> Self {
        self.valid_to = Some(valid_to);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns `entry` with this patch applied.
    pub fn apply(&self, entry: &ScheduleEntry) -> ScheduleEntry {
        let mut next = entry.clone();
        if let Some(course_id) = &self.course_id {
            next.course_id = course_id.clone();
        }
        if let Some(slot_id) = &self.slot_id {
            next.slot_id = slot_id.clone();
        }
        if let Some(room_id) = &self.room_id {
            next.room_id = room_id.clone();
        }
        if let Some(instructor_id) = &self.instructor_id {
            next.instructor_id = instructor_id.clone();
        }
        if let Some(section) = &self.section {
            next.section = section.clone();
        }
        if let Some(is_recurring) = self.is_recurring {
            next.is_recurring = is_recurring;
        }
        if let Some(valid_from) = self.valid_from {
            next.valid_from = valid_from;
        }
        if let Some(valid_to) = self.valid_to {
            next.valid_to = valid_to;
        }
        next
    }
}

/// Selection criteria for `list_entries`. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    pub term_id: Option<String>,
    pub room_id: Option<String>,
    pub instructor_id: Option<String>,
    pub course_id: Option<String>,
    pub section: Option<String>,
    pub weekday: Option<Weekday>,
    pub active: Option<bool>,
}

impl EntryFilter {
    /// Matches every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Active entries only.
    pub fn active() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    pub fn in_term(mut self, term_id: impl Into<String>) -> Self {
        self.term_id = Some(term_id.into());
        self
    }

    pub fn in_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn taught_by(mut self, instructor_id: impl Into<String>) -> Self {
        self.instructor_id = Some(instructor_id.into());
        self
    }

    pub fn for_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn for_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn on(mut self, weekday: Weekday) -> Self {
        self.weekday = Some(weekday);
        self
    }

    /// Whether `entry`, whose slot recurs on `weekday`, passes the filter.
    pub fn matches(&self, entry: &ScheduleEntry, weekday: Option<Weekday>) -> bool {
        fn eq_opt(want: &Option<String>, have: Option<&str>) -> bool {
            want.as_deref().is_none_or(|w| have == Some(w))
        }

        eq_opt(&self.term_id, Some(entry.term_id.as_str()))
            && eq_opt(&self.room_id, entry.room_id.as_deref())
            && eq_opt(&self.instructor_id, entry.instructor_id.as_deref())
            && eq_opt(&self.course_id, Some(entry.course_id.as_str()))
            && eq_opt(&self.section, entry.section.as_deref())
            && self.weekday.is_none_or(|w| weekday == Some(w))
            && self.active.is_none_or(|a| entry.active == a)
    }
}
