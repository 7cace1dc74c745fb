//! Reference data the scheduler reads but does not own.

use serde::{Deserialize, Serialize};

use super::{
    DateWindow, Instructor, ResourceRegistry, Room, ScheduleEntry, Term, TermCatalog, TimeGrid,
    TimeSlot,
};

/// Terms, time grid and resources, assembled up front.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, NaiveTime, Weekday};
/// use u_timetable::models::{Catalog, Room, Term, TimeSlot};
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
/// let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
///
/// let catalog = Catalog::new()
///     .with_term(Term::new("2024-S2", "2023-24", 2, d(1, 1), d(5, 31)).activated())
///     .with_slot(TimeSlot::new("MON-09", Weekday::Mon, t(9), t(10)))
///     .with_room(Room::new("R101"));
///
/// assert!(catalog.terms.active().is_some());
/// assert!(catalog.grid.get("MON-09").is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Academic terms.
    pub terms: TermCatalog,
    /// Weekly time slots.
    pub grid: TimeGrid,
    /// Rooms and instructors.
    pub resources: ResourceRegistry,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a term.
    pub fn with_term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    /// Adds a time slot.
    pub fn with_slot(mut self, slot: TimeSlot) -> Self {
        self.grid.push(slot);
        self
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.resources.push_room(room);
        self
    }

    /// Adds an instructor.
    pub fn with_instructor(mut self, instructor: Instructor) -> Self {
        self.resources.push_instructor(instructor);
        self
    }

    /// The slot an entry is bound to.
    pub fn slot_of(&self, entry: &ScheduleEntry) -> Option<&TimeSlot> {
        self.grid.get(&entry.slot_id)
    }

    /// The dates an entry applies to, resolving an open end to its term end.
    pub fn window_of(&self, entry: &ScheduleEntry) -> Option<DateWindow> {
        self.terms
            .get(&entry.term_id)
            .map(|term| entry.effective_window(term.end))
    }
}
