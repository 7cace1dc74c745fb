//! Timetabling domain models.
//!
//! Reference data (terms, time grid, resources) is read-only to the
//! scheduler. Entries and exceptions are the mutable state it owns;
//! occurrences are derived from both.
//!
//! # Domain Mappings
//!
//! | u-timetable | University | School | Training Center |
//! |-------------|-----------|--------|-----------------|
//! | Term | Semester | Term | Cohort window |
//! | TimeSlot | Period | Bell period | Session slot |
//! | ScheduleEntry | Course section meeting | Class period | Recurring session |
//! | ScheduleException | Holiday / makeup | Snow day | Rescheduled session |

mod catalog;
mod entry;
mod exception;
mod occurrence;
mod resource;
mod term;
mod time_slot;

pub use catalog::Catalog;
pub use entry::{EntryChanges, EntryDraft, EntryFilter, EntryId, ScheduleEntry};
pub use exception::{ExceptionDraft, ExceptionId, ExceptionKind, ScheduleException};
pub use occurrence::{Occurrence, OccurrenceStatus};
pub use resource::{Axis, Bookable, Instructor, ResourceRef, ResourceRegistry, Room};
pub use term::{Term, TermCatalog};
pub use time_slot::{DateWindow, TimeGrid, TimeRange, TimeSlot};
