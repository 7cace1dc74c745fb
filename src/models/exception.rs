//! Date-scoped schedule exceptions.
//!
//! An exception overrides what a recurring entry does on a single calendar
//! date: it cancels the session, moves it to another slot or room, adds a
//! makeup session, or marks the date as a holiday, exam or event. An
//! exception never recurs. Once its date has passed it stays on record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::EntryId;

/// Store-assigned exception identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExceptionId(pub u64);

impl fmt::Display for ExceptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// What an exception does to the date it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    /// The session does not meet.
    Cancelled,
    /// The session meets in a replacement slot and/or room.
    Rescheduled,
    /// An extra session outside the recurring pattern.
    Makeup,
    /// No classes (entry-bound, or term-wide when standalone).
    Holiday,
    /// Examination day.
    Exam,
    /// Institutional event.
    Event,
}

impl ExceptionKind {
    /// Kinds that must reference an entry.
    pub fn requires_entry(self) -> bool {
        matches!(self, Self::Cancelled | Self::Rescheduled | Self::Makeup)
    }

    /// Kinds that must carry a replacement slot.
    pub fn requires_replacement(self) -> bool {
        matches!(self, Self::Rescheduled | Self::Makeup)
    }

    /// Kinds that replace the regular session on their date.
    ///
    /// At most one overriding exception may exist per (entry, date); makeups
    /// are additive and never override.
    pub fn overrides_session(self) -> bool {
        !matches!(self, Self::Makeup)
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cancelled => "cancelled",
            Self::Rescheduled => "rescheduled",
            Self::Makeup => "makeup",
            Self::Holiday => "holiday",
            Self::Exam => "exam",
            Self::Event => "event",
        };
        f.write_str(s)
    }
}

/// A recorded override for one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleException {
    /// Exception identifier.
    pub id: ExceptionId,
    /// Affected entry; `None` for a standalone (term-wide) exception.
    pub entry_id: Option<EntryId>,
    /// The date overridden.
    pub date: NaiveDate,
    /// Override kind.
    pub kind: ExceptionKind,
    /// Replacement slot for reschedules and makeups.
    pub replacement_slot_id: Option<String>,
    /// Replacement room; falls back to the entry's room when unset.
    pub replacement_room_id: Option<String>,
    /// Free-text reason shown to users.
    pub reason: String,
}

/// An exception submitted to `add_exception`.
#[derive(Debug, Clone)]
pub struct ExceptionDraft {
    pub entry_id: Option<EntryId>,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    pub replacement_slot_id: Option<String>,
    pub replacement_room_id: Option<String>,
    pub reason: String,
    /// Abort instead of committing after this instant.
    pub deadline: Option<Instant>,
}

impl ExceptionDraft {
    /// Creates an exception of any kind for an entry.
    pub fn for_entry(entry_id: EntryId, date: NaiveDate, kind: ExceptionKind) -> Self {
        Self {
            entry_id: Some(entry_id),
            date,
            kind,
            replacement_slot_id: None,
            replacement_room_id: None,
            reason: String::new(),
            deadline: None,
        }
    }

    /// Creates a standalone exception not tied to any entry.
    pub fn standalone(date: NaiveDate, kind: ExceptionKind) -> Self {
        Self {
            entry_id: None,
            ..Self::for_entry(EntryId(0), date, kind)
        }
    }

    /// Cancels one session of an entry.
    pub fn cancel(entry_id: EntryId, date: NaiveDate) -> Self {
        Self::for_entry(entry_id, date, ExceptionKind::Cancelled)
    }

    /// Moves one session of an entry to another slot.
    pub fn reschedule(entry_id: EntryId, date: NaiveDate, slot_id: impl Into<String>) -> Self {
        Self::for_entry(entry_id, date, ExceptionKind::Rescheduled).with_slot(slot_id)
    }

    /// Adds an extra session for an entry.
    pub fn makeup(entry_id: EntryId, date: NaiveDate, slot_id: impl Into<String>) -> Self {
        Self::for_entry(entry_id, date, ExceptionKind::Makeup).with_slot(slot_id)
    }

    /// A term-wide holiday.
    pub fn holiday(date: NaiveDate) -> Self {
        Self::standalone(date, ExceptionKind::Holiday)
    }

    /// Sets the replacement slot.
    pub fn with_slot(mut self, slot_id: impl Into<String>) -> Self {
        self.replacement_slot_id = Some(slot_id.into());
        self
    }

    /// Sets the replacement room.
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.replacement_room_id = Some(room_id.into());
        self
    }

    /// Sets the reason text.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets a commit deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Materializes the draft.
    pub fn into_exception(self, id: ExceptionId) -> ScheduleException {
        ScheduleException {
            id,
            entry_id: self.entry_id,
            date: self.date,
            kind: self.kind,
            replacement_slot_id: self.replacement_slot_id,
            replacement_room_id: self.replacement_room_id,
            reason: self.reason,
        }
    }
}
