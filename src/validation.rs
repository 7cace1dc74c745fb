//! Input validation for timetable mutations.
//!
//! Checks structural and referential integrity before any conflict scan.
//! Every check runs and every problem is reported, so a form can show the
//! complete list at once. Detects:
//! - Duplicate IDs and duplicate slot signatures in reference data
//! - Inverted time ranges and date windows
//! - References to unknown or retired terms, slots and resources
//! - Dates outside the owning term or off the slot's weekday
//! - Exceptions missing the entry or replacement their kind requires

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::models::{
    Bookable, Catalog, ExceptionDraft, ResourceRef, ScheduleEntry, ScheduleException, TimeSlot,
};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Two reference records share the same ID.
    DuplicateId,
    /// Two slots share (weekday, start, end).
    DuplicateTimeSlot,
    /// More than one term is flagged active.
    MultipleActiveTerms,
    /// A time range does not end after it starts.
    InvertedTimeRange,
    /// A date window ends before it starts.
    InvertedDateWindow,
    /// Referenced term does not exist.
    UnknownTerm,
    /// Referenced term is not the active term.
    InactiveTerm,
    /// Referenced time slot does not exist.
    UnknownTimeSlot,
    /// Referenced room or instructor does not exist.
    UnknownResource,
    /// Referenced room or instructor is retired.
    InactiveResource,
    /// A date lies outside the owning term.
    OutsideTerm,
    /// A date does not fall on the slot's weekday.
    WeekdayMismatch,
    /// A date lies outside the entry's validity window.
    OutsideValidity,
    /// A reschedule or makeup lacks its replacement slot.
    MissingReplacement,
    /// An exception kind needs an entry reference.
    EntryRequired,
    /// The referenced entry has been deactivated.
    InactiveEntry,
    /// The entry already has an overriding exception on that date.
    DuplicateOverride,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates reference data before a timetable is built on it.
///
/// Checks:
/// 1. No duplicate term, slot, room or instructor IDs
/// 2. Every term window and slot range is well-formed
/// 3. No two slots share (weekday, start, end)
/// 4. At most one term is active
pub fn validate_catalog(catalog: &Catalog) -> ValidationResult {
    let mut errors = Vec::new();

    let mut term_ids = HashSet::new();
    for term in catalog.terms.terms() {
        if !term_ids.insert(term.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate term ID: {}", term.id),
            ));
        }
        if !term.window().is_well_formed() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedDateWindow,
                format!("Term '{}' ends ({}) before it starts ({})", term.id, term.end, term.start),
            ));
        }
    }

    let active = catalog.terms.terms().iter().filter(|t| t.active).count();
    if active > 1 {
        errors.push(ValidationError::new(
            ValidationErrorKind::MultipleActiveTerms,
            format!("{active} terms are flagged active; at most one may be"),
        ));
    }

    let mut slot_ids = HashSet::new();
    let mut signatures: Vec<&TimeSlot> = Vec::new();
    for slot in catalog.grid.slots() {
        if !slot_ids.insert(slot.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate time slot ID: {}", slot.id),
            ));
        }
        if !slot.range.is_well_formed() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedTimeRange,
                format!(
                    "Time slot '{}' does not end ({}) after it starts ({})",
                    slot.id,
                    slot.end(),
                    slot.start()
                ),
            ));
        }
        if let Some(twin) = signatures.iter().find(|s| s.same_signature(slot)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateTimeSlot,
                format!("Time slots '{}' and '{}' describe the same period", twin.id, slot.id),
            ));
        } else {
            signatures.push(slot);
        }
    }

    let mut room_ids = HashSet::new();
    for room in catalog.resources.rooms() {
        if !room_ids.insert(room.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate room ID: {}", room.id),
            ));
        }
    }

    let mut instructor_ids = HashSet::new();
    for instructor in catalog.resources.instructors() {
        if !instructor_ids.insert(instructor.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate instructor ID: {}", instructor.id),
            ));
        }
    }

    finish(errors)
}

/// Checks that need no reference data: run before any lock is taken.
pub fn check_entry_shape(entry: &ScheduleEntry) -> ValidationResult {
    let mut errors = Vec::new();
    if let Some(valid_to) = entry.valid_to {
        if valid_to < entry.valid_from {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedDateWindow,
                format!(
                    "Entry valid-to ({valid_to}) precedes valid-from ({})",
                    entry.valid_from
                ),
            ));
        }
    }
    finish(errors)
}

fn check_resource(catalog: &Catalog, resource: &ResourceRef, errors: &mut Vec<ValidationError>) {
    match catalog.resources.lookup(resource) {
        None => errors.push(ValidationError::new(
            ValidationErrorKind::UnknownResource,
            format!("Unknown {resource}"),
        )),
        Some(r) if !r.is_bookable() => errors.push(ValidationError::new(
            ValidationErrorKind::InactiveResource,
            format!("{resource} is not available for booking"),
        )),
        Some(_) => {}
    }
}

/// Validates an entry against reference data.
///
/// Checks:
/// 1. Shape (see [`check_entry_shape`])
/// 2. Term exists and is active
/// 3. Slot exists
/// 4. Assigned room and instructor exist and are bookable
/// 5. The validity window lies inside the term
/// 6. A one-off entry's date falls on the slot's weekday
pub fn validate_entry(entry: &ScheduleEntry, catalog: &Catalog) -> ValidationResult {
    let mut errors = check_entry_shape(entry).err().unwrap_or_default();

    let term = catalog.terms.get(&entry.term_id);
    match term {
        None => errors.push(ValidationError::new(
            ValidationErrorKind::UnknownTerm,
            format!("Unknown term: {}", entry.term_id),
        )),
        Some(t) if !t.active => errors.push(ValidationError::new(
            ValidationErrorKind::InactiveTerm,
            format!("Term '{}' is not the active term", t.id),
        )),
        Some(_) => {}
    }

    let slot = catalog.slot_of(entry);
    if slot.is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownTimeSlot,
            format!("Unknown time slot: {}", entry.slot_id),
        ));
    }

    for resource in [
        entry.room_id.as_ref().map(ResourceRef::room),
        entry.instructor_id.as_ref().map(ResourceRef::instructor),
    ]
    .into_iter()
    .flatten()
    {
        check_resource(catalog, &resource, &mut errors);
    }

    if let Some(term) = term {
        let last = entry.valid_to.unwrap_or(term.end);
        for (label, date) in [("valid-from", entry.valid_from), ("valid-to", last)] {
            if !term.contains(date) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OutsideTerm,
                    format!(
                        "Entry {label} {date} is outside term '{}' ({}..{})",
                        term.id, term.start, term.end
                    ),
                ));
            }
        }
    }

    if let Some(slot) = slot {
        if !entry.is_recurring && !slot.falls_on(entry.valid_from) {
            errors.push(ValidationError::new(
                ValidationErrorKind::WeekdayMismatch,
                format!(
                    "One-off date {} is a {}, slot '{}' is on {}",
                    entry.valid_from,
                    entry.valid_from.weekday(),
                    slot.id,
                    slot.weekday
                ),
            ));
        }
    }

    finish(errors)
}

/// Validates an exception against its entry (already looked up) and
/// reference data.
///
/// Checks:
/// 1. Cancel, reschedule and makeup reference an entry, which is active
/// 2. Reschedule and makeup name a known replacement slot on the date's weekday
/// 3. A replacement room exists and is bookable
/// 4. The date lies in the entry's term (any known term when standalone)
/// 5. Overriding kinds fall on the entry's weekday inside its validity window
pub fn validate_exception(
    draft: &ExceptionDraft,
    entry: Option<&ScheduleEntry>,
    catalog: &Catalog,
) -> ValidationResult {
    let mut errors = Vec::new();
    let date = draft.date;

    if draft.kind.requires_entry() && entry.is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EntryRequired,
            format!("A {} exception must reference a schedule entry", draft.kind),
        ));
    }

    if draft.kind.requires_replacement() {
        match draft.replacement_slot_id.as_deref() {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::MissingReplacement,
                format!("A {} exception needs a replacement time slot", draft.kind),
            )),
            Some(id) => match catalog.grid.get(id) {
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownTimeSlot,
                    format!("Unknown replacement time slot: {id}"),
                )),
                Some(slot) if !slot.falls_on(date) => errors.push(ValidationError::new(
                    ValidationErrorKind::WeekdayMismatch,
                    format!(
                        "Replacement slot '{}' is on {}, but {date} is a {}",
                        slot.id,
                        slot.weekday,
                        date.weekday()
                    ),
                )),
                Some(_) => {}
            },
        }
    }

    if let Some(room_id) = &draft.replacement_room_id {
        check_resource(catalog, &ResourceRef::room(room_id), &mut errors);
    }

    match entry {
        None => {
            if catalog.terms.containing(date).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OutsideTerm,
                    format!("{date} is not inside any known term"),
                ));
            }
        }
        Some(entry) => {
            if !entry.active {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InactiveEntry,
                    format!("Entry {} has been deactivated", entry.id),
                ));
            }

            if let Some(term) = catalog.terms.get(&entry.term_id) {
                if !term.contains(date) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::OutsideTerm,
                        format!("{date} is outside term '{}'", term.id),
                    ));
                }
            }

            if draft.kind.overrides_session() {
                if let Some(slot) = catalog.slot_of(entry) {
                    if !slot.falls_on(date) {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::WeekdayMismatch,
                            format!(
                                "Entry {} meets on {}, but {date} is a {}",
                                entry.id,
                                slot.weekday,
                                date.weekday()
                            ),
                        ));
                    }
                }
                if let Some(window) = catalog.window_of(entry) {
                    if !window.contains(date) {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::OutsideValidity,
                            format!(
                                "{date} is outside entry {} validity ({}..{})",
                                entry.id, window.from, window.to
                            ),
                        ));
                    }
                }
            }
        }
    }

    finish(errors)
}

/// Validates an edited entry against the overriding exceptions already
/// recorded for it.
///
/// Checks:
/// 1. Every override date still falls on the entry's weekday
/// 2. Every override date is still inside the entry's validity window
///
/// Makeups are additive and are not checked here.
pub fn validate_overrides<'a, I>(
    entry: &ScheduleEntry,
    exceptions: I,
    catalog: &Catalog,
) -> ValidationResult
where
    I: IntoIterator<Item = &'a ScheduleException>,
{
    let (Some(slot), Some(window)) = (catalog.slot_of(entry), catalog.window_of(entry)) else {
        return Ok(());
    };

    let mut errors = Vec::new();
    for x in exceptions.into_iter().filter(|x| x.kind.overrides_session()) {
        if !slot.falls_on(x.date) {
            errors.push(ValidationError::new(
                ValidationErrorKind::WeekdayMismatch,
                format!(
                    "{} exception {} on {} would no longer match entry {} ({})",
                    x.kind, x.id, x.date, entry.id, slot.weekday
                ),
            ));
        } else if !window.contains(x.date) {
            errors.push(ValidationError::new(
                ValidationErrorKind::OutsideValidity,
                format!(
                    "{} exception {} on {} would fall outside entry {} validity ({}..{})",
                    x.kind, x.id, x.date, entry.id, window.from, window.to
                ),
            ));
        }
    }
    finish(errors)
}
