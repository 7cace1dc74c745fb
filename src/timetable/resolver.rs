//! Occurrence resolution.
//!
//! Reconciles recurring entries with the exception overlay for concrete
//! calendar dates. Resolution is a pure function of (catalog, entries,
//! exceptions, date): it holds no state and can run on any snapshot in
//! parallel with other readers.
//!
//! # Algorithm
//!
//! 1. Select entries live on the date whose term and validity window
//!    contain it and whose slot recurs on its weekday.
//! 2. Apply the entry's overriding exception, if any:
//!    - cancelled, holiday, exam, event → `Cancelled`
//!    - rescheduled → `Moved`, using the replacement slot and room
//!    - none, but a standalone holiday that day → `Cancelled`
//!    - none → `Scheduled`
//! 3. Add every makeup recorded for the date as a `Makeup` occurrence.
//! 4. Sort by (start, end, entry id, exception id).

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::{EntryStore, ExceptionOverlay};
use crate::models::{
    Catalog, DateWindow, ExceptionId, ExceptionKind, Occurrence, OccurrenceStatus, ResourceRef,
    ScheduleEntry, TimeSlot,
};

/// Read-only view that resolves occurrences.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    store: &'a EntryStore,
    overlay: &'a ExceptionOverlay,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, store: &'a EntryStore, overlay: &'a ExceptionOverlay) -> Self {
        Self {
            catalog,
            store,
            overlay,
        }
    }

    /// Every occurrence on a date, across all resources.
    pub fn occurrences_on(&self, date: NaiveDate) -> Vec<Occurrence> {
        let holiday = self.overlay.standalone(date, ExceptionKind::Holiday);
        let mut out = Vec::new();

        for entry in self.store.iter() {
            if !entry.is_live_on(date) || !self.meets_on(entry, date) {
                continue;
            }
            let Some(slot) = self.catalog.slot_of(entry) else {
                continue;
            };

            let occurrence = match self.overlay.override_for(entry.id, date) {
                Some(x) if x.kind == ExceptionKind::Rescheduled => {
                    let replacement = x
                        .replacement_slot_id
                        .as_deref()
                        .and_then(|id| self.catalog.grid.get(id))
                        .unwrap_or(slot);
                    let room = x.replacement_room_id.clone().or_else(|| entry.room_id.clone());
                    build(entry, date, replacement, room, OccurrenceStatus::Moved, Some(x.id))
                }
                Some(x) => build(
                    entry,
                    date,
                    slot,
                    entry.room_id.clone(),
                    OccurrenceStatus::Cancelled,
                    Some(x.id),
                ),
                None => match holiday {
                    Some(h) => build(
                        entry,
                        date,
                        slot,
                        entry.room_id.clone(),
                        OccurrenceStatus::Cancelled,
                        Some(h.id),
                    ),
                    None => build(
                        entry,
                        date,
                        slot,
                        entry.room_id.clone(),
                        OccurrenceStatus::Scheduled,
                        None,
                    ),
                },
            };
            out.push(occurrence);
        }

        for x in self.overlay.makeups_on(date) {
            let Some(entry) = x.entry_id.and_then(|id| self.store.get(id)) else {
                continue;
            };
            if !entry.is_live_on(date) {
                continue;
            }
            let Some(slot) = x
                .replacement_slot_id
                .as_deref()
                .and_then(|id| self.catalog.grid.get(id))
            else {
                continue;
            };
            let room = x.replacement_room_id.clone().or_else(|| entry.room_id.clone());
            out.push(build(entry, date, slot, room, OccurrenceStatus::Makeup, Some(x.id)));
        }

        out.sort_by_key(|o| (o.start(), o.end(), o.entry_id, o.exception_id));
        out
    }

    /// What a resource is doing on a date, including cancelled sessions.
    pub fn day(&self, resource: &ResourceRef, date: NaiveDate) -> Vec<Occurrence> {
        self.occurrences_on(date)
            .into_iter()
            .filter(|o| o.claims(resource))
            .collect()
    }

    /// [`day`](Self::day) for each date of a window; every date is present.
    pub fn range(&self, resource: &ResourceRef, window: DateWindow) -> BTreeMap<NaiveDate, Vec<Occurrence>> {
        window
            .days()
            .map(|date| (date, self.day(resource, date)))
            .collect()
    }

    /// Moved and makeup occurrences on every date that has one.
    pub fn replacement_occurrences(&self) -> Vec<Occurrence> {
        self.overlay
            .replacement_dates()
            .into_iter()
            .flat_map(|date| self.occurrences_on(date))
            .filter(|o| matches!(o.status, OccurrenceStatus::Moved | OccurrenceStatus::Makeup))
            .collect()
    }

    /// Whether the entry's regular pattern includes the date.
    fn meets_on(&self, entry: &ScheduleEntry, date: NaiveDate) -> bool {
        let Some(term) = self.catalog.terms.get(&entry.term_id) else {
            return false;
        };
        let in_pattern = self
            .catalog
            .slot_of(entry)
            .is_some_and(|slot| slot.falls_on(date));
        term.contains(date) && entry.effective_window(term.end).contains(date) && in_pattern
    }
}

pub(super) fn build(
    entry: &ScheduleEntry,
    date: NaiveDate,
    slot: &TimeSlot,
    room_id: Option<String>,
    status: OccurrenceStatus,
    exception_id: Option<ExceptionId>,
) -> Occurrence {
    Occurrence {
        date,
        entry_id: entry.id,
        exception_id,
        course_id: entry.course_id.clone(),
        section: entry.section.clone(),
        slot: slot.clone(),
        room_id,
        instructor_id: entry.instructor_id.clone(),
        status,
    }
}
