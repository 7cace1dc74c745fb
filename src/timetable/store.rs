//! Schedule entry store.
//!
//! Owns the recurring allocations and hands out entry ids. The store does no
//! checking of its own: the [`Timetable`](super::Timetable) validates and
//! conflict-scans every write while holding the state lock.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{Catalog, EntryFilter, EntryId, ScheduleEntry};

#[derive(Debug, Clone)]
pub struct EntryStore {
    entries: BTreeMap<EntryId, ScheduleEntry>,
    next_id: u64,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next inserted entry will receive.
    pub fn peek_id(&self) -> EntryId {
        EntryId(self.next_id)
    }

    /// Inserts or replaces an entry, keeping the id counter ahead of it.
    pub fn put(&mut self, entry: ScheduleEntry) {
        self.next_id = self.next_id.max(entry.id.0 + 1);
        self.entries.insert(entry.id, entry);
    }

    pub fn get(&self, id: EntryId) -> Option<&ScheduleEntry> {
        self.entries.get(&id)
    }

    /// Deactivates an entry from `effective` onward.
    ///
    /// Returns `None` for an unknown id, `Some(false)` if it was already
    /// inactive.
    pub fn deactivate(&mut self, id: EntryId, effective: NaiveDate) -> Option<bool> {
        let entry = self.entries.get_mut(&id)?;
        if !entry.active {
            return Some(false);
        }
        entry.active = false;
        entry.deactivated_from = Some(effective);
        Some(true)
    }

    /// All entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.values()
    }

    /// Active entries of a term.
    pub fn active_in_term<'a>(&'a self, term_id: &'a str) -> impl Iterator<Item = &'a ScheduleEntry> {
        self.entries
            .values()
            .filter(move |e| e.active && e.term_id == term_id)
    }

    /// Entries passing `filter`, ordered by (weekday, start time, id).
    pub fn select(&self, filter: &EntryFilter, catalog: &Catalog) -> Vec<&ScheduleEntry> {
        let mut found: Vec<&ScheduleEntry> = self
            .entries
            .values()
            .filter(|e| filter.matches(e, catalog.slot_of(e).map(|s| s.weekday)))
            .collect();
        found.sort_by_key(|e| {
            let slot = catalog.slot_of(e);
            (
                slot.map(|s| s.day_index()),
                slot.map(|s| s.start()),
                e.id,
            )
        });
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryDraft, Term, TimeSlot};
    use chrono::{NaiveTime, Weekday};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn sample_store() -> EntryStore {
        let mut store = EntryStore::new();
        for (slot, room) in [("TUE-09", "R1"), ("MON-11", "R2"), ("MON-09", "R1")] {
            let id = store.peek_id();
            store.put(
                EntryDraft::new("S2", "CS101", slot, ymd(2024, 1, 1))
                    .with_room(room)
                    .into_entry(id),
            );
        }
        store
    }

    fn sample_catalog() -> Catalog {
        Catalog::new()
            .with_term(Term::new("S2", "2023-24", 2, ymd(2024, 1, 1), ymd(2024, 5, 31)).activated())
            .with_slot(TimeSlot::new("MON-09", Weekday::Mon, hm(9), hm(10)))
            .with_slot(TimeSlot::new("MON-11", Weekday::Mon, hm(11), hm(12)))
            .with_slot(TimeSlot::new("TUE-09", Weekday::Tue, hm(9), hm(10)))
    }

    #[test]
    fn test_ids_are_sequential() {
        let store = sample_store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.peek_id(), EntryId(4));
        assert_eq!(store.get(EntryId(2)).map(|e| e.slot_id.as_str()), Some("MON-11"));
    }

    #[test]
    fn test_deactivate() {
        let mut store = sample_store();
        assert_eq!(store.deactivate(EntryId(1), ymd(2024, 3, 1)), Some(true));
        assert_eq!(store.deactivate(EntryId(1), ymd(2024, 4, 1)), Some(false));
        assert_eq!(store.deactivate(EntryId(99), ymd(2024, 4, 1)), None);

        let e = store.get(EntryId(1)).unwrap();
        assert!(!e.active);
        assert_eq!(e.deactivated_from, Some(ymd(2024, 3, 1)));
        assert_eq!(store.active_in_term("S2").count(), 2);
    }

    #[test]
    fn test_select_orders_by_weekday_then_time() {
        let store = sample_store();
        let catalog = sample_catalog();

        let ids: Vec<u64> = store
            .select(&EntryFilter::new(), &catalog)
            .iter()
            .map(|e| e.id.0)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]); // MON-09, MON-11, TUE-09

        let r1: Vec<u64> = store
            .select(&EntryFilter::new().in_room("R1").on(Weekday::Mon), &catalog)
            .iter()
            .map(|e| e.id.0)
            .collect();
        assert_eq!(r1, vec![3]);
    }
}
