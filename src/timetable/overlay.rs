//! Exception overlay.
//!
//! Date-indexed record of overrides layered on the recurring entries.
//! Exceptions are append-only: they are never edited or removed.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{EntryId, ExceptionId, ExceptionKind, ScheduleException};

#[derive(Debug, Clone)]
pub struct ExceptionOverlay {
    by_id: BTreeMap<ExceptionId, ScheduleException>,
    by_date: BTreeMap<NaiveDate, Vec<ExceptionId>>,
    next_id: u64,
}

impl Default for ExceptionOverlay {
    fn default() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_date: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl ExceptionOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next recorded exception will receive.
    pub fn peek_id(&self) -> ExceptionId {
        ExceptionId(self.next_id)
    }

    pub fn record(&mut self, exception: ScheduleException) {
        self.next_id = self.next_id.max(exception.id.0 + 1);
        self.by_date
            .entry(exception.date)
            .or_default()
            .push(exception.id);
        self.by_id.insert(exception.id, exception);
    }

    pub fn get(&self, id: ExceptionId) -> Option<&ScheduleException> {
        self.by_id.get(&id)
    }

    /// Every exception on a date, in id order.
    pub fn on_date(&self, date: NaiveDate) -> impl Iterator<Item = &ScheduleException> {
        self.by_date
            .get(&date)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
    }

    /// Every exception attached to an entry, in date order.
    pub fn for_entry(&self, entry_id: EntryId) -> Vec<&ScheduleException> {
        let mut found: Vec<&ScheduleException> = self
            .by_id
            .values()
            .filter(|x| x.entry_id == Some(entry_id))
            .collect();
        found.sort_by_key(|x| (x.date, x.id));
        found
    }

    /// The exception that replaces an entry's regular session on a date.
    pub fn override_for(&self, entry_id: EntryId, date: NaiveDate) -> Option<&ScheduleException> {
        self.on_date(date)
            .find(|x| x.entry_id == Some(entry_id) && x.kind.overrides_session())
    }

    /// A standalone exception of the given kind on a date.
    pub fn standalone(&self, date: NaiveDate, kind: ExceptionKind) -> Option<&ScheduleException> {
        self.on_date(date)
            .find(|x| x.entry_id.is_none() && x.kind == kind)
    }

    /// Makeup sessions on a date.
    pub fn makeups_on(&self, date: NaiveDate) -> impl Iterator<Item = &ScheduleException> {
        self.on_date(date)
            .filter(|x| x.kind == ExceptionKind::Makeup)
    }

    /// Dates carrying at least one reschedule or makeup.
    pub fn replacement_dates(&self) -> Vec<NaiveDate> {
        self.by_date
            .iter()
            .filter(|(_, ids)| {
                ids.iter()
                    .filter_map(|id| self.by_id.get(id))
                    .any(|x| x.kind.requires_replacement())
            })
            .map(|(date, _)| *date)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExceptionDraft;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_overlay() -> ExceptionOverlay {
        let mut overlay = ExceptionOverlay::new();
        let drafts = [
            ExceptionDraft::cancel(EntryId(1), ymd(2024, 2, 5)),
            ExceptionDraft::makeup(EntryId(1), ymd(2024, 2, 7), "WED-09"),
            ExceptionDraft::holiday(ymd(2024, 2, 5)),
            ExceptionDraft::reschedule(EntryId(2), ymd(2024, 3, 4), "MON-09").with_room("R102"),
        ];
        for draft in drafts {
            let id = overlay.peek_id();
            overlay.record(draft.into_exception(id));
        }
        overlay
    }

    #[test]
    fn test_lookup_by_date() {
        let overlay = sample_overlay();
        assert_eq!(overlay.len(), 4);
        assert_eq!(overlay.on_date(ymd(2024, 2, 5)).count(), 2);
        assert_eq!(overlay.on_date(ymd(2024, 2, 6)).count(), 0);
    }

    #[test]
    fn test_override_ignores_makeups() {
        let overlay = sample_overlay();
        let x = overlay.override_for(EntryId(1), ymd(2024, 2, 5)).unwrap();
        assert_eq!(x.kind, ExceptionKind::Cancelled);
        assert!(overlay.override_for(EntryId(1), ymd(2024, 2, 7)).is_none());
        assert_eq!(overlay.makeups_on(ymd(2024, 2, 7)).count(), 1);
    }

    #[test]
    fn test_standalone_and_per_entry() {
        let overlay = sample_overlay();
        assert!(overlay.standalone(ymd(2024, 2, 5), ExceptionKind::Holiday).is_some());
        assert!(overlay.standalone(ymd(2024, 3, 4), ExceptionKind::Holiday).is_none());

        let dates: Vec<NaiveDate> = overlay.for_entry(EntryId(1)).iter().map(|x| x.date).collect();
        assert_eq!(dates, vec![ymd(2024, 2, 5), ymd(2024, 2, 7)]);
        assert_eq!(overlay.replacement_dates(), vec![ymd(2024, 2, 7), ymd(2024, 3, 4)]);
    }
}
