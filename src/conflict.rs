//! Conflict detection across the room and instructor axes.
//!
//! # Algorithm
//!
//! 1. Take the candidate's recurrence signature (weekday, start, end) from
//!    its slot and its effective validity window from its term.
//! 2. For each axis the candidate claims (a null room or instructor skips
//!    that axis), select the other active entries of the same term that
//!    claim the same resource.
//! 3. Two entries collide iff their slots share a weekday, their time
//!    ranges intersect (`s1 < e2 && s2 < e1`) and their validity windows
//!    intersect.
//! 4. Every collision is reported with its axis, the other entry and the
//!    overlapping window. An empty list means the candidate is accepted.
//!
//! Date-specific occurrences (reschedules and makeups) are checked with the
//! same time test on a single date.
//!
//! # Complexity
//! O(a * n) per candidate, a = axes claimed (≤ 2), n = entries in the term.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{
    Axis, Catalog, EntryId, ExceptionId, Occurrence, ScheduleEntry, TimeRange, TimeSlot,
};

/// How two slots are compared in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Half-open wall-clock intersection on the same weekday.
    #[default]
    Overlap,
    /// Collide only when both sides use the identical slot id.
    SlotIdentity,
}

/// Where two bookings overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapWindow {
    /// Shared weekday.
    pub weekday: Weekday,
    /// Start of the shared time range.
    pub start: NaiveTime,
    /// End of the shared time range (exclusive).
    pub end: NaiveTime,
    /// First shared date.
    pub from: NaiveDate,
    /// Last shared date.
    pub to: NaiveDate,
}

/// One collision between a candidate and an existing booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Axis the collision is on.
    pub axis: Axis,
    /// The contested room or instructor id.
    pub resource: String,
    /// The entry already holding the resource.
    pub entry_id: EntryId,
    /// Set when the holder is a reschedule or makeup exception.
    pub exception_id: Option<ExceptionId>,
    /// Set when the collision is on a single date.
    pub date: Option<NaiveDate>,
    /// Overlapping weekday, time range and dates.
    pub overlap: OverlapWindow,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} is held by entry {}",
            self.axis, self.resource, self.entry_id
        )?;
        if let Some(x) = self.exception_id {
            write!(f, " (exception {x})")?;
        }
        write!(
            f,
            " on {} {}-{}",
            self.overlap.weekday,
            self.overlap.start.format("%H:%M"),
            self.overlap.end.format("%H:%M")
        )?;
        if self.overlap.from == self.overlap.to {
            write!(f, " ({})", self.overlap.from)
        } else {
            write!(f, " ({}..{})", self.overlap.from, self.overlap.to)
        }
    }
}

/// Decides whether a candidate booking may coexist with existing ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector {
    mode: MatchMode,
}

impl ConflictDetector {
    /// Creates a detector using the given time comparison.
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    /// The time comparison in use.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Wall-clock overlap between two slots, if they collide.
    pub fn slot_overlap(&self, a: &TimeSlot, b: &TimeSlot) -> Option<TimeRange> {
        match self.mode {
            MatchMode::Overlap => a.overlap(b),
            MatchMode::SlotIdentity => (a.id == b.id).then_some(a.range),
        }
    }

    /// Scans recurring entries for collisions with `candidate`.
    ///
    /// Entries that are inactive, belong to another term, or carry the
    /// candidate's own id are skipped. Returns every collision found.
    pub fn scan_entries<'a, I>(
        &self,
        candidate: &ScheduleEntry,
        existing: I,
        catalog: &Catalog,
    ) -> Vec<Conflict>
    where
        I: IntoIterator<Item = &'a ScheduleEntry>,
    {
        let (Some(slot), Some(window)) = (catalog.slot_of(candidate), catalog.window_of(candidate))
        else {
            return Vec::new();
        };

        let peers: Vec<&ScheduleEntry> = existing
            .into_iter()
            .filter(|e| e.active && e.id != candidate.id && e.term_id == candidate.term_id)
            .collect();

        let mut conflicts = Vec::new();
        for axis in Axis::ALL {
            let Some(resource) = candidate.resource_on(axis) else {
                continue;
            };

            for other in peers.iter().filter(|e| e.references(&resource)) {
                let (Some(other_slot), Some(other_window)) =
                    (catalog.slot_of(other), catalog.window_of(other))
                else {
                    continue;
                };
                let Some(time) = self.slot_overlap(slot, other_slot) else {
                    continue;
                };
                let Some(days) = window.intersection(&other_window) else {
                    continue;
                };

                conflicts.push(Conflict {
                    axis,
                    resource: resource.id().to_string(),
                    entry_id: other.id,
                    exception_id: None,
                    date: None,
                    overlap: OverlapWindow {
                        weekday: slot.weekday,
                        start: time.start,
                        end: time.end,
                        from: days.from,
                        to: days.to,
                    },
                });
            }
        }
        conflicts
    }

    /// Scans date-specific occurrences (moves and makeups) that would fall
    /// inside a recurring candidate's pattern.
    pub fn scan_occurrences(
        &self,
        candidate: &ScheduleEntry,
        occurrences: &[Occurrence],
        catalog: &Catalog,
    ) -> Vec<Conflict> {
        let (Some(slot), Some(window)) = (catalog.slot_of(candidate), catalog.window_of(candidate))
        else {
            return Vec::new();
        };

        let mut conflicts = Vec::new();
        for axis in Axis::ALL {
            let Some(resource) = candidate.resource_on(axis) else {
                continue;
            };

            for occ in occurrences {
                if !occ.is_busy()
                    || occ.entry_id == candidate.id
                    || !window.contains(occ.date)
                    || !slot.falls_on(occ.date)
                    || !occ.claims(&resource)
                {
                    continue;
                }
                if let Some(time) = self.slot_overlap(slot, &occ.slot) {
                    conflicts.push(single_day(axis, resource.id(), occ, time));
                }
            }
        }
        conflicts
    }

    /// Checks a proposed single-date occurrence against what is already busy
    /// on that date. The caller removes anything the proposal frees.
    pub fn scan_replacement(&self, proposed: &Occurrence, busy: &[Occurrence]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for axis in Axis::ALL {
            let Some(resource) = proposed.resource_on(axis) else {
                continue;
            };

            for occ in busy.iter().filter(|o| o.is_busy() && o.date == proposed.date) {
                if !occ.claims(&resource) {
                    continue;
                }
                if let Some(time) = self.slot_overlap(&proposed.slot, &occ.slot) {
                    conflicts.push(single_day(axis, resource.id(), occ, time));
                }
            }
        }
        conflicts
    }
}

fn single_day(axis: Axis, resource: &str, holder: &Occurrence, time: TimeRange) -> Conflict {
    Conflict {
        axis,
        resource: resource.to_string(),
        entry_id: holder.entry_id,
        exception_id: holder.exception_id,
        date: Some(holder.date),
        overlap: OverlapWindow {
            weekday: holder.slot.weekday,
            start: time.start,
            end: time.end,
            from: holder.date,
            to: holder.date,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryDraft, OccurrenceStatus, Room, Instructor, Term};
    use rstest::rstest;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn sample_catalog() -> Catalog {
        Catalog::new()
            .with_term(Term::new("S2", "2023-24", 2, ymd(2024, 1, 1), ymd(2024, 5, 31)).activated())
            .with_slot(TimeSlot::new("MON-0900", Weekday::Mon, hm(9, 0), hm(10, 0)))
            .with_slot(TimeSlot::new("MON-0930", Weekday::Mon, hm(9, 30), hm(10, 30)))
            .with_slot(TimeSlot::new("MON-1000", Weekday::Mon, hm(10, 0), hm(11, 0)))
            .with_slot(TimeSlot::new("TUE-0900", Weekday::Tue, hm(9, 0), hm(10, 0)))
            .with_room(Room::new("R101"))
            .with_room(Room::new("R102"))
            .with_instructor(Instructor::new("P1"))
            .with_instructor(Instructor::new("P2"))
    }

    fn entry(id: u64, slot: &str, room: Option<&str>, prof: Option<&str>) -> ScheduleEntry {
        let mut draft = EntryDraft::new("S2", format!("C{id}"), slot, ymd(2024, 1, 1)).until(ymd(2024, 5, 31));
        if let Some(room) = room {
            draft = draft.with_room(room);
        }
        if let Some(prof) = prof {
            draft = draft.with_instructor(prof);
        }
        draft.into_entry(EntryId(id))
    }

    #[test]
    fn test_partial_overlap_reports_window() {
        let catalog = sample_catalog();
        let a = entry(1, "MON-0900", Some("R101"), None);
        let b = entry(2, "MON-0930", Some("R101"), None);

        let found = ConflictDetector::default().scan_entries(&b, [&a], &catalog);
        assert_eq!(found.len(), 1);
        let c = &found[0];
        assert_eq!(c.axis, Axis::Room);
        assert_eq!(c.entry_id, EntryId(1));
        assert_eq!((c.overlap.start, c.overlap.end), (hm(9, 30), hm(10, 0)));
        assert_eq!((c.overlap.from, c.overlap.to), (ymd(2024, 1, 1), ymd(2024, 5, 31)));
    }

    #[rstest]
    #[case::same_slot("MON-0900", "MON-0900", true)]
    #[case::partial("MON-0900", "MON-0930", true)]
    #[case::adjacent("MON-0900", "MON-1000", false)]
    #[case::other_day("MON-0900", "TUE-0900", false)]
    fn test_time_overlap_cases(#[case] a: &str, #[case] b: &str, #[case] expect: bool) {
        let catalog = sample_catalog();
        let first = entry(1, a, Some("R101"), None);
        let second = entry(2, b, Some("R101"), None);
        let found = ConflictDetector::default().scan_entries(&second, [&first], &catalog);
        assert_eq!(!found.is_empty(), expect);
    }

    #[test]
    fn test_slot_identity_mode_ignores_partial_overlap() {
        let catalog = sample_catalog();
        let a = entry(1, "MON-0900", Some("R101"), None);
        let b = entry(2, "MON-0930", Some("R101"), None);
        let same = entry(3, "MON-0900", Some("R101"), None);

        let detector = ConflictDetector::new(MatchMode::SlotIdentity);
        assert!(detector.scan_entries(&b, [&a], &catalog).is_empty());
        assert_eq!(detector.scan_entries(&same, [&a], &catalog).len(), 1);
    }

    #[test]
    fn test_disjoint_validity_windows() {
        let catalog = sample_catalog();
        let mut a = entry(1, "MON-0900", Some("R101"), None);
        a.valid_to = Some(ymd(2024, 2, 29));
        let mut b = entry(2, "MON-0900", Some("R101"), None);
        b.valid_from = ymd(2024, 3, 1);

        assert!(ConflictDetector::default().scan_entries(&b, [&a], &catalog).is_empty());
    }

    #[test]
    fn test_open_end_runs_to_term_end() {
        let catalog = sample_catalog();
        let mut a = entry(1, "MON-0900", Some("R101"), None);
        a.valid_to = None;
        let mut b = entry(2, "MON-0900", Some("R101"), None);
        b.valid_from = ymd(2024, 5, 27);

        let found = ConflictDetector::default().scan_entries(&b, [&a], &catalog);
        assert_eq!(found[0].overlap.to, ymd(2024, 5, 31));
    }

    #[test]
    fn test_reports_both_axes() {
        let catalog = sample_catalog();
        let a = entry(1, "MON-0900", Some("R101"), Some("P1"));
        let b = entry(2, "MON-0900", Some("R101"), Some("P1"));

        let found = ConflictDetector::default().scan_entries(&b, [&a], &catalog);
        let axes: Vec<Axis> = found.iter().map(|c| c.axis).collect();
        assert_eq!(axes, vec![Axis::Room, Axis::Instructor]);
    }

    #[test]
    fn test_null_resources_never_conflict() {
        let catalog = sample_catalog();
        let a = entry(1, "MON-0900", None, None);
        let b = entry(2, "MON-0900", None, Some("P1"));
        assert!(ConflictDetector::default().scan_entries(&b, [&a], &catalog).is_empty());
    }

    #[test]
    fn test_skips_inactive_and_self() {
        let catalog = sample_catalog();
        let mut inactive = entry(1, "MON-0900", Some("R101"), None);
        inactive.active = false;
        let me = entry(2, "MON-0900", Some("R101"), None);

        let found = ConflictDetector::default().scan_entries(&me, [&inactive, &me], &catalog);
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_occurrences_hits_makeup_on_pattern_day() {
        let catalog = sample_catalog();
        let candidate = entry(5, "MON-0900", Some("R102"), None);
        let makeup = Occurrence {
            date: ymd(2024, 3, 11),
            entry_id: EntryId(1),
            exception_id: Some(ExceptionId(7)),
            course_id: "C1".into(),
            section: None,
            slot: catalog.grid.get("MON-0930").unwrap().clone(),
            room_id: Some("R102".into()),
            instructor_id: Some("P2".into()),
            status: OccurrenceStatus::Makeup,
        };

        let found = ConflictDetector::default().scan_occurrences(&candidate, &[makeup], &catalog);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].exception_id, Some(ExceptionId(7)));
        assert_eq!(found[0].date, Some(ymd(2024, 3, 11)));
        assert_eq!(found[0].to_string(), "room R102 is held by entry #1 (exception x7) on Mon 09:30-10:00 (2024-03-11)");
    }
}
