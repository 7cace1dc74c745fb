//! Time grid models.
//!
//! Defines the weekly slots schedule entries bind to, and the two interval
//! types the conflict detector compares: wall-clock ranges within a day and
//! calendar date windows.
//!
//! # Interval Model
//! Both interval types are half-open. A [`TimeRange`] `[09:00, 10:00)` does
//! not collide with `[10:00, 11:00)`. A [`DateWindow`] is written with an
//! inclusive last day (`from..=to`) and compared as `[from, to + 1 day)`.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A wall-clock interval [start, end) within a single day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeRange {
    /// Interval start (inclusive).
    pub start: NaiveTime,
    /// Interval end (exclusive).
    pub end: NaiveTime,
}

impl TimeRange {
    /// Creates a new time range.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether start precedes end.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    /// Length of the range in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether a time falls within this range.
    #[inline]
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether two ranges overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The common part of two ranges, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Self { start, end })
    }
}

/// A calendar date window, inclusive of both ends.
///
/// Overlap is evaluated as the half-open `[from, to + 1 day)`, which for
/// whole days is the same as comparing the inclusive bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateWindow {
    /// First day of the window.
    pub from: NaiveDate,
    /// Last day of the window.
    pub to: NaiveDate,
}

impl DateWindow {
    /// Creates a new date window.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// A window covering one day.
    pub fn single(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// Whether `from` is on or before `to`.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.from <= self.to
    }

    /// Whether a date falls within this window.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Whether two windows share at least one day.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    /// The common part of two windows, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let from = self.from.max(other.from);
        let to = self.to.min(other.to);
        (from <= to).then_some(Self { from, to })
    }

    /// Iterates the days of the window in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

/// A recurring weekly time slot: (day-of-week, start, end).
///
/// Slots are reference data owned by the time grid. Entries refer to them
/// by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    /// Unique slot identifier.
    pub id: String,
    /// Day of week the slot recurs on.
    pub weekday: Weekday,
    /// Wall-clock range on that day.
    pub range: TimeRange,
}

impl TimeSlot {
    /// Creates a new slot.
    pub fn new(id: impl Into<String>, weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            id: id.into(),
            weekday,
            range: TimeRange::new(start, end),
        }
    }

    /// Day of week as 0 (Monday) through 6 (Sunday).
    #[inline]
    pub fn day_index(&self) -> u32 {
        self.weekday.num_days_from_monday()
    }

    /// Slot start time.
    #[inline]
    pub fn start(&self) -> NaiveTime {
        self.range.start
    }

    /// Slot end time.
    #[inline]
    pub fn end(&self) -> NaiveTime {
        self.range.end
    }

    /// Whether the slot recurs on the given date's weekday.
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        date.weekday() == self.weekday
    }

    /// Whether two slots describe the same (weekday, start, end).
    pub fn same_signature(&self, other: &Self) -> bool {
        self.weekday == other.weekday && self.range == other.range
    }

    /// Wall-clock overlap with another slot on the same weekday.
    pub fn overlap(&self, other: &Self) -> Option<TimeRange> {
        if self.weekday != other.weekday {
            return None;
        }
        self.range.intersection(&other.range)
    }
}

/// Catalog of the time slots available for booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeGrid {
    slots: Vec<TimeSlot>,
}

impl TimeGrid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot. Integrity is checked by
    /// [`validate_catalog`](crate::validation::validate_catalog).
    pub fn push(&mut self, slot: TimeSlot) {
        self.slots.push(slot);
    }

    /// Looks up a slot by id.
    pub fn get(&self, id: &str) -> Option<&TimeSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    /// All slots in insertion order.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Slots recurring on a weekday, ordered by start time.
    pub fn on_weekday(&self, weekday: Weekday) -> Vec<&TimeSlot> {
        let mut slots: Vec<&TimeSlot> = self.slots.iter().filter(|s| s.weekday == weekday).collect();
        slots.sort_by_key(|s| (s.start(), s.end()));
        slots
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the grid has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_time_range() {
        let r = TimeRange::new(hm(9, 0), hm(10, 0));
        assert_eq!(r.duration_minutes(), 60);
        assert!(r.contains(hm(9, 0)));
        assert!(r.contains(hm(9, 59)));
        assert!(!r.contains(hm(10, 0))); // exclusive end
        assert!(r.is_well_formed());
        assert!(!TimeRange::new(hm(10, 0), hm(10, 0)).is_well_formed());
    }

    #[test]
    fn test_time_range_overlap() {
        let a = TimeRange::new(hm(9, 0), hm(10, 0));
        let b = TimeRange::new(hm(9, 30), hm(10, 30));
        assert!(a.overlaps(&b));
        assert_eq!(a.intersection(&b), Some(TimeRange::new(hm(9, 30), hm(10, 0))));

        let c = TimeRange::new(hm(10, 0), hm(11, 0)); // touching
        assert!(!a.overlaps(&c));
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_date_window() {
        let w = DateWindow::new(ymd(2024, 1, 1), ymd(2024, 1, 31));
        assert!(w.contains(ymd(2024, 1, 1)));
        assert!(w.contains(ymd(2024, 1, 31)));
        assert!(!w.contains(ymd(2024, 2, 1)));

        let adjacent = DateWindow::new(ymd(2024, 1, 31), ymd(2024, 2, 10));
        assert!(w.overlaps(&adjacent)); // share the 31st
        assert_eq!(w.intersection(&adjacent), Some(DateWindow::single(ymd(2024, 1, 31))));

        let after = DateWindow::new(ymd(2024, 2, 1), ymd(2024, 2, 10));
        assert!(!w.overlaps(&after));
    }

    #[test]
    fn test_date_window_days() {
        let w = DateWindow::new(ymd(2024, 2, 27), ymd(2024, 3, 1));
        let days: Vec<NaiveDate> = w.days().collect();
        assert_eq!(days.len(), 4); // leap year
        assert_eq!(days[2], ymd(2024, 2, 29));
    }

    #[test]
    fn test_slot_overlap_requires_same_weekday() {
        let mon = TimeSlot::new("MON-1", Weekday::Mon, hm(9, 0), hm(10, 0));
        let mon_late = TimeSlot::new("MON-2", Weekday::Mon, hm(9, 30), hm(10, 30));
        let tue = TimeSlot::new("TUE-1", Weekday::Tue, hm(9, 0), hm(10, 0));

        assert!(mon.overlap(&mon_late).is_some());
        assert!(mon.overlap(&tue).is_none());
        assert_eq!(mon.day_index(), 0);
        assert!(mon.falls_on(ymd(2024, 2, 5))); // a Monday
        assert!(!mon.falls_on(ymd(2024, 2, 6)));
    }

    #[test]
    fn test_grid_weekday_ordering() {
        let mut grid = TimeGrid::new();
        grid.push(TimeSlot::new("B", Weekday::Wed, hm(11, 0), hm(12, 0)));
        grid.push(TimeSlot::new("A", Weekday::Wed, hm(8, 0), hm(9, 0)));
        grid.push(TimeSlot::new("C", Weekday::Thu, hm(8, 0), hm(9, 0)));

        let wed: Vec<&str> = grid.on_weekday(Weekday::Wed).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(wed, vec!["A", "B"]);
        assert_eq!(grid.get("C").map(|s| s.weekday), Some(Weekday::Thu));
        assert!(grid.get("Z").is_none());
        assert_eq!(grid.len(), 3);
    }
}
