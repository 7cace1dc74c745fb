//! Academic term model.
//!
//! A term bounds every schedule entry: validity windows default to the
//! term end and may not leave it. At most one term is active at a time;
//! new entries can only be booked into the active term.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DateWindow;

/// An academic year/semester window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Term {
    /// Unique term identifier.
    pub id: String,
    /// Academic year label (e.g., "2023-24").
    pub academic_year: String,
    /// Semester ordinal within the year (1, 2, ...).
    pub semester: u8,
    /// First day of the term.
    pub start: NaiveDate,
    /// Last day of the term.
    pub end: NaiveDate,
    /// Whether this is the active term.
    pub active: bool,
}

impl Term {
    /// Creates an inactive term.
    pub fn new(
        id: impl Into<String>,
        academic_year: impl Into<String>,
        semester: u8,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            academic_year: academic_year.into(),
            semester,
            start,
            end,
            active: false,
        }
    }

    /// Marks the term active.
    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    /// The term's date bounds.
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start, self.end)
    }

    /// Whether a date falls inside the term.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.window().contains(date)
    }
}

/// The set of known terms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermCatalog {
    terms: Vec<Term>,
}

impl TermCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a term. Integrity is checked by
    /// [`validate_catalog`](crate::validation::validate_catalog).
    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    /// Looks up a term by id.
    pub fn get(&self, id: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.id == id)
    }

    /// The currently active term, if any.
    pub fn active(&self) -> Option<&Term> {
        self.terms.iter().find(|t| t.active)
    }

    /// The first term whose window contains `date`.
    pub fn containing(&self, date: NaiveDate) -> Option<&Term> {
        self.terms.iter().find(|t| t.contains(date))
    }

    /// Makes `id` the only active term.
    ///
    /// Returns `false` (and changes nothing) if the term is unknown.
    pub fn activate(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        for term in &mut self.terms {
            term.active = term.id == id;
        }
        true
    }

    /// All terms in insertion order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_catalog() -> TermCatalog {
        let mut terms = TermCatalog::new();
        terms.push(Term::new("2023-S1", "2023-24", 1, ymd(2023, 8, 1), ymd(2023, 12, 20)).activated());
        terms.push(Term::new("2023-S2", "2023-24", 2, ymd(2024, 1, 1), ymd(2024, 5, 31)));
        terms
    }

    #[test]
    fn test_term_contains() {
        let t = Term::new("T", "2023-24", 2, ymd(2024, 1, 1), ymd(2024, 5, 31));
        assert!(t.contains(ymd(2024, 1, 1)));
        assert!(t.contains(ymd(2024, 5, 31)));
        assert!(!t.contains(ymd(2024, 6, 1)));
        assert!(!t.active);
    }

    #[test]
    fn test_activate_flips_siblings() {
        let mut terms = sample_catalog();
        assert_eq!(terms.active().map(|t| t.id.as_str()), Some("2023-S1"));

        assert!(terms.activate("2023-S2"));
        assert_eq!(terms.active().map(|t| t.id.as_str()), Some("2023-S2"));
        assert_eq!(terms.terms().iter().filter(|t| t.active).count(), 1);
    }

    #[test]
    fn test_activate_unknown_is_noop() {
        let mut terms = sample_catalog();
        assert!(!terms.activate("missing"));
        assert_eq!(terms.active().map(|t| t.id.as_str()), Some("2023-S1"));
    }

    #[test]
    fn test_containing() {
        let terms = sample_catalog();
        assert_eq!(terms.containing(ymd(2024, 3, 4)).map(|t| t.semester), Some(2));
        assert!(terms.containing(ymd(2023, 12, 25)).is_none());
    }
}
