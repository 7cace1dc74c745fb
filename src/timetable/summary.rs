//! Per-day load figures.
//!
//! Summarizes resolved occurrences for allocation views.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Scheduled / Moved / Makeup | Sessions that meet, by status |
//! | Cancelled | Sessions shown for visibility only |
//! | Busy minutes | Sum of meeting durations, cancelled excluded |
//! | Utilization | Busy minutes / available minutes |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Occurrence, OccurrenceStatus};

/// Load of one resource on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLoad {
    /// The date summarized.
    pub date: NaiveDate,
    /// Regular sessions that meet.
    pub scheduled: usize,
    /// Sessions moved into this resource's day.
    pub moved: usize,
    /// Makeup sessions.
    pub makeup: usize,
    /// Sessions that do not meet.
    pub cancelled: usize,
    /// Minutes the resource is occupied.
    pub busy_minutes: i64,
}

impl DayLoad {
    /// Summarizes resolved occurrences for one date.
    pub fn from_occurrences(date: NaiveDate, occurrences: &[Occurrence]) -> Self {
        let mut load = Self {
            date,
            scheduled: 0,
            moved: 0,
            makeup: 0,
            cancelled: 0,
            busy_minutes: 0,
        };
        for occ in occurrences.iter().filter(|o| o.date == date) {
            match occ.status {
                OccurrenceStatus::Scheduled => load.scheduled += 1,
                OccurrenceStatus::Moved => load.moved += 1,
                OccurrenceStatus::Makeup => load.makeup += 1,
                OccurrenceStatus::Cancelled => load.cancelled += 1,
            }
            if occ.is_busy() {
                load.busy_minutes += occ.slot.range.duration_minutes();
            }
        }
        load
    }

    /// Sessions that actually meet.
    pub fn meeting_count(&self) -> usize {
        self.scheduled + self.moved + self.makeup
    }

    /// Busy share of the available minutes.
    ///
    /// Returns `None` if `available_minutes` is zero or negative.
    pub fn utilization(&self, available_minutes: i64) -> Option<f64> {
        if available_minutes <= 0 {
            return None;
        }
        Some(self.busy_minutes as f64 / available_minutes as f64)
    }
}
