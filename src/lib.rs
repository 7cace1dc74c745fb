//! Academic timetable core.
//!
//! Stores recurring schedule entries (course section + weekly time slot +
//! room + instructor over a validity window), rejects double bookings of a
//! room or an instructor, and resolves the concrete occurrences of any date
//! once cancellations, reschedules, makeups and holidays are applied.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Term`, `TimeSlot`, `Room`, `Instructor`,
//!   `ScheduleEntry`, `ScheduleException`, `Occurrence`, `Catalog`
//! - **`validation`**: Input integrity checks (duplicate IDs, inverted ranges,
//!   dangling references, dates outside terms)
//! - **`conflict`**: Half-open interval overlap on the room and instructor axes
//! - **`timetable`**: The thread-safe [`Timetable`] service, entry store,
//!   exception overlay and occurrence resolver
//! - **`config`**: Layered configuration (defaults, `timetable.toml`, env)
//! - **`error`**: [`TimetableError`]
//!
//! # Logging
//!
//! Mutations and rejections are reported through `tracing`. The crate never
//! installs a subscriber.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Allen (1983), "Maintaining Knowledge about Temporal Intervals"

pub mod config;
pub mod conflict;
pub mod error;
pub mod models;
pub mod timetable;
pub mod validation;

pub use config::TimetableConfig;
pub use conflict::{Conflict, ConflictDetector, MatchMode};
pub use error::{TimetableError, TimetableResult};
pub use timetable::{Snapshot, Timetable};
