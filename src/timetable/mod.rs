//! The timetable service.
//!
//! [`Timetable`] owns the entry store and the exception overlay on top of an
//! immutable-per-call [`Catalog`], and exposes the mutation and read API.
//!
//! # Concurrency
//!
//! State lives behind a single `RwLock<Arc<State>>`. Every mutation runs
//! validation, the conflict scan, the deadline check and the commit while
//! holding the write guard, so scan and insert form one serialized
//! transaction: two racing writers for the same room and slot can never both
//! succeed. Commits go through `Arc::make_mut`, so readers holding an older
//! [`Snapshot`] keep seeing the state they started with and resolve without
//! holding the lock.
//!
//! A caller deadline bounds lock acquisition (retry with back-off) and is
//! checked again right before commit. Expiry returns
//! [`TimetableError::DeadlineExceeded`] with nothing written.

mod overlay;
mod resolver;
mod store;
mod summary;

pub use overlay::ExceptionOverlay;
pub use resolver::Resolver;
pub use store::EntryStore;
pub use summary::DayLoad;

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard, TryLockError};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::TimetableConfig;
use crate::conflict::{Conflict, ConflictDetector};
use crate::error::{TimetableError, TimetableResult};
use crate::models::{
    Catalog, DateWindow, EntryChanges, EntryDraft, EntryFilter, EntryId, ExceptionDraft,
    ExceptionId, ExceptionKind, Occurrence, OccurrenceStatus, ResourceRef, Room, ScheduleEntry,
    ScheduleException,
};
use crate::validation::{self, ValidationError, ValidationErrorKind};

#[derive(Debug, Clone)]
struct State {
    catalog: Catalog,
    store: EntryStore,
    overlay: ExceptionOverlay,
}

impl State {
    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.catalog, &self.store, &self.overlay)
    }
}

#[derive(Debug)]
struct Shared {
    state: RwLock<Arc<State>>,
    config: TimetableConfig,
    detector: ConflictDetector,
}

/// Point-in-time view of the timetable.
#[derive(Debug, Clone)]
pub struct Snapshot {
    state: Arc<State>,
}

impl Snapshot {
    pub fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    pub fn entries(&self) -> &EntryStore {
        &self.state.store
    }

    pub fn exceptions(&self) -> &ExceptionOverlay {
        &self.state.overlay
    }

    /// A resolver over this snapshot.
    pub fn resolver(&self) -> Resolver<'_> {
        self.state.resolver()
    }
}

/// Thread-safe handle to a timetable. Clones share the same state.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, NaiveTime, Weekday};
/// use u_timetable::models::{Catalog, EntryDraft, ResourceRef, Room, Term, TimeSlot};
/// use u_timetable::Timetable;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
/// let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
///
/// let catalog = Catalog::new()
///     .with_term(Term::new("2024-S2", "2023-24", 2, d(1, 1), d(5, 31)).activated())
///     .with_slot(TimeSlot::new("MON-09", Weekday::Mon, t(9), t(10)))
///     .with_room(Room::new("R101"));
/// let timetable = Timetable::from_catalog(catalog).unwrap();
///
/// let draft = EntryDraft::new("2024-S2", "CS101", "MON-09", d(1, 1)).with_room("R101");
/// timetable.create_entry(draft.clone()).unwrap();
/// assert!(timetable.create_entry(draft).is_err());
///
/// let day = timetable.resolve_day(&ResourceRef::room("R101"), d(2, 5)).unwrap();
/// assert_eq!(day.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Timetable {
    inner: Arc<Shared>,
}

impl Timetable {
    /// Creates an empty timetable over validated reference data.
    pub fn new(catalog: Catalog, config: TimetableConfig) -> TimetableResult<Self> {
        config.validate()?;
        validation::validate_catalog(&catalog)?;
        let detector = ConflictDetector::new(config.conflicts.match_mode);
        debug!(
            terms = catalog.terms.terms().len(),
            slots = catalog.grid.len(),
            rooms = catalog.resources.rooms().len(),
            instructors = catalog.resources.instructors().len(),
            match_mode = ?detector.mode(),
            "timetable initialized"
        );

        let state = State {
            catalog,
            store: EntryStore::new(),
            overlay: ExceptionOverlay::new(),
        };
        Ok(Self {
            inner: Arc::new(Shared {
                state: RwLock::new(Arc::new(state)),
                detector,
                config,
            }),
        })
    }

    /// Creates a timetable with default configuration.
    pub fn from_catalog(catalog: Catalog) -> TimetableResult<Self> {
        Self::new(catalog, TimetableConfig::default())
    }

    pub fn config(&self) -> &TimetableConfig {
        &self.inner.config
    }

    /// The current state. Later writes do not affect it.
    pub fn snapshot(&self) -> TimetableResult<Snapshot> {
        let state = self
            .inner
            .state
            .read()
            .map_err(|_| TimetableError::Poisoned)?;
        Ok(Snapshot {
            state: Arc::clone(&state),
        })
    }

    /// Makes `term_id` the only active term.
    pub fn activate_term(&self, term_id: &str) -> TimetableResult<()> {
        let mut guard = self.lock(None)?;
        if guard.catalog.terms.get(term_id).is_none() {
            return Err(TimetableError::not_found("term", term_id));
        }
        Arc::make_mut(&mut *guard).catalog.terms.activate(term_id);
        info!(term = term_id, "term activated");
        Ok(())
    }

    /// Validates, conflict-checks and stores a new entry.
    pub fn create_entry(&self, draft: EntryDraft) -> TimetableResult<EntryId> {
        let deadline = draft.deadline;
        let mut candidate = draft.into_entry(EntryId(0));
        validation::check_entry_shape(&candidate)?;

        let mut guard = self.lock(deadline)?;
        candidate.id = guard.store.peek_id();
        validation::validate_entry(&candidate, &guard.catalog)?;

        let conflicts = self.scan(&guard, &candidate);
        if !conflicts.is_empty() {
            return Err(rejected("create_entry", conflicts));
        }
        expire(deadline)?;

        let id = candidate.id;
        let term = candidate.term_id.clone();
        let course = candidate.course_id.clone();
        Arc::make_mut(&mut *guard).store.put(candidate);
        info!(entry_id = %id, term = %term, course = %course, "entry created");
        Ok(id)
    }

    /// Runs the checks of [`create_entry`](Self::create_entry) without
    /// writing. Returns the conflicts that would reject the draft.
    pub fn check_entry(&self, draft: &EntryDraft) -> TimetableResult<Vec<Conflict>> {
        let snapshot = self.snapshot()?;
        let mut candidate = draft.clone().into_entry(EntryId(0));
        candidate.id = snapshot.state.store.peek_id();
        validation::validate_entry(&candidate, &snapshot.state.catalog)?;
        Ok(self.scan(&snapshot.state, &candidate))
    }

    /// Applies `changes` to an active entry, re-checking it against every
    /// other active entry. The term of an entry cannot change.
    ///
    /// Overrides already recorded for the entry must still fall inside its
    /// new pattern, and its moves and makeups are re-checked with the new
    /// room and instructor.
    pub fn update_entry(&self, id: EntryId, changes: EntryChanges) -> TimetableResult<ScheduleEntry> {
        let mut guard = self.lock(changes.deadline)?;
        let current = guard
            .store
            .get(id)
            .ok_or_else(|| TimetableError::not_found("entry", id))?;
        if !current.active {
            return Err(TimetableError::Validation(vec![ValidationError::new(
                ValidationErrorKind::InactiveEntry,
                format!("Entry {id} has been deactivated"),
            )]));
        }

        let next = changes.apply(current);
        validation::validate_entry(&next, &guard.catalog)?;
        validation::validate_overrides(&next, guard.overlay.for_entry(id), &guard.catalog)?;

        let mut conflicts = self.scan(&guard, &next);
        conflicts.extend(self.scan_own_replacements(&guard, &next));
        if !conflicts.is_empty() {
            return Err(rejected("update_entry", conflicts));
        }
        expire(changes.deadline)?;

        Arc::make_mut(&mut *guard).store.put(next.clone());
        info!(entry_id = %id, slot = %next.slot_id, "entry updated");
        Ok(next)
    }

    /// Retires an entry from `effective` onward. Occurrences before that
    /// date still resolve. Deactivating twice is a no-op.
    pub fn deactivate_entry(&self, id: EntryId, effective: NaiveDate) -> TimetableResult<()> {
        let mut guard = self.lock(None)?;
        match guard.store.get(id) {
            None => return Err(TimetableError::not_found("entry", id)),
            Some(entry) if !entry.active => {
                debug!(entry_id = %id, "entry already inactive");
                return Ok(());
            }
            Some(_) => {}
        }
        Arc::make_mut(&mut *guard).store.deactivate(id, effective);
        info!(entry_id = %id, effective = %effective, "entry deactivated");
        Ok(())
    }

    /// Records a date-specific override.
    ///
    /// Reschedules and makeups are checked against what is busy on that
    /// date; a reschedule frees the entry's own regular session first.
    pub fn add_exception(&self, draft: ExceptionDraft) -> TimetableResult<ExceptionId> {
        let deadline = draft.deadline;
        let mut guard = self.lock(deadline)?;
        let state: &State = &guard;

        let entry = match draft.entry_id {
            Some(id) => Some(
                state
                    .store
                    .get(id)
                    .ok_or_else(|| TimetableError::not_found("entry", id))?,
            ),
            None => None,
        };

        let mut errors = validation::validate_exception(&draft, entry, &state.catalog)
            .err()
            .unwrap_or_default();
        if let Some(entry) = entry.filter(|_| draft.kind.overrides_session()) {
            if let Some(existing) = state.overlay.override_for(entry.id, draft.date) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateOverride,
                    format!(
                        "Entry {} already has a {} exception ({}) on {}",
                        entry.id, existing.kind, existing.id, draft.date
                    ),
                ));
            }
        }
        if !errors.is_empty() {
            return Err(TimetableError::Validation(errors));
        }

        if let Some(entry) = entry {
            let conflicts = self.scan_replacement(state, &draft, entry);
            if !conflicts.is_empty() {
                return Err(rejected("add_exception", conflicts));
            }
        }
        expire(deadline)?;

        let id = state.overlay.peek_id();
        let (kind, date, entry_id) = (draft.kind, draft.date, draft.entry_id);
        Arc::make_mut(&mut *guard)
            .overlay
            .record(draft.into_exception(id));
        info!(exception_id = %id, kind = %kind, date = %date, entry_id = ?entry_id, "exception added");
        Ok(id)
    }

    /// Every exception recorded for a date, in id order.
    pub fn exceptions_for_date(&self, date: NaiveDate) -> TimetableResult<Vec<ScheduleException>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.state.overlay.on_date(date).cloned().collect())
    }

    /// Every exception attached to an entry, in date order.
    pub fn exceptions_for_entry(&self, id: EntryId) -> TimetableResult<Vec<ScheduleException>> {
        let snapshot = self.snapshot()?;
        if snapshot.state.store.get(id).is_none() {
            return Err(TimetableError::not_found("entry", id));
        }
        Ok(snapshot
            .state
            .overlay
            .for_entry(id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn get_entry(&self, id: EntryId) -> TimetableResult<ScheduleEntry> {
        let snapshot = self.snapshot()?;
        snapshot
            .state
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| TimetableError::not_found("entry", id))
    }

    /// Entries passing `filter`, ordered by (weekday, start time, id).
    pub fn list_entries(&self, filter: &EntryFilter) -> TimetableResult<Vec<ScheduleEntry>> {
        let snapshot = self.snapshot()?;
        let state = &snapshot.state;
        Ok(state
            .store
            .select(filter, &state.catalog)
            .into_iter()
            .cloned()
            .collect())
    }

    /// What a room or instructor is doing on a date, in start-time order.
    pub fn resolve_day(&self, resource: &ResourceRef, date: NaiveDate) -> TimetableResult<Vec<Occurrence>> {
        let snapshot = self.snapshot()?;
        known(&snapshot.state, resource)?;
        let day = snapshot.state.resolver().day(resource, date);
        debug!(resource = %resource, date = %date, occurrences = day.len(), "day resolved");
        Ok(day)
    }

    /// [`resolve_day`](Self::resolve_day) for every date of an inclusive window.
    pub fn resolve_range(
        &self,
        resource: &ResourceRef,
        window: DateWindow,
    ) -> TimetableResult<BTreeMap<NaiveDate, Vec<Occurrence>>> {
        if !window.is_well_formed() {
            return Err(TimetableError::Validation(vec![ValidationError::new(
                ValidationErrorKind::InvertedDateWindow,
                format!("Range ends ({}) before it starts ({})", window.to, window.from),
            )]));
        }
        let snapshot = self.snapshot()?;
        known(&snapshot.state, resource)?;
        Ok(snapshot.state.resolver().range(resource, window))
    }

    /// Load figures for a resource on a date.
    pub fn day_load(&self, resource: &ResourceRef, date: NaiveDate) -> TimetableResult<DayLoad> {
        let day = self.resolve_day(resource, date)?;
        Ok(DayLoad::from_occurrences(date, &day))
    }

    /// Active rooms that could take a booking of `slot_id` over `window`.
    pub fn free_rooms(&self, term_id: &str, slot_id: &str, window: DateWindow) -> TimetableResult<Vec<Room>> {
        let snapshot = self.snapshot()?;
        let state = &snapshot.state;
        let Some(term) = state.catalog.terms.get(term_id) else {
            return Err(TimetableError::not_found("term", term_id));
        };
        if state.catalog.grid.get(slot_id).is_none() {
            return Err(TimetableError::not_found("time slot", slot_id));
        }

        let mut errors = Vec::new();
        if !window.is_well_formed() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedDateWindow,
                format!("Range ends ({}) before it starts ({})", window.to, window.from),
            ));
        }
        for date in [window.from, window.to] {
            if !term.contains(date) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OutsideTerm,
                    format!("{date} is outside term '{}'", term.id),
                ));
            }
        }
        if !errors.is_empty() {
            return Err(TimetableError::Validation(errors));
        }

        let probe_id = state.store.peek_id();
        let free: Vec<Room> = state
            .catalog
            .resources
            .rooms()
            .iter()
            .filter(|room| room.active)
            .filter(|room| {
                let probe = EntryDraft::new(term_id, "", slot_id, window.from)
                    .until(window.to)
                    .with_room(room.id.clone())
                    .into_entry(probe_id);
                self.scan(state, &probe).is_empty()
            })
            .cloned()
            .collect();
        debug!(term = term_id, slot = slot_id, free = free.len(), "free rooms");
        Ok(free)
    }

    fn lock(&self, deadline: Option<Instant>) -> TimetableResult<RwLockWriteGuard<'_, Arc<State>>> {
        let Some(deadline) = deadline else {
            return self
                .inner
                .state
                .write()
                .map_err(|_| TimetableError::Poisoned);
        };

        loop {
            match self.inner.state.try_write() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(_)) => return Err(TimetableError::Poisoned),
                Err(TryLockError::WouldBlock) => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!("deadline passed waiting for the timetable lock");
                        return Err(TimetableError::DeadlineExceeded);
                    }
                    thread::sleep(self.inner.config.retry_delay().min(deadline - now));
                }
            }
        }
    }

    /// Recurring entries of the candidate's term, then recorded moves and
    /// makeups when exception checking is on.
    fn scan(&self, state: &State, candidate: &ScheduleEntry) -> Vec<Conflict> {
        let detector = self.inner.detector;
        let peers = state.store.active_in_term(&candidate.term_id);
        let mut conflicts = detector.scan_entries(candidate, peers, &state.catalog);

        if self.inner.config.conflicts.check_exceptions {
            let replacements = state.resolver().replacement_occurrences();
            conflicts.extend(detector.scan_occurrences(candidate, &replacements, &state.catalog));
        }
        debug!(entry_id = %candidate.id, conflicts = conflicts.len(), "conflict scan");
        conflicts
    }

    fn scan_replacement(
        &self,
        state: &State,
        draft: &ExceptionDraft,
        entry: &ScheduleEntry,
    ) -> Vec<Conflict> {
        if !self.inner.config.conflicts.check_exceptions || !draft.kind.requires_replacement() {
            return Vec::new();
        }
        let Some(proposed) = replacement(
            state,
            entry,
            draft.kind,
            draft.date,
            draft.replacement_slot_id.as_deref(),
            draft.replacement_room_id.as_deref(),
        ) else {
            return Vec::new();
        };

        let frees_own = proposed.status == OccurrenceStatus::Moved;
        let busy: Vec<Occurrence> = state
            .resolver()
            .occurrences_on(draft.date)
            .into_iter()
            .filter(|o| {
                !(frees_own && o.entry_id == entry.id && o.status == OccurrenceStatus::Scheduled)
            })
            .collect();
        self.inner.detector.scan_replacement(&proposed, &busy)
    }

    /// Rebuilds an edited entry's recorded moves and makeups with its new
    /// room and instructor and checks them against everyone else's day.
    fn scan_own_replacements(&self, state: &State, entry: &ScheduleEntry) -> Vec<Conflict> {
        if !self.inner.config.conflicts.check_exceptions {
            return Vec::new();
        }
        let resolver = state.resolver();
        let mut conflicts = Vec::new();

        for x in state.overlay.for_entry(entry.id) {
            if !x.kind.requires_replacement() {
                continue;
            }
            let Some(proposed) = replacement(
                state,
                entry,
                x.kind,
                x.date,
                x.replacement_slot_id.as_deref(),
                x.replacement_room_id.as_deref(),
            ) else {
                continue;
            };
            let busy: Vec<Occurrence> = resolver
                .occurrences_on(x.date)
                .into_iter()
                .filter(|o| o.entry_id != entry.id)
                .collect();
            conflicts.extend(self.inner.detector.scan_replacement(&proposed, &busy));
        }
        debug!(entry_id = %entry.id, conflicts = conflicts.len(), "own replacement scan");
        conflicts
    }
}

/// The single-date occurrence a reschedule or makeup puts on the calendar.
/// The room falls back to the entry's own.
fn replacement(
    state: &State,
    entry: &ScheduleEntry,
    kind: ExceptionKind,
    date: NaiveDate,
    slot_id: Option<&str>,
    room_id: Option<&str>,
) -> Option<Occurrence> {
    let slot = slot_id.and_then(|id| state.catalog.grid.get(id))?;
    let status = match kind {
        ExceptionKind::Makeup => OccurrenceStatus::Makeup,
        _ => OccurrenceStatus::Moved,
    };
    let room = room_id.map(str::to_string).or_else(|| entry.room_id.clone());
    Some(resolver::build(entry, date, slot, room, status, None))
}

fn rejected(op: &'static str, conflicts: Vec<Conflict>) -> TimetableError {
    if let Some(first) = conflicts.first() {
        warn!(
            op = op,
            count = conflicts.len(),
            axis = %first.axis,
            resource = %first.resource,
            holder = %first.entry_id,
            "rejected: conflict"
        );
    }
    TimetableError::Conflict(conflicts)
}

fn expire(deadline: Option<Instant>) -> TimetableResult<()> {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        warn!("deadline passed before commit; change discarded");
        return Err(TimetableError::DeadlineExceeded);
    }
    Ok(())
}

fn known(state: &State, resource: &ResourceRef) -> TimetableResult<()> {
    if state.catalog.resources.lookup(resource).is_none() {
        return Err(TimetableError::not_found(
            match resource {
                ResourceRef::Room(_) => "room",
                ResourceRef::Instructor(_) => "instructor",
            },
            resource.id(),
        ));
    }
    Ok(())
}
