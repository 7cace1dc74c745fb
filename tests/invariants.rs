//! Randomized mutation sequences never leave a double booking behind.

use std::thread;

use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use u_timetable::models::{
    Catalog, EntryChanges, EntryDraft, EntryFilter, Instructor, Room, ScheduleEntry, Term,
    TimeSlot,
};
use u_timetable::{Snapshot, Timetable};

const ROOMS: [&str; 3] = ["R1", "R2", "R3"];
const PROFS: [&str; 3] = ["P1", "P2", "P3"];

fn term_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn catalog() -> Catalog {
    let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
    let mut catalog = Catalog::new().with_term(
        Term::new("S2", "2023-24", 2, term_start(), term_start() + Duration::days(150)).activated(),
    );
    for (day, weekday) in [("MON", Weekday::Mon), ("TUE", Weekday::Tue)] {
        for (start, end) in [(t(9, 0), t(10, 0)), (t(9, 30), t(10, 30)), (t(10, 0), t(11, 30))] {
            let id = format!("{day}-{}", start.format("%H%M"));
            catalog = catalog.with_slot(TimeSlot::new(id, weekday, start, end));
        }
    }
    for r in ROOMS {
        catalog = catalog.with_room(Room::new(r));
    }
    for p in PROFS {
        catalog = catalog.with_instructor(Instructor::new(p));
    }
    catalog
}

fn random_draft(rng: &mut StdRng, slots: &[String], n: usize) -> EntryDraft {
    let from = term_start() + Duration::days(rng.random_range(0..120));
    let mut draft = EntryDraft::new("S2", format!("C{n}"), &slots[rng.random_range(0..slots.len())], from);
    if rng.random_bool(0.8) {
        draft = draft.with_room(ROOMS[rng.random_range(0..ROOMS.len())]);
    }
    if rng.random_bool(0.8) {
        draft = draft.with_instructor(PROFS[rng.random_range(0..PROFS.len())]);
    }
    if rng.random_bool(0.5) {
        draft = draft.until(from + Duration::days(rng.random_range(0..30)));
    }
    draft
}

fn collide(snapshot: &Snapshot, a: &ScheduleEntry, b: &ScheduleEntry) -> bool {
    let catalog = snapshot.catalog();
    let shares = (a.room_id.is_some() && a.room_id == b.room_id)
        || (a.instructor_id.is_some() && a.instructor_id == b.instructor_id);
    let (sa, sb) = (catalog.slot_of(a).unwrap(), catalog.slot_of(b).unwrap());
    let (wa, wb) = (catalog.window_of(a).unwrap(), catalog.window_of(b).unwrap());
    shares
        && sa.weekday == sb.weekday
        && sa.start() < sb.end()
        && sb.start() < sa.end()
        && wa.from <= wb.to
        && wb.from <= wa.to
}

fn assert_no_double_booking(tt: &Timetable) -> usize {
    let snapshot = tt.snapshot().unwrap();
    let active = tt.list_entries(&EntryFilter::active()).unwrap();
    for (i, a) in active.iter().enumerate() {
        for b in &active[i + 1..] {
            assert!(!collide(&snapshot, a, b), "double booking: {a:?} / {b:?}");
        }
    }
    active.len()
}

#[test]
fn random_creates_updates_and_deactivations() {
    let tt = Timetable::from_catalog(catalog()).unwrap();
    let slots: Vec<String> = tt
        .snapshot()
        .unwrap()
        .catalog()
        .grid
        .slots()
        .iter()
        .map(|s| s.id.clone())
        .collect();
    let mut rng = StdRng::seed_from_u64(42);
    let mut created = Vec::new();

    for n in 0..300 {
        match rng.random_range(0..10) {
            0..=5 => {
                if let Ok(id) = tt.create_entry(random_draft(&mut rng, &slots, n)) {
                    created.push(id);
                }
            }
            6..=8 if !created.is_empty() => {
                let id = created[rng.random_range(0..created.len())];
                let changes = EntryChanges::new()
                    .with_slot(&slots[rng.random_range(0..slots.len())])
                    .with_room(ROOMS[rng.random_range(0..ROOMS.len())]);
                let _ = tt.update_entry(id, changes);
            }
            _ if !created.is_empty() => {
                let id = created[rng.random_range(0..created.len())];
                let cutoff = term_start() + Duration::days(rng.random_range(0..150));
                tt.deactivate_entry(id, cutoff).unwrap();
            }
            _ => {}
        }
    }

    assert!(assert_no_double_booking(&tt) > 0);
}

#[test]
fn concurrent_random_creates() {
    let tt = Timetable::from_catalog(catalog()).unwrap();
    let slots: Vec<String> = tt
        .snapshot()
        .unwrap()
        .catalog()
        .grid
        .slots()
        .iter()
        .map(|s| s.id.clone())
        .collect();

    let handles: Vec<_> = (0..4u64)
        .map(|seed| {
            let tt = tt.clone();
            let slots = slots.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                for n in 0..100 {
                    let _ = tt.create_entry(random_draft(&mut rng, &slots, n));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(assert_no_double_booking(&tt) > 0);
}
