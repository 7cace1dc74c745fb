//! Racing writers against one timetable.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{NaiveDate, NaiveTime, Weekday};
use u_timetable::models::{
    Catalog, EntryDraft, EntryFilter, Instructor, ResourceRef, Room, Term, TimeSlot,
};
use u_timetable::{Timetable, TimetableError};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn timetable() -> Timetable {
    let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
    let catalog = Catalog::new()
        .with_term(Term::new("S2", "2023-24", 2, ymd(2024, 1, 1), ymd(2024, 5, 31)).activated())
        .with_slot(TimeSlot::new("MON-09", Weekday::Mon, t(9), t(10)))
        .with_room(Room::new("R101"))
        .with_instructor(Instructor::new("P1"))
        .with_instructor(Instructor::new("P2"));
    Timetable::from_catalog(catalog).unwrap()
}

#[test]
fn two_racing_creates_one_wins() {
    for _ in 0..50 {
        let tt = timetable();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["CS101", "MA201"]
            .into_iter()
            .map(|course| {
                let tt = tt.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    tt.create_entry(
                        EntryDraft::new("S2", course, "MON-09", ymd(2024, 1, 1)).with_room("R101"),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(TimetableError::Conflict(_))))
            .count();
        assert_eq!((wins, conflicts), (1, 1), "{results:?}");
        assert_eq!(tt.list_entries(&EntryFilter::active()).unwrap().len(), 1);
    }
}

#[test]
fn many_writers_and_readers() {
    let tt = timetable();
    let writers = 8;
    let barrier = Arc::new(Barrier::new(writers + 2));

    let mut handles = Vec::new();
    for i in 0..writers {
        let tt = tt.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            // Same room every time; the instructor alternates.
            let prof = if i % 2 == 0 { "P1" } else { "P2" };
            tt.create_entry(
                EntryDraft::new("S2", format!("C{i}"), "MON-09", ymd(2024, 1, 1))
                    .with_room("R101")
                    .with_instructor(prof),
            )
            .is_ok()
        }));
    }

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let tt = tt.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..100 {
                    let day = tt.resolve_day(&ResourceRef::room("R101"), ymd(2024, 3, 4)).unwrap();
                    assert!(day.len() <= 1);
                }
            })
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(wins, 1);
}
