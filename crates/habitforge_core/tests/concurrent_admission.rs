use chrono::{TimeZone, Utc};
use habitforge_core::db::open_db;
use habitforge_core::{
    Cadence, EngineError, FixedClock, Habit, HabitEngine, HabitLogRepository, HabitRepository,
    SqliteHabitLogRepository, SqliteHabitRepository,
};
use std::sync::{Arc, Barrier};
use std::thread;

const WRITERS: usize = 8;

#[test]
fn concurrent_admissions_admit_one_log_per_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitforge.db");
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();

    // Migrate once up front so writers only contend on the log insert.
    let habit = Habit::new("ana", "run", Some(Cadence::Daily), now);
    {
        let conn = open_db(&path).unwrap();
        SqliteHabitRepository::try_new(&conn)
            .unwrap()
            .create_habit(&habit)
            .unwrap();
    }

    let clock = Arc::new(FixedClock::new(now));
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles = (0..WRITERS)
        .map(|_| {
            let path = path.clone();
            let clock = Arc::clone(&clock);
            let barrier = Arc::clone(&barrier);
            let habit_id = habit.habit_id;
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let engine = HabitEngine::new(
                    SqliteHabitRepository::try_new(&conn).unwrap(),
                    SqliteHabitLogRepository::try_new(&conn).unwrap(),
                    clock,
                );
                barrier.wait();
                engine.admit_log(habit_id, "done")
            })
        })
        .collect::<Vec<_>>();

    let results = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    let admitted = results.iter().filter(|result| result.is_ok()).count();
    let limited = results
        .iter()
        .filter(|result| matches!(result, Err(EngineError::RateLimited { .. })))
        .count();
    assert_eq!(admitted, 1, "results: {results:?}");
    assert_eq!(limited, WRITERS - 1, "results: {results:?}");

    let conn = open_db(&path).unwrap();
    let history = SqliteHabitLogRepository::try_new(&conn)
        .unwrap()
        .find_logs_ascending(habit.habit_id)
        .unwrap();
    assert_eq!(history.len(), 1);
}
