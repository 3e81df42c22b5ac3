use chrono::{DateTime, Duration, TimeZone, Utc};
use habitforge_core::db::open_db_in_memory;
use habitforge_core::{
    Cadence, EngineError, FixedClock, Habit, HabitEngine, HabitLog, HabitLogRepository,
    HabitRepository, SqliteHabitLogRepository, SqliteHabitRepository, ValidationError,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

type Engine<'c> =
    HabitEngine<SqliteHabitRepository<'c>, SqliteHabitLogRepository<'c>, &'c FixedClock>;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 8, 30, 0).unwrap()
}

fn engine<'c>(conn: &'c Connection, clock: &'c FixedClock) -> Engine<'c> {
    HabitEngine::new(
        SqliteHabitRepository::try_new(conn).unwrap(),
        SqliteHabitLogRepository::try_new(conn).unwrap(),
        clock,
    )
}

fn seed_habit(conn: &Connection, cadence: Option<Cadence>) -> Habit {
    let habit = Habit::new("ana", "read", cadence, t0());
    SqliteHabitRepository::try_new(conn)
        .unwrap()
        .create_habit(&habit)
        .unwrap();
    habit
}

#[test]
fn first_daily_log_is_admitted() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(t0());
    let habit = seed_habit(&conn, Some(Cadence::Daily));

    let log = engine(&conn, &clock).admit_log(habit.habit_id, "done").unwrap();
    assert_eq!(log.habit_id, habit.habit_id);
    assert_eq!(log.username, "ana");
    assert_eq!(log.habit_name, "read");
    assert_eq!(log.value, "done");
    assert_eq!(log.logged_at, t0());

    let stored = SqliteHabitLogRepository::try_new(&conn)
        .unwrap()
        .find_most_recent_log(habit.habit_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, log);
}

#[test]
fn admitted_log_matches_stored_row_at_sub_millisecond_clock() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(t0() + Duration::microseconds(500));
    let habit = seed_habit(&conn, Some(Cadence::Daily));

    let log = engine(&conn, &clock).admit_log(habit.habit_id, "done").unwrap();
    assert_eq!(log.logged_at, t0());

    let stored = SqliteHabitLogRepository::try_new(&conn)
        .unwrap()
        .find_most_recent_log(habit.habit_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, log);
}

#[test]
fn value_is_normalized_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(t0());
    let habit = seed_habit(&conn, Some(Cadence::Daily));

    let log = engine(&conn, &clock).admit_log(habit.habit_id, " DONE ").unwrap();
    assert_eq!(log.value, "done");
}

#[test]
fn second_daily_log_within_a_day_is_rate_limited() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(t0());
    let habit = seed_habit(&conn, Some(Cadence::Daily));
    let engine = engine(&conn, &clock);

    engine.admit_log(habit.habit_id, "done").unwrap();
    clock.advance(Duration::hours(23) + Duration::minutes(59));

    let err = engine.admit_log(habit.habit_id, "done").unwrap_err();
    match err {
        EngineError::RateLimited {
            cadence,
            min_interval,
        } => {
            assert_eq!(cadence, Cadence::Daily);
            assert_eq!(min_interval, Duration::days(1));
        }
        other => panic!("unexpected error: {other}"),
    }

    clock.set(t0() + Duration::days(1));
    engine.admit_log(habit.habit_id, "done").unwrap();
}

#[test]
fn weekly_and_monthly_thresholds() {
    for (cadence, threshold) in [
        (Cadence::Weekly, Duration::days(7)),
        (Cadence::Monthly, Duration::days(30)),
    ] {
        let conn = open_db_in_memory().unwrap();
        let clock = FixedClock::new(t0());
        let habit = seed_habit(&conn, Some(cadence));
        let engine = engine(&conn, &clock);

        engine.admit_log(habit.habit_id, "done").unwrap();

        clock.set(t0() + threshold - Duration::seconds(1));
        let err = engine.admit_log(habit.habit_id, "done").unwrap_err();
        assert!(
            matches!(err, EngineError::RateLimited { cadence: c, .. } if c == cadence),
            "{cadence}: unexpected {err}"
        );

        clock.set(t0() + threshold);
        engine.admit_log(habit.habit_id, "done").unwrap();
    }
}

#[test]
fn non_done_values_are_rejected_regardless_of_history() {
    for cadence in Cadence::ALL {
        let conn = open_db_in_memory().unwrap();
        let clock = FixedClock::new(t0());
        let habit = seed_habit(&conn, Some(cadence));
        let engine = engine(&conn, &clock);

        let err = engine.admit_log(habit.habit_id, "maybe").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::InvalidLogValue(_))
        ));

        engine.admit_log(habit.habit_id, "done").unwrap();
        clock.advance(Duration::days(60));
        let err = engine.admit_log(habit.habit_id, "maybe").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::InvalidLogValue(_))
        ));
    }
}

#[test]
fn value_check_runs_before_habit_lookup() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(t0());

    let err = engine(&conn, &clock)
        .admit_log(Uuid::new_v4(), "")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::EmptyLogValue)
    ));
}

#[test]
fn unknown_habit_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(t0());
    let missing = Uuid::new_v4();

    let err = engine(&conn, &clock).admit_log(missing, "done").unwrap_err();
    assert!(matches!(err, EngineError::NotFound(id) if id == missing));
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn missing_and_invalid_cadence_are_distinguished() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(t0());
    let habit = seed_habit(&conn, None);
    let engine = engine(&conn, &clock);

    let err = engine.admit_log(habit.habit_id, "done").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::MissingCadence)
    ));

    conn.execute(
        "UPDATE habits SET frequency = 'hourly' WHERE habit_id = ?1;",
        params![habit.habit_id.to_string()],
    )
    .unwrap();
    let err = engine.admit_log(habit.habit_id, "done").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::InvalidCadence(ref raw)) if raw == "hourly"
    ));
}

#[test]
fn guarded_insert_refuses_when_a_newer_log_exists() {
    let conn = open_db_in_memory().unwrap();
    let habit = seed_habit(&conn, Some(Cadence::Daily));
    let logs = SqliteHabitLogRepository::try_new(&conn).unwrap();

    logs.insert_log(&HabitLog::done(&habit, t0())).unwrap();

    let later = HabitLog::done(&habit, t0() + Duration::hours(2));
    let refused = logs
        .insert_log_if_idle(&later, t0() - Duration::minutes(1))
        .unwrap();
    assert!(refused.is_none());

    let accepted = logs.insert_log_if_idle(&later, t0()).unwrap();
    assert_eq!(accepted, Some(later));
    assert_eq!(logs.find_logs_ascending(habit.habit_id).unwrap().len(), 2);
}

#[test]
fn insert_for_deleted_habit_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let habit = seed_habit(&conn, Some(Cadence::Daily));
    SqliteHabitRepository::try_new(&conn)
        .unwrap()
        .delete_habit(habit.habit_id)
        .unwrap();

    let logs = SqliteHabitLogRepository::try_new(&conn).unwrap();
    let err = logs
        .insert_log_if_idle(&HabitLog::done(&habit, t0()), t0())
        .unwrap_err();
    assert!(matches!(
        EngineError::from(err),
        EngineError::NotFound(id) if id == habit.habit_id
    ));
}
