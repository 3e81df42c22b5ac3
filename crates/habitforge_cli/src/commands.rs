use crate::Commands;
use habitforge_core::db::open_db;
use habitforge_core::{
    core_version, ping, CreateHabitRequest, EngineConfig, HabitEngine, HabitId, HabitService,
    SqliteHabitLogRepository, SqliteHabitRepository, SystemClock,
};
use log::info;
use serde::Serialize;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Serialize)]
struct Pong<'a> {
    ping: &'static str,
    version: &'static str,
    db_path: &'a std::path::Path,
}

#[derive(Serialize)]
struct Deleted {
    habit_id: HabitId,
}

pub(crate) fn run(command: Commands, config: &EngineConfig) -> CmdResult {
    let conn = open_db(&config.db_path)?;
    let habits = HabitService::new(SqliteHabitRepository::try_new(&conn)?, SystemClock);
    let engine = HabitEngine::new(
        SqliteHabitRepository::try_new(&conn)?,
        SqliteHabitLogRepository::try_new(&conn)?,
        SystemClock,
    );

    match command {
        Commands::Create {
            user,
            name,
            frequency,
            status,
        } => {
            let habit = habits.create_habit(&CreateHabitRequest {
                username: user,
                habit_name: name,
                frequency,
                status,
            })?;
            print_json(&habit)
        }
        Commands::Log { user, name, value } => {
            let habit = habits.require_by_name(&user, &name)?;
            let log = engine.admit_log(habit.habit_id, &value)?;
            print_json(&log)
        }
        Commands::Streak { user, name } => {
            let habit = habits.require_by_name(&user, &name)?;
            print_json(&engine.streak_report(habit.habit_id)?)
        }
        Commands::Stats { user, name } => {
            let habit = habits.require_by_name(&user, &name)?;
            print_json(&engine.compute_statistics(habit.habit_id)?)
        }
        Commands::History { user, name } => {
            let habit = habits.require_by_name(&user, &name)?;
            print_json(&engine.log_history(habit.habit_id)?)
        }
        Commands::List { user } => print_json(&habits.list_habits(&user)?),
        Commands::Rename {
            user,
            name,
            new_name,
        } => print_json(&habits.rename_habit(&user, &name, &new_name)?),
        Commands::Status { user, name, set } => {
            if let Some(status) = set.as_deref() {
                habits.set_status(&user, &name, Some(status))?;
            }
            print_json(&habits.get_status(&user, &name)?)
        }
        Commands::Delete { user, name } => {
            let habit_id = habits.delete_habit(&user, &name)?;
            info!("event=cli_delete module=cli status=ok habit_id={habit_id}");
            print_json(&Deleted { habit_id })
        }
        Commands::Ping => print_json(&Pong {
            ping: ping(),
            version: core_version(),
            db_path: &config.db_path,
        }),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
