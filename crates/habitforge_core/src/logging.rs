//! File logging for the engine.
//!
//! Logging is opt-in: nothing is written until `init_logging` succeeds. The
//! first successful call fixes the level and directory for the rest of the
//! process, and later calls must repeat them exactly.
//!
//! Engine events are `key=value` lines (`event=... module=... status=...`)
//! carrying ids, cadences and counts. Habit names and log values are user
//! text and never reach the log files.

use crate::config::EngineConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "habitforge";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_TEXT_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: LevelFilter,
    dir: PathBuf,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn ensure_matches(&self, level: LevelFilter, dir: &Path) -> Result<(), String> {
        if self.dir != dir {
            return Err(format!(
                "logging already writes to `{}`, cannot move it to `{}`",
                self.dir.display(),
                dir.display()
            ));
        }
        if self.level != level {
            return Err(format!(
                "logging already runs at {}, cannot change it to {level}",
                self.level
            ));
        }
        Ok(())
    }
}

/// Starts rolling file logs under `log_dir`.
///
/// # Errors
/// - `level` is not one of `trace|debug|info|warn|error`.
/// - `log_dir` is empty, relative, or cannot be created.
/// - Logging already runs with another level or directory.
pub fn init_logging(level: &str, log_dir: impl AsRef<Path>) -> Result<(), String> {
    let level = parse_level(level)?;
    let dir = absolute_dir(log_dir.as_ref())?;
    let active = ACTIVE.get_or_try_init(|| start(level, dir.clone()))?;
    active.ensure_matches(level, &dir)
}

/// Starts logging when `config` names a log directory.
///
/// Returns `Ok(false)` when none is configured.
pub fn init_logging_from_config(config: &EngineConfig) -> Result<bool, String> {
    match config.log_dir.as_deref() {
        Some(dir) => init_logging(&config.log_level, dir).map(|()| true),
        None => Ok(false),
    }
}

/// Active `(level, directory)`, if logging has started.
pub fn logging_status() -> Option<(LevelFilter, PathBuf)> {
    ACTIVE.get().map(|active| (active.level, active.dir.clone()))
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start(level: LevelFilter, dir: PathBuf) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(&dir)
        .map_err(|err| format!("cannot create log directory `{}`: {err}", dir.display()))?;

    let handle = Logger::with(LogSpecification::builder().default(level).build())
        .log_to_file(
            FileSpec::default()
                .directory(dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("cannot start logger: {err}"))?;

    install_panic_hook();

    info!(
        "event=logging_init module=logging status=ok os={} profile={} version={} level={level} log_dir={}",
        std::env::consts::OS,
        if cfg!(debug_assertions) { "debug" } else { "release" },
        env!("CARGO_PKG_VERSION"),
        dir.display()
    );

    Ok(ActiveLogger {
        level,
        dir,
        _handle: handle,
    })
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    let raw = raw.trim();
    let parsed = if raw.eq_ignore_ascii_case("warning") {
        Ok(LevelFilter::Warn)
    } else {
        raw.parse::<LevelFilter>()
    };
    match parsed {
        Ok(LevelFilter::Off) | Err(_) => Err(format!(
            "unknown log level `{raw}` (use trace, debug, info, warn or error)"
        )),
        Ok(level) => Ok(level),
    }
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, String> {
    if dir.as_os_str().is_empty() {
        return Err("log directory is empty".to_string());
    }
    if !dir.is_absolute() {
        return Err(format!(
            "log directory must be absolute, got `{}`",
            dir.display()
        ));
    }
    Ok(dir.to_path_buf())
}

fn install_panic_hook() {
    PANIC_HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info.location().map_or_else(
                || "unknown".to_string(),
                |loc| format!("{}:{}", loc.file(), loc.line()),
            );
            error!(
                "event=panic module=logging status=error location={location} payload={}",
                one_line(panic_text(info.payload()), PANIC_TEXT_LIMIT)
            );
            previous(info);
        }));
    });
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Folds line breaks into spaces and caps the result at `limit` chars.
fn one_line(text: &str, limit: usize) -> String {
    let mut folded = text
        .chars()
        .take(limit)
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .collect::<String>();
    if text.chars().nth(limit).is_some() {
        folded.push_str("...");
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::{
        absolute_dir, init_logging, init_logging_from_config, logging_status, one_line,
        panic_text, parse_level,
    };
    use crate::config::EngineConfig;
    use log::LevelFilter;
    use std::any::Any;
    use std::path::{Path, PathBuf};

    #[test]
    fn parse_level_accepts_names_in_any_case() {
        assert_eq!(parse_level("INFO"), Ok(LevelFilter::Info));
        assert_eq!(parse_level(" warning "), Ok(LevelFilter::Warn));
        assert_eq!(parse_level("trace"), Ok(LevelFilter::Trace));
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("off").is_err());
    }

    #[test]
    fn absolute_dir_rejects_relative_and_empty_paths() {
        let err = absolute_dir(Path::new("logs/dev")).unwrap_err();
        assert!(err.contains("absolute"));
        assert!(absolute_dir(Path::new("")).is_err());
    }

    #[test]
    fn one_line_folds_breaks_and_caps_length() {
        assert_eq!(one_line("a\nb\rc", 10), "a b c");
        assert_eq!(one_line("line1\nline2", 5), "line1...");
        assert_eq!(one_line("short", 5), "short");
    }

    #[test]
    fn panic_text_reads_str_and_string_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new("bang".to_string());
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_text(literal.as_ref()), "boom");
        assert_eq!(panic_text(owned.as_ref()), "bang");
        assert_eq!(panic_text(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn config_without_log_dir_leaves_logging_untouched() {
        let config = EngineConfig {
            db_path: PathBuf::from("/tmp/unused.sqlite3"),
            log_level: "info".to_string(),
            log_dir: None,
        };
        assert_eq!(init_logging_from_config(&config), Ok(false));
    }

    // Starts the process-wide logger; no other test may.
    #[test]
    fn init_logging_repeats_same_config_and_rejects_changes() {
        let log_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();

        init_logging("info", log_dir.path()).unwrap();
        init_logging("INFO", log_dir.path()).unwrap();

        let err = init_logging("debug", log_dir.path()).unwrap_err();
        assert!(err.contains("cannot change"));

        let err = init_logging("info", other_dir.path()).unwrap_err();
        assert!(err.contains("cannot move"));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, LevelFilter::Info);
        assert_eq!(dir, log_dir.path());
    }
}
