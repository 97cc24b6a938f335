//! Minimal stderr backend for the `log` facade.
//!
//! The library only emits records through `log::{debug, info, warn}`; the
//! binaries install this logger once at start-up:
//!
//! ```no_run
//! use log::LevelFilter;
//! tile_puzzles::logger::init(LevelFilter::Debug).ok();
//! log::info!("ready");
//! ```
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

struct StderrLogger;

impl StderrLogger {
    fn level_prefix(level: Level) -> &'static str {
        match level {
            Level::Error => "[ERROR] ",
            Level::Warn => "[WARN]  ",
            Level::Info => "[INFO]  ",
            Level::Debug => "[DEBUG] ",
            Level::Trace => "[TRACE] ",
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut line = String::from(Self::level_prefix(record.level()));
        if let Some(module) = record.module_path() {
            line.push('[');
            line.push_str(module);
            line.push_str("] ");
        }
        line.push_str(&record.args().to_string());
        // Write errors on a closed stderr are dropped.
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

/// Installs the stderr logger and sets the maximum level.
///
/// Fails if another logger was already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Maps a `-v` count to a level: none is `Warn`, then `Info`, `Debug`, `Trace`.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
