use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use colored::{Color, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use time::macros;

struct Logger {
    file: Mutex<BufWriter<File>>,
}

impl Logger {
    fn new(path: &Path) -> io::Result<Self> {
        Ok(Self { file: Mutex::new(BufWriter::new(File::create(path)?)) })
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match metadata.target().split("::").next() {
            Some("urlcheck") => true,
            _ => metadata.level() <= Level::Info,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = time::OffsetDateTime::now_utc()
            .format(macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
            .unwrap_or_default();
        let target = record.target();
        let level = record.level().as_str();
        let args = record.args();

        let color = match record.level() {
            Level::Error => Color::BrightRed,
            Level::Warn => Color::BrightYellow,
            Level::Info => Color::BrightCyan,
            Level::Debug => Color::Magenta,
            Level::Trace => Color::Green,
        };

        eprintln!("{} {} {args}", timestamp.color(Color::BrightBlack), level.color(color));
        if let Ok(mut file) = self.file.lock() {
            // write failures are dropped
            let _ = writeln!(file, "{timestamp} [{target} {level}] {args}");
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

#[derive(Debug)]
pub enum InitError {
    LogFile(io::Error),
    AlreadySet(SetLoggerError),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LogFile(err) => write!(f, "cannot create log file: {err}"),
            Self::AlreadySet(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for InitError {}

pub fn init(path: impl AsRef<Path>) -> Result<(), InitError> {
    let logger = Logger::new(path.as_ref()).map_err(InitError::LogFile)?;
    log::set_boxed_logger(Box::new(logger)).map_err(InitError::AlreadySet)?;
    log::set_max_level(LevelFilter::Debug);
    Ok(())
}
