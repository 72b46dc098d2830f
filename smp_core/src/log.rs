//! A small, synchronous leveled logger.
//!
//! The teacher's `fe2o3_core::log` runs a dedicated logger-bot thread fed by
//! a channel so that logging never blocks the caller. This crate library has
//! no daemon lifecycle of its own (it is driven entirely by its caller's
//! tokio runtime), so the thread and channel are dropped in favour of a
//! plain `Mutex`-guarded sink — the macro call surface is kept the same.
use std::{
    io::Write,
    sync::{
        atomic::{AtomicU8, Ordering},
        Mutex,
    },
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl From<u8> for LogLevel {
    fn from(b: u8) -> Self {
        match b {
            0 => Self::Error,
            1 => Self::Warn,
            2 => Self::Info,
            3 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

struct Sink(Box<dyn Write + Send>);

static SINK: Mutex<Option<Sink>> = Mutex::new(None);

pub fn set_log_level(level: LogLevel) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn get_log_level() -> LogLevel {
    LogLevel::from(LEVEL.load(Ordering::Relaxed))
}

/// Redirect log output to a custom sink (tests use this to capture output;
/// by default lines go to stderr).
pub fn set_log_out(w: Box<dyn Write + Send>) {
    *SINK.lock().unwrap() = Some(Sink(w));
}

#[doc(hidden)]
pub fn write_log_line(level: LogLevel, file: &str, line: u32, msg: &fmt::Arguments) {
    if level > get_log_level() {
        return;
    }
    let line_text = format!("[{:?}] {}:{}: {}\n", level, file, line, msg);
    let mut guard = SINK.lock().unwrap();
    match guard.as_mut() {
        Some(sink) => { let _ = sink.0.write_all(line_text.as_bytes()); },
        None => { eprint!("{}", line_text); },
    }
}

use std::fmt;

#[macro_export]
macro_rules! log_at {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::write_log_line($level, file!(), line!(), &format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::log_at!($crate::log::LogLevel::Error, $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::log_at!($crate::log::LogLevel::Warn, $($arg)*) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::log_at!($crate::log::LogLevel::Info, $($arg)*) };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::log_at!($crate::log::LogLevel::Debug, $($arg)*) };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::log_at!($crate::log::LogLevel::Trace, $($arg)*) };
}

pub use crate::{debug, error, info, log_at, trace, warn};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filters() {
        set_log_level(LogLevel::Warn);
        assert!(LogLevel::Error <= get_log_level());
        assert!(!(LogLevel::Info <= get_log_level()));
        set_log_level(LogLevel::Info);
    }
}
