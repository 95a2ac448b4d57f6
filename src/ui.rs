//! Leveled diagnostic output.
//!
//! All orchestrator components report human-readable messages through this
//! module so callers get one consistent stream on stderr. A process-wide
//! minimum level lets the CLI silence everything below warnings.

use colored::*;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Command echoes and progress chatter.
    Echo = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    /// Suppresses everything.
    Quiet = 4,
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Echo as u8);

pub fn set_min_level(level: Level) {
    MIN_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn log(level: Level, message: &str) {
    if (level as u8) < MIN_LEVEL.load(Ordering::Relaxed) {
        return;
    }
    match level {
        Level::Echo | Level::Info => eprintln!("{} {}", "[INFO]".blue(), message),
        Level::Warning => eprintln!("{} {}", "[WARNING]".yellow(), message),
        Level::Error => eprintln!("{} {}", "[ERROR]".red(), message),
        Level::Quiet => {}
    }
}

pub fn echo(message: &str) {
    log(Level::Echo, message);
}

pub fn info(message: &str) {
    log(Level::Info, message);
}

pub fn warn(message: &str) {
    log(Level::Warning, message);
}

pub fn error(message: &str) {
    log(Level::Error, message);
}
