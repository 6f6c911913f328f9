//! Debug logging with per-module loggers.
//!
//! Control via the `DEBUG` environment variable:
//! - `DEBUG=*` - enable all loggers
//! - `DEBUG=parser` - enable only the parser logger
//! - `DEBUG=parser,engine` - enable several
//!
//! Verbosity via `DEBUG_VERBOSITY` (1-3, default 1). Level 1 carries the
//! main events, level 2 adds per-step detail.

use std::collections::HashSet;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

// ============================================================================
// Configuration
// ============================================================================

enum Enabled {
    All,
    None,
    Named(HashSet<String>),
}

struct Config {
    enabled: Enabled,
    verbosity: u8,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

fn config() -> &'static Config {
    CONFIG.get_or_init(|| {
        let enabled = match env::var("DEBUG").ok().as_deref() {
            None | Some("") => Enabled::None,
            Some("*") | Some("1") | Some("true") => Enabled::All,
            Some(value) => {
                let names: HashSet<_> = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if names.is_empty() {
                    Enabled::None
                } else {
                    Enabled::Named(names)
                }
            }
        };
        let verbosity = env::var("DEBUG_VERBOSITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(|v: u8| v.clamp(1, 3))
            .unwrap_or(1);
        Config { enabled, verbosity }
    })
}

fn is_enabled(name: &str) -> bool {
    match &config().enabled {
        Enabled::None => false,
        Enabled::All => true,
        Enabled::Named(names) => names.contains(name),
    }
}

// ============================================================================
// Logger
// ============================================================================

/// A named logger. Disabled loggers cost a single branch per call site
/// when used through the [`log!`](crate::log) family of macros.
pub struct Logger {
    name: &'static str,
    enabled: bool,
    indent: AtomicUsize,
}

impl Logger {
    pub const fn disabled() -> Self {
        Self {
            name: "",
            enabled: false,
            indent: AtomicUsize::new(0),
        }
    }

    fn active(name: &'static str) -> Self {
        Self {
            name,
            enabled: true,
            indent: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn emit(&self, msg: &str) {
        let depth = self.indent.load(Ordering::Relaxed);
        eprintln!("{}[{}] {}", "  ".repeat(depth), self.name, msg);
    }

    /// Log a main event (verbosity >= 1).
    pub fn log(&self, msg: &str) {
        if self.enabled {
            self.emit(msg);
        }
    }

    /// Log per-step detail (verbosity >= 2).
    pub fn detail(&self, msg: &str) {
        if self.enabled && config().verbosity >= 2 {
            self.emit(msg);
        }
    }

    /// Indent subsequent output one level.
    pub fn push_indent(&self) {
        if self.enabled {
            self.indent.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Undo one level of indentation.
    pub fn pop_indent(&self) {
        if self.enabled {
            let _ = self
                .indent
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                    Some(v.saturating_sub(1))
                });
        }
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Create a logger. The name must be a static string.
pub fn create_logger(name: &'static str) -> Logger {
    if is_enabled(name) {
        Logger::active(name)
    } else {
        Logger::disabled()
    }
}

// ============================================================================
// Macros - avoid format! cost when disabled
// ============================================================================

#[macro_export]
macro_rules! log {
    ($logger:expr, $($arg:tt)*) => {
        if $logger.enabled() {
            $logger.log(&format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_detail {
    ($logger:expr, $($arg:tt)*) => {
        if $logger.enabled() {
            $logger.detail(&format!($($arg)*));
        }
    };
}
