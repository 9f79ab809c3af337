//! Category-gated logging facade.
//!
//! # Design
//! The dispatcher only needs a narrow interface: emit a line, emit an error,
//! emit a debug line, and ask whether a category is enabled. `Logger` captures
//! exactly that, so tests can substitute a recording logger. `TracingLogger`
//! is the production implementation and forwards to `tracing` events; output
//! formatting is left to whatever subscriber the binary installs.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use crate::error::ConfigError;

/// Target used for every event emitted by `TracingLogger`.
pub const LOG_TARGET: &str = "dispatch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogCategory {
    /// Initialization of modules and services.
    Init,
    /// Database queries.
    Queries,
    MethodCalls,
    /// Outbound API requests.
    Requests,
    /// Responses from the API and the database.
    Responses,
    Errors,
    Debug,
}

impl LogCategory {
    pub const ALL: [LogCategory; 7] = [
        LogCategory::Init,
        LogCategory::Queries,
        LogCategory::MethodCalls,
        LogCategory::Requests,
        LogCategory::Responses,
        LogCategory::Debug,
        LogCategory::Errors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Init => "init",
            LogCategory::Queries => "queries",
            LogCategory::MethodCalls => "method_calls",
            LogCategory::Requests => "requests",
            LogCategory::Responses => "responses",
            LogCategory::Errors => "errors",
            LogCategory::Debug => "debug",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogCategory {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownLogCategory(s.to_string()))
    }
}

/// The set of enabled categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLevel {
    categories: BTreeSet<LogCategory>,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::all()
    }
}

impl LogLevel {
    pub fn all() -> Self {
        Self::only(LogCategory::ALL)
    }

    pub fn none() -> Self {
        Self {
            categories: BTreeSet::new(),
        }
    }

    pub fn only(categories: impl IntoIterator<Item = LogCategory>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    /// Every category except the given ones.
    pub fn except(excluded: impl IntoIterator<Item = LogCategory>) -> Self {
        let excluded: BTreeSet<_> = excluded.into_iter().collect();
        Self::only(LogCategory::ALL.into_iter().filter(|c| !excluded.contains(c)))
    }

    pub fn includes(&self, category: LogCategory) -> bool {
        self.categories.contains(&category)
    }
}

fn parse_list(s: &str) -> Result<Vec<LogCategory>, ConfigError> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::parse)
        .collect()
}

/// Accepts `all`, `none`/`off`, a space- or comma-separated category list,
/// or `except:<list>`.
impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" | "all" => return Ok(LogLevel::all()),
            "none" | "off" => return Ok(LogLevel::none()),
            _ => {}
        }
        if let Some(rest) = s.strip_prefix("except:") {
            return Ok(LogLevel::except(parse_list(rest)?));
        }
        Ok(LogLevel::only(parse_list(s)?))
    }
}

/// The logging interface the dispatcher consumes.
pub trait Logger: Send + Sync {
    fn log(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
    fn debug(&self, args: fmt::Arguments<'_>);
    fn includes(&self, category: LogCategory) -> bool;
    fn set_log_level(&self, level: LogLevel);
}

/// `Logger` that forwards to `tracing`.
///
/// When a category is switched off, `error` and `debug` still emit a
/// placeholder line so the call site remains visible in the log.
#[derive(Debug, Default)]
pub struct TracingLogger {
    level: RwLock<LogLevel>,
}

impl TracingLogger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: RwLock::new(level),
        }
    }
}

impl Logger for TracingLogger {
    fn log(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: LOG_TARGET, "{args}");
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        if self.includes(LogCategory::Errors) {
            tracing::error!(target: LOG_TARGET, "{args}");
        } else {
            tracing::warn!(target: LOG_TARGET, "error logging is disabled");
        }
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        if self.includes(LogCategory::Debug) {
            tracing::debug!(target: LOG_TARGET, "{args}");
        } else {
            tracing::debug!(target: LOG_TARGET, "debug logging is disabled");
        }
    }

    fn includes(&self, category: LogCategory) -> bool {
        self.level
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .includes(category)
    }

    fn set_log_level(&self, level: LogLevel) {
        *self.level.write().unwrap_or_else(PoisonError::into_inner) = level;
    }
}
