//! Shared logging utilities for consistent tracing across the agent

use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info};

use crate::errors::{SharedError, SharedResult};
use crate::types::AgentId;

/// Filter directive used by [`init_tracing`] for the given base level
pub fn level_filter(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("inviter={base_level},shared={base_level},reqwest=warn,hyper=warn")
}

/// Initialize tracing: compact stdout output plus, when `log_file` is set,
/// an appending plain-text copy of every event.
pub fn init_tracing(log_level: Option<&str>, log_file: Option<&Path>) -> SharedResult<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level_filter = level_filter(log_level);

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| SharedError::LoggingError {
                    message: format!("cannot open {}: {e}", path.display()),
                })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(&level_filter))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| SharedError::LoggingError { message: e.to_string() })
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Local> = Local::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for agent-aware info logging
#[macro_export]
macro_rules! agent_info {
    ($agent:expr, $($arg:tt)*) => {
        tracing::info!(
            agent = %$agent,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for agent-aware warning logging
#[macro_export]
macro_rules! agent_warn {
    ($agent:expr, $($arg:tt)*) => {
        tracing::warn!(
            agent = %$agent,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for agent-aware error logging
#[macro_export]
macro_rules! agent_error {
    ($agent:expr, $($arg:tt)*) => {
        tracing::error!(
            agent = %$agent,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for agent-aware debug logging
#[macro_export]
macro_rules! agent_debug {
    ($agent:expr, $($arg:tt)*) => {
        tracing::debug!(
            agent = %$agent,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(agent: &AgentId, details: &str) {
    info!(
        agent = %agent,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(agent: &AgentId, reason: &str) {
    info!(
        agent = %agent,
        timestamp = format_timestamp(),
        "🛑 Shutting down: {}",
        reason
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(agent: &AgentId, context: &str, error: &dyn std::fmt::Display) {
    error!(
        agent = %agent,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(agent: &AgentId, message: &str) {
    info!(
        agent = %agent,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}

/// Contextual logging helper for progress updates
pub fn log_progress(agent: &AgentId, action: &str, details: &str) {
    info!(
        agent = %agent,
        timestamp = format_timestamp(),
        "📋 {}: {}",
        action,
        details
    );
}
