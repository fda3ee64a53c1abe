//! File logging. The browser owns the terminal, so nothing is written to
//! stdout or stderr; without a log file no subscriber is installed.

use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};

const FILTER_ENV: &str = "JAVARECALL_LOG";

pub fn init(file: Option<&Path>, default_level: &str) -> AppResult<bool> {
    let Some(path) = file else {
        return Ok(false);
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let writer = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = build_filter(default_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(writer))
        .with_ansi(false)
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))?;
    Ok(true)
}

fn build_filter(default_level: &str) -> AppResult<EnvFilter> {
    let from_env = env::var(FILTER_ENV).ok();
    filter_from(from_env.as_deref(), default_level)
}

/// A set `JAVARECALL_LOG` must parse; only an unset or blank one falls back
/// to the configured level.
fn filter_from(directives: Option<&str>, default_level: &str) -> AppResult<EnvFilter> {
    match directives.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => EnvFilter::try_new(value)
            .map_err(|err| AppError::Logging(format!("invalid {FILTER_ENV} {value:?}: {err}"))),
        None => EnvFilter::try_new(default_level)
            .map_err(|err| AppError::Logging(format!("invalid log level {default_level:?}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_file_skips_setup() {
        assert!(!init(None, "info").unwrap());
    }

    #[test]
    fn default_level_builds_a_filter() {
        assert!(filter_from(None, "debug").is_ok());
        assert!(filter_from(Some("  "), "javarecall=trace,warn").is_ok());
    }

    #[test]
    fn env_directives_take_precedence() {
        let filter = filter_from(Some("javarecall=debug"), "warn").unwrap();
        assert_eq!(filter.to_string().to_lowercase(), "javarecall=debug");
    }

    #[test]
    fn invalid_env_directives_are_reported() {
        let err = filter_from(Some("javarecall=notalevel"), "info").unwrap_err();
        assert!(matches!(err, AppError::Logging(ref msg) if msg.contains(FILTER_ENV)));
    }
}
