//! Process-wide binder configuration loaded from `dynbind.cfg`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};

use crate::error::{Error, Result};
use crate::overloads::NarrowingLevel;

pub const CONFIG_FILE: &str = "dynbind.cfg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinderConfig {
    /// Bind to non-public members as if they were public.
    pub private_binding: bool,
    pub min_narrowing: NarrowingLevel,
    pub max_narrowing: NarrowingLevel,
    /// Mark thrown failures as light-weight so hosts may return them instead of unwinding.
    pub light_exceptions: bool,
    /// Emit per-candidate trace events during overload resolution.
    pub trace_resolution: bool,
}

impl BinderConfig {
    #[must_use]
    pub fn with_private_binding(mut self, enabled: bool) -> Self {
        self.private_binding = enabled;
        self
    }

    #[must_use]
    pub fn with_narrowing(mut self, min: NarrowingLevel, max: NarrowingLevel) -> Self {
        self.min_narrowing = min;
        self.max_narrowing = max;
        self
    }

    #[must_use]
    pub fn with_light_exceptions(mut self, enabled: bool) -> Self {
        self.light_exceptions = enabled;
        self
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            private_binding: false,
            min_narrowing: NarrowingLevel::None,
            max_narrowing: NarrowingLevel::All,
            light_exceptions: false,
            trace_resolution: false,
        }
    }
}

static GLOBAL_CONFIG: OnceLock<RwLock<BinderConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<BinderConfig> {
    GLOBAL_CONFIG.get_or_init(|| RwLock::new(BinderConfig::default()))
}

/// Update the process-wide binder configuration.
pub fn set_global(config: BinderConfig) {
    if let Ok(mut guard) = config_cell().write() {
        *guard = config;
    }
}

/// Retrieve the current binder configuration.
#[must_use]
pub fn current() -> BinderConfig {
    config_cell().read().map(|guard| *guard).unwrap_or_default()
}

/// Resolve a configuration from `dynbind.cfg` in the working directory, falling back
/// to defaults when the file is absent or unreadable.
#[must_use]
pub fn resolve() -> BinderConfig {
    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(CONFIG_FILE))
        .and_then(|path| load_from(&path).ok())
        .unwrap_or_default()
}

/// Load a configuration file; unknown keys are ignored, malformed values are errors.
pub fn load_from(path: &Path) -> Result<BinderConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents).map_err(|message| {
        Error::config(format!("{}: {message}", PathBuf::from(path).display()))
    })
}

fn parse_config(contents: &str) -> std::result::Result<BinderConfig, String> {
    let mut config = BinderConfig::default();

    for (index, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(format!("line {}: expected `key = value`", index + 1));
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "binder.private_binding" | "private_binding" => {
                config.private_binding = parse_flag(value, index)?;
            }
            "binder.light_exceptions" | "light_exceptions" => {
                config.light_exceptions = parse_flag(value, index)?;
            }
            "binder.trace_resolution" | "trace_resolution" => {
                config.trace_resolution = parse_flag(value, index)?;
            }
            "overloads.min_narrowing" | "min_narrowing" => {
                config.min_narrowing = parse_level(value, index)?;
            }
            "overloads.max_narrowing" | "max_narrowing" => {
                config.max_narrowing = parse_level(value, index)?;
            }
            _ => {}
        }
    }

    if config.min_narrowing > config.max_narrowing {
        return Err(format!(
            "min_narrowing `{}` exceeds max_narrowing `{}`",
            config.min_narrowing, config.max_narrowing
        ));
    }
    Ok(config)
}

fn parse_flag(value: &str, index: usize) -> std::result::Result<bool, String> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("line {}: `{other}` is not a boolean", index + 1)),
    }
}

fn parse_level(value: &str, index: usize) -> std::result::Result<NarrowingLevel, String> {
    NarrowingLevel::parse(value)
        .ok_or_else(|| format!("line {}: `{value}` is not a narrowing level", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_flags_and_levels() {
        let config = parse_config(
            "# binder settings\nprivate_binding = yes\noverloads.max_narrowing = two\n",
        )
        .expect("valid config");
        assert!(config.private_binding);
        assert_eq!(config.max_narrowing, NarrowingLevel::Two);
        assert_eq!(config.min_narrowing, NarrowingLevel::None);
    }

    #[test]
    fn rejects_inverted_narrowing_range() {
        let err = parse_config("min_narrowing = all\nmax_narrowing = one\n")
            .expect_err("range must be ordered");
        assert!(err.contains("exceeds"), "unexpected message: {err}");
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = parse_config("private_binding\n").expect_err("missing value");
        assert!(err.starts_with("line 1"), "unexpected message: {err}");
    }

    #[test]
    fn load_from_reports_path_in_errors() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "light_exceptions = maybe").expect("write config");
        match load_from(file.path()) {
            Err(Error::Config { message }) => assert!(message.contains("maybe")),
            other => panic!("expected config error, found {other:?}"),
        }
    }

    #[test]
    fn global_config_round_trips() {
        let config = BinderConfig::default().with_light_exceptions(true);
        set_global(config);
        assert!(current().light_exceptions);
        set_global(BinderConfig::default());
    }
}
