//! Tracing setup for hosts embedding the binder.
//!
//! Resolution events are emitted under the `binder`, `catalog`, `overloads` and
//! `fusion` targets; hosts either install their own subscriber or call
//! [`init_logging`].

use std::env;
use std::fmt::Write;

use tracing::Level;

use crate::binder_config::BinderConfig;

pub const LOG_FORMAT_ENV: &str = "DYNBIND_LOG_FORMAT";
pub const LOG_LEVEL_ENV: &str = "DYNBIND_LOG_LEVEL";

/// Targets raised to `trace` when a binder asks for resolution tracing.
pub const RESOLUTION_TARGETS: [&str; 2] = ["binder", "overloads"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub format: LogFormat,
    pub level: Level,
    /// Mirrors [`BinderConfig::trace_resolution`].
    pub trace_resolution: bool,
}

impl LogOptions {
    #[must_use]
    pub fn for_config(config: &BinderConfig) -> Self {
        Self {
            format: LogFormat::Text,
            level: Level::WARN,
            trace_resolution: config.trace_resolution,
        }
    }

    /// [`LogOptions::for_config`] with `DYNBIND_LOG_FORMAT` and
    /// `DYNBIND_LOG_LEVEL` applied; unparseable values are ignored.
    #[must_use]
    pub fn from_env(config: &BinderConfig) -> Self {
        let format = env::var(LOG_FORMAT_ENV).ok();
        let level = env::var(LOG_LEVEL_ENV).ok();
        Self::for_config(config).with_overrides(format.as_deref(), level.as_deref())
    }

    #[must_use]
    fn with_overrides(mut self, format: Option<&str>, level: Option<&str>) -> Self {
        if let Some(format) = format.and_then(LogFormat::parse) {
            self.format = format;
        }
        if let Some(level) = level.and_then(|spec| spec.parse::<Level>().ok()) {
            self.level = level;
        }
        self
    }

    /// `EnvFilter` directive: the base level, plus per-target `trace` for
    /// resolution tracing.
    #[must_use]
    pub fn directive(&self) -> String {
        let mut directive = self.level.as_str().to_ascii_lowercase();
        if self.trace_resolution {
            for target in RESOLUTION_TARGETS {
                let _ = write!(directive, ",{target}=trace");
            }
        }
        directive
    }
}

/// Install a global `tracing` subscriber once per process. `RUST_LOG` wins
/// over the options' directive when set.
pub fn init_logging(options: &LogOptions) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::{EnvFilter, fmt};

    static INITIALISED: OnceLock<()> = OnceLock::new();

    let _ = INITIALISED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(options.directive()));
        let builder = fmt::fmt()
            .with_env_filter(filter)
            .with_ansi(env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
            .with_target(true);
        let installed = match options.format {
            LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
            LogFormat::Text => tracing::subscriber::set_global_default(builder.compact().finish()),
        };
        tracing::debug!(
            target: "binder",
            stage = "logging.init",
            directive = %options.directive(),
            installed = installed.is_ok()
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_by_default() {
        let options = LogOptions::for_config(&BinderConfig::default());
        assert_eq!(options.format, LogFormat::Text);
        assert_eq!(options.directive(), "warn");
    }

    #[test]
    fn resolution_tracing_raises_binder_targets_only() {
        let config = BinderConfig {
            trace_resolution: true,
            ..BinderConfig::default()
        };
        let options = LogOptions::for_config(&config);
        assert_eq!(options.directive(), "warn,binder=trace,overloads=trace");
    }

    #[test]
    fn overrides_ignore_unknown_values() {
        let base = LogOptions::for_config(&BinderConfig::default());
        let options = base.with_overrides(Some("JSON"), Some("debug"));
        assert_eq!(options.format, LogFormat::Json);
        assert_eq!(options.level, Level::DEBUG);
        assert_eq!(options.directive(), "debug");

        assert_eq!(base.with_overrides(Some("yaml"), Some("noisy")), base);
    }
}
