//! Logging configuration and initialization.
//!
//! Presets pick a baseline per `skymark::*` target, `--log target=level` flags refine
//! it, and `RUST_LOG` replaces both when set. Output is plain text or JSON lines.

use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET_PREFIX: &str = "skymark::";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Request summaries, job submissions and provider failures
    #[default]
    Production,
    Verbose,
    /// Prompt sizes, store deletions and provider round trips
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    /// Pick the preset from CLI flags. Quieter flags win over louder ones.
    pub fn from_flags(verbose: bool, debug: bool, trace: bool, quiet: bool) -> Self {
        match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (_, _, _, true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        }
    }

    fn directives(&self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "skymark::startup=info",
                "skymark::api=info",
                "skymark::chat=info",
                "skymark::training=info",
                "skymark::provider=warn",
                "skymark::db=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["skymark=info", "tower_http=info"],
            LogPreset::Debug => &["skymark=debug", "tower_http=debug"],
            LogPreset::Trace => &["skymark=trace", "tower_http=trace"],
            LogPreset::Quiet => &["skymark=warn", "tower_http=error"],
        }
    }
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Fully qualified target -> level, e.g. "skymark::provider" -> DEBUG
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        Self {
            preset: LogPreset::from_flags(verbose, debug, trace, quiet),
            overrides: parse_overrides(&log_overrides),
            format,
        }
    }

    /// Filter directives for the preset followed by the overrides.
    pub fn directives(&self) -> String {
        let overrides = self
            .overrides
            .iter()
            .map(|(target, level)| format!("{}={}", target, level.as_str().to_lowercase()));

        self.preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .chain(overrides)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Build an EnvFilter, preferring `RUST_LOG` when it is set.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives()).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Parse `target=level` pairs, comma separated or repeated. Bad levels are skipped.
fn parse_overrides(raw: &[String]) -> BTreeMap<String, Level> {
    raw.iter()
        .flat_map(|s| s.split(','))
        .filter_map(|part| part.split_once('='))
        .filter_map(|(target, level)| {
            let level = Level::from_str(level.trim()).ok()?;
            let target = target.trim();
            let target = if target.starts_with(TARGET_PREFIX) || target == "tower_http" {
                target.to_string()
            } else {
                format!("{TARGET_PREFIX}{target}")
            };
            Some((target, level))
        })
        .collect()
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_preset_priority() {
        assert_eq!(LogPreset::from_flags(true, true, true, true), LogPreset::Quiet);
        assert_eq!(LogPreset::from_flags(true, true, true, false), LogPreset::Trace);
        assert_eq!(LogPreset::from_flags(true, true, false, false), LogPreset::Debug);
        assert_eq!(LogPreset::from_flags(true, false, false, false), LogPreset::Verbose);
        assert_eq!(LogPreset::from_flags(false, false, false, false), LogPreset::Production);
    }

    #[test]
    fn test_overrides_are_prefixed() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["chat=debug".into(), "provider=trace, db=info".into(), "bogus=loud".into()],
            LogFormat::Text,
        );

        assert_eq!(config.overrides.get("skymark::chat"), Some(&Level::DEBUG));
        assert_eq!(config.overrides.get("skymark::provider"), Some(&Level::TRACE));
        assert_eq!(config.overrides.get("skymark::db"), Some(&Level::INFO));
        assert!(!config.overrides.contains_key("skymark::bogus"));
    }

    #[test]
    fn test_full_targets_pass_through() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["skymark::training=warn".into(), "tower_http=trace".into()],
            LogFormat::Json,
        );

        assert_eq!(config.overrides.get("skymark::training"), Some(&Level::WARN));
        assert_eq!(config.overrides.get("tower_http"), Some(&Level::TRACE));
    }

    #[test]
    fn test_directives_append_overrides_after_preset() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            true,
            vec!["provider=debug".into()],
            LogFormat::Text,
        );
        assert_eq!(
            config.directives(),
            "skymark=warn,tower_http=error,skymark::provider=debug"
        );
    }
}
