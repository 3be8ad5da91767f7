//! Log filters for the skein crates.
//!
//! Available with the `logging` feature. The library never installs a
//! subscriber; binaries build their `EnvFilter` from here so that
//! `settings.logLevel`, `--verbose` and `--quiet` all mean the same thing.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Crates whose events a skein log level controls.
pub const SKEIN_TARGETS: [&str; 4] = ["skein_cli", "skein_bundler", "skein_graph", "skein_config"];

/// Verbosity accepted by `settings.logLevel`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// Directive string: skein targets at this level, dependencies capped
    /// at `warn`.
    pub fn directives(self) -> String {
        let mut directives = self.min(LogLevel::Warn).to_string();
        for target in SKEIN_TARGETS {
            directives.push_str(&format!(",{target}={self}"));
        }
        directives
    }

    pub fn env_filter(self) -> EnvFilter {
        EnvFilter::new(self.directives())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "off" | "silent" | "none" => LogLevel::Off,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" | "verbose" => LogLevel::Debug,
            other => return Err(format!("unknown log level '{other}'")),
        })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Filter used when nothing chose a level: skein's own progress at `info`,
/// graph and config internals at `warn`.
pub fn default_filter() -> EnvFilter {
    EnvFilter::new("warn,skein_cli=info,skein_bundler=info,skein_graph=warn,skein_config=warn")
}

/// Filter from `RUST_LOG`, if set and valid.
pub fn env_override() -> Option<EnvFilter> {
    EnvFilter::try_from_default_env().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_spellings() {
        assert_eq!("INFO".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("silent".parse::<LogLevel>(), Ok(LogLevel::Off));
        assert_eq!("verbose".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn debug_keeps_dependencies_at_warn() {
        assert_eq!(
            LogLevel::Debug.directives(),
            "warn,skein_cli=debug,skein_bundler=debug,skein_graph=debug,skein_config=debug"
        );
        assert_eq!(
            LogLevel::Error.directives(),
            "error,skein_cli=error,skein_bundler=error,skein_graph=error,skein_config=error"
        );
        assert!(LogLevel::Off.directives().starts_with("off,skein_cli=off"));
    }

    #[test]
    fn directives_are_valid_filters() {
        for level in [LogLevel::Off, LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug] {
            assert!(level.directives().parse::<EnvFilter>().is_ok(), "{level}");
            assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
        }
    }
}
