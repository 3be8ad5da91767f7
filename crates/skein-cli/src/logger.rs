//! Logging setup for the skein CLI.
//!
//! Library crates only emit `tracing` events; the binary installs the
//! subscriber here, once, before any command runs.
//!
//! ```rust,no_run
//! use skein_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("Starting build");
//! ```

use std::sync::OnceLock;

use skein_bundler::logging::{self, LogLevel};
use tracing::warn;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Set only when no flag or `RUST_LOG` chose the filter, so the config's
/// `settings.logLevel` may still replace it.
static CONFIG_FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global subscriber.
///
/// Precedence: `--verbose`, then `--quiet`, then `RUST_LOG`, then the
/// config's `settings.logLevel` (see [`apply_config_level`]), then
/// [`logging::default_filter`]. Calling this twice is a no-op.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let explicit = verbose || quiet || std::env::var_os("RUST_LOG").is_some();
    let (filter, handle) = reload::Layer::new(filter_for(verbose, quiet));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(no_color))
        .try_init()
        .is_ok();
    if installed && !explicit {
        let _ = CONFIG_FILTER.set(handle);
    }
}

/// Apply `settings.logLevel` from a loaded config.
///
/// Does nothing if a flag or `RUST_LOG` already chose the filter.
pub fn apply_config_level(level: Option<&str>) {
    let (Some(level), Some(handle)) = (level, CONFIG_FILTER.get()) else {
        return;
    };
    match level.parse::<LogLevel>() {
        Ok(level) => {
            let _ = handle.reload(level.env_filter());
        }
        Err(e) => warn!("Ignoring settings.logLevel: {e}"),
    }
}

fn fmt_layer<S>(no_color: bool) -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .with_writer(std::io::stderr)
        .compact()
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        LogLevel::Debug.env_filter()
    } else if quiet {
        LogLevel::Error.env_filter()
    } else {
        logging::env_override().unwrap_or_else(logging::default_filter)
    }
}

/// Whether log output should be colored.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them, otherwise the
/// terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pick_skein_levels() {
        assert_eq!(filter_for(true, false).to_string(), LogLevel::Debug.env_filter().to_string());
        assert_eq!(filter_for(false, true).to_string(), LogLevel::Error.env_filter().to_string());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logger(false, true, true);
        init_logger(true, false, true);
        apply_config_level(Some("debug"));
        apply_config_level(Some("loud"));
        apply_config_level(None);
    }
}
