use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Dependency modules whose output is hidden unless running at Trace.
const NOISY_MODULES: &[&str] = &[
    "sqlx",
    "sea_orm",
    "tower",
    "tracing",
    "hyper",
    "axum",
    "reqwest",
    "reqwest_retry",
];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the configured level.
    ///
    /// Everything is shown at Trace. Below that, chatter from the HTTP stack, the database
    /// driver and the outbound client is dropped so campaign and dispatch events stay readable.
    pub fn init_logger(config: &Config) {
        let level = config.log_level_filter;
        let log_config = Self::build_log_config(Self::hides_dependencies(level));

        if let Err(e) = simplelog::TermLogger::init(
            Self::to_simplelog(level),
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        ) {
            eprintln!("Logger already initialized: {e}");
        }
    }

    fn to_simplelog(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    fn hides_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn build_log_config(hide_dependencies: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if hide_dependencies {
            for module in NOISY_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noisy_modules_cover_http_and_database_stacks() {
        for module in ["sqlx", "sea_orm", "hyper", "axum", "reqwest"] {
            assert!(NOISY_MODULES.contains(&module), "{module} should be hidden");
        }
    }

    #[test]
    fn test_only_trace_shows_dependencies() {
        assert!(!Logger::hides_dependencies(LevelFilter::Trace));
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            assert!(Logger::hides_dependencies(level), "{level} should hide");
        }
    }

    #[test]
    fn test_level_conversion() {
        assert_eq!(
            Logger::to_simplelog(LevelFilter::Debug) as u8,
            simplelog::LevelFilter::Debug as u8
        );
        assert_eq!(
            Logger::to_simplelog(LevelFilter::Off) as u8,
            simplelog::LevelFilter::Off as u8
        );
    }

    #[test]
    fn test_build_log_config_does_not_panic() {
        let _hidden = Logger::build_log_config(true);
        let _shown = Logger::build_log_config(false);
    }
}
