/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::PurgerConfig;
use crate::error::{PurgerError, Result};

/// Install the global subscriber: compact stdout, or JSON lines when
/// `log_file` is set. `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &PurgerConfig) -> Result<()> {
    let env_filter = build_filter(effective_level(config))?;
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_file {
        Some(ref log_path) => {
            let file = open_log_file(log_path)?;
            registry
                .with(fmt::layer().with_writer(file).with_ansi(false).json())
                .init();
        }
        None => registry.with(fmt::layer().compact()).init(),
    }

    Ok(())
}

fn build_filter(level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("purger={}", level)))
        .map_err(|e| PurgerError::Config(format!("Failed to create log filter: {}", e)))
}

fn effective_level(config: &PurgerConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

fn open_log_file(log_path: &Path) -> Result<File> {
    File::create(log_path).map_err(|e| {
        PurgerError::Config(format!("Failed to create log file {}: {}", log_path.display(), e))
    })
}

/// Initialize logging with custom format for testing
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("purger=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok(); // Ignore error if already initialized
    });
}
