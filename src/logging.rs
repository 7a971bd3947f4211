//! Tracing subscriber setup.
//!
//! All log output goes to stderr so stdout stays reserved for answers and
//! JSON results. `RUST_LOG` takes precedence over the configured level.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;
use crate::error::{EagleEyeError, Result};

/// Default filter at info level, quieting dependency chatter.
const INFO_FILTER: &str = "eagleeye=info,eagleeye_search=info,reqwest=warn,hyper=warn";

/// Default filter when debug logging is enabled.
const DEBUG_FILTER: &str = "eagleeye=debug,eagleeye_search=debug,reqwest=warn,hyper=warn";

/// Returns the filter directive used when `RUST_LOG` is unset.
pub fn default_directive(debug: bool) -> &'static str {
    if debug { DEBUG_FILTER } else { INFO_FILTER }
}

/// Install the global subscriber.
///
/// When file logging is enabled, a daily-rotated file is written to
/// [`LoggingConfig::file_directory`] as well. The returned guard flushes the
/// file writer and must be kept alive for the lifetime of the process.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.debug)));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match config.file_directory() {
        Some(dir) => {
            let (writer, guard) = file_writer(&dir)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| EagleEyeError::Config(format!("failed to install logger: {e}")))?;

    Ok(guard)
}

fn file_writer(dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, "eagleeye.log");
    Ok(tracing_appender::non_blocking(appender))
}
