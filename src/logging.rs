use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LOG_FILTER_ENV};

/// Route `tracing` output to the log file in the data directory. The filter
/// comes from `LIBRARY_LOG` and defaults to `info`.
pub fn init_logging(config: &Config) -> Result<()> {
    fs::create_dir_all(config.data_dir()).context("failed to create data directory")?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .context("failed to open log file")?;

    let env_filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("failed to install log subscriber")
}
