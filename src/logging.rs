//! Logging configuration.
//!
//! Sets up tracing-based logging to stderr, a daily rolling file, or
//! systemd's journal on Linux. The journald target falls back to stderr
//! when the journal socket is unavailable.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogTarget, LoggingConfig};

/// Initialize the logging system.
///
/// Log level can be controlled via the `PHOTOINDEX_LOG` environment variable,
/// e.g. `PHOTOINDEX_LOG=debug` or `PHOTOINDEX_LOG=photoindex::index=trace`.
/// Defaults to `info`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_env("PHOTOINDEX_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.target {
        LogTarget::Journald => {
            #[cfg(target_os = "linux")]
            {
                if let Ok(journald_layer) = tracing_journald::layer() {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(journald_layer)
                        .try_init()?;

                    tracing::info!("Logging initialized with journald backend");
                    return Ok(());
                }
            }

            init_stderr(env_filter)
        }
        LogTarget::File => {
            let log_dir = config.dir.clone().unwrap_or_else(default_log_dir);
            std::fs::create_dir_all(&log_dir)?;

            let file_appender = tracing_appender::rolling::daily(&log_dir, "photoindex.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Dropping the guard would stop the background writer.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init()?;

            tracing::info!("Logging initialized with file backend at {:?}", log_dir);
            Ok(())
        }
        LogTarget::Stderr => init_stderr(env_filter),
    }
}

fn init_stderr(env_filter: EnvFilter) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photoindex")
        .join("logs")
}
