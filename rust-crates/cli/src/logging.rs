use color_eyre::eyre::{
    Result,
    WrapErr,
};
use std::path::Path;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const LOG_FILE_PREFIX: &str = "typing-stats.log";

/// Logs to a daily rolling file under `log_dir`, and to stderr as well when `verbose`.
/// `RUST_LOG` overrides the default `info` level. Keep the returned guard alive until
/// exit so buffered lines are flushed.
pub fn init(log_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = verbose.then(|| fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(stderr)
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;
    Ok(guard)
}
