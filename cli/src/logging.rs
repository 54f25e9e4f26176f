use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

const LOG_FILE: &str = "ragchat.log";
const DEFAULT_FILTER: &str = "ragchat_core=info,ragchat_cli=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Logs go to `<log_dir>/ragchat.log` so the
/// chat transcript on stdout stays readable, or to stderr when `to_stderr`
/// is set. Keep the returned guard alive until exit to flush the file writer.
pub fn init_logging(log_dir: &Path, to_stderr: bool) -> anyhow::Result<Option<WorkerGuard>> {
    if to_stderr {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(env_filter());
        tracing_subscriber::registry().with(stderr_layer).try_init()?;
        return Ok(None);
    }

    std::fs::create_dir_all(log_dir)?;
    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);
    #[cfg(unix)]
    {
        log_file_opts.mode(0o600);
    }
    let log_file = log_file_opts.open(log_dir.join(LOG_FILE))?;

    let (non_blocking, guard) = non_blocking(log_file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter());
    tracing_subscriber::registry().with(file_layer).try_init()?;
    Ok(Some(guard))
}
