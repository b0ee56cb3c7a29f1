//! File logging. Stdout belongs to the terminal UI, so traces go to a daily
//! rolling file under the platform cache directory.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "YTS_LOG";
const DEFAULT_FILTER: &str = "info";

pub fn log_dir() -> Option<PathBuf> {
  ProjectDirs::from("", "", "yts").map(|dirs| dirs.cache_dir().join("logs"))
}

/// Filter precedence: explicit CLI value, then `YTS_LOG`, then `info`.
/// A CLI value that does not parse is an error.
fn filter(cli: Option<&str>) -> Result<EnvFilter> {
  if let Some(directive) = cli {
    return EnvFilter::try_new(directive).with_context(|| format!("Invalid --log-level filter `{}`", directive));
  }
  Ok(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
}

/// Install the global subscriber. The returned guard must live until exit so
/// buffered lines are flushed. Returns `None` when no log directory exists.
pub fn init(cli_filter: Option<&str>) -> Result<Option<WorkerGuard>> {
  let filter = filter(cli_filter)?;
  let Some(dir) = log_dir() else { return Ok(None) };
  let appender = tracing_appender::rolling::daily(&dir, "yts.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .with_target(false)
    .try_init()
    .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

  Ok(Some(guard))
}
