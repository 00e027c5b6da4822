use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::Metadata;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::filter_fn, fmt::layer as fmt_layer, prelude::*, EnvFilter, Registry,
};

use crate::config::LoggingConfig;

const CRATE_TARGET: &str = "academic_recommender";

fn ours(meta: &Metadata<'_>) -> bool {
    meta.target().starts_with(CRATE_TARGET)
}

fn split_log_path(file: &str) -> anyhow::Result<(PathBuf, String)> {
    let path = Path::new(file);
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid log file path {file:?}"))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, name.to_string()))
}

/// Installs the global subscriber: crate events go to stdout (with source
/// locations) and to the log file, everything else only to stdout.
///
/// The returned guard flushes the file writer on drop, so keep it alive for
/// the lifetime of the process.
pub fn init(logging: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(logging.level.as_deref().unwrap_or("info"))
    });

    let (directory, file_name) = split_log_path(&logging.file)?;
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("failed to create log directory {directory:?}"))?;
    let (writer, guard) = tracing_appender::non_blocking(rolling::never(directory, file_name));

    let crate_stdout = fmt_layer()
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter_fn(ours));
    let other_stdout = fmt_layer().with_filter(filter_fn(|meta| !ours(meta)));
    let file = fmt_layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter_fn(ours));

    Registry::default()
        .with(env_filter)
        .with(crate_stdout)
        .with(other_stdout)
        .with(file)
        .try_init()
        .context("failed to init tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_is_split_into_directory_and_name() {
        let (dir, name) = split_log_path("logs/recommender.log").unwrap();
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(name, "recommender.log");

        let (dir, name) = split_log_path("recommender.log").unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "recommender.log");

        assert!(split_log_path("logs/..").is_err());
    }
}
