//! Logging Infrastructure
//!
//! Console logging by default, daily rolling files when a log directory is
//! configured.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger at `info`
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with an optional level and log directory.
///
/// `RUST_LOG` wins over `log_level` when set. A missing `log_dir` falls back
/// to stdout. A second call leaves the first subscriber in place and reports
/// the refusal on stderr.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "blog-core");
            let result = subscriber.with_ansi(false).with_writer(file_appender).try_init();
            if let Err(e) = result {
                eprintln!("Logger already initialized, keeping existing subscriber: {e}");
            }
            return;
        }
    }

    if let Err(e) = subscriber.try_init() {
        eprintln!("Logger already initialized, keeping existing subscriber: {e}");
    }
}

/// Initialize logging from [`Config`](crate::core::Config) values
pub fn init_from_config(config: &crate::core::Config) {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        init_logger_with_file(Some("debug"), dir.path().to_str());
        init_logger();
        tracing::info!("logger initialised twice");
    }
}
