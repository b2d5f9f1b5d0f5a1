//! Tracing subscriber setup

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Daily log files kept before the oldest is deleted
const LOG_RETENTION_DAYS: usize = 10;

/// Install the global subscriber: JSON to stdout, plus a daily rolling file
/// when `log_dir` is configured.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process.
pub fn init_logging(config: &Config) -> std::io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "medibridge_server={level},medibridge_core={level},tower_http=debug,tokio_postgres=warn",
            level = config.log_level
        ))
    });

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = file_appender(dir).map_err(std::io::Error::other)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// `medibridge.<date>.log` in `dir`, rotated daily, pruned to the retention window
fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("medibridge")
        .filename_suffix("log")
        .max_log_files(LOG_RETENTION_DAYS)
        .build(dir)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn file_appender_writes_dated_file() {
        let dir = std::env::temp_dir().join(format!("medibridge-logs-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut appender = file_appender(&dir).unwrap();
        appender.write_all(b"{\"msg\":\"hello\"}\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1, "{names:?}");
        assert!(names[0].starts_with("medibridge.") && names[0].ends_with(".log"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
