use std::{fs::OpenOptions, path::Path, sync::Mutex};

use miette::{Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{format, writer::MakeWriterExt, FmtContext, FormatEvent, FormatFields},
    registry::LookupSpan,
    FmtSubscriber,
};

/// Parse a log level name, accepting the usual aliases
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" | "critical" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize the logging system.
///
/// Logs go to stderr, and are also appended to `log_file` if given.
pub fn init_logging(level: Level, log_file: Option<&Path>) -> Result<()> {
    let subscriber = build_subscriber(level, log_file)?;
    tracing::subscriber::set_global_default(subscriber)
        .into_diagnostic()
        .wrap_err("Setting default subscriber failed")
}

fn build_subscriber(
    level: Level,
    log_file: Option<&Path>,
) -> Result<Box<dyn Subscriber + Send + Sync>> {
    // Getting the offset can fail once multiple threads are running
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let my_pretty_logger = MyPrettyLogger::new(local_offset);

    // No color codes in the log file
    let builder = FmtSubscriber::builder()
        .with_ansi(log_file.is_none())
        .event_format(my_pretty_logger)
        .with_max_level(level);

    let Some(path) = log_file else {
        return Ok(Box::new(builder.with_writer(std::io::stderr).finish()));
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not open log file {}", path.display()))?;

    Ok(Box::new(
        builder
            .with_writer(std::io::stderr.and(Mutex::new(file)))
            .finish(),
    ))
}

/// Custom logger as the default ones are not as customizable as I want
struct MyPrettyLogger {
    offset: UtcOffset,
    time_format: &'static [FormatItem<'static>],
}

impl MyPrettyLogger {
    fn new(offset: UtcOffset) -> Self {
        Self {
            offset,
            time_format: format_description!("[hour]:[minute]:[second]"),
        }
    }
}

impl<S, N> FormatEvent<S, N> for MyPrettyLogger
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        let now = OffsetDateTime::now_utc().to_offset(self.offset).time();
        let now = now.format(self.time_format).map_err(|_| std::fmt::Error)?;
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("?");

        if writer.has_ansi_escapes() {
            let level = match *metadata.level() {
                Level::ERROR => metadata.level().red().to_string(),
                Level::WARN => metadata.level().yellow().to_string(),
                Level::DEBUG => metadata.level().blue().to_string(),
                Level::TRACE => metadata.level().purple().to_string(),
                _ => metadata.level().green().to_string(),
            };

            write!(&mut writer, "{now} {level:>5} {} ", thread_name.yellow())?;
        } else {
            write!(&mut writer, "{now} {:>5} {thread_name} ", metadata.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_aliases() {
        assert_eq!(parse_level("INFO"), Some(Level::INFO));
        assert_eq!(parse_level("Warning"), Some(Level::WARN));
        assert_eq!(parse_level("critical"), Some(Level::ERROR));
        assert_eq!(parse_level("debug "), Some(Level::DEBUG));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn log_file_receives_plain_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autosubs.log");

        let subscriber = build_subscriber(Level::INFO, Some(&path)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("subtitle saved");
            tracing::debug!("filtered out");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains(" INFO "), "{content:?}");
        assert!(content.contains("subtitle saved"), "{content:?}");
        assert!(!content.contains("filtered out"));
        assert!(!content.contains('\x1b'));
    }

    #[test]
    fn unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a log file
        assert!(build_subscriber(Level::INFO, Some(dir.path())).is_err());
    }
}
