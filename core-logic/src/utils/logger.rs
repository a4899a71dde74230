use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
    Layer,
};

/// Target used for user-facing progress lines (taps, purchases, claims).
pub const RESULT_TARGET: &str = "task_result";

/// Installs the global subscriber: hourly rotated file log plus a coloured
/// console. The returned guard flushes the file writer and must be kept alive.
pub fn setup_logger(file_prefix: &str) -> Option<WorkerGuard> {
    if std::fs::create_dir_all("logs").is_err() {
        eprintln!("Cannot create logs directory, file logging disabled");
        init_console_only();
        return None;
    }

    let file_appender = tracing_appender::rolling::hourly("logs", file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // File keeps everything at INFO so skipped actions can be audited later
    let file_filter = tracing_subscriber::filter::Targets::new()
        .with_target(RESULT_TARGET, Level::INFO)
        .with_default(Level::INFO);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(console_filter());

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if installed.is_err() {
        eprintln!("A global tracing subscriber is already installed");
    }

    Some(guard)
}

fn console_filter() -> tracing_subscriber::filter::Targets {
    tracing_subscriber::filter::Targets::new()
        .with_target(RESULT_TARGET, Level::INFO)
        .with_default(Level::WARN)
}

fn init_console_only() {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(console_filter());
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn event_message(event: &Event<'_>) -> String {
    let mut visitor = MessageVisitor {
        message: String::new(),
    };
    event.record(&mut visitor);
    visitor.message
}

/// Paints the leading `account | ` prefix and colours the rest by level.
fn colorize(level: &Level, msg: &str) -> String {
    let body_style = match *level {
        Level::ERROR => Style::new().fg(Color::LightRed).bold(),
        Level::WARN => Style::new().fg(Color::Yellow),
        Level::DEBUG | Level::TRACE => Style::new().dimmed(),
        _ => Style::new(),
    };

    match msg.split_once(" | ") {
        Some((account, rest)) => format!(
            "{} | {}",
            Style::new().fg(Color::Cyan).bold().paint(account),
            body_style.paint(highlight_outcome(rest))
        ),
        None => format!("{}", body_style.paint(msg)),
    }
}

fn highlight_outcome(msg: &str) -> String {
    if msg.contains("SUCCESS") {
        let green = Style::new().fg(Color::LightGreen).bold();
        msg.replace("SUCCESS", &format!("{}", green.paint("SUCCESS")))
    } else if msg.contains("FAILED") {
        let red = Style::new().fg(Color::LightRed).bold();
        msg.replace("FAILED", &format!("{}", red.paint("FAILED")))
    } else {
        msg.to_string()
    }
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%H:%M:%S");
        let msg = event_message(event);
        write!(
            writer,
            "{} {}",
            Style::new().dimmed().paint(timestamp.to_string()),
            colorize(event.metadata().level(), &msg)
        )?;
        writeln!(writer)
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level();

        write!(writer, "{} [{}] ", timestamp, level)?;
        writeln!(writer, "{}", event_message(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_highlight_keeps_text() {
        let out = highlight_outcome("Bought card SUCCESS");
        assert!(out.contains("SUCCESS"));
        assert!(out.starts_with("Bought card "));
    }

    #[test]
    fn test_colorize_without_prefix() {
        let out = colorize(&Level::INFO, "plain line");
        assert!(out.contains("plain line"));
    }
}
