//! Colored console log format.
//!
//! Renders `[LEVEL|target] timestamp: message [key=value ...]`, showing only
//! the run-correlation keys so console lines stay scannable while the JSONL
//! file layer keeps the full structured record.

use std::fmt;

use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Extra keys surfaced on the console, in display order.
const EXTRA_KEYS: [&str; 4] = ["run_session_id", "claude_session_id", "status", "attempt"];

/// Console event format used by the runner binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleFormat;

#[derive(Default)]
struct FieldCollector {
    message: String,
    extras: Vec<(&'static str, String)>,
}

impl FieldCollector {
    fn record(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else if EXTRA_KEYS.contains(&field.name()) {
            self.extras.push((field.name(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, value.to_string());
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
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
        let meta = event.metadata();
        let level = *meta.level();

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let tag = format!("[{:<5}|{}]", level_name(level), meta.target());
        let timestamp = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        if writer.has_ansi_escapes() {
            match level {
                Level::ERROR => write!(writer, "{}", tag.red().bold())?,
                Level::WARN => write!(writer, "{}", tag.yellow().bold())?,
                Level::INFO => write!(writer, "{}", tag.green())?,
                Level::DEBUG => write!(writer, "{}", tag.blue())?,
                Level::TRACE => write!(writer, "{}", tag.magenta())?,
            }
            write!(writer, " {}: {}", timestamp.dimmed(), collector.message)?;
            if !collector.extras.is_empty() {
                write!(writer, " [")?;
                for (i, (key, value)) in collector.extras.iter().enumerate() {
                    if i > 0 {
                        write!(writer, " ")?;
                    }
                    write!(writer, "{}={value}", key.cyan())?;
                }
                write!(writer, "]")?;
            }
        } else {
            write!(writer, "{tag} {timestamp}: {}", collector.message)?;
            if !collector.extras.is_empty() {
                write!(writer, " [")?;
                for (i, (key, value)) in collector.extras.iter().enumerate() {
                    if i > 0 {
                        write!(writer, " ")?;
                    }
                    write!(writer, "{key}={value}")?;
                }
                write!(writer, "]")?;
            }
        }
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct BufWriter(Arc<Mutex<Vec<u8>>>);

    impl BufWriter {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for BufWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufWriter {
        type Writer = BufWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn render(emit: impl FnOnce()) -> String {
        let buf = BufWriter::default();
        // with_ansi must precede event_format: the builder only exposes it
        // while the default format is still installed.
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buf.clone())
            .with_ansi(false)
            .event_format(ConsoleFormat)
            .finish();
        tracing::subscriber::with_default(subscriber, emit);
        buf.contents()
    }

    #[test]
    fn test_level_names_padded_tag() {
        assert_eq!(level_name(Level::ERROR), "ERROR");
        assert_eq!(level_name(Level::WARN), "WARN");
        let tag = format!("[{:<5}|runner]", level_name(Level::WARN));
        assert_eq!(tag, "[WARN |runner]");
    }

    #[test]
    fn test_known_extras_rendered_in_brackets() {
        let out = render(|| {
            tracing::info!(run_session_id = "r-1", attempt = 2_u32, "Hello");
        });
        assert!(out.contains("Hello"));
        assert!(out.contains("[run_session_id=r-1 attempt=2]"));
        assert!(out.contains("[INFO |"));
    }

    #[test]
    fn test_unknown_fields_omitted() {
        let out = render(|| {
            tracing::info!(run_session_id = "r-2", unrelated = "x", "Msg");
        });
        assert!(out.contains("run_session_id=r-2"));
        assert!(!out.contains("unrelated"));
    }

    #[test]
    fn test_no_extras_no_trailing_brackets() {
        let out = render(|| {
            tracing::warn!("Plain");
        });
        assert!(out.contains("Plain"));
        assert!(!out.contains("Plain ["), "{out}");
        assert!(out.contains("[WARN |"));
    }
}
