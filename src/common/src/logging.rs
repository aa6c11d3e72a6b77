//! Log formatting shared by the CLI and the test suites.
//!
//! Lines look like `2024-07-01 15:55:23 tests_integration::fixtures INFO: Done`.
//! An event recorded with the boolean field `nl = true` is preceded by an
//! empty line so the start of a stage (teardown, row dumps) stands out.

use std::fmt;

use chrono::Local;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Field name that requests a blank separator line before the event.
pub const SEPARATOR_FIELD: &str = "nl";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Event formatter emitting `timestamp target LEVEL: message k=v...`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeparatedFormat;

#[derive(Default)]
struct RecordVisitor {
    message: String,
    separated: bool,
    fields: Vec<(&'static str, String)>,
}

impl Visit for RecordVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == SEPARATOR_FIELD {
            self.separated = value;
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }
}

impl<S, N> FormatEvent<S, N> for SeparatedFormat
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
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        if visitor.separated {
            writeln!(writer)?;
        }

        let metadata = event.metadata();
        write!(
            writer,
            "{} {} {}: {}",
            Local::now().format(TIMESTAMP_FORMAT),
            metadata.target(),
            metadata.level(),
            visitor.message
        )?;
        for (name, value) in &visitor.fields {
            write!(writer, " {name}={value}")?;
        }
        writeln!(writer)
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs the global subscriber writing to stderr. `RUST_LOG` wins over
/// `default_level` when set.
pub fn init_logging(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .event_format(SeparatedFormat)
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize logging for tests; safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .event_format(SeparatedFormat)
        .with_env_filter(env_filter("info"))
        .with_test_writer()
        .try_init();
}
