//! Leveled line logging on top of `tracing`.
//!
//! Lines are written as `<LEVEL>: <message>`. The threshold can be changed at
//! runtime after [`init`].

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, Registry};

use crate::error::{Error, Result};

/// Minimum level of messages to emit. `None` silences everything.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    All,
    Debug,
    Info,
    #[default]
    Error,
    None,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::All => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::None => LevelFilter::OFF,
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(LogLevel::All),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "error" => Ok(LogLevel::Error),
            "none" => Ok(LogLevel::None),
            other => Err(Error::Config(format!("Unknown log level: {}", other))),
        }
    }
}

/// Event format producing `<LEVEL>: <message>` lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

fn label(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "LOG",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARN",
        Level::ERROR => "ERROR",
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{}: ", label(event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

static RELOAD: OnceLock<reload::Handle<LevelFilter, Registry>> = OnceLock::new();

/// Install the global subscriber. Logs go to `file` (appended) or stderr.
pub fn init(level: LogLevel, file: Option<&Path>) -> Result<()> {
    let writer = match file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let (filter, handle) = reload::Layer::new(level.as_filter());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .event_format(LineFormat)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    let _ = RELOAD.set(handle);
    Ok(())
}

/// Change the threshold of the subscriber installed by [`init`].
pub fn set_level(level: LogLevel) -> Result<()> {
    match RELOAD.get() {
        Some(handle) => handle
            .modify(|filter| *filter = level.as_filter())
            .map_err(|e| Error::Logging(e.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture(level: LogLevel, f: impl FnOnce()) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(LineFormat)
            .with_max_level(level.as_filter())
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buf.contents()
    }

    #[test]
    fn test_line_format() {
        let out = capture(LogLevel::All, || {
            tracing::error!("Failed to encode character to UTF-8: 0x{:X}", 0x110000);
            tracing::trace!("frame");
        });
        assert_eq!(
            out,
            "ERROR: Failed to encode character to UTF-8: 0x110000\nLOG: frame\n"
        );
    }

    #[test]
    fn test_threshold_filters_lower_levels() {
        let out = capture(LogLevel::Info, || {
            tracing::debug!("hidden");
            tracing::info!("shown");
            tracing::error!("also shown");
        });
        assert_eq!(out, "INFO: shown\nERROR: also shown\n");

        let out = capture(LogLevel::None, || tracing::error!("silenced"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_level_order_and_parse() {
        assert!(LogLevel::All < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::None);
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
