//! Logging setup: console or dashboard buffer, plus `envoy-dash.log`

use tracing::Subscriber;
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::tui::{LogBuffer, LogMakeWriter};

/// Log file written in the working directory
pub const LOG_FILE: &str = "envoy-dash.log";

/// Filter from `RUST_LOG`, falling back to `info`
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_layer<S>(writer: NonBlocking) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(env_filter())
}

/// Console output plus the log file
fn headless_subscriber<W>(console: W, file: NonBlocking) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(console)
                .with_filter(env_filter()),
        )
        .with(file_layer(file))
}

/// Captured lines for the log panel plus the log file
fn dashboard_subscriber(
    log_buffer: LogBuffer,
    file: NonBlocking,
) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(LogMakeWriter::new(log_buffer))
                .with_ansi(false)
                .with_target(false)
                .compact()
                .with_filter(env_filter()),
        )
        .with(file_layer(file))
}

/// Initialize logging for the chosen mode
///
/// Headless mode logs to stderr so stdout carries only the watch columns.
/// Dashboard mode must keep the terminal clean while the UI owns it, so events
/// go to the returned [`LogBuffer`] instead. Both modes also append to
/// [`LOG_FILE`].
///
/// The appender guard is forgotten so the file writer lives as long as the
/// process.
pub fn init_logging(headless: bool) -> Option<LogBuffer> {
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let log_buffer = if headless {
        headless_subscriber(std::io::stderr, non_blocking).init();
        None
    } else {
        let log_buffer = LogBuffer::new();
        dashboard_subscriber(log_buffer.clone(), non_blocking).init();
        Some(log_buffer)
    };

    std::mem::forget(guard);
    log_buffer
}
