//! Log subscriber setup for the binary
//!
//! The filter comes from `HEAPVIZ_LOG` (standard `EnvFilter` syntax) and
//! defaults to `warn`. The terminal viewer owns the screen, so it either logs
//! to a file or not at all.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "HEAPVIZ_LOG";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    File(PathBuf),
    Disabled,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. A second call keeps the first subscriber
/// and only reports the refusal at debug level.
pub fn init_logger(sink: LogSink) -> io::Result<()> {
    let result = match sink {
        LogSink::Disabled => return Ok(()),
        LogSink::Stderr => tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer().with_writer(io::stderr))
            .try_init(),
        LogSink::File(path) => {
            let file = File::create(path)?;
            tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
        }
    };
    if let Err(err) = result {
        debug!("keeping the existing log subscriber: {}", err);
    }
    Ok(())
}
