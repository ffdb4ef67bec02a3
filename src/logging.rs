//! Logging setup for the binary, on `tracing` and `tracing-subscriber`.
//!
//! Logs go to stderr so rendered output on stdout stays clean. `RUST_LOG`
//! wins when set; otherwise the verbosity count picks the level for this
//! crate and dependencies stay at `warn`.

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

pub fn default_directives(verbosity: u8) -> String {
    let level = level_for(verbosity);
    format!("warn,hn_blog={level}")
}

pub fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_directives(verbosity))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}
