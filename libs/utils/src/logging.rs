//! Tracing subscriber setup shared by the binaries.

use anyhow::Context;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl LogFormat {
    pub fn from_config(s: &str) -> anyhow::Result<LogFormat> {
        use LogFormat::*;
        match s {
            "plain" => Ok(Plain),
            "json" => Ok(Json),
            _ => anyhow::bail!("Unrecognized log format. Please specify 'plain' or 'json'."),
        }
    }
}

/// Initialize logging to stderr, with the filter taken from `RUST_LOG` and
/// defaulting to `info`. `--verbose` on the command line lowers the default
/// to `debug`.
pub fn init(log_format: LogFormat, verbose: bool) -> anyhow::Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let base_logger = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Json => base_logger.json().init(),
        LogFormat::Plain => base_logger.init(),
    }

    Ok(())
}

/// Like `init`, but tolerates being called more than once. Tests use this.
pub fn init_for_tests() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        init(LogFormat::Plain, true).context("init test logging").ok();
    });
}
