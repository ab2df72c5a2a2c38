//! tracing-subscriber setup for hosts that do not install their own.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

const DEFAULT_DIRECTIVE: &str = "imbridge_core=info,imbridge_ffi=info";

/// Build the filter: explicit directives win, then `RUST_LOG`, then the default.
pub fn filter(config: &LogConfig) -> anyhow::Result<EnvFilter> {
    match config.filter.as_deref() {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))),
    }
}

/// Install the global subscriber.
///
/// JSON output when `config.json` is set or `IMBRIDGE_LOG_JSON=1`. Fails if a
/// global subscriber is already installed.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let json = config.json || std::env::var("IMBRIDGE_LOG_JSON").unwrap_or_default() == "1";
    let filter = filter(config)?;
    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
