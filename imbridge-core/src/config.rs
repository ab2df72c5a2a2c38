//! Bridge configuration, parsed from the JSON the host passes at creation.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Default name of the spawned delivery thread.
pub const DEFAULT_DELIVERY_THREAD: &str = "imbridge-main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name given to the delivery thread when the host does not supply one.
    pub delivery_thread: String,
    pub log: LogConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            delivery_thread: DEFAULT_DELIVERY_THREAD.to_string(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives. Falls back to `RUST_LOG`, then info for both bridge crates.
    pub filter: Option<String>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl BridgeConfig {
    /// Parse from JSON. Empty input yields the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_str(json).map_err(|e| BridgeError::Config(e.to_string()))?;
        if config.delivery_thread.trim().is_empty() {
            return Err(BridgeError::Config("delivery_thread must not be empty".into()));
        }
        Ok(config)
    }
}
