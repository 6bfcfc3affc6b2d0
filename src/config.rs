//! # Gateway configuration.
//!
//! [`GatewayConfig`] is loaded from a YAML document:
//!
//! ```yaml
//! log:
//!   level: info
//! supervisor:
//!   grace_secs: 30
//! producers:
//!   - type: generic_input
//!     name: BMA
//!     params: { line: 17, time_debounce: 500, time_alarm: 2000 }
//! consumers:
//!   - type: log
//!     name: printer
//!     events:
//!       bma_alarm: {}
//!       bma_idle: { enabled: false }
//! ```
//!
//! Unit parameters stay an untyped mapping until the unit is built; each unit
//! reads them through [`Params`], which turns missing or malformed values into
//! a descriptive [`ConfigError`].
//!
//! ## Sentinel values
//! - `supervisor.grace_secs = 0` → no wait; units still running at shutdown are reported as stuck.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;

/// Example configuration printed by `--generate-config`.
pub const EXAMPLE_CONFIG: &str = include_str!("config.example.yaml");

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub producers: Vec<UnitConfig>,
    #[serde(default)]
    pub consumers: Vec<UnitConfig>,
}

impl GatewayConfig {
    /// Reads and parses a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parses a YAML configuration document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format.
    #[default]
    Compact,
    /// JSON format for structured logging.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level filter (e.g. "info", "debug", "firestation_gateway=trace").
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Supervisor settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    /// Maximum time, in seconds, to wait for units to exit on shutdown.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
}

fn default_grace_secs() -> u64 {
    60
}

impl SupervisorConfig {
    #[inline]
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            grace_secs: default_grace_secs(),
        }
    }
}

/// One configured producer or consumer.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    /// Registry tag selecting the implementation.
    #[serde(rename = "type")]
    pub kind: String,
    /// Instance name; samplers use it (lower-cased) as event name prefix.
    pub name: String,
    /// Per-event options, keyed by event name. A `null` entry means "enabled, no overrides".
    #[serde(default)]
    pub events: BTreeMap<String, Value>,
    /// Implementation-specific parameters.
    #[serde(default)]
    pub params: Mapping,
}

impl UnitConfig {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            events: BTreeMap::new(),
            params: Mapping::new(),
        }
    }

    /// Adds a parameter (builder style, mostly for tests and embedding).
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(Value::from(key), value.into());
        self
    }

    /// Adds an event entry (builder style).
    pub fn with_event(mut self, name: &str, options: Value) -> Self {
        self.events.insert(name.to_string(), options);
        self
    }

    /// Typed view over `params`.
    pub fn params(&self) -> Params<'_> {
        Params {
            unit: &self.name,
            map: &self.params,
        }
    }
}

/// Read-only accessor over a unit's parameter mapping.
#[derive(Clone, Copy)]
pub struct Params<'a> {
    unit: &'a str,
    map: &'a Mapping,
}

impl<'a> Params<'a> {
    pub fn unit(&self) -> &'a str {
        self.unit
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Non-negative integer; numeric strings are accepted.
    pub fn u64(&self, key: &'static str) -> Result<Option<u64>, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_u64().ok_or_else(|| format!("{n} is not a non-negative integer")),
            Value::String(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("'{s}' is not a non-negative integer")),
            other => Err(format!("expected a number, got {}", kind_of(other))),
        };
        parsed
            .map(Some)
            .map_err(|reason| ConfigError::invalid(self.unit, key, reason))
    }

    pub fn u64_or(&self, key: &'static str, default: u64) -> Result<u64, ConfigError> {
        Ok(self.u64(key)?.unwrap_or(default))
    }

    pub fn required_u64(&self, key: &'static str) -> Result<u64, ConfigError> {
        self.u64(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn bool_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(ConfigError::invalid(
                self.unit,
                key,
                format!("expected true/false, got {}", kind_of(other)),
            )),
        }
    }

    pub fn str(&self, key: &'static str) -> Result<Option<&'a str>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(ConfigError::invalid(
                self.unit,
                key,
                format!("expected a string, got {}", kind_of(other)),
            )),
        }
    }

    pub fn required_str(&self, key: &'static str) -> Result<&'a str, ConfigError> {
        self.str(key)?.ok_or_else(|| self.missing(key))
    }

    /// Deserializes a nested section into `T`; absent → `T::default()`.
    pub fn section<T: DeserializeOwned + Default>(&self, key: &'static str) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(T::default()),
            Some(value) => serde_yaml::from_value(value.clone())
                .map_err(|e| ConfigError::invalid(self.unit, key, e.to_string())),
        }
    }

    fn missing(&self, key: &'static str) -> ConfigError {
        ConfigError::Missing {
            unit: self.unit.to_string(),
            key,
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
