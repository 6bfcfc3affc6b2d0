//! Error types used by the gateway runtime, its units and downstream clients.
//!
//! - [`ConfigError`]: a unit (or the whole file) is misconfigured; fatal to that unit.
//! - [`HardwareError`]: a GPIO line could not be opened, read or written.
//! - [`BuildError`]: anything that stops a unit from being constructed.
//! - [`ValidationError`]: an outgoing message has fields outside their allowed range.
//! - [`DeliveryError`]: a downstream call failed; logged by the consumer, never fatal.
//! - [`RuntimeError`]: errors raised by the supervisor itself.
//!
//! Every enum provides `as_label` (a short stable snake_case label for logs).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Configuration errors.
///
/// Raised while loading the configuration file or while a unit parses its
/// own parameters. A unit that fails with a `ConfigError` is not started.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration document is not valid YAML for the expected shape.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required parameter is absent.
    #[error("{unit}: missing required parameter '{key}'")]
    Missing { unit: String, key: &'static str },

    /// A parameter is present but has the wrong type or an out-of-range value.
    #[error("{unit}: invalid parameter '{key}': {reason}")]
    Invalid {
        unit: String,
        key: String,
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`].
    pub fn invalid(unit: &str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            unit: unit.to_string(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Missing { .. } => "config_missing",
            ConfigError::Invalid { .. } => "config_invalid",
        }
    }
}

/// # Discrete I/O failures.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HardwareError {
    /// The line could not be requested (bad chip path, offset, or busy line).
    #[error("cannot open {line}: {reason}")]
    Open { line: String, reason: String },

    /// Reading the line level failed.
    #[error("cannot read {line}: {reason}")]
    Read { line: String, reason: String },

    /// Driving the line failed.
    #[error("cannot write {line}: {reason}")]
    Write { line: String, reason: String },

    /// The binary was built without a hardware backend.
    #[error("{line}: GPIO support not compiled in (enable the `gpio` feature)")]
    Unsupported { line: String },
}

impl HardwareError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HardwareError::Open { .. } => "hw_open",
            HardwareError::Read { .. } => "hw_read",
            HardwareError::Write { .. } => "hw_write",
            HardwareError::Unsupported { .. } => "hw_unsupported",
        }
    }
}

/// # Unit construction failures.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// The HTTP client backing a forwarder could not be created.
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}

impl BuildError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::Config(e) => e.as_label(),
            BuildError::Hardware(e) => e.as_label(),
            BuildError::Http(_) => "http_client",
        }
    }
}

/// # Message fields outside their allowed range.
///
/// Raised by message builders before anything is transmitted.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Numeric field outside its allowed range.
    #[error("'{field}' = {value} out of range (allowed: {allowed})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        allowed: &'static str,
    },

    /// A required field is empty.
    #[error("'{field}' must not be empty")]
    Empty { field: &'static str },
}

impl ValidationError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { .. } => "validation_range",
            ValidationError::Empty { .. } => "validation_empty",
        }
    }
}

/// # Downstream delivery failures.
///
/// Caught by the consumer worker and logged; the event is considered processed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Message was rejected before transmission.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Connectivity problem or timeout.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Back-end answered with an unexpected status.
    #[error("unexpected status {status} from {url}: {body}")]
    Protocol {
        url: String,
        status: u16,
        body: String,
    },

    /// Writing a discrete output failed.
    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::Validation(e) => e.as_label(),
            DeliveryError::Transport(_) => "delivery_transport",
            DeliveryError::Protocol { .. } => "delivery_protocol",
            DeliveryError::Hardware(e) => e.as_label(),
        }
    }
}

/// # Errors produced by the supervisor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some units had not exited.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the units that did not exit in time.
        stuck: Vec<String>,
    },

    /// OS signal handlers could not be installed.
    #[error("cannot install signal handlers: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use firestation_gateway::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = ConfigError::Missing {
            unit: "bma".into(),
            key: "time_alarm",
        };
        assert_eq!(err.as_label(), "config_missing");
        assert_eq!(err.to_string(), "bma: missing required parameter 'time_alarm'");

        let err = BuildError::from(HardwareError::Unsupported { line: "x".into() });
        assert_eq!(err.as_label(), "hw_unsupported");

        let err = DeliveryError::from(ValidationError::Empty { field: "Ziel" });
        assert_eq!(err.as_label(), "validation_empty");
    }
}
