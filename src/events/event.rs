//! # Domain events emitted by samplers.
//!
//! An [`Event`] has a plain string name (`"<sampler>_alarm"`, `"<sampler>_idle"`, ...)
//! and an open payload: the emitting source, a wall-clock timestamp and an
//! arbitrary map of extra fields. Events are shared as `Arc<Event>` once
//! emitted, so the payload is never mutated after the fact.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use firestation_gateway::Event;
//!
//! let ev = Event::new("bma_alarm", "BMA").with_field("line", 17);
//!
//! assert_eq!(ev.name(), "bma_alarm");
//! assert_eq!(ev.source(), "BMA");
//! assert_eq!(ev.field("line"), Some(&serde_json::json!(17)));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Named event with its payload.
#[derive(Clone, Debug, Serialize)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Event name used for routing.
    pub name: Arc<str>,
    /// Name of the unit that emitted the event.
    pub source: Arc<str>,
    /// Wall-clock timestamp.
    #[serde(serialize_with = "serialize_at")]
    pub at: SystemTime,
    /// Additional payload fields.
    pub fields: BTreeMap<String, Value>,
}

impl Event {
    /// Creates a new event stamped with the current time and the next sequence number.
    pub fn new(name: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            name: name.into(),
            source: source.into(),
            at: SystemTime::now(),
            fields: BTreeMap::new(),
        }
    }

    /// Attaches an extra payload field.
    #[inline]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Timestamp in local time.
    pub fn timestamp(&self) -> DateTime<Local> {
        DateTime::<Local>::from(self.at)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} from {} at {}",
            self.name,
            self.seq,
            self.source,
            self.timestamp().format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}

fn serialize_at<S: serde::Serializer>(at: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&DateTime::<Local>::from(*at).to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new("a_idle", "a");
        let b = Event::new("a_alarm", "a");
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_serializes_timestamp_as_string() {
        let ev = Event::new("a_alarm", "A").with_field("k", "v");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["name"], "a_alarm");
        assert_eq!(json["source"], "A");
        assert_eq!(json["fields"]["k"], "v");
        assert!(json["at"].is_string());
    }
}
