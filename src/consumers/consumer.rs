//! # Consumer contract and per-event configuration.
//!
//! A [`Consumer`] is the variant-specific part of a queued consumer: it only
//! sees events that are configured **and** enabled, together with the typed
//! per-event options parsed from the configuration.
//!
//! [`EventTable`] holds those options. A lookup never fails: it returns a
//! tagged [`Lookup`] telling the worker whether to ignore, suppress or handle.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use firestation_gateway::{Consumer, DeliveryError, Event};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Options { text: String }
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Consumer for Printer {
//!     type Options = Options;
//!
//!     fn kind(&self) -> &'static str { "printer" }
//!
//!     async fn handle_event(&mut self, event: &Event, options: &Options) -> Result<(), DeliveryError> {
//!         println!("{}: {}", event.name(), options.text);
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::config::UnitConfig;
use crate::error::{ConfigError, DeliveryError};
use crate::events::Event;

/// Variant logic of a queued consumer.
///
/// ### Implementation requirements
/// - Runs on the consumer's dedicated worker task; events arrive in FIFO order.
/// - Downstream calls must be bounded by a timeout: shutdown waits for them.
/// - Errors are returned, not panicked; the worker logs them and moves on.
#[async_trait]
pub trait Consumer: Send + 'static {
    /// Per-event options, parsed from the event's configuration entry.
    type Options: DeserializeOwned + Send + Sync + 'static;

    /// Registry tag of the implementation.
    fn kind(&self) -> &'static str;

    /// Called once on the worker task before the first event.
    async fn on_start(&mut self) {}

    /// Processes one configured and enabled event.
    async fn handle_event(&mut self, event: &Event, options: &Self::Options) -> Result<(), DeliveryError>;
}

/// Options type for consumers without per-event overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoOptions {}

/// One configured event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEntry<T> {
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub options: T,
}

fn enabled_default() -> bool {
    true
}

/// Result of looking up an event name.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// The consumer has no entry for this event.
    Unconfigured,
    /// Configured with `enabled: false`.
    Disabled,
    /// Configured and enabled.
    Enabled(&'a T),
}

/// Event name → options table of one consumer.
#[derive(Debug, Clone)]
pub struct EventTable<T> {
    entries: BTreeMap<String, EventEntry<T>>,
}

impl<T> Default for EventTable<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: DeserializeOwned> EventTable<T> {
    /// Parses every entry of `unit.events`; a malformed entry fails the whole table.
    pub fn from_config(unit: &UnitConfig) -> Result<Self, ConfigError> {
        let mut entries = BTreeMap::new();
        for (name, raw) in &unit.events {
            let raw = match raw {
                Value::Null => Value::Mapping(Mapping::new()),
                other => other.clone(),
            };
            let entry: EventEntry<T> = serde_yaml::from_value(raw)
                .map_err(|e| ConfigError::invalid(&unit.name, format!("events.{name}"), e.to_string()))?;
            entries.insert(name.clone(), entry);
        }
        Ok(Self { entries })
    }
}

impl<T> EventTable<T> {
    pub fn insert(&mut self, name: impl Into<String>, enabled: bool, options: T) {
        self.entries.insert(name.into(), EventEntry { enabled, options });
    }

    pub fn lookup(&self, name: &str) -> Lookup<'_, T> {
        match self.entries.get(name) {
            None => Lookup::Unconfigured,
            Some(entry) if !entry.enabled => Lookup::Disabled,
            Some(entry) => Lookup::Enabled(&entry.options),
        }
    }

    /// Configured event names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
