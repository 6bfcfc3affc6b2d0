use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::{GatewayConfig, UnitConfig};
use crate::error::BuildError;
use crate::events::EventBroker;

use super::registry;
use super::supervisor::Supervisor;
use super::unit::Unit;

type DeferredProducer = Box<dyn FnOnce(Arc<EventBroker>) -> Result<Box<dyn Unit>, BuildError>>;

/// Wires consumers and producers into a [`Supervisor`].
///
/// Consumers are built immediately and subscribe to the broker. Producers are
/// built in [`build`](Self::build), after the broker has been frozen.
/// A unit that fails to build is logged and skipped.
pub struct SupervisorBuilder {
    grace: std::time::Duration,
    broker: EventBroker,
    consumers: Vec<Box<dyn Unit>>,
    producers: Vec<(String, DeferredProducer)>,
}

impl SupervisorBuilder {
    pub fn new(grace: std::time::Duration) -> Self {
        Self {
            grace,
            broker: EventBroker::new(),
            consumers: Vec::new(),
            producers: Vec::new(),
        }
    }

    /// Resolves every configured unit through the registry.
    ///
    /// Unknown tags are skipped with a warning.
    pub fn with_config(mut self, cfg: &GatewayConfig) -> Self {
        for unit in &cfg.consumers {
            match registry::consumer(&unit.kind) {
                Some(factory) => {
                    self = self.with_consumer(&unit.name, |broker| factory(unit, broker));
                }
                None => warn!(consumer = %unit.name, kind = %unit.kind, "unknown consumer type; skipped"),
            }
        }
        for unit in &cfg.producers {
            match registry::producer(&unit.kind) {
                Some(factory) => {
                    let unit: UnitConfig = unit.clone();
                    let name = unit.name.clone();
                    self = self.with_producer(&name, move |broker| factory(&unit, broker));
                }
                None => warn!(producer = %unit.name, kind = %unit.kind, "unknown producer type; skipped"),
            }
        }
        self
    }

    /// Builds a consumer now, letting it subscribe to the broker.
    pub fn with_consumer<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(&mut EventBroker) -> Result<Box<dyn Unit>, BuildError>,
    {
        match build(&mut self.broker) {
            Ok(unit) => {
                info!(consumer = %name, kind = unit.kind(), "consumer created");
                self.consumers.push(unit);
            }
            Err(e) => error!(consumer = %name, label = e.as_label(), error = %e, "consumer not created; skipped"),
        }
        self
    }

    /// Registers a producer to be built once the broker is frozen.
    pub fn with_producer<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(Arc<EventBroker>) -> Result<Box<dyn Unit>, BuildError> + 'static,
    {
        self.producers.push((name.to_string(), Box::new(build)));
        self
    }

    /// Freezes the broker, builds the producers and returns the supervisor.
    pub fn build(self) -> Supervisor {
        let broker = Arc::new(self.broker);
        info!(events = ?broker.event_names(), "broker wired");

        let mut producers = Vec::with_capacity(self.producers.len());
        for (name, build) in self.producers {
            match build(Arc::clone(&broker)) {
                Ok(unit) => {
                    info!(producer = %name, kind = unit.kind(), "producer created");
                    producers.push(unit);
                }
                Err(e) => error!(producer = %name, label = e.as_label(), error = %e, "producer not created; skipped"),
            }
        }

        Supervisor::new_internal(self.grace, broker, producers, self.consumers)
    }
}
