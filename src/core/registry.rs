//! # Unit registry: static type tag → factory tables.
//!
//! ```text
//! UnitConfig.kind ──► producer(tag) ──► fn(&UnitConfig, Arc<EventBroker>) → Box<dyn Unit>
//!                 └─► consumer(tag) ──► fn(&UnitConfig, &mut EventBroker) → Box<dyn Unit>
//! ```
//!
//! Producers receive the frozen, shared broker. Consumers receive the broker
//! while it is still being wired, so they can subscribe.
//!
//! | producers         | consumers                                         |
//! |-------------------|---------------------------------------------------|
//! | `genius`          | `connect`, `tetracontrol`, `gpio_output`          |
//! | `generic_input`   | `log`, `generic_printout`                         |

use std::sync::Arc;

use crate::config::UnitConfig;
use crate::consumers::{
    ConnectForwarder, ConsumerQueue, LogConsumer, OutputConsumer, TetraForwarder,
};
use crate::error::BuildError;
use crate::events::EventBroker;
use crate::producers;

use super::unit::Unit;

/// Builds a producer bound to the shared broker.
pub type ProducerFactory = fn(&UnitConfig, Arc<EventBroker>) -> Result<Box<dyn Unit>, BuildError>;

/// Builds a consumer and subscribes it to the broker.
pub type ConsumerFactory = fn(&UnitConfig, &mut EventBroker) -> Result<Box<dyn Unit>, BuildError>;

static PRODUCERS: &[(&str, ProducerFactory)] = &[
    ("genius", genius),
    ("generic_input", generic_input),
];

static CONSUMERS: &[(&str, ConsumerFactory)] = &[
    ("connect", connect),
    ("tetracontrol", tetracontrol),
    ("gpio_output", gpio_output),
    ("log", log),
    ("generic_printout", log),
];

/// Factory registered for a producer tag.
pub fn producer(tag: &str) -> Option<ProducerFactory> {
    PRODUCERS.iter().find(|(t, _)| *t == tag).map(|(_, f)| *f)
}

/// Factory registered for a consumer tag.
pub fn consumer(tag: &str) -> Option<ConsumerFactory> {
    CONSUMERS.iter().find(|(t, _)| *t == tag).map(|(_, f)| *f)
}

pub fn producer_tags() -> impl Iterator<Item = &'static str> {
    PRODUCERS.iter().map(|(t, _)| *t)
}

pub fn consumer_tags() -> impl Iterator<Item = &'static str> {
    CONSUMERS.iter().map(|(t, _)| *t)
}

fn genius(unit: &UnitConfig, broker: Arc<EventBroker>) -> Result<Box<dyn Unit>, BuildError> {
    Ok(Box::new(producers::build_genius(unit, broker)?))
}

fn generic_input(unit: &UnitConfig, broker: Arc<EventBroker>) -> Result<Box<dyn Unit>, BuildError> {
    Ok(Box::new(producers::build_generic_input(unit, broker)?))
}

fn connect(unit: &UnitConfig, broker: &mut EventBroker) -> Result<Box<dyn Unit>, BuildError> {
    let forwarder = ConnectForwarder::from_config(unit)?;
    Ok(Box::new(ConsumerQueue::from_config(unit, forwarder, broker)?))
}

fn tetracontrol(unit: &UnitConfig, broker: &mut EventBroker) -> Result<Box<dyn Unit>, BuildError> {
    let forwarder = TetraForwarder::from_config(unit)?;
    Ok(Box::new(ConsumerQueue::from_config(unit, forwarder, broker)?))
}

fn gpio_output(unit: &UnitConfig, broker: &mut EventBroker) -> Result<Box<dyn Unit>, BuildError> {
    let output = OutputConsumer::from_config(unit)?;
    Ok(Box::new(ConsumerQueue::from_config(unit, output, broker)?))
}

fn log(unit: &UnitConfig, broker: &mut EventBroker) -> Result<Box<dyn Unit>, BuildError> {
    let printer = LogConsumer::new(unit.name.clone());
    Ok(Box::new(ConsumerQueue::from_config(unit, printer, broker)?))
}
