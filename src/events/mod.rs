//! Domain events and the broker that routes them.
//!
//! ## Contents
//! - [`Event`] named event with an immutable payload
//! - [`EventBroker`] name-indexed publish/subscribe table with synchronous dispatch
//! - [`Handler`] callback contract for broker subscriptions
//!
//! ## Quick reference
//! - **Publishers**: `SignalSampler` run loops.
//! - **Subscribers**: one queue handler per configured event name per consumer.

mod broker;
mod event;

pub use broker::{DispatchError, EventBroker, Handler};
pub use event::Event;
