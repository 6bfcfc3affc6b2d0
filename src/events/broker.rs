//! # Name-indexed event broker.
//!
//! [`EventBroker`] routes an [`Event`] to every [`Handler`] subscribed to its
//! name. Dispatch is synchronous and runs on the emitting producer's task, so
//! handlers must not block: consumer handlers only push into an unbounded queue.
//!
//! ## Architecture
//! ```text
//! Producers (many):                       Handlers (per name, in order):
//!   Sampler A ──┐                          ┌──► queue of consumer 1
//!               ├──► emit(event) ──► table ┼──► queue of consumer 2
//!   Sampler B ──┘                          └──► ...
//! ```
//!
//! ## Rules
//! - **Wiring first**: `subscribe` takes `&mut self`; once the broker is shared
//!   behind an `Arc` the subscription table is read-only.
//! - **Registration order**: handlers for one name are invoked in the order they subscribed.
//! - **Isolation**: a handler that fails or panics is logged and skipped; the
//!   remaining handlers still run and the producer is never unwound.
//! - **No persistence**: an event nobody subscribed to is dropped.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, trace, warn};

use super::event::Event;

/// Reason a handler could not accept an event.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Receiving side of the handler is gone (consumer worker exited).
    #[error("subscriber '{0}' is closed")]
    Closed(String),
}

/// Callback invoked by the broker for each matching event.
///
/// Implementations run on the producer's task and must return quickly.
pub trait Handler: Send + Sync + 'static {
    /// Accepts one event.
    fn handle(&self, event: &Arc<Event>) -> Result<(), DispatchError>;

    /// Name used in logs when the handler fails.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Handler for F
where
    F: Fn(&Arc<Event>) -> Result<(), DispatchError> + Send + Sync + 'static,
{
    fn handle(&self, event: &Arc<Event>) -> Result<(), DispatchError> {
        (self)(event)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Publish/subscribe registry keyed by event name.
#[derive(Default)]
pub struct EventBroker {
    table: HashMap<String, Vec<Arc<dyn Handler>>>,
}

impl EventBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events named `event_name`.
    ///
    /// Multiple handlers per name are allowed and are invoked in registration order.
    pub fn subscribe(&mut self, event_name: impl Into<String>, handler: Arc<dyn Handler>) {
        let event_name = event_name.into();
        trace!(event = %event_name, handler = handler.name(), "subscribed");
        self.table.entry(event_name).or_default().push(handler);
    }

    /// Delivers `event` to every handler subscribed to its name.
    ///
    /// Returns the number of handlers that accepted the event.
    pub fn emit(&self, event: Event) -> usize {
        let Some(handlers) = self.table.get(event.name()) else {
            trace!(event = %event.name, "no subscribers");
            return 0;
        };

        let event = Arc::new(event);
        let mut delivered = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler.handle(&event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(event = %event.name, handler = handler.name(), error = %e, "handler failed");
                }
                Err(panic_err) => {
                    let info = if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
                        (*msg).to_string()
                    } else if let Some(msg) = panic_err.downcast_ref::<String>() {
                        msg.clone()
                    } else {
                        "unknown panic".to_string()
                    };
                    error!(event = %event.name, handler = handler.name(), panic = %info, "handler panicked");
                }
            }
        }
        delivered
    }

    /// Number of handlers registered for `event_name`.
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.table.get(event_name).map_or(0, Vec::len)
    }

    /// Sorted list of event names with at least one subscriber.
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for EventBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroker")
            .field("events", &self.event_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(tag: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn Handler> {
        Arc::new(move |ev: &Arc<Event>| {
            log.lock().unwrap().push(format!("{tag}:{}", ev.name()));
            Ok::<(), DispatchError>(())
        })
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut broker = EventBroker::new();
        broker.subscribe("bma_alarm", recorder("first", log.clone()));
        broker.subscribe("bma_alarm", recorder("second", log.clone()));
        broker.subscribe("bma_idle", recorder("other", log.clone()));

        assert_eq!(broker.emit(Event::new("bma_alarm", "bma")), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:bma_alarm".to_string(), "second:bma_alarm".to_string()]
        );
    }

    #[test]
    fn test_unsubscribed_name_is_dropped() {
        let broker = EventBroker::new();
        assert_eq!(broker.emit(Event::new("nobody_listens", "x")), 0);
    }

    #[test]
    fn test_failing_and_panicking_handlers_are_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut broker = EventBroker::new();
        broker.subscribe(
            "bma_alarm",
            Arc::new(|_: &Arc<Event>| -> Result<(), DispatchError> { panic!("boom") }),
        );
        broker.subscribe(
            "bma_alarm",
            Arc::new(|_: &Arc<Event>| Err::<(), _>(DispatchError::Closed("gone".into()))),
        );
        broker.subscribe("bma_alarm", recorder("last", log.clone()));

        assert_eq!(broker.emit(Event::new("bma_alarm", "bma")), 1);
        assert_eq!(*log.lock().unwrap(), vec!["last:bma_alarm".to_string()]);
    }

    #[test]
    fn test_event_names_sorted() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut broker = EventBroker::new();
        broker.subscribe("b_idle", recorder("x", log.clone()));
        broker.subscribe("a_alarm", recorder("y", log));
        assert_eq!(broker.event_names(), vec!["a_alarm", "b_idle"]);
        assert_eq!(broker.handler_count("a_alarm"), 1);
        assert_eq!(broker.handler_count("c"), 0);
    }
}
