//! # ConsumerQueue: subscription + private FIFO + dedicated worker.
//!
//! ## Architecture
//! ```text
//! EventBroker::emit ──► QueueHandler (one per configured name) ──► [unbounded queue]
//!                                                                     │
//!                                                              worker task (FIFO)
//!                                                                     │
//!                                              EventTable::lookup(event.name)
//!                                              ├─ Unconfigured → ignore
//!                                              ├─ Disabled     → dequeue, suppress
//!                                              └─ Enabled(opt) → consumer.handle_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking enqueue**: the broker-side handler only pushes into an unbounded channel.
//! - **Per-consumer FIFO**: one worker processes the queue in arrival order.
//! - **Failure isolation**: delivery errors and panics in `handle_event` are
//!   logged; the event counts as processed and the worker continues.
//! - **Stop sentinel**: `stop()` enqueues [`QueueItem::Stop`] behind every event
//!   already queued, so all of them are processed before the worker exits.
//!   Events enqueued concurrently with or after `stop()` may be left unprocessed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::config::UnitConfig;
use crate::core::Unit;
use crate::error::ConfigError;
use crate::events::{DispatchError, Event, EventBroker, Handler};

use super::consumer::{Consumer, EventTable, Lookup};

/// Item carried by a consumer's queue.
#[derive(Debug, Clone)]
pub enum QueueItem {
    Event(Arc<Event>),
    /// Worker exits when it dequeues this.
    Stop,
}

/// Counters reported by a worker when it exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Events passed to `handle_event` (successful or not).
    pub handled: u64,
    /// Events configured with `enabled: false`.
    pub suppressed: u64,
    /// Events with no configuration entry.
    pub ignored: u64,
    /// Events whose `handle_event` failed or panicked.
    pub failed: u64,
}

/// Broker-side handler pushing into one consumer's queue.
struct QueueHandler {
    consumer: Arc<str>,
    tx: mpsc::UnboundedSender<QueueItem>,
}

impl Handler for QueueHandler {
    fn handle(&self, event: &Arc<Event>) -> Result<(), DispatchError> {
        self.tx
            .send(QueueItem::Event(Arc::clone(event)))
            .map_err(|_| DispatchError::Closed(self.consumer.to_string()))
    }

    fn name(&self) -> &str {
        &self.consumer
    }
}

/// Queued consumer wrapping a [`Consumer`] variant.
pub struct ConsumerQueue<C: Consumer> {
    name: Arc<str>,
    kind: &'static str,
    tx: mpsc::UnboundedSender<QueueItem>,
    worker: Option<Worker<C>>,
    join: Option<JoinHandle<WorkerStats>>,
    stats: Option<WorkerStats>,
}

impl<C: Consumer> ConsumerQueue<C> {
    /// Creates the queue and subscribes one enqueue handler per configured event name.
    pub fn new(
        name: impl Into<Arc<str>>,
        consumer: C,
        events: EventTable<C::Options>,
        broker: &mut EventBroker,
    ) -> Self {
        let name: Arc<str> = name.into();
        let (tx, rx) = mpsc::unbounded_channel();

        for event_name in events.names() {
            broker.subscribe(
                event_name,
                Arc::new(QueueHandler {
                    consumer: Arc::clone(&name),
                    tx: tx.clone(),
                }),
            );
        }
        debug!(consumer = %name, kind = consumer.kind(), events = events.len(), "consumer subscribed");

        Self {
            kind: consumer.kind(),
            worker: Some(Worker {
                name: Arc::clone(&name),
                consumer,
                events,
                rx,
                stats: WorkerStats::default(),
            }),
            name,
            tx,
            join: None,
            stats: None,
        }
    }

    /// Parses the unit's event table and wires the queue.
    pub fn from_config(unit: &UnitConfig, consumer: C, broker: &mut EventBroker) -> Result<Self, ConfigError> {
        let events = EventTable::from_config(unit)?;
        Ok(Self::new(unit.name.as_str(), consumer, events, broker))
    }

    /// Worker counters, available after `join`.
    pub fn stats(&self) -> Option<WorkerStats> {
        self.stats
    }
}

#[async_trait]
impl<C: Consumer> Unit for ConsumerQueue<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn start(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.join = Some(tokio::spawn(worker.run()));
        }
    }

    fn stop(&self) {
        // The queue holds its own sender, so the channel cannot be closed here.
        let _ = self.tx.send(QueueItem::Stop);
    }

    async fn join(&mut self) {
        let Some(handle) = self.join.take() else {
            return;
        };
        match handle.await {
            Ok(stats) => {
                info!(
                    consumer = %self.name,
                    handled = stats.handled,
                    suppressed = stats.suppressed,
                    ignored = stats.ignored,
                    failed = stats.failed,
                    "consumer stopped"
                );
                self.stats = Some(stats);
            }
            Err(e) => error!(consumer = %self.name, error = %e, "consumer worker aborted"),
        }
    }
}

/// State moved into the worker task.
struct Worker<C: Consumer> {
    name: Arc<str>,
    consumer: C,
    events: EventTable<C::Options>,
    rx: mpsc::UnboundedReceiver<QueueItem>,
    stats: WorkerStats,
}

impl<C: Consumer> Worker<C> {
    async fn run(mut self) -> WorkerStats {
        info!(consumer = %self.name, kind = self.consumer.kind(), "consumer started");
        self.consumer.on_start().await;

        while let Some(item) = self.rx.recv().await {
            match item {
                QueueItem::Stop => break,
                QueueItem::Event(event) => self.dispatch(&event).await,
            }
        }
        self.stats
    }

    async fn dispatch(&mut self, event: &Event) {
        let options = match self.events.lookup(event.name()) {
            Lookup::Unconfigured => {
                trace!(consumer = %self.name, event = %event.name, "event not configured");
                self.stats.ignored += 1;
                return;
            }
            Lookup::Disabled => {
                debug!(consumer = %self.name, event = %event.name, "event disabled; suppressed");
                self.stats.suppressed += 1;
                return;
            }
            Lookup::Enabled(options) => options,
        };

        debug!(consumer = %self.name, event = %event, "handling event");
        self.stats.handled += 1;

        let fut = self.consumer.handle_event(event, options);
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.stats.failed += 1;
                warn!(
                    consumer = %self.name,
                    event = %event.name,
                    label = e.as_label(),
                    error = %e,
                    "delivery failed; event dropped"
                );
            }
            Err(panic_err) => {
                self.stats.failed += 1;
                let info = if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = panic_err.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                error!(consumer = %self.name, event = %event.name, panic = %info, "consumer panicked");
            }
        }
    }
}
