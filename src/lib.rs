//! # firestation-gateway
//!
//! Event-driven gateway between alarm contacts and alerting systems of a fire
//! station. Debounced discrete inputs (fire alarm panel, smoke detector relays)
//! produce named events; queued consumers forward them to paging back-ends,
//! incident management APIs, discrete outputs or the log.
//!
//! ## Architecture
//! ```text
//!     ┌─────────────────┐   ┌─────────────────┐
//!     │  SignalSampler  │   │  SignalSampler  │     one task each, polling every 100 ms
//!     │  (BMA)          │   │  (Genius)       │     Debouncer: Idle → Active → Alarm
//!     └────────┬────────┘   └────────┬────────┘
//!              │ emit("bma_alarm")   │ emit("genius_selftest")
//!              ▼                     ▼
//! ┌──────────────────────────────────────────────────────┐
//! │ EventBroker (event name → handlers, frozen at start) │
//! └──────┬──────────────────┬──────────────────┬─────────┘
//!        ▼                  ▼                  ▼
//!   [queue: paging]   [queue: connect]   [queue: siren]      unbounded FIFO per consumer
//!        │                  │                  │
//!   worker task        worker task        worker task
//!        ▼                  ▼                  ▼
//!   TETRAcontrol SDS   Connect operation   GPIO output
//! ```
//!
//! ### Lifecycle
//! ```text
//! GatewayConfig ──► Supervisor::from_config()
//!                     ├─ consumers built first (subscribe to the broker)
//!                     ├─ broker frozen, shared with producers
//!                     └─ producers built
//! Supervisor::run()
//!   ├─ start producers, then consumers
//!   ├─ wait for SIGINT / SIGTERM / SIGQUIT
//!   └─ stop + join producers, then consumers (queues drain), within the grace period
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types                                  |
//! |-----------------|----------------------------------------------------------|--------------------------------------------|
//! | **Producers**   | Debounced inputs emitting `_active/_alarm/_selftest/_idle` | [`SignalSampler`], [`Debouncer`]         |
//! | **Events**      | Named events, synchronous isolated dispatch              | [`Event`], [`EventBroker`], [`Handler`]    |
//! | **Consumers**   | Per-consumer FIFO with per-event options                 | [`ConsumerQueue`], [`Consumer`], [`EventTable`] |
//! | **Clients**     | Connect operation API, TETRAcontrol SDS API              | [`clients::ConnectClient`], [`clients::TetraClient`] |
//! | **Supervision** | Registry, startup ordering, graceful shutdown            | [`Supervisor`], [`Unit`]                   |
//! | **I/O**         | GPIO lines (`gpio` feature) and file-backed simulation   | [`io::InputLine`], [`io::OutputLine`]      |
//! | **Errors**      | Typed errors with stable log labels                      | [`ConfigError`], [`DeliveryError`], [`RuntimeError`] |
//!
//! ## Optional features
//! - `gpio`: Linux GPIO character device backend (`gpiocdev`).
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use firestation_gateway::{DispatchError, Event, EventBroker, Handler};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let mut broker = EventBroker::new();
//! let sink = Arc::clone(&seen);
//! let handler: Arc<dyn Handler> = Arc::new(move |ev: &Arc<Event>| {
//!     sink.lock().unwrap().push(ev.name().to_string());
//!     Ok::<(), DispatchError>(())
//! });
//! broker.subscribe("bma_alarm", handler);
//!
//! let broker = Arc::new(broker);
//! assert_eq!(broker.emit(Event::new("bma_alarm", "BMA")), 1);
//! assert_eq!(broker.emit(Event::new("bma_idle", "BMA")), 0);
//! assert_eq!(*seen.lock().unwrap(), vec!["bma_alarm"]);
//! ```

pub mod clients;
mod config;
mod consumers;
mod core;
mod error;
mod events;
pub mod io;
pub mod logging;
mod producers;

// ---- Public re-exports ----

pub use config::{EXAMPLE_CONFIG, GatewayConfig, LogConfig, LogFormat, Params, SupervisorConfig, UnitConfig};
pub use consumers::{
    ConnectForwarder, Consumer, ConsumerQueue, EventEntry, EventTable, LogConsumer, Lookup, NoOptions,
    OutputConsumer, OutputOptions, QueueItem, TetraForwarder, WorkerStats,
};
pub use core::{
    ConsumerFactory, ProducerFactory, ShutdownSignal, Supervisor, SupervisorBuilder, Unit, registry,
    wait_for_shutdown_signal,
};
pub use error::{BuildError, ConfigError, DeliveryError, HardwareError, RuntimeError, ValidationError};
pub use events::{DispatchError, Event, EventBroker, Handler};
pub use producers::{
    DEFAULT_SAMPLE_PERIOD, Debouncer, SamplerSettings, SamplerState, Signal, SignalSampler, Step, Thresholds,
    build_generic_input, build_genius,
};
