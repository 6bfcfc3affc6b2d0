//! Runtime core: unit lifecycle and orchestration.
//!
//! - [`unit`]: the start/stop/join contract shared by producers and consumers;
//! - [`registry`]: static type tag → factory tables;
//! - [`builder`]: wires consumers, freezes the broker, then wires producers;
//! - [`supervisor`]: starts units and shuts them down within a grace period;
//! - [`shutdown`]: termination signal handling.

mod builder;
pub mod registry;
mod shutdown;
mod supervisor;
mod unit;

pub use builder::SupervisorBuilder;
pub use registry::{ConsumerFactory, ProducerFactory};
pub use shutdown::{ShutdownSignal, wait_for_shutdown_signal};
pub use supervisor::Supervisor;
pub use unit::Unit;
