//! # Uniform lifecycle of producers and consumers.
//!
//! Every unit resolved from configuration is handed to the supervisor as a
//! `Box<dyn Unit>`. The supervisor only ever calls these four methods:
//!
//! ```text
//! start()  ── spawns the unit's dedicated task
//! stop()   ── cooperative: cancels a producer's token / enqueues a consumer's sentinel
//! join()   ── waits until the task has fully exited
//! ```
//!
//! ## Rules
//! - `start` is called once, inside a tokio runtime.
//! - `stop` never blocks and may be called before `start` (the unit then never runs).
//! - `join` after `stop` returns once all work accepted before `stop` is done.

use async_trait::async_trait;

/// Start/stop/join capability shared by producers and consumers.
#[async_trait]
pub trait Unit: Send + 'static {
    /// Instance name from configuration.
    fn name(&self) -> &str;

    /// Registry tag of the implementation (e.g. `"generic_input"`).
    fn kind(&self) -> &'static str;

    /// Spawns the unit's task. Calling it twice is a no-op.
    fn start(&mut self);

    /// Requests a cooperative stop.
    fn stop(&self);

    /// Waits for the unit's task to exit.
    async fn join(&mut self);
}
