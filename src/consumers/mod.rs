//! Queued event consumers.
//!
//! Every consumer is a [`ConsumerQueue`] around one [`Consumer`] variant:
//!
//! | tag                          | variant              | side effect                    |
//! |------------------------------|----------------------|--------------------------------|
//! | `connect`                    | [`ConnectForwarder`] | Connect operation (HTTP)       |
//! | `tetracontrol`               | [`TetraForwarder`]   | SDS / callout (HTTP)           |
//! | `gpio_output`                | [`OutputConsumer`]   | drives a discrete output       |
//! | `log`, `generic_printout`    | [`LogConsumer`]      | log line only                  |

mod connect;
mod consumer;
mod log;
mod output;
mod queue;
mod tetra;

pub use connect::ConnectForwarder;
pub use consumer::{Consumer, EventEntry, EventTable, Lookup, NoOptions};
pub use log::LogConsumer;
pub use output::{OutputConsumer, OutputOptions};
pub use queue::{ConsumerQueue, QueueItem, WorkerStats};
pub use tetra::TetraForwarder;
