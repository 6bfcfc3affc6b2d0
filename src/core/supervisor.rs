//! # Supervisor: owns every unit and drives the gateway lifecycle.
//!
//! ## Lifecycle
//! ```text
//! GatewayConfig ──► SupervisorBuilder
//!                     ├─ consumers: registry::consumer(tag)(unit, &mut broker)   (subscribe)
//!                     ├─ broker frozen → Arc<EventBroker>
//!                     └─ producers: registry::producer(tag)(unit, Arc<broker>)
//!
//! Supervisor::run()
//!   ├─► start(): producers, then consumers
//!   ├─► wait_for_shutdown_signal()            (SIGINT / SIGTERM / SIGQUIT / Ctrl-C)
//!   └─► shutdown(grace):
//!          ├─ stop() all producers, join() each
//!          ├─ stop() all consumers, join() each (queues drain up to their sentinel)
//!          ├─ all joined before the deadline → Ok
//!          └─ deadline hit                   → RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - One bad configuration entry never aborts startup: it is logged and skipped.
//! - Producers stop first so no new events enter the consumer queues while they drain.
//! - The grace period bounds the whole shutdown, not each unit.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use firestation_gateway::{GatewayConfig, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = GatewayConfig::from_yaml(r#"
//! consumers:
//!   - type: log
//!     name: printer
//!     events: { bma_alarm: {} }
//! "#)?;
//!
//!     let sup = Supervisor::from_config(&cfg);
//!     assert_eq!(sup.consumer_count(), 1);
//!     sup.run_until(tokio::time::sleep(Duration::from_millis(10))).await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::error::RuntimeError;
use crate::events::EventBroker;

use super::builder::SupervisorBuilder;
use super::shutdown;
use super::unit::Unit;

/// Owns the broker and all producer and consumer units.
pub struct Supervisor {
    grace: Duration,
    broker: Arc<EventBroker>,
    producers: Vec<Box<dyn Unit>>,
    consumers: Vec<Box<dyn Unit>>,
}

impl Supervisor {
    pub(super) fn new_internal(
        grace: Duration,
        broker: Arc<EventBroker>,
        producers: Vec<Box<dyn Unit>>,
        consumers: Vec<Box<dyn Unit>>,
    ) -> Self {
        Self {
            grace,
            broker,
            producers,
            consumers,
        }
    }

    /// Builds every configured unit; entries that fail are skipped.
    pub fn from_config(cfg: &GatewayConfig) -> Self {
        SupervisorBuilder::new(cfg.supervisor.grace())
            .with_config(cfg)
            .build()
    }

    /// Builder for wiring units by hand.
    pub fn builder(grace: Duration) -> SupervisorBuilder {
        SupervisorBuilder::new(grace)
    }

    pub fn broker(&self) -> &Arc<EventBroker> {
        &self.broker
    }

    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Names of all units, producers first.
    pub fn unit_names(&self) -> Vec<&str> {
        self.producers
            .iter()
            .chain(self.consumers.iter())
            .map(|u| u.name())
            .collect()
    }

    /// Starts producers, then consumers.
    pub fn start(&mut self) {
        for unit in self.producers.iter_mut().chain(self.consumers.iter_mut()) {
            unit.start();
        }
        info!(
            producers = self.producers.len(),
            consumers = self.consumers.len(),
            "gateway running"
        );
    }

    /// Runs until a termination signal arrives, then shuts down gracefully.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        self.start();
        let signal = shutdown::wait_for_shutdown_signal().await;
        match &signal {
            Ok(received) => info!(signal = %received, "shutdown requested"),
            Err(e) => error!(error = %e, "cannot wait for termination signals; shutting down"),
        }
        let result = self.shutdown().await;
        signal?;
        result
    }

    /// Runs until `stop` completes, then shuts down gracefully.
    pub async fn run_until<F>(mut self, stop: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        self.start();
        stop.await;
        info!("shutdown requested");
        self.shutdown().await
    }

    /// Stops and joins producers, then consumers, within the grace period.
    pub async fn shutdown(&mut self) -> Result<(), RuntimeError> {
        let deadline = Instant::now() + self.grace;
        let mut stuck = Vec::new();

        stop_all(&mut self.producers, deadline, &mut stuck).await;
        stop_all(&mut self.consumers, deadline, &mut stuck).await;

        if stuck.is_empty() {
            info!("all units stopped within grace");
            Ok(())
        } else {
            warn!(grace = ?self.grace, stuck = ?stuck, "grace period exceeded");
            Err(RuntimeError::GraceExceeded {
                grace: self.grace,
                stuck,
            })
        }
    }
}

async fn stop_all(units: &mut [Box<dyn Unit>], deadline: Instant, stuck: &mut Vec<String>) {
    for unit in units.iter() {
        unit.stop();
    }
    for unit in units.iter_mut() {
        if time::timeout_at(deadline, unit.join()).await.is_err() {
            stuck.push(unit.name().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    /// Unit recording lifecycle calls into a shared journal.
    struct Probe {
        name: String,
        journal: Arc<Mutex<Vec<String>>>,
        token: CancellationToken,
        ignore_stop: bool,
        join: Option<JoinHandle<()>>,
    }

    impl Probe {
        fn boxed(name: &str, journal: &Arc<Mutex<Vec<String>>>, ignore_stop: bool) -> Box<dyn Unit> {
            Box::new(Self {
                name: name.to_string(),
                journal: Arc::clone(journal),
                token: CancellationToken::new(),
                ignore_stop,
                join: None,
            })
        }
    }

    #[async_trait]
    impl Unit for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> &'static str {
            "probe"
        }

        fn start(&mut self) {
            self.journal.lock().unwrap().push(format!("start {}", self.name));
            let token = self.token.clone();
            let ignore_stop = self.ignore_stop;
            self.join = Some(tokio::spawn(async move {
                if ignore_stop {
                    std::future::pending::<()>().await;
                }
                token.cancelled().await;
            }));
        }

        fn stop(&self) {
            self.journal.lock().unwrap().push(format!("stop {}", self.name));
            self.token.cancel();
        }

        async fn join(&mut self) {
            if let Some(handle) = self.join.take() {
                let _ = handle.await;
            }
            self.journal.lock().unwrap().push(format!("joined {}", self.name));
        }
    }

    fn supervisor(journal: &Arc<Mutex<Vec<String>>>, stuck_consumer: bool) -> Supervisor {
        let producer_journal = Arc::clone(journal);
        Supervisor::builder(Duration::from_secs(5))
            .with_consumer("c", |_| Ok(Probe::boxed("c", journal, stuck_consumer)))
            .with_producer("p", move |_| Ok(Probe::boxed("p", &producer_journal, false)))
            .build()
    }

    #[tokio::test]
    async fn test_start_and_shutdown_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let sup = supervisor(&journal, false);
        assert_eq!(sup.unit_names(), vec!["p", "c"]);

        sup.run_until(async {}).await.unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["start p", "start c", "stop p", "joined p", "stop c", "joined c"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_exceeded_reports_stuck_units() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let sup = supervisor(&journal, true);

        let err = sup.run_until(async {}).await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_secs(5));
                assert_eq!(stuck, vec!["c".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failed_units_are_skipped() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let built = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&built);

        let sup = Supervisor::builder(Duration::from_secs(1))
            .with_consumer("broken", |_| {
                Err(crate::error::ConfigError::Missing {
                    unit: "broken".into(),
                    key: "token",
                }
                .into())
            })
            .with_consumer("c", |_| Ok(Probe::boxed("c", &journal, false)))
            .with_producer("p", move |_| {
                flag.store(true, Ordering::SeqCst);
                Err(crate::error::HardwareError::Unsupported { line: "x".into() }.into())
            })
            .build();

        assert!(built.load(Ordering::SeqCst));
        assert_eq!(sup.producer_count(), 0);
        assert_eq!(sup.consumer_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tags_are_skipped() {
        let cfg = GatewayConfig::from_yaml(
            r#"
producers:
  - type: smoke_signal
    name: Smoke
consumers:
  - type: carrier_pigeon
    name: pigeon
  - type: log
    name: printer
    events: { smoke_alarm: {} }
"#,
        )
        .unwrap();
        let sup = Supervisor::from_config(&cfg);
        assert_eq!(sup.producer_count(), 0);
        assert_eq!(sup.unit_names(), vec!["printer"]);
        assert_eq!(sup.broker().handler_count("smoke_alarm"), 1);
    }
}
