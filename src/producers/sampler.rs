//! # SignalSampler: periodic poller of one discrete input.
//!
//! Runs on its own tokio task. Every `period` it reads the input, feeds the
//! level into a [`Debouncer`] and emits one event per produced [`Signal`]
//! through the shared [`EventBroker`].
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► exit if token cancelled
//!   ├─► level = input.read()          (error → log, producer stops)
//!   ├─► step = debouncer.tick(level)
//!   ├─► broker.emit("<name>_<signal>") for each signal, in order
//!   └─► sleep(max(0, period − elapsed)) (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - Events from one sampler are emitted in sampling order, on the sampler's task.
//! - The sleep compensates for processing time to bound cumulative drift; it
//!   does not provide hard real-time deadlines.
//! - A read failure stops this sampler only.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::core::Unit;
use crate::error::{BuildError, ConfigError, HardwareError};
use crate::events::{Event, EventBroker};
use crate::io::InputLine;

use super::state::{DEFAULT_SAMPLE_PERIOD, Debouncer, SamplerState, Signal, Thresholds};

/// Timing and reporting options of a sampler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerSettings {
    /// Minimum continuous activity before the input counts as active.
    pub debounce: Duration,
    /// Additional continuous activity until the alarm is raised.
    pub alarm: Duration,
    /// Sampling period.
    pub period: Duration,
    /// Emit `_selftest` on `Active → Idle`.
    pub report_selftest: bool,
    /// Emit `_active` on entry into `Active`.
    pub report_active: bool,
}

impl SamplerSettings {
    /// Plain contact: 500 ms debounce, no self-test reporting.
    pub fn new(alarm: Duration) -> Self {
        Self {
            debounce: Duration::from_millis(500),
            alarm,
            period: DEFAULT_SAMPLE_PERIOD,
            report_selftest: false,
            report_active: false,
        }
    }

    /// Validated thresholds for these settings.
    pub fn thresholds(&self, unit: &str) -> Result<Thresholds, ConfigError> {
        Thresholds::from_timings(self.debounce, self.alarm, self.period).ok_or_else(|| {
            ConfigError::invalid(
                unit,
                "period",
                format!("sampling period {:?} must be at least 1ms", self.period),
            )
        })
    }
}

/// Producer polling one input line.
pub struct SignalSampler {
    name: String,
    kind: &'static str,
    period: Duration,
    broker: Arc<EventBroker>,
    token: CancellationToken,
    parts: Option<(Box<dyn InputLine>, Debouncer)>,
    join: Option<JoinHandle<Result<(), HardwareError>>>,
}

impl SignalSampler {
    /// Creates a sampler. The input is read once; a failing read aborts construction.
    pub fn new(
        name: impl Into<String>,
        kind: &'static str,
        settings: &SamplerSettings,
        mut input: Box<dyn InputLine>,
        broker: Arc<EventBroker>,
    ) -> Result<Self, BuildError> {
        let name = name.into();
        let thresholds = settings.thresholds(&name)?;
        input.read()?;

        let debouncer = Debouncer::new(thresholds)
            .with_selftest(settings.report_selftest)
            .with_active(settings.report_active);

        info!(
            sampler = %name,
            activation = thresholds.activation(),
            alarm = thresholds.alarm(),
            period_ms = settings.period.as_millis() as u64,
            "sampler configured"
        );

        Ok(Self {
            name,
            kind,
            period: settings.period,
            broker,
            token: CancellationToken::new(),
            parts: Some((input, debouncer)),
            join: None,
        })
    }
}

#[async_trait]
impl Unit for SignalSampler {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn start(&mut self) {
        let Some((input, debouncer)) = self.parts.take() else {
            return;
        };
        let run = SamplerLoop {
            name: Arc::from(self.name.as_str()),
            input,
            debouncer,
            period: self.period,
            broker: Arc::clone(&self.broker),
        };
        self.join = Some(tokio::spawn(run.run(self.token.clone())));
    }

    fn stop(&self) {
        self.token.cancel();
    }

    async fn join(&mut self) {
        let Some(handle) = self.join.take() else {
            return;
        };
        match handle.await {
            Ok(Ok(())) => debug!(sampler = %self.name, "sampler stopped"),
            Ok(Err(e)) => error!(sampler = %self.name, error = %e, label = e.as_label(), "sampler ended with hardware error"),
            Err(e) => error!(sampler = %self.name, error = %e, "sampler task panicked"),
        }
    }
}

/// State moved into the sampler task.
struct SamplerLoop {
    name: Arc<str>,
    input: Box<dyn InputLine>,
    debouncer: Debouncer,
    period: Duration,
    broker: Arc<EventBroker>,
}

impl SamplerLoop {
    async fn run(mut self, token: CancellationToken) -> Result<(), HardwareError> {
        info!(sampler = %self.name, "sampler started");
        loop {
            if token.is_cancelled() {
                break;
            }
            let started = Instant::now();

            let level = match self.input.read() {
                Ok(level) => level,
                Err(e) => {
                    error!(sampler = %self.name, error = %e, "input read failed; sampler stops");
                    return Err(e);
                }
            };
            self.sample(level);

            let sleep = time::sleep(self.period.saturating_sub(started.elapsed()));
            tokio::pin!(sleep);
            tokio::select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => break,
            }
        }
        Ok(())
    }

    fn sample(&mut self, level: bool) {
        let step = self.debouncer.tick(level);
        if !step.changed() {
            return;
        }
        info!(sampler = %self.name, from = %step.from, to = %step.to, "state changed");

        for signal in step.signals {
            self.emit(signal, step.to);
        }
    }

    fn emit(&self, signal: Signal, state: SamplerState) {
        let event = Event::new(signal.event_name(&self.name), Arc::clone(&self.name))
            .with_field("state", state.to_string())
            .with_field("counter", self.debouncer.counter());
        let delivered = self.broker.emit(event);
        debug!(sampler = %self.name, signal = signal.suffix(), delivered, "event emitted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::events::{DispatchError, Handler};

    /// Replays a fixed script, then keeps returning the last level.
    struct Scripted {
        levels: VecDeque<bool>,
        last: bool,
        fail_after_script: bool,
    }

    impl InputLine for Scripted {
        fn read(&mut self) -> Result<bool, HardwareError> {
            match self.levels.pop_front() {
                Some(level) => {
                    self.last = level;
                    Ok(level)
                }
                None if self.fail_after_script => Err(HardwareError::Read {
                    line: "scripted".into(),
                    reason: "script exhausted".into(),
                }),
                None => Ok(self.last),
            }
        }
    }

    fn scripted(levels: &[bool], fail_after_script: bool) -> Box<dyn InputLine> {
        // First level is consumed by the construction probe.
        let mut all = VecDeque::from(vec![false]);
        all.extend(levels.iter().copied());
        Box::new(Scripted {
            levels: all,
            last: false,
            fail_after_script,
        })
    }

    fn recording_broker(names: &[&str]) -> (Arc<EventBroker>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut broker = EventBroker::new();
        for name in names {
            let log = Arc::clone(&log);
            let handler: Arc<dyn Handler> = Arc::new(move |ev: &Arc<Event>| {
                log.lock().unwrap().push(ev.name().to_string());
                Ok::<(), DispatchError>(())
            });
            broker.subscribe(*name, handler);
        }
        (Arc::new(broker), log)
    }

    fn settings() -> SamplerSettings {
        SamplerSettings {
            debounce: Duration::from_millis(500),
            alarm: Duration::from_millis(500),
            period: Duration::from_millis(100),
            report_selftest: true,
            report_active: false,
        }
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let (broker, _) = recording_broker(&[]);
        let mut s = settings();
        s.period = Duration::ZERO;
        let err = SignalSampler::new("bma", "generic_input", &s, scripted(&[], false), broker)
            .err()
            .unwrap();
        assert_eq!(err.as_label(), "config_invalid");
    }

    #[test]
    fn test_unreadable_input_fails_construction() {
        let (broker, _) = recording_broker(&[]);
        let input = Box::new(Scripted {
            levels: VecDeque::new(),
            last: false,
            fail_after_script: true,
        });
        let err = SignalSampler::new("bma", "generic_input", &settings(), input, broker)
            .err()
            .unwrap();
        assert_eq!(err.as_label(), "hw_read");
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_alarm_then_idle() {
        let (broker, log) = recording_broker(&["bma_alarm", "bma_idle", "bma_selftest"]);
        let mut levels = vec![true; 20];
        levels.push(false);
        let mut sampler =
            SignalSampler::new("BMA", "generic_input", &settings(), scripted(&levels, true), broker)
                .unwrap();

        sampler.start();
        sampler.join().await;

        assert_eq!(*log.lock().unwrap(), vec!["bma_alarm", "bma_idle"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_stops_sampler_only() {
        let (broker, log) = recording_broker(&["bma_alarm", "smoke_alarm"]);
        let mut failing = SignalSampler::new(
            "BMA",
            "generic_input",
            &settings(),
            scripted(&[true; 3], true),
            Arc::clone(&broker),
        )
        .unwrap();
        let mut healthy =
            SignalSampler::new("Smoke", "generic_input", &settings(), scripted(&[true; 20], false), broker)
                .unwrap();
        failing.start();
        healthy.start();

        // Loop ends by itself once the script is exhausted.
        tokio::time::timeout(Duration::from_secs(5), failing.join())
            .await
            .unwrap();
        assert!(log.lock().unwrap().is_empty());

        // The other sampler keeps ticking into Alarm.
        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(*log.lock().unwrap(), vec!["smoke_alarm"]);

        healthy.stop();
        tokio::time::timeout(Duration::from_secs(1), healthy.join())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_sleep() {
        let (broker, _) = recording_broker(&[]);
        let mut sampler =
            SignalSampler::new("BMA", "generic_input", &settings(), scripted(&[], false), broker)
                .unwrap();
        sampler.start();
        time::sleep(Duration::from_millis(350)).await;
        sampler.stop();
        tokio::time::timeout(Duration::from_secs(1), sampler.join())
            .await
            .unwrap();
    }
}
