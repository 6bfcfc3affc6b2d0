//! End-to-end tests: sampler → broker → queued consumers, driven by the supervisor.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use firestation_gateway::io::InputLine;
use firestation_gateway::{
    Consumer, ConsumerQueue, DeliveryError, Event, EventTable, GatewayConfig, HardwareError, NoOptions,
    SamplerSettings, SignalSampler, Supervisor,
};

/// Replays a script of levels, then repeats the last one.
struct Scripted {
    levels: VecDeque<bool>,
    last: bool,
}

impl Scripted {
    fn boxed(levels: impl IntoIterator<Item = bool>) -> Box<dyn InputLine> {
        let mut all = VecDeque::from([false]);
        all.extend(levels);
        Box::new(Self {
            levels: all,
            last: false,
        })
    }
}

impl InputLine for Scripted {
    fn read(&mut self) -> Result<bool, HardwareError> {
        if let Some(level) = self.levels.pop_front() {
            self.last = level;
        }
        Ok(self.last)
    }
}

/// Consumer recording the names of handled events.
struct Recorder {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Consumer for Recorder {
    type Options = NoOptions;

    fn kind(&self) -> &'static str {
        "recorder"
    }

    async fn handle_event(&mut self, event: &Event, _options: &NoOptions) -> Result<(), DeliveryError> {
        self.seen.lock().unwrap().push(event.name().to_string());
        Ok(())
    }
}

fn settings() -> SamplerSettings {
    SamplerSettings {
        debounce: Duration::from_millis(500),
        alarm: Duration::from_millis(500),
        period: Duration::from_millis(100),
        report_selftest: true,
        report_active: true,
    }
}

#[tokio::test(start_paused = true)]
async fn test_alarm_reaches_consumer_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder {
        seen: Arc::clone(&seen),
    };

    let mut table = EventTable::default();
    table.insert("bma_active", false, NoOptions {});
    table.insert("bma_alarm", true, NoOptions {});
    table.insert("bma_idle", true, NoOptions {});

    // 2 s active, then idle for good.
    let mut levels = vec![true; 20];
    levels.push(false);

    let sup = Supervisor::builder(Duration::from_secs(5))
        .with_consumer("recorder", move |broker| {
            Ok(Box::new(ConsumerQueue::new("recorder", recorder, table, broker)))
        })
        .with_producer("BMA", move |broker| {
            Ok(Box::new(SignalSampler::new(
                "BMA",
                "generic_input",
                &settings(),
                Scripted::boxed(levels),
                broker,
            )?))
        })
        .build();
    assert_eq!(sup.unit_names(), vec!["BMA", "recorder"]);
    assert_eq!(sup.broker().handler_count("bma_selftest"), 0);

    sup.run_until(tokio::time::sleep(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["bma_alarm", "bma_idle"]);
}

#[tokio::test(start_paused = true)]
async fn test_short_pulse_is_a_selftest() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder {
        seen: Arc::clone(&seen),
    };

    let mut table = EventTable::default();
    for name in ["bma_active", "bma_alarm", "bma_selftest", "bma_idle"] {
        table.insert(name, true, NoOptions {});
    }

    // Active long enough to debounce, released before the alarm threshold.
    let mut levels = vec![true; 7];
    levels.push(false);

    let sup = Supervisor::builder(Duration::from_secs(5))
        .with_consumer("recorder", move |broker| {
            Ok(Box::new(ConsumerQueue::new("recorder", recorder, table, broker)))
        })
        .with_producer("BMA", move |broker| {
            Ok(Box::new(SignalSampler::new(
                "BMA",
                "generic_input",
                &settings(),
                Scripted::boxed(levels),
                broker,
            )?))
        })
        .build();

    sup.run_until(tokio::time::sleep(Duration::from_secs(3)))
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["bma_active", "bma_selftest", "bma_idle"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_simulated_input_drives_file_output() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("bma_active");
    let output = dir.path().join("siren");

    let cfg = GatewayConfig::from_yaml(&format!(
        r#"
supervisor:
  grace_secs: 5
producers:
  - type: generic_input
    name: BMA
    params:
      simulate_file: {marker}
      time_debounce: 200
      time_alarm: 300
  - type: smoke_signal
    name: Smoke
consumers:
  - type: tetracontrol
    name: broken
  - type: gpio_output
    name: siren
    params:
      path: {output}
    events:
      bma_alarm: {{ value: true }}
      bma_idle: {{ value: false }}
  - type: generic_printout
    name: printer
    events:
      bma_alarm:
      bma_idle:
"#,
        marker = marker.display(),
        output = output.display(),
    ))
    .unwrap();

    let mut sup = Supervisor::from_config(&cfg);
    assert_eq!(sup.unit_names(), vec!["BMA", "siren", "printer"]);
    assert_eq!(sup.broker().handler_count("bma_alarm"), 2);

    sup.start();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "0\n");

    std::fs::write(&marker, b"").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "1\n");

    std::fs::remove_file(&marker).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "0\n");

    sup.shutdown().await.unwrap();
}
