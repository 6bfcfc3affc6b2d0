//! # Debounce / alarm state machine.
//!
//! The state is a pure function of the number of contiguous `true` reads and
//! two thresholds:
//!
//! ```text
//! counter ≤ activation            → Idle
//! activation < counter ≤ alarm    → Active
//! counter > alarm                 → Alarm
//! ```
//!
//! [`Debouncer::tick`] re-derives the state on every sample and reports the
//! [`Signal`]s produced by the edge between the previous and the new state.
//!
//! ## Emission rules
//! - entry into `Alarm` → [`Signal::Alarm`], once per entry
//! - entry into `Idle` from any other state → [`Signal::Idle`], once per entry
//! - `Active → Idle` (alarm never reached) → [`Signal::Selftest`] before `Idle`, if enabled
//! - entry into `Active` → [`Signal::Active`], if enabled
//! - unchanged state → nothing

use std::fmt;
use std::time::Duration;

/// Default sampling period.
pub const DEFAULT_SAMPLE_PERIOD: Duration = Duration::from_millis(100);

/// Debounced state of a sampled input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Active,
    Alarm,
}

impl fmt::Display for SamplerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SamplerState::Idle => "idle",
            SamplerState::Active => "active",
            SamplerState::Alarm => "alarm",
        })
    }
}

/// Event produced by a state edge; its suffix is appended to the sampler name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Active,
    Alarm,
    Selftest,
    Idle,
}

impl Signal {
    pub fn suffix(self) -> &'static str {
        match self {
            Signal::Active => "active",
            Signal::Alarm => "alarm",
            Signal::Selftest => "selftest",
            Signal::Idle => "idle",
        }
    }

    /// Full event name for a sampler: `"<name>_<suffix>"`, name lower-cased.
    pub fn event_name(self, sampler: &str) -> String {
        format!("{}_{}", sampler.to_lowercase(), self.suffix())
    }
}

/// Counter thresholds. Invariant: `alarm ≥ activation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    activation: u64,
    alarm: u64,
}

impl Thresholds {
    /// Returns `None` if `alarm < activation`.
    pub fn new(activation: u64, alarm: u64) -> Option<Self> {
        (alarm >= activation).then_some(Self { activation, alarm })
    }

    /// Derives thresholds from timings:
    /// `activation = debounce / period`, `alarm = (debounce + alarm) / period`.
    ///
    /// Returns `None` for a zero (or sub-millisecond) period.
    pub fn from_timings(debounce: Duration, alarm: Duration, period: Duration) -> Option<Self> {
        let period_ms = period.as_millis();
        if period_ms == 0 {
            return None;
        }
        let debounce_ms = debounce.as_millis();
        let activation = debounce_ms / period_ms;
        let alarm = debounce_ms.saturating_add(alarm.as_millis()) / period_ms;
        Self::new(
            u64::try_from(activation).unwrap_or(u64::MAX),
            u64::try_from(alarm).unwrap_or(u64::MAX),
        )
    }

    #[inline]
    pub fn activation(&self) -> u64 {
        self.activation
    }

    #[inline]
    pub fn alarm(&self) -> u64 {
        self.alarm
    }

    /// State for a given run length of `true` reads.
    pub fn state_for(&self, counter: u64) -> SamplerState {
        if counter > self.alarm {
            SamplerState::Alarm
        } else if counter > self.activation {
            SamplerState::Active
        } else {
            SamplerState::Idle
        }
    }
}

/// Outcome of one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub from: SamplerState,
    pub to: SamplerState,
    /// Signals in emission order.
    pub signals: Vec<Signal>,
}

impl Step {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Run-length counter plus the last derived state.
#[derive(Debug, Clone)]
pub struct Debouncer {
    thresholds: Thresholds,
    counter: u64,
    state: SamplerState,
    report_selftest: bool,
    report_active: bool,
}

impl Debouncer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            counter: 0,
            state: SamplerState::Idle,
            report_selftest: false,
            report_active: false,
        }
    }

    /// Emit [`Signal::Selftest`] on `Active → Idle`.
    pub fn with_selftest(mut self, on: bool) -> Self {
        self.report_selftest = on;
        self
    }

    /// Emit [`Signal::Active`] on entry into `Active`.
    pub fn with_active(mut self, on: bool) -> Self {
        self.report_active = on;
        self
    }

    #[inline]
    pub fn state(&self) -> SamplerState {
        self.state
    }

    #[inline]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    #[inline]
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Feeds one input sample.
    pub fn tick(&mut self, level: bool) -> Step {
        self.counter = if level { self.counter.saturating_add(1) } else { 0 };

        let from = self.state;
        let to = self.thresholds.state_for(self.counter);
        let mut signals = Vec::new();

        if from != to {
            match to {
                SamplerState::Idle => {
                    if from == SamplerState::Active && self.report_selftest {
                        signals.push(Signal::Selftest);
                    }
                    signals.push(Signal::Idle);
                }
                SamplerState::Active => {
                    if self.report_active {
                        signals.push(Signal::Active);
                    }
                }
                SamplerState::Alarm => signals.push(Signal::Alarm),
            }
        }

        self.state = to;
        Step { from, to, signals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> Debouncer {
        Debouncer::new(Thresholds::new(5, 10).unwrap())
    }

    #[test]
    fn test_threshold_invariant() {
        assert!(Thresholds::new(5, 4).is_none());
        assert!(Thresholds::new(0, 0).is_some());
        assert!(Thresholds::from_timings(
            Duration::from_millis(500),
            Duration::from_millis(1000),
            Duration::ZERO
        )
        .is_none());
    }

    #[test]
    fn test_thresholds_from_timings() {
        let t = Thresholds::from_timings(
            Duration::from_millis(500),
            Duration::from_millis(500),
            DEFAULT_SAMPLE_PERIOD,
        )
        .unwrap();
        assert_eq!((t.activation(), t.alarm()), (5, 10));

        // Fractional parts add up before truncation.
        let t = Thresholds::from_timings(
            Duration::from_millis(550),
            Duration::from_millis(550),
            DEFAULT_SAMPLE_PERIOD,
        )
        .unwrap();
        assert_eq!((t.activation(), t.alarm()), (5, 11));
    }

    #[test]
    fn test_state_is_function_of_run_length() {
        let t = Thresholds::new(5, 10).unwrap();
        let mut d = Debouncer::new(t);
        let pattern = [true, true, false, true, true, true, true, true, true, true, false, true];
        for level in pattern {
            d.tick(level);
            assert_eq!(d.state(), t.state_for(d.counter()));
        }
    }

    #[test]
    fn test_alarm_emitted_once_per_entry() {
        let mut d = debouncer();
        let mut alarms = 0;
        for tick in 1..=20u64 {
            let step = d.tick(true);
            match tick {
                1..=5 => assert_eq!(step.to, SamplerState::Idle),
                6 => {
                    assert_eq!(step.to, SamplerState::Active);
                    assert!(step.signals.is_empty());
                }
                7..=10 => assert_eq!(step.to, SamplerState::Active),
                11 => assert_eq!(step.signals, vec![Signal::Alarm]),
                _ => assert!(step.signals.is_empty()),
            }
            alarms += step.signals.iter().filter(|s| **s == Signal::Alarm).count();
        }
        assert_eq!(alarms, 1);
        assert_eq!(d.state(), SamplerState::Alarm);

        let step = d.tick(false);
        assert_eq!(step.to, SamplerState::Idle);
        assert_eq!(step.signals, vec![Signal::Idle]);
        assert!(d.tick(false).signals.is_empty());
    }

    #[test]
    fn test_alarm_to_idle_has_no_selftest() {
        let mut d = debouncer().with_selftest(true);
        for _ in 0..11 {
            d.tick(true);
        }
        assert_eq!(d.tick(false).signals, vec![Signal::Idle]);
    }

    #[test]
    fn test_selftest_on_active_to_idle() {
        let mut d = debouncer().with_selftest(true);
        for _ in 0..7 {
            d.tick(true);
        }
        assert_eq!(d.state(), SamplerState::Active);
        assert_eq!(d.tick(false).signals, vec![Signal::Selftest, Signal::Idle]);
    }

    #[test]
    fn test_plain_sampler_omits_selftest() {
        let mut d = debouncer();
        for _ in 0..7 {
            d.tick(true);
        }
        assert_eq!(d.tick(false).signals, vec![Signal::Idle]);
    }

    #[test]
    fn test_short_pulse_is_debounced() {
        let mut d = debouncer().with_active(true).with_selftest(true);
        for _ in 0..5 {
            assert!(d.tick(true).signals.is_empty());
        }
        let step = d.tick(false);
        assert!(!step.changed());
        assert!(step.signals.is_empty());
    }

    #[test]
    fn test_active_signal_when_enabled() {
        let mut d = debouncer().with_active(true);
        let signals: Vec<Signal> = (0..6).flat_map(|_| d.tick(true).signals).collect();
        assert_eq!(signals, vec![Signal::Active]);
    }

    #[test]
    fn test_equal_thresholds_go_straight_to_alarm() {
        let mut d = Debouncer::new(Thresholds::new(2, 2).unwrap()).with_active(true);
        d.tick(true);
        d.tick(true);
        let step = d.tick(true);
        assert_eq!((step.from, step.to), (SamplerState::Idle, SamplerState::Alarm));
        assert_eq!(step.signals, vec![Signal::Alarm]);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(Signal::Alarm.event_name("BMA"), "bma_alarm");
        assert_eq!(Signal::Selftest.event_name("Genius"), "genius_selftest");
    }
}
