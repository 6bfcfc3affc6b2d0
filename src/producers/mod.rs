//! Signal producers.
//!
//! - [`SignalSampler`] polls one input and runs the [`Debouncer`] state machine.
//! - Factories resolve configuration into samplers:
//!   - `generic_input`: configurable `time_debounce` (default 500 ms) and required `time_alarm`
//!   - `genius`: self-testing smoke detector relay (1 s debounce, 8 s alarm, active-low)
//!
//! ## Parameters
//! | key             | meaning                                                   |
//! |-----------------|-----------------------------------------------------------|
//! | `line`          | GPIO line offset; absent → simulated via a marker file    |
//! | `chip`          | GPIO chip path (default `/dev/gpiochip0`)                 |
//! | `active_low`    | invert the input (default `true`)                         |
//! | `bias`          | `pull_up`, `pull_down` or `default`                       |
//! | `simulate_file` | marker file used when `line` is absent                    |
//! | `time_debounce` | ms (generic_input only)                                   |
//! | `time_alarm`    | ms, required (generic_input only)                         |
//! | `emit_active`   | emit `<name>_active` on entry into Active (default `false`)|

mod sampler;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::UnitConfig;
use crate::error::{BuildError, ConfigError};
use crate::events::EventBroker;
use crate::io::{self, Bias, InputLine, LineAddress, MarkerFileInput};

pub use sampler::{SamplerSettings, SignalSampler};
pub use state::{DEFAULT_SAMPLE_PERIOD, Debouncer, SamplerState, Signal, Step, Thresholds};

/// Builds a `generic_input` sampler.
pub fn build_generic_input(
    unit: &UnitConfig,
    broker: Arc<EventBroker>,
) -> Result<SignalSampler, BuildError> {
    let params = unit.params();
    let mut settings = SamplerSettings::new(Duration::from_millis(params.required_u64("time_alarm")?));
    settings.debounce = Duration::from_millis(params.u64_or("time_debounce", 500)?);
    settings.report_active = params.bool_or("emit_active", false)?;

    let input = open_sampler_input(unit, MarkerFileInput::default_for)?;
    SignalSampler::new(unit.name.clone(), "generic_input", &settings, input, broker)
}

/// Builds a `genius` sampler: fixed timings, self-test reporting.
pub fn build_genius(unit: &UnitConfig, broker: Arc<EventBroker>) -> Result<SignalSampler, BuildError> {
    let params = unit.params();
    let settings = SamplerSettings {
        debounce: Duration::from_millis(1000),
        alarm: Duration::from_millis(8000),
        period: DEFAULT_SAMPLE_PERIOD,
        report_selftest: true,
        report_active: params.bool_or("emit_active", false)?,
    };

    let input = open_sampler_input(unit, |_| MarkerFileInput::genius())?;
    SignalSampler::new(unit.name.clone(), "genius", &settings, input, broker)
}

/// Opens the configured GPIO line, or the simulation marker file if no line is set.
///
/// `default_marker` picks the marker when `simulate_file` is absent.
fn open_sampler_input(
    unit: &UnitConfig,
    default_marker: impl FnOnce(&str) -> MarkerFileInput,
) -> Result<Box<dyn InputLine>, BuildError> {
    let params = unit.params();
    let bias = match params.str("bias")? {
        None => Bias::Default,
        Some(raw) => raw
            .parse::<Bias>()
            .map_err(|reason| ConfigError::invalid(&unit.name, "bias", reason))?,
    };
    let active_low = params.bool_or("active_low", true)?;

    match params.u64("line")? {
        Some(offset) => {
            let offset = u32::try_from(offset)
                .map_err(|_| ConfigError::invalid(&unit.name, "line", format!("{offset} is too large")))?;
            let mut addr = LineAddress::new(offset);
            addr.active_low = active_low;
            addr.bias = bias;
            if let Some(chip) = params.str("chip")? {
                addr.chip = PathBuf::from(chip);
            }
            info!(sampler = %unit.name, line = %addr, active_low, ?bias, "opening input line");
            Ok(io::open_input(&addr, &unit.name)?)
        }
        None => {
            let input = match params.str("simulate_file")? {
                Some(path) => MarkerFileInput::new(path),
                None => default_marker(&unit.name),
            };
            info!(sampler = %unit.name, marker = %input.path().display(), "no line configured; simulating input");
            Ok(Box::new(input))
        }
    }
}
