//! # Discrete output consumer (`gpio_output`).
//!
//! Drives one output line to the value configured for each event.
//!
//! ## Parameters
//! | key          | meaning                                              |
//! |--------------|------------------------------------------------------|
//! | `line`       | GPIO line offset                                     |
//! | `chip`       | GPIO chip path (default `/dev/gpiochip0`)            |
//! | `active_low` | invert the output (default `false`)                  |
//! | `initial`    | level driven when the line is requested (default `false`) |
//! | `path`       | file written with `1`/`0` instead of a GPIO line     |
//!
//! Per event: `value: true|false` (default `true`).

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::UnitConfig;
use crate::error::{BuildError, ConfigError, DeliveryError};
use crate::events::Event;
use crate::io::{self, FileOutput, LineAddress, OutputLine};

use super::consumer::Consumer;

/// Per-event options of [`OutputConsumer`].
#[derive(Debug, Clone, Deserialize)]
pub struct OutputOptions {
    #[serde(default = "value_default")]
    pub value: bool,
}

fn value_default() -> bool {
    true
}

/// Owns one output line exclusively.
pub struct OutputConsumer {
    name: String,
    line: Box<dyn OutputLine>,
}

impl OutputConsumer {
    pub fn new(name: impl Into<String>, line: Box<dyn OutputLine>) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }

    /// Requests the configured line; fails if none is configured or it cannot be opened.
    pub fn from_config(unit: &UnitConfig) -> Result<Self, BuildError> {
        let params = unit.params();
        let initial = params.bool_or("initial", false)?;

        let line: Box<dyn OutputLine> = match (params.u64("line")?, params.str("path")?) {
            (Some(offset), _) => {
                let offset = u32::try_from(offset)
                    .map_err(|_| ConfigError::invalid(&unit.name, "line", format!("{offset} is too large")))?;
                let mut addr = LineAddress::new(offset);
                addr.active_low = params.bool_or("active_low", false)?;
                if let Some(chip) = params.str("chip")? {
                    addr.chip = PathBuf::from(chip);
                }
                info!(consumer = %unit.name, line = %addr, initial, "opening output line");
                io::open_output(&addr, &unit.name, initial)?
            }
            (None, Some(path)) => {
                info!(consumer = %unit.name, path, initial, "driving output file");
                Box::new(FileOutput::create(path, initial)?)
            }
            (None, None) => {
                return Err(ConfigError::Missing {
                    unit: unit.name.clone(),
                    key: "line",
                }
                .into());
            }
        };
        Ok(Self::new(unit.name.clone(), line))
    }
}

#[async_trait]
impl Consumer for OutputConsumer {
    type Options = OutputOptions;

    fn kind(&self) -> &'static str {
        "gpio_output"
    }

    async fn handle_event(&mut self, event: &Event, options: &OutputOptions) -> Result<(), DeliveryError> {
        self.line.write(options.value)?;
        debug!(consumer = %self.name, event = %event.name, value = options.value, "output written");
        Ok(())
    }
}
