//! # Discrete I/O boundary.
//!
//! Samplers read an [`InputLine`]; the output consumer drives an [`OutputLine`].
//! Both are plain blocking capabilities: reading or writing a GPIO level takes
//! microseconds, so they are called directly from the owning task.
//!
//! Backends:
//! - **GPIO character device** (`gpio` feature): addressed by [`LineAddress`]
//!   (chip path + line offset), with active-low and bias resolved once when the
//!   line is requested.
//! - **Files**: [`MarkerFileInput`] reads `true` while a marker file exists
//!   (used to simulate a contact on development machines); [`FileOutput`]
//!   writes `1`/`0` into a file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::HardwareError;

mod file;
#[cfg(feature = "gpio")]
mod gpio;

pub use file::{FileOutput, MarkerFileInput};

/// Default GPIO chip.
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Readable boolean line.
pub trait InputLine: Send + 'static {
    /// Returns the current logical level (active-low already applied).
    fn read(&mut self) -> Result<bool, HardwareError>;
}

/// Writable boolean line.
pub trait OutputLine: Send + 'static {
    /// Drives the line to the given logical level.
    fn write(&mut self, value: bool) -> Result<(), HardwareError>;
}

/// Internal pull resistor configuration of an input line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    PullUp,
    PullDown,
    /// Leave the line as configured by the platform.
    #[default]
    Default,
}

impl FromStr for Bias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pull_up" => Ok(Bias::PullUp),
            "pull_down" => Ok(Bias::PullDown),
            "default" => Ok(Bias::Default),
            other => Err(format!(
                "'{other}' (use 'pull_up', 'pull_down' or 'default')"
            )),
        }
    }
}

/// Address and electrical configuration of one GPIO line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAddress {
    pub chip: PathBuf,
    pub offset: u32,
    pub active_low: bool,
    pub bias: Bias,
}

impl LineAddress {
    pub fn new(offset: u32) -> Self {
        Self {
            chip: PathBuf::from(DEFAULT_CHIP),
            offset,
            active_low: false,
            bias: Bias::Default,
        }
    }
}

impl fmt::Display for LineAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chip.display(), self.offset)
    }
}

/// Requests `addr` as an input line.
#[cfg(feature = "gpio")]
pub fn open_input(addr: &LineAddress, consumer: &str) -> Result<Box<dyn InputLine>, HardwareError> {
    Ok(Box::new(gpio::GpioInput::request(addr, consumer)?))
}

/// Requests `addr` as an output line driven to `initial`.
#[cfg(feature = "gpio")]
pub fn open_output(
    addr: &LineAddress,
    consumer: &str,
    initial: bool,
) -> Result<Box<dyn OutputLine>, HardwareError> {
    Ok(Box::new(gpio::GpioOutput::request(addr, consumer, initial)?))
}

/// Requests `addr` as an input line.
#[cfg(not(feature = "gpio"))]
pub fn open_input(addr: &LineAddress, _consumer: &str) -> Result<Box<dyn InputLine>, HardwareError> {
    Err(HardwareError::Unsupported {
        line: addr.to_string(),
    })
}

/// Requests `addr` as an output line driven to `initial`.
#[cfg(not(feature = "gpio"))]
pub fn open_output(
    addr: &LineAddress,
    _consumer: &str,
    _initial: bool,
) -> Result<Box<dyn OutputLine>, HardwareError> {
    Err(HardwareError::Unsupported {
        line: addr.to_string(),
    })
}
