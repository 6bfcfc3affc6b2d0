//! Linux GPIO character device backend.

use gpiocdev::Request;
use gpiocdev::line::{Bias as LineBias, Value};

use crate::error::HardwareError;

use super::{Bias, InputLine, LineAddress, OutputLine};

fn open_err(addr: &LineAddress, e: gpiocdev::Error) -> HardwareError {
    HardwareError::Open {
        line: addr.to_string(),
        reason: e.to_string(),
    }
}

/// Requested input line.
pub struct GpioInput {
    label: String,
    offset: u32,
    req: Request,
}

impl GpioInput {
    pub fn request(addr: &LineAddress, consumer: &str) -> Result<Self, HardwareError> {
        let mut builder = Request::builder();
        builder
            .on_chip(&addr.chip)
            .with_consumer(consumer)
            .with_line(addr.offset)
            .as_input();
        if addr.active_low {
            builder.as_active_low();
        }
        match addr.bias {
            Bias::PullUp => {
                builder.with_bias(LineBias::PullUp);
            }
            Bias::PullDown => {
                builder.with_bias(LineBias::PullDown);
            }
            Bias::Default => {}
        }
        let req = builder.request().map_err(|e| open_err(addr, e))?;
        Ok(Self {
            label: addr.to_string(),
            offset: addr.offset,
            req,
        })
    }
}

impl InputLine for GpioInput {
    fn read(&mut self) -> Result<bool, HardwareError> {
        self.req
            .value(self.offset)
            .map(|v| v == Value::Active)
            .map_err(|e| HardwareError::Read {
                line: self.label.clone(),
                reason: e.to_string(),
            })
    }
}

/// Requested output line, owned exclusively by one consumer.
pub struct GpioOutput {
    label: String,
    offset: u32,
    req: Request,
}

fn level(value: bool) -> Value {
    if value { Value::Active } else { Value::Inactive }
}

impl GpioOutput {
    pub fn request(addr: &LineAddress, consumer: &str, initial: bool) -> Result<Self, HardwareError> {
        let mut builder = Request::builder();
        builder
            .on_chip(&addr.chip)
            .with_consumer(consumer)
            .with_line(addr.offset)
            .as_output(level(initial));
        if addr.active_low {
            builder.as_active_low();
        }
        let req = builder.request().map_err(|e| open_err(addr, e))?;
        Ok(Self {
            label: addr.to_string(),
            offset: addr.offset,
            req,
        })
    }
}

impl OutputLine for GpioOutput {
    fn write(&mut self, value: bool) -> Result<(), HardwareError> {
        self.req
            .set_value(self.offset, level(value))
            .map(|_| ())
            .map_err(|e| HardwareError::Write {
                line: self.label.clone(),
                reason: e.to_string(),
            })
    }
}
