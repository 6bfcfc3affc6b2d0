//! Log-only consumer (`log`, alias `generic_printout`).

use async_trait::async_trait;
use tracing::info;

use crate::error::DeliveryError;
use crate::events::Event;

use super::consumer::{Consumer, NoOptions};

/// Logs every configured and enabled event; no side effects.
#[derive(Debug, Default)]
pub struct LogConsumer {
    name: String,
}

impl LogConsumer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Consumer for LogConsumer {
    type Options = NoOptions;

    fn kind(&self) -> &'static str {
        "log"
    }

    async fn handle_event(&mut self, event: &Event, _options: &NoOptions) -> Result<(), DeliveryError> {
        info!(consumer = %self.name, event = %event, fields = ?event.fields, "event received");
        Ok(())
    }
}
