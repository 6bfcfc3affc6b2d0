//! # Connect forwarder (`connect`).
//!
//! Creates one Connect operation per configured event.
//!
//! ## Parameters
//! | key        | meaning                                               |
//! |------------|-------------------------------------------------------|
//! | `token`    | API token, required                                   |
//! | `url`      | API base URL (default: public Connect interface)      |
//! | `testmode` | build and log operations without sending (default `false`) |
//! | `template` | default operation fields                              |
//!
//! Per event: `keyword`, `facts`, `source`, `ric`, `address`, `properties`.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::clients::connect::{self, ConnectClient, ConnectOverrides, OperationTemplate, build_operation};
use crate::config::UnitConfig;
use crate::error::{BuildError, DeliveryError};
use crate::events::Event;

use super::consumer::Consumer;

pub struct ConnectForwarder {
    name: String,
    client: ConnectClient,
    template: OperationTemplate,
    testmode: bool,
}

impl ConnectForwarder {
    pub fn new(name: impl Into<String>, client: ConnectClient, template: OperationTemplate, testmode: bool) -> Self {
        let name = name.into();
        if testmode {
            warn!(consumer = %name, "testmode enabled; no operation will be sent");
        }
        Self {
            name,
            client,
            template,
            testmode,
        }
    }

    pub fn from_config(unit: &UnitConfig) -> Result<Self, BuildError> {
        let params = unit.params();
        let token = params.required_str("token")?;
        let url = params.str("url")?.unwrap_or(connect::DEFAULT_URL);
        let testmode = params.bool_or("testmode", false)?;
        let template: OperationTemplate = params.section("template")?;

        let client = ConnectClient::new(url, token)?;
        info!(consumer = %unit.name, url = client.base_url(), "connect forwarder configured");
        Ok(Self::new(unit.name.clone(), client, template, testmode))
    }
}

#[async_trait]
impl Consumer for ConnectForwarder {
    type Options = ConnectOverrides;

    fn kind(&self) -> &'static str {
        "connect"
    }

    async fn handle_event(&mut self, event: &Event, options: &ConnectOverrides) -> Result<(), DeliveryError> {
        let operation = build_operation(&self.template, options, event.timestamp());
        info!(
            consumer = %self.name,
            event = %event.name,
            keyword = %operation.keyword,
            ric = %operation.ric,
            testmode = self.testmode,
            "operation built"
        );
        if self.testmode {
            return Ok(());
        }
        self.client.send_operation(&operation).await?;
        info!(consumer = %self.name, event = %event.name, "operation sent");
        Ok(())
    }
}
