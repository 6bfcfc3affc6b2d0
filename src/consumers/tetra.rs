//! # TETRAcontrol forwarder (`tetracontrol`).
//!
//! Sends one SDS or callout per configured event.
//!
//! ## Parameters
//! | key        | meaning                                                       |
//! |------------|---------------------------------------------------------------|
//! | `url`      | server base URL, required                                     |
//! | `token`    | user key, required                                            |
//! | `testmode` | build, validate and log messages without sending (default `false`) |
//! | `defaults` | `device`, `flash`, `encrypted`, `prio`, `callout_prio`        |
//!
//! Per event: `dest`, `text`, `type` (`simple|normal|concat|callout`), `prio`,
//! `flash`, `callout_prio`, `no_reply`, `sub`.
//!
//! Callouts are numbered by a per-consumer counter (1 … 250, then 1 again).
//! When the worker starts, the radio device status is probed once; a failed
//! probe is logged and otherwise ignored.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::clients::tetra::{CalloutCounter, SdsDefaults, SdsOverrides, SdsType, TetraClient, build_sds};
use crate::config::UnitConfig;
use crate::error::{BuildError, DeliveryError};
use crate::events::Event;

use super::consumer::Consumer;

pub struct TetraForwarder {
    name: String,
    client: TetraClient,
    defaults: SdsDefaults,
    testmode: bool,
    callouts: CalloutCounter,
}

impl TetraForwarder {
    pub fn new(name: impl Into<String>, client: TetraClient, defaults: SdsDefaults, testmode: bool) -> Self {
        let name = name.into();
        if testmode {
            warn!(consumer = %name, "testmode enabled; no message will be sent");
        }
        Self {
            name,
            client,
            defaults,
            testmode,
            callouts: CalloutCounter::default(),
        }
    }

    pub fn from_config(unit: &UnitConfig) -> Result<Self, BuildError> {
        let params = unit.params();
        let url = params.required_str("url")?;
        let token = params.required_str("token")?;
        let testmode = params.bool_or("testmode", false)?;
        let defaults: SdsDefaults = params.section("defaults")?;

        let client = TetraClient::new(url, token)?;
        info!(consumer = %unit.name, url = client.base_url(), device = defaults.device, "tetracontrol forwarder configured");
        Ok(Self::new(unit.name.clone(), client, defaults, testmode))
    }
}

#[async_trait]
impl Consumer for TetraForwarder {
    type Options = SdsOverrides;

    fn kind(&self) -> &'static str {
        "tetracontrol"
    }

    async fn on_start(&mut self) {
        match self.client.device_status(self.defaults.device).await {
            Ok(body) => info!(consumer = %self.name, status = %body.trim(), "radio device reachable"),
            Err(e) => warn!(consumer = %self.name, label = e.as_label(), error = %e, "radio device probe failed"),
        }
    }

    async fn handle_event(&mut self, event: &Event, options: &SdsOverrides) -> Result<(), DeliveryError> {
        let number = if options.typ == SdsType::Callout {
            self.callouts.next_number()
        } else {
            0
        };
        let message = build_sds(&self.defaults, options, number);
        message.validate()?;

        info!(
            consumer = %self.name,
            event = %event.name,
            dest = %message.dest,
            typ = message.typ.code(),
            callout = number,
            testmode = self.testmode,
            "message built"
        );
        if self.testmode {
            return Ok(());
        }
        let body = self.client.send_sds(&message).await?;
        info!(consumer = %self.name, event = %event.name, reply = %body.trim(), "message sent");
        Ok(())
    }
}
