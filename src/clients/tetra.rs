//! # TETRAcontrol SDS API client.
//!
//! Sends short data service messages (SDS) and callouts through a
//! TETRAcontrol server:
//!
//! ```text
//! POST {url}/API/SDS           Cookie: userkey=<token>    form: Ziel, Text, GerID, Typ, Flash, Encr, Prio
//!                                                         callout adds: COPrio, CONum, noreply, sub
//! POST {url}/API/RADIO.json    Cookie: userkey=<token>    form: GerID
//! ```
//!
//! The server answers `200` on success.
//!
//! ## Field ranges
//! | field     | allowed                                  |
//! |-----------|------------------------------------------|
//! | `Typ`     | 0 simple, 1 normal, 138 concatenated; 195 callout |
//! | `GerID`   | 1–4                                      |
//! | `Flash`   | 0/1                                      |
//! | `Encr`    | 0/1                                      |
//! | `Prio`    | 0–15                                     |
//! | `COPrio`  | 1–15 (callout only)                      |
//! | `CONum`   | 1–250 (callout only)                     |
//! | `noreply` | 0/1 (callout only)                       |
//!
//! [`SdsMessage::validate`] checks all of them; a message that fails
//! validation is never transmitted.

use std::ops::RangeInclusive;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::COOKIE;
use serde::Deserialize;
use tracing::debug;

use crate::error::{DeliveryError, ValidationError};

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Highest callout incident number before wrapping to 1.
pub const MAX_CALLOUT_NUMBER: u8 = 250;

/// Message type (`Typ`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdsType {
    Simple,
    #[default]
    Normal,
    Concat,
    Callout,
}

impl SdsType {
    pub const fn code(self) -> i64 {
        match self {
            SdsType::Simple => 0,
            SdsType::Normal => 1,
            SdsType::Concat => 138,
            SdsType::Callout => 195,
        }
    }
}

/// Callout-only fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutFields {
    pub severity: i64,
    pub number: i64,
    pub no_reply: i64,
    pub sub_groups: Vec<String>,
}

/// One SDS ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdsMessage {
    pub dest: String,
    pub text: String,
    pub device: i64,
    pub typ: SdsType,
    pub flash: i64,
    pub encrypted: i64,
    pub prio: i64,
    /// Present exactly when `typ` is [`SdsType::Callout`].
    pub callout: Option<CalloutFields>,
}

fn check(field: &'static str, value: i64, range: RangeInclusive<i64>, allowed: &'static str) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, value, allowed })
    }
}

impl SdsMessage {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dest.trim().is_empty() {
            return Err(ValidationError::Empty { field: "Ziel" });
        }
        check("GerID", self.device, 1..=4, "1-4")?;
        check("Flash", self.flash, 0..=1, "0/1")?;
        check("Encr", self.encrypted, 0..=1, "0/1")?;
        check("Prio", self.prio, 0..=15, "0-15")?;

        match (&self.callout, self.typ) {
            (Some(co), SdsType::Callout) => {
                check("COPrio", co.severity, 1..=15, "1-15")?;
                check("CONum", co.number, 1..=i64::from(MAX_CALLOUT_NUMBER), "1-250")?;
                check("noreply", co.no_reply, 0..=1, "0/1")?;
            }
            (None, SdsType::Callout) => {
                return Err(ValidationError::OutOfRange {
                    field: "Typ",
                    value: self.typ.code(),
                    allowed: "0, 1, 138 without callout fields",
                });
            }
            (Some(_), typ) => {
                return Err(ValidationError::OutOfRange {
                    field: "Typ",
                    value: typ.code(),
                    allowed: "195 with callout fields",
                });
            }
            (None, _) => {}
        }
        Ok(())
    }

    /// Form body in wire order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("Ziel", self.dest.clone()),
            ("Text", self.text.clone()),
            ("GerID", self.device.to_string()),
            ("Typ", self.typ.code().to_string()),
            ("Flash", self.flash.to_string()),
            ("Encr", self.encrypted.to_string()),
            ("Prio", self.prio.to_string()),
        ];
        if let Some(co) = &self.callout {
            fields.push(("COPrio", co.severity.to_string()));
            fields.push(("CONum", co.number.to_string()));
            fields.push(("noreply", co.no_reply.to_string()));
            if !co.sub_groups.is_empty() {
                fields.push(("sub", co.sub_groups.join(",")));
            }
        }
        fields
    }
}

/// Consumer-wide message defaults (`params.defaults`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SdsDefaults {
    pub device: i64,
    pub flash: i64,
    pub encrypted: i64,
    pub prio: i64,
    pub callout_prio: i64,
}

impl Default for SdsDefaults {
    fn default() -> Self {
        Self {
            device: 1,
            flash: 1,
            encrypted: 1,
            prio: 1,
            callout_prio: 1,
        }
    }
}

/// Per-event overrides (`events.<name>` of a `tetracontrol` consumer).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SdsOverrides {
    /// Target ISSI or GSSI.
    #[serde(default)]
    pub dest: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "type")]
    pub typ: SdsType,
    pub prio: Option<i64>,
    pub flash: Option<i64>,
    pub callout_prio: Option<i64>,
    #[serde(default)]
    pub no_reply: bool,
    #[serde(default)]
    pub sub: Vec<String>,
}

/// Builds a fresh message. `callout_number` is only used for callouts.
pub fn build_sds(defaults: &SdsDefaults, overrides: &SdsOverrides, callout_number: u8) -> SdsMessage {
    let callout = (overrides.typ == SdsType::Callout).then(|| CalloutFields {
        severity: overrides.callout_prio.unwrap_or(defaults.callout_prio),
        number: i64::from(callout_number),
        no_reply: i64::from(overrides.no_reply),
        sub_groups: overrides.sub.clone(),
    });

    SdsMessage {
        dest: overrides.dest.clone(),
        text: overrides.text.clone(),
        device: defaults.device,
        typ: overrides.typ,
        flash: overrides.flash.unwrap_or(defaults.flash),
        encrypted: defaults.encrypted,
        prio: overrides.prio.unwrap_or(defaults.prio),
        callout,
    }
}

/// Incident numbers for callouts: 1, 2, … 250, 1, …
#[derive(Debug, Clone)]
pub struct CalloutCounter {
    next: u8,
}

impl Default for CalloutCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl CalloutCounter {
    pub fn next_number(&mut self) -> u8 {
        let current = self.next;
        self.next = if current >= MAX_CALLOUT_NUMBER { 1 } else { current + 1 };
        current
    }
}

/// HTTP client for one TETRAcontrol server.
#[derive(Debug, Clone)]
pub struct TetraClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl TetraClient {
    pub fn new(base: &str, token: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Validates and sends one message. Returns the response body.
    pub async fn send_sds(&self, message: &SdsMessage) -> Result<String, DeliveryError> {
        message.validate()?;
        self.post("API/SDS", &message.form_fields()).await
    }

    /// Queries the status of radio device `device` (1–4). Returns the response body.
    pub async fn device_status(&self, device: i64) -> Result<String, DeliveryError> {
        check("GerID", device, 1..=4, "1-4")?;
        self.post("API/RADIO.json", &[("GerID", device.to_string())]).await
    }

    async fn post(&self, path: &str, form: &[(&'static str, String)]) -> Result<String, DeliveryError> {
        let url = format!("{}/{path}", self.base);
        let resp = self
            .http
            .post(&url)
            .header(COOKIE, format!("userkey={}", self.token))
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            return Err(DeliveryError::Protocol {
                url,
                status: status.as_u16(),
                body,
            });
        }
        debug!(url = %url, body = %body, "request accepted");
        Ok(body)
    }
}
