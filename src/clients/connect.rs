//! # Connect operation API client.
//!
//! Creates incident operations on the Connect public interface:
//!
//! ```text
//! POST {url}/operation
//! Authorization: Bearer <token>
//! Content-Type: application/json
//!
//! {"Start": "...", "Status": "new", "AlarmEnabled": true, "Keyword": "...",
//!  "Address": {"Street": "...", "HouseNumber": "...", "ZipCode": "...", "City": "..."},
//!  "Source": "...", "Facts": "...", "Ric": "...", "Properties": [{"Key": "...", "Value": "..."}]}
//! ```
//!
//! The back-end answers `204 No Content` on success.
//!
//! Operations are built by [`build_operation`], a pure function of the
//! template, the per-event overrides and the event time. The template is
//! never modified.

use std::time::Duration;

use chrono::{DateTime, Local, SecondsFormat};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DeliveryError;

/// Public Connect API base URL.
pub const DEFAULT_URL: &str = "https://connectapi.feuersoftware.com/interfaces/public";

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Operation as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Operation {
    pub start: String,
    pub status: String,
    pub alarm_enabled: bool,
    pub keyword: String,
    pub address: Address,
    pub source: String,
    pub facts: String,
    pub ric: String,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    pub street: String,
    pub house_number: String,
    pub zip_code: String,
    pub city: String,
}

/// Free key/value attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename(serialize = "Key"))]
    pub key: String,
    #[serde(rename(serialize = "Value"))]
    pub value: String,
}

/// Address fields as written in the configuration; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPatch {
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
}

impl AddressPatch {
    fn apply(&self, address: &mut Address) {
        if let Some(v) = &self.street {
            address.street = v.clone();
        }
        if let Some(v) = &self.housenumber {
            address.house_number = v.clone();
        }
        if let Some(v) = &self.zipcode {
            address.zip_code = v.clone();
        }
        if let Some(v) = &self.city {
            address.city = v.clone();
        }
    }
}

/// Default operation of one consumer (`params.template`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OperationTemplate {
    pub status: String,
    pub alarm_enabled: bool,
    pub keyword: String,
    pub address: AddressPatch,
    pub source: String,
    pub facts: String,
    pub ric: String,
    pub properties: Vec<Property>,
}

impl Default for OperationTemplate {
    fn default() -> Self {
        Self {
            status: "new".to_string(),
            alarm_enabled: true,
            keyword: "F-RWM".to_string(),
            address: AddressPatch::default(),
            source: "firestation-gateway".to_string(),
            facts: "Meldereingang".to_string(),
            ric: String::new(),
            properties: Vec::new(),
        }
    }
}

/// Per-event overrides (`events.<name>` of a `connect` consumer).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectOverrides {
    pub keyword: Option<String>,
    pub facts: Option<String>,
    pub source: Option<String>,
    pub ric: Option<String>,
    pub address: Option<AddressPatch>,
    /// Appended after the template's properties.
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// Builds a fresh operation for an event that happened at `at`.
pub fn build_operation(
    template: &OperationTemplate,
    overrides: &ConnectOverrides,
    at: DateTime<Local>,
) -> Operation {
    let mut address = Address::default();
    template.address.apply(&mut address);
    if let Some(patch) = &overrides.address {
        patch.apply(&mut address);
    }

    let pick = |over: &Option<String>, base: &String| over.clone().unwrap_or_else(|| base.clone());

    let mut properties = template.properties.clone();
    properties.extend(overrides.properties.iter().cloned());

    Operation {
        start: at.to_rfc3339_opts(SecondsFormat::Secs, false),
        status: template.status.clone(),
        alarm_enabled: template.alarm_enabled,
        keyword: pick(&overrides.keyword, &template.keyword),
        address,
        source: pick(&overrides.source, &template.source),
        facts: pick(&overrides.facts, &template.facts),
        ric: pick(&overrides.ric, &template.ric),
        properties,
    }
}

/// HTTP client for the operation endpoint.
#[derive(Debug, Clone)]
pub struct ConnectClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl ConnectClient {
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

    /// Creates an operation; only `204 No Content` counts as success.
    pub async fn send_operation(&self, operation: &Operation) -> Result<(), DeliveryError> {
        let url = format!("{}/operation", self.base);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .json(operation)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::NO_CONTENT {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Protocol {
                url,
                status: status.as_u16(),
                body,
            });
        }
        debug!(url = %url, "operation created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_template_defaults_without_overrides() {
        let op = build_operation(&OperationTemplate::default(), &ConnectOverrides::default(), at());
        assert_eq!(op.status, "new");
        assert!(op.alarm_enabled);
        assert_eq!(op.keyword, "F-RWM");
        assert_eq!(op.address, Address::default());
        assert!(op.start.starts_with("2024-05-01T12:30:00"));
    }

    #[test]
    fn test_overrides_replace_only_present_fields() {
        let template: OperationTemplate = serde_yaml::from_str(
            r#"
source: Station 1
address: { street: Hauptstr., housenumber: "112", city: Musterstadt }
properties: [{ key: Quelle, value: Gateway }]
"#,
        )
        .unwrap();
        let overrides: ConnectOverrides = serde_yaml::from_str(
            r#"
keyword: F-BMA
address: { city: Nachbarstadt }
properties: [{ key: Melder, value: BMA }]
"#,
        )
        .unwrap();

        let op = build_operation(&template, &overrides, at());
        assert_eq!(op.keyword, "F-BMA");
        assert_eq!(op.source, "Station 1");
        assert_eq!(op.facts, "Meldereingang");
        assert_eq!(op.address.street, "Hauptstr.");
        assert_eq!(op.address.house_number, "112");
        assert_eq!(op.address.city, "Nachbarstadt");
        assert_eq!(op.properties.len(), 2);
        assert_eq!(op.properties[1].key, "Melder");

        // Template is untouched; a second build starts from the same defaults.
        let again = build_operation(&template, &ConnectOverrides::default(), at());
        assert_eq!(again.address.city, "Musterstadt");
        assert_eq!(again.properties.len(), 1);
    }

    #[test]
    fn test_wire_format_is_pascal_case() {
        let op = build_operation(&OperationTemplate::default(), &ConnectOverrides::default(), at());
        let json = serde_json::to_value(&op).unwrap();
        for key in [
            "Start",
            "Status",
            "AlarmEnabled",
            "Keyword",
            "Address",
            "Source",
            "Facts",
            "Ric",
            "Properties",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["Address"].get("HouseNumber").is_some());
        assert!(json["Address"].get("ZipCode").is_some());
    }
}
