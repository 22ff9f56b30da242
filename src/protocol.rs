use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{Error, Result};

pub const API_BASE: &str = "https://api.switch-bot.com/v1.1";

/// `statusCode` the cloud uses for success.
pub const SUCCESS_CODE: i64 = 100;

pub const COMMAND_TYPE: &str = "command";
pub const DEFAULT_PARAMETER: &str = "default";

pub const CMD_TURN_OFF: &str = "turnOff";
pub const CMD_SET_ALL: &str = "setAll";

pub fn devices_path() -> String {
    "/devices".to_string()
}

pub fn status_path(device_id: &str) -> String {
    format!("/devices/{device_id}/status")
}

pub fn commands_path(device_id: &str) -> String {
    format!("/devices/{device_id}/commands")
}

/// `{statusCode, message, body}` wrapper carried by every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "statusCode")]
    pub status_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub body: Value,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status_code == SUCCESS_CODE
    }

    /// Body of a successful envelope, or `Error::Api` with the device's message.
    pub fn into_body(self) -> Result<Value> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(Error::Api {
                code: self.status_code,
                message: if self.message.is_empty() {
                    "Unknown error".to_string()
                } else {
                    self.message
                },
            })
        }
    }
}

/// Wire-level command. `parameter` is sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub command: String,
    pub parameter: String,
    #[serde(rename = "commandType")]
    pub command_type: &'static str,
}

impl Command {
    pub fn new(command: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            parameter: parameter.into(),
            command_type: COMMAND_TYPE,
        }
    }

    pub fn to_body(&self) -> Value {
        json!({
            "command": self.command,
            "parameter": self.parameter,
            "commandType": self.command_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalDevice {
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub hub_device_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraredRemote {
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub remote_type: String,
    #[serde(default)]
    pub hub_device_id: String,
}

/// Body of `GET /devices`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceList {
    #[serde(default)]
    pub device_list: Vec<PhysicalDevice>,
    #[serde(default)]
    pub infrared_remote_list: Vec<InfraredRemote>,
}

impl DeviceList {
    pub fn from_body(body: Value) -> Result<Self> {
        if body.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(body)?)
    }

    /// Hub the given infrared remote is paired with.
    pub fn hub_for(&self, device_id: &str) -> Option<&str> {
        self.infrared_remote_list
            .iter()
            .find(|r| r.device_id == device_id)
            .map(|r| r.hub_device_id.as_str())
            .filter(|hub| !hub.is_empty())
    }
}
