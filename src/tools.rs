//! Tool surface exposed to MCP clients and scripts.
//!
//! Every tool returns a human-readable string. Failures are rendered as
//! `"Error: ..."` rather than propagated, since callers consume text.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::controller::{AcController, RoomLookup};
use crate::types::*;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

const COMMON_COMMANDS: &str = "Common AC Commands:

Standard:
  - turnOn / turnOff: power control
  - setAll: set temperature, mode, fan speed and power at once

Custom (use with send_custom_ac_command):
  - swing: toggle vertical swing
  - swingHorizontal: toggle horizontal swing
  - timer: set timer
  - sleep: activate sleep mode
  - turbo: activate turbo mode
  - economy: energy saving mode
  - quiet: silent mode
  - light: toggle display light

Note: not all commands work with all AC models.";

fn default_temperature() -> i32 {
    24
}

fn default_mode() -> AcMode {
    AcMode::Cool
}

fn default_fan() -> FanSpeed {
    FanSpeed::Auto
}

fn default_parameter() -> String {
    crate::protocol::DEFAULT_PARAMETER.to_string()
}

#[derive(Debug, Deserialize)]
struct TurnOnArgs {
    #[serde(default = "default_temperature")]
    temperature: i32,
    #[serde(default = "default_mode")]
    mode: AcMode,
    #[serde(default = "default_fan")]
    fan_speed: FanSpeed,
}

#[derive(Debug, Deserialize)]
struct TemperatureArgs {
    temperature: i32,
}

#[derive(Debug, Deserialize)]
struct ModeArgs {
    mode: AcMode,
}

#[derive(Debug, Deserialize)]
struct FanArgs {
    fan_speed: FanSpeed,
}

#[derive(Debug, Deserialize)]
struct AllSettingsArgs {
    power: Power,
    #[serde(default = "default_temperature")]
    temperature: i32,
    #[serde(default = "default_mode")]
    mode: AcMode,
    #[serde(default = "default_fan")]
    fan_speed: FanSpeed,
}

#[derive(Debug, Deserialize)]
struct CustomArgs {
    command: String,
    #[serde(default = "default_parameter")]
    parameter: String,
}

pub struct AcTools {
    controller: AcController,
}

impl AcTools {
    pub fn new(controller: AcController) -> Self {
        Self { controller }
    }

    pub fn definitions() -> Vec<ToolDefinition> {
        let temperature = json!({
            "type": "integer", "minimum": MIN_TEMPERATURE, "maximum": MAX_TEMPERATURE,
            "description": "Target temperature in °C"
        });
        let mode = json!({"type": "string", "enum": AcMode::ALL.map(|m| m.as_api_str())});
        let fan = json!({"type": "string", "enum": FanSpeed::ALL.map(|f| f.as_api_str())});

        vec![
            ToolDefinition::new("turn_ac_on", "Turn on the AC with specified settings.")
                .with_schema(json!({
                    "type": "object",
                    "properties": {
                        "temperature": temperature.clone(),
                        "mode": mode.clone(),
                        "fan_speed": fan.clone()
                    }
                })),
            ToolDefinition::new("turn_ac_off", "Turn off the AC."),
            ToolDefinition::new("set_ac_temperature", "Change AC temperature (AC must be on).")
                .with_schema(json!({
                    "type": "object",
                    "properties": {"temperature": temperature.clone()},
                    "required": ["temperature"]
                })),
            ToolDefinition::new("set_ac_mode", "Change AC mode (AC must be on).").with_schema(
                json!({
                    "type": "object",
                    "properties": {"mode": mode.clone()},
                    "required": ["mode"]
                }),
            ),
            ToolDefinition::new("set_ac_fan_speed", "Change AC fan speed (AC must be on).")
                .with_schema(json!({
                    "type": "object",
                    "properties": {"fan_speed": fan.clone()},
                    "required": ["fan_speed"]
                })),
            ToolDefinition::new("set_ac_all_settings", "Set all AC settings at once.")
                .with_schema(json!({
                    "type": "object",
                    "properties": {
                        "power": {"type": "string", "enum": ["on", "off"]},
                        "temperature": temperature,
                        "mode": mode,
                        "fan_speed": fan
                    },
                    "required": ["power"]
                })),
            ToolDefinition::new(
                "send_custom_ac_command",
                "Send a custom command (swing, turbo, sleep, ...). May not be supported by all AC models.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string"},
                    "parameter": {"type": "string", "default": "default"}
                },
                "required": ["command"]
            })),
            ToolDefinition::new("get_ac_status", "Get current AC status (power, temp, mode, fan)."),
            ToolDefinition::new(
                "get_room_temperature",
                "Get room temperature and humidity from the Hub 2 sensor.",
            ),
            ToolDefinition::new(
                "get_ac_devices",
                "List all infrared devices (to find your AC device ID).",
            ),
            ToolDefinition::new(
                "check_credentials",
                "Check if SwitchBot credentials are configured and valid.",
            ),
            ToolDefinition::new(
                "list_common_ac_commands",
                "List common AC commands for send_custom_ac_command.",
            ),
        ]
    }

    /// Dispatch by tool name with JSON arguments.
    pub async fn call(&self, name: &str, args: Value) -> String {
        debug!(tool = %name, "tool call");
        let args = if args.is_null() { json!({}) } else { args };
        match name {
            "turn_ac_on" => match parse_args::<TurnOnArgs>(name, args) {
                Ok(a) => self.turn_ac_on(a.temperature, a.mode, a.fan_speed).await,
                Err(e) => error_text(&e),
            },
            "turn_ac_off" => self.turn_ac_off().await,
            "set_ac_temperature" => match parse_args::<TemperatureArgs>(name, args) {
                Ok(a) => self.set_ac_temperature(a.temperature).await,
                Err(e) => error_text(&e),
            },
            "set_ac_mode" => match parse_args::<ModeArgs>(name, args) {
                Ok(a) => self.set_ac_mode(a.mode).await,
                Err(e) => error_text(&e),
            },
            "set_ac_fan_speed" => match parse_args::<FanArgs>(name, args) {
                Ok(a) => self.set_ac_fan_speed(a.fan_speed).await,
                Err(e) => error_text(&e),
            },
            "set_ac_all_settings" => match parse_args::<AllSettingsArgs>(name, args) {
                Ok(a) => {
                    self.set_ac_all_settings(a.power, a.temperature, a.mode, a.fan_speed)
                        .await
                }
                Err(e) => error_text(&e),
            },
            "send_custom_ac_command" => match parse_args::<CustomArgs>(name, args) {
                Ok(a) => self.send_custom_ac_command(&a.command, &a.parameter).await,
                Err(e) => error_text(&e),
            },
            "get_ac_status" => self.get_ac_status().await,
            "get_room_temperature" => self.get_room_temperature().await,
            "get_ac_devices" => self.get_ac_devices().await,
            "check_credentials" => self.check_credentials().await,
            "list_common_ac_commands" => Self::list_common_ac_commands(),
            other => format!("Error: unknown tool '{other}'"),
        }
    }

    pub async fn turn_ac_on(&self, temperature: i32, mode: AcMode, fan_speed: FanSpeed) -> String {
        match self.controller.turn_on(temperature, mode, fan_speed).await {
            Ok(()) => format!(
                "✓ AC turned ON\n  Temperature: {temperature}°C\n  Mode: {mode}\n  Fan Speed: {fan_speed}"
            ),
            Err(e) => error_text(&e),
        }
    }

    pub async fn turn_ac_off(&self) -> String {
        match self.controller.turn_off().await {
            Ok(()) => "✓ AC turned OFF".to_string(),
            Err(e) => error_text(&e),
        }
    }

    pub async fn set_ac_temperature(&self, temperature: i32) -> String {
        match self.controller.set_temperature(temperature).await {
            Ok(()) => format!("✓ Temperature set to {temperature}°C"),
            Err(e) => error_text(&e),
        }
    }

    pub async fn set_ac_mode(&self, mode: AcMode) -> String {
        match self.controller.set_mode(mode).await {
            Ok(()) => format!("✓ Mode set to {mode}"),
            Err(e) => error_text(&e),
        }
    }

    pub async fn set_ac_fan_speed(&self, fan_speed: FanSpeed) -> String {
        match self.controller.set_fan_speed(fan_speed).await {
            Ok(()) => format!("✓ Fan speed set to {fan_speed}"),
            Err(e) => error_text(&e),
        }
    }

    pub async fn set_ac_all_settings(
        &self,
        power: Power,
        temperature: i32,
        mode: AcMode,
        fan_speed: FanSpeed,
    ) -> String {
        match self.controller.set_all(power, temperature, mode, fan_speed).await {
            Ok(()) if power == Power::Off => "✓ AC turned OFF".to_string(),
            Ok(()) => format!(
                "✓ AC settings updated\n  Power: ON\n  Temperature: {temperature}°C\n  Mode: {mode}\n  Fan Speed: {fan_speed}"
            ),
            Err(e) => error_text(&e),
        }
    }

    pub async fn send_custom_ac_command(&self, command: &str, parameter: &str) -> String {
        match self.controller.custom(command, parameter).await {
            Ok(()) => format!(
                "✓ Custom command sent\n  Command: {command}\n  Parameter: {parameter}"
            ),
            Err(e) => format!("{}\n  Command: {command}", error_text(&e)),
        }
    }

    pub async fn get_ac_status(&self) -> String {
        match self.controller.status().await {
            Ok(status) => render_status(&status),
            Err(e) => error_text(&e),
        }
    }

    pub async fn get_room_temperature(&self) -> String {
        match self.controller.room_reading().await {
            Ok(RoomLookup::Found { reading, .. }) => render_room(&reading),
            Ok(RoomLookup::HubNotFound) => format!(
                "Hub not found: no infrared remote '{}' paired with a hub",
                self.controller.device_id()
            ),
            Err(e) => error_text(&e),
        }
    }

    pub async fn get_ac_devices(&self) -> String {
        let devices = match self.controller.devices().await {
            Ok(d) => d,
            Err(e) => return error_text(&e),
        };
        if devices.infrared_remote_list.is_empty() {
            return "No infrared devices found. Add your AC remote via the SwitchBot app."
                .to_string();
        }

        let mut out = String::from("Infrared Devices:\n\n");
        for dev in &devices.infrared_remote_list {
            out.push_str(&format!("Name: {}\n", or_na(&dev.device_name, "Unnamed")));
            out.push_str(&format!("Type: {}\n", or_na(&dev.remote_type, "Unknown")));
            out.push_str(&format!("Device ID: {}\n", or_na(&dev.device_id, "N/A")));
            out.push_str(&format!("Hub ID: {}\n", or_na(&dev.hub_device_id, "N/A")));
            out.push_str(&"-".repeat(40));
            out.push('\n');
        }
        out
    }

    pub async fn check_credentials(&self) -> String {
        let creds = self.controller.client().credentials();
        let mut out = String::from("Credential Status Check:\n\n");

        if creds.has_token() {
            out.push_str(&format!("SWITCHBOT_TOKEN: Set ({} chars)\n", creds.token_len()));
        } else {
            out.push_str("SWITCHBOT_TOKEN: Not set\n");
        }
        if creds.has_secret() {
            out.push_str(&format!("SWITCHBOT_SECRET: Set ({} chars)\n", creds.secret_len()));
        } else {
            out.push_str("SWITCHBOT_SECRET: Not set\n");
        }
        let device_id = self.controller.device_id();
        if device_id.is_empty() {
            out.push_str("SWITCHBOT_AC_DEVICE_ID: Not set\n");
        } else {
            out.push_str(&format!("SWITCHBOT_AC_DEVICE_ID: {device_id}\n"));
        }

        if creds.ensure_present().is_err() {
            out.push_str("\nMissing credentials!");
            return out;
        }

        out.push_str("\nTesting API authentication...\n");
        match self.controller.client().list_devices().await {
            Ok(env) if env.is_success() => out.push_str("Authentication successful!\n"),
            Ok(env) => out.push_str(&format!("Authentication failed: {}\n", env.message)),
            Err(e) => {
                warn!("credential check request failed: {e}");
                out.push_str(&format!("API request failed: {e}\n"));
            }
        }
        out
    }

    pub fn list_common_ac_commands() -> String {
        COMMON_COMMANDS.to_string()
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::Validation(format!("invalid arguments for {tool}: {e}")))
}

pub fn error_text(e: &Error) -> String {
    format!("Error: {e}")
}

fn or_na<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

pub fn render_status(status: &AcStatus) -> String {
    let power = match status.power {
        Power::On => "ON",
        Power::Off => "OFF",
    };
    let temp = status
        .temperature
        .map_or_else(|| "N/A".to_string(), |t| t.to_string());
    let mode = status.mode.map_or("N/A", |m| m.as_api_str());
    let fan = status.fan_speed.map_or("N/A", |f| f.as_api_str());
    format!(
        "Air Conditioner Status:\n\nPower: {power}\nTemperature: {temp}°C\nMode: {mode}\nFan Speed: {fan}"
    )
}

pub fn render_room(reading: &RoomReading) -> String {
    let temp = reading
        .temperature
        .map_or_else(|| "N/A".to_string(), |t| t.to_string());
    let humidity = reading
        .humidity
        .map_or_else(|| "N/A".to_string(), |h| h.to_string());
    let mut out =
        format!("Room Conditions (from Hub 2):\n\nTemperature: {temp}°C\nHumidity: {humidity}%");
    if let Some(t) = reading.temperature {
        out.push_str("\n\n");
        out.push_str(comfort_note(t));
    }
    out
}

pub fn comfort_note(temperature: f64) -> &'static str {
    if temperature < 18.0 {
        "It's quite cold"
    } else if temperature < 22.0 {
        "Cool"
    } else if temperature < 26.0 {
        "Comfortable"
    } else if temperature < 30.0 {
        "Getting warm"
    } else {
        "Very hot!"
    }
}
