use std::fmt;

use serde::{Deserialize, Serialize};

pub const MIN_TEMPERATURE: i32 = 16;
pub const MAX_TEMPERATURE: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    On,
    #[default]
    Off,
}

impl Power {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Power::On => "on",
            Power::Off => "off",
        }
    }

    /// Anything other than a case-insensitive "on" is off.
    pub fn from_api_str(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("on") {
            Power::On
        } else {
            Power::Off
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcMode {
    Auto,
    Cool,
    Dry,
    Fan,
    Heat,
}

impl AcMode {
    pub const ALL: [AcMode; 5] = [
        AcMode::Auto,
        AcMode::Cool,
        AcMode::Dry,
        AcMode::Fan,
        AcMode::Heat,
    ];

    pub fn as_api_str(&self) -> &'static str {
        match self {
            AcMode::Auto => "auto",
            AcMode::Cool => "cool",
            AcMode::Dry => "dry",
            AcMode::Fan => "fan",
            AcMode::Heat => "heat",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(AcMode::Auto),
            "cool" => Some(AcMode::Cool),
            "dry" => Some(AcMode::Dry),
            "fan" => Some(AcMode::Fan),
            "heat" => Some(AcMode::Heat),
            _ => None,
        }
    }
}

impl fmt::Display for AcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanSpeed {
    Auto,
    Low,
    Medium,
    High,
}

impl FanSpeed {
    pub const ALL: [FanSpeed; 4] = [
        FanSpeed::Auto,
        FanSpeed::Low,
        FanSpeed::Medium,
        FanSpeed::High,
    ];

    pub fn as_api_str(&self) -> &'static str {
        match self {
            FanSpeed::Auto => "auto",
            FanSpeed::Low => "low",
            FanSpeed::Medium => "medium",
            FanSpeed::High => "high",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(FanSpeed::Auto),
            "low" => Some(FanSpeed::Low),
            "medium" => Some(FanSpeed::Medium),
            "high" => Some(FanSpeed::High),
            _ => None,
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Last known state of the AC's infrared remote profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcStatus {
    pub power: Power,
    pub temperature: Option<i32>,
    pub mode: Option<AcMode>,
    pub fan_speed: Option<FanSpeed>,
}

/// Sensor reading from the hub, not from the AC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    None,
    TurnOn,
    TurnOff,
    AdjustTemp,
    ChangeMode,
    SetAll,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::TurnOn => "turn_on",
            Action::TurnOff => "turn_off",
            Action::AdjustTemp => "adjust_temp",
            Action::ChangeMode => "change_mode",
            Action::SetAll => "set_all",
        }
    }

    /// Actions that change a single field and must re-send the rest from a fresh status.
    pub fn modifies_in_place(&self) -> bool {
        matches!(self, Action::AdjustTemp | Action::ChangeMode)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired change, before validation and defaulting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    pub action: Action,
    pub temperature: Option<i32>,
    pub mode: Option<AcMode>,
    pub fan_speed: Option<FanSpeed>,
}

impl Intent {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    pub fn temperature(mut self, t: i32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn mode(mut self, mode: AcMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn fan_speed(mut self, fan: FanSpeed) -> Self {
        self.fan_speed = Some(fan);
        self
    }
}

/// Fallbacks used when neither the intent nor the current status has a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub mode: AcMode,
    pub temperature: i32,
    pub fan_speed: FanSpeed,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            mode: AcMode::Cool,
            temperature: 24,
            fan_speed: FanSpeed::Auto,
        }
    }
}
