use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::automation::history::DecisionRecord;
use crate::automation::weather::Weather;
use crate::types::*;

/// `{action, temperature, mode, fan_speed, reasoning}` as produced by a strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub mode: Option<AcMode>,
    #[serde(default)]
    pub fan_speed: Option<FanSpeed>,
    #[serde(default)]
    pub reasoning: String,
}

impl Decision {
    pub fn none(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    pub fn turn_off(reasoning: impl Into<String>) -> Self {
        Self {
            action: Action::TurnOff,
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    /// Fractional temperatures are rounded; range checks happen in the mapper.
    pub fn intent(&self) -> Intent {
        Intent {
            action: self.action,
            temperature: self.temperature.map(|t| t.round() as i32),
            mode: self.mode,
            fan_speed: self.fan_speed,
        }
    }
}

/// Parse a decision, tolerating a surrounding markdown code fence.
pub fn parse_decision(text: &str) -> Result<Decision> {
    let mut content = text.trim();
    if let Some(rest) = content.strip_prefix("```") {
        content = rest.split("```").next().unwrap_or(rest);
        content = content.strip_prefix("json").unwrap_or(content);
    }
    Ok(serde_json::from_str(content.trim())?)
}

/// Everything a strategy may look at. Absent readings stay `None`.
#[derive(Debug, Clone, Default)]
pub struct DecisionContext {
    pub room: Option<RoomReading>,
    pub ac: Option<AcStatus>,
    pub weather: Option<Weather>,
    /// Local wall-clock time, `HH:MM`.
    pub current_time: String,
    /// Most recent first.
    pub history: Vec<DecisionRecord>,
}

pub trait DecisionStrategy {
    fn decide(&self, context: &DecisionContext) -> impl Future<Output = Result<Decision>> + Send;
}
