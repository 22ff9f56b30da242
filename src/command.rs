//! Maps intents onto the two wire commands the AC understands.
//!
//! The infrared protocol has no partial update: every change re-sends the full
//! `"{temperature},{mode},{fan},{power}"` tuple through `setAll`, and powering
//! off is a separate `turnOff`.

use crate::protocol::{CMD_SET_ALL, CMD_TURN_OFF, Command, DEFAULT_PARAMETER};
use crate::types::*;
use crate::{Error, Result};

pub fn validate_temperature(temperature: i32) -> Result<i32> {
    if (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(Error::Validation(format!(
            "Temperature must be between {MIN_TEMPERATURE} and {MAX_TEMPERATURE}°C (got {temperature})"
        )))
    }
}

pub fn turn_off() -> Command {
    Command::new(CMD_TURN_OFF, DEFAULT_PARAMETER)
}

/// `setAll` for the given tuple. `Power::Off` short-circuits to `turnOff` without
/// validating the other fields.
pub fn set_all(power: Power, temperature: i32, mode: AcMode, fan_speed: FanSpeed) -> Result<Command> {
    if power == Power::Off {
        return Ok(turn_off());
    }
    let temperature = validate_temperature(temperature)?;
    Ok(Command::new(
        CMD_SET_ALL,
        format!(
            "{temperature},{},{},{}",
            mode.as_api_str(),
            fan_speed.as_api_str(),
            power.as_api_str()
        ),
    ))
}

pub fn turn_on(temperature: i32, mode: AcMode, fan_speed: FanSpeed) -> Result<Command> {
    set_all(Power::On, temperature, mode, fan_speed)
}

/// Passed through verbatim. Parameter grammar is device-template specific, so
/// nothing is validated and not every AC model supports every command.
pub fn custom_command(name: &str, parameter: &str) -> Command {
    Command::new(name, parameter)
}

/// Resolve an intent into a command. `Ok(None)` for `Action::None`.
///
/// Fields missing from the intent come from `current` when given, else `defaults`.
pub fn build_command(
    intent: &Intent,
    current: Option<&AcStatus>,
    defaults: &Defaults,
) -> Result<Option<Command>> {
    match intent.action {
        Action::None => Ok(None),
        Action::TurnOff => Ok(Some(turn_off())),
        Action::TurnOn | Action::AdjustTemp | Action::ChangeMode | Action::SetAll => {
            let temperature = intent
                .temperature
                .or_else(|| current.and_then(|s| s.temperature))
                .unwrap_or(defaults.temperature);
            let mode = intent
                .mode
                .or_else(|| current.and_then(|s| s.mode))
                .unwrap_or(defaults.mode);
            let fan_speed = intent
                .fan_speed
                .or_else(|| current.and_then(|s| s.fan_speed))
                .unwrap_or(defaults.fan_speed);
            set_all(Power::On, temperature, mode, fan_speed).map(Some)
        }
    }
}
