//! Status parsing.
//!
//! The structured variants read envelope bodies. The text variants read the
//! rendered tool output (`Power: ON`, `Temperature: 22°C`, ...) for callers that
//! only see prose; unknown or missing labels leave the field unset.

use serde_json::Value;

use crate::types::*;

/// Body of `GET /devices/{ac}/status`. Never fails; absent fields stay `None`.
pub fn parse_ac_status(body: &Value) -> AcStatus {
    AcStatus {
        power: body
            .get("power")
            .and_then(|v| v.as_str())
            .map(Power::from_api_str)
            .unwrap_or_default(),
        temperature: body.get("temperature").and_then(integer),
        mode: body
            .get("mode")
            .and_then(|v| v.as_str())
            .and_then(AcMode::from_api_str),
        fan_speed: body
            .get("fanSpeed")
            .and_then(|v| v.as_str())
            .and_then(FanSpeed::from_api_str),
    }
}

/// Body of `GET /devices/{hub}/status`.
pub fn parse_room_reading(body: &Value) -> RoomReading {
    RoomReading {
        temperature: body.get("temperature").and_then(number),
        humidity: body.get("humidity").and_then(number),
    }
}

pub fn parse_ac_status_text(text: &str) -> AcStatus {
    let mut status = AcStatus::default();
    for (label, value) in labelled_lines(text) {
        match label {
            "Power" => status.power = Power::from_api_str(value),
            "Temperature" => {
                status.temperature = strip_unit(value, "°C").parse::<f64>().ok().map(round)
            }
            "Mode" => status.mode = AcMode::from_api_str(value),
            "Fan Speed" => status.fan_speed = FanSpeed::from_api_str(value),
            _ => {}
        }
    }
    status
}

pub fn parse_room_reading_text(text: &str) -> RoomReading {
    let mut reading = RoomReading::default();
    for (label, value) in labelled_lines(text) {
        match label {
            "Temperature" => reading.temperature = strip_unit(value, "°C").parse().ok(),
            "Humidity" => reading.humidity = strip_unit(value, "%").parse().ok(),
            _ => {}
        }
    }
    reading
}

fn labelled_lines(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.lines().filter_map(|line| {
        let (label, value) = line.split_once(':')?;
        Some((label.trim(), value.trim()))
    })
}

fn strip_unit<'a>(value: &'a str, unit: &str) -> &'a str {
    value.trim_end_matches(unit).trim()
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .or_else(|| n.as_f64().map(round)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(round),
        _ => None,
    }
}

fn round(f: f64) -> i32 {
    f.round() as i32
}
