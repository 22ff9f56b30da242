use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub description: String,
}

/// WMO weather interpretation codes as reported by Open-Meteo.
pub fn describe_weather_code(code: i64) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 | 48 => "foggy",
        51 => "light drizzle",
        53 => "drizzle",
        55 => "heavy drizzle",
        61 => "light rain",
        63 => "rain",
        65 => "heavy rain",
        80 => "rain showers",
        95 => "thunderstorm",
        96 => "thunderstorm with hail",
        _ => "unknown",
    }
}

/// Current conditions from Open-Meteo (no API key).
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn current(&self, lat: f64, lon: f64) -> Result<Weather> {
        let url = format!("{}/forecast", self.base_url);
        debug!(url = %url, lat, lon, "fetching weather");
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code"
                        .to_string(),
                ),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(Error::Status {
                status,
                path: "/forecast".to_string(),
            });
        }
        let data: Value = resp.json().await?;
        Ok(parse_current(&data))
    }
}

fn parse_current(data: &Value) -> Weather {
    let current = data.get("current").unwrap_or(&Value::Null);
    let code = current
        .get("weather_code")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    Weather {
        temperature: current.get("temperature_2m").and_then(|v| v.as_f64()),
        feels_like: current.get("apparent_temperature").and_then(|v| v.as_f64()),
        humidity: current.get("relative_humidity_2m").and_then(|v| v.as_f64()),
        description: describe_weather_code(code).to_string(),
    }
}
