//! Configuration: an optional TOML file, then environment overrides.
//!
//! Loaded once at startup and passed by value into constructors.

use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{SwitchBotClient, SwitchBotClientBuilder};
use crate::protocol::API_BASE;
use crate::sign::Credentials;
use crate::types::{AcMode, Defaults};
use crate::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub switchbot: SwitchBotConfig,
    pub server: ServerConfig,
    pub defaults: Defaults,
    pub location: LocationConfig,
    pub schedule: ScheduleConfig,
    pub rules: RulesConfig,
    pub ai: AiConfig,
    pub history: HistoryConfig,
    pub weather: WeatherConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SwitchBotConfig {
    pub token: String,
    pub secret: String,
    pub device_id: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// NDJSON wire log of every cloud request.
    pub message_log: Option<String>,
}

impl Default for SwitchBotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            secret: String::new(),
            device_id: String::new(),
            base_url: API_BASE.to_string(),
            timeout_secs: 30,
            message_log: None,
        }
    }
}

impl std::fmt::Debug for SwitchBotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchBotConfig")
            .field("token_set", &!self.token.is_empty())
            .field("secret_set", &!self.secret.is_empty())
            .field("device_id", &self.device_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SwitchBotConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone(), self.secret.clone())
    }

    pub fn client_builder(&self) -> SwitchBotClientBuilder {
        let mut builder = SwitchBotClient::builder(self.credentials())
            .base_url(self.base_url.clone())
            .timeout(Duration::from_secs(self.timeout_secs));
        if let Some(path) = &self.message_log {
            builder = builder.message_log(path);
        }
        builder
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub lat: f64,
    pub lon: f64,
    /// IANA zone name the schedule window is evaluated in, e.g. `Asia/Jerusalem`.
    pub timezone: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lon: 0.0,
            timezone: "UTC".to_string(),
        }
    }
}

impl LocationConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| Error::Config(format!("unknown timezone '{}'", self.timezone)))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start_hour: 22,
            end_hour: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub acceptable_max: f64,
    pub preferred_mode: AcMode,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            optimal_min: 16.0,
            optimal_max: 20.0,
            acceptable_max: 24.0,
            preferred_mode: AcMode::Cool,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    pub notes: String,
    pub api_key: String,
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "google/gemini-2.0-flash-001".to_string(),
            notes: String::new(),
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
        }
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("model", &self.model)
            .field("api_key_set", &!self.api_key.is_empty())
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: String,
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: "ac_automation_log.ndjson".to_string(),
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::Parse(format!("invalid config: {e}")))?;
        config.location.tz()?;
        Ok(config)
    }

    /// `[defaults]` with the mode replaced by `rules.preferred_mode`.
    pub fn automation_defaults(&self) -> Defaults {
        Defaults {
            mode: self.rules.preferred_mode,
            ..self.defaults
        }
    }

    /// Read `path` (or `config.toml` if present), then apply process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_toml_str(&std::fs::read_to_string(p)?)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_toml_str(&std::fs::read_to_string(DEFAULT_CONFIG_PATH)?)?
            }
            None => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.warn_missing();
        Ok(config)
    }

    /// Environment overrides; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(v) = get("SWITCHBOT_TOKEN") {
            self.switchbot.token = v;
        }
        if let Some(v) = get("SWITCHBOT_SECRET") {
            self.switchbot.secret = v;
        }
        if let Some(v) = get("SWITCHBOT_AC_DEVICE_ID") {
            self.switchbot.device_id = v;
        }
        if let Some(v) = get("MCP_API_KEY") {
            self.server.api_key = Some(v);
        }
        if let Some(v) = get("OPENROUTER_API_KEY") {
            self.ai.api_key = v;
        }
        if let Some(v) = get("OPENROUTER_MODEL") {
            self.ai.model = v;
        }
    }

    fn warn_missing(&self) {
        if self.switchbot.token.is_empty() {
            warn!("SWITCHBOT_TOKEN is empty");
        }
        if self.switchbot.secret.is_empty() {
            warn!("SWITCHBOT_SECRET is empty");
        }
        if self.switchbot.device_id.is_empty() {
            warn!("SWITCHBOT_AC_DEVICE_ID is empty");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FanSpeed;
    use std::collections::HashMap;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.switchbot.base_url, API_BASE);
        assert_eq!(config.switchbot.timeout_secs, 30);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.schedule.start_hour, 22);
        assert_eq!(config.schedule.end_hour, 7);
        assert_eq!(config.defaults, Defaults::default());
        assert_eq!(config.rules.preferred_mode, AcMode::Cool);
        assert_eq!(config.history.limit, 10);
    }

    #[test]
    fn parses_sections() {
        let config = Config::from_toml_str(
            r#"
            [switchbot]
            device_id = "02-ABC"

            [defaults]
            mode = "heat"
            temperature = 21

            [location]
            lat = 35.68
            lon = 139.76
            timezone = "Asia/Tokyo"

            [rules]
            optimal_max = 21.5
            preferred_mode = "dry"
            "#,
        )
        .unwrap();
        assert_eq!(config.switchbot.device_id, "02-ABC");
        assert_eq!(config.defaults.mode, AcMode::Heat);
        assert_eq!(config.defaults.temperature, 21);
        assert_eq!(config.defaults.fan_speed, FanSpeed::Auto);
        assert_eq!(config.location.tz().unwrap(), chrono_tz::Asia::Tokyo);
        assert_eq!(config.rules.optimal_max, 21.5);
        assert_eq!(config.rules.optimal_min, 16.0);
        assert_eq!(config.rules.preferred_mode, AcMode::Dry);
    }

    #[test]
    fn unknown_timezone_is_config_error() {
        let err = Config::from_toml_str("[location]\ntimezone = \"Mars/Olympus\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(
            Config::default().location.tz().unwrap(),
            chrono_tz::UTC
        );
    }

    #[test]
    fn automation_defaults_follow_preferred_mode() {
        let config = Config::from_toml_str(
            "[defaults]\nmode = \"cool\"\ntemperature = 22\n\n[rules]\npreferred_mode = \"heat\"",
        )
        .unwrap();
        let defaults = config.automation_defaults();
        assert_eq!(defaults.mode, AcMode::Heat);
        assert_eq!(defaults.temperature, 22);
        assert_eq!(config.defaults.mode, AcMode::Cool);
    }

    #[test]
    fn rejects_bad_enum() {
        let err = Config::from_toml_str("[defaults]\nmode = \"arctic\"").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::from_toml_str("[switchbot]\ntoken = \"file\"\nsecret = \"s\"").unwrap();
        let env: HashMap<&str, &str> = [
            ("SWITCHBOT_TOKEN", "env-token"),
            ("SWITCHBOT_SECRET", ""),
            ("MCP_API_KEY", "k"),
            ("OPENROUTER_MODEL", "m"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.switchbot.token, "env-token");
        assert_eq!(config.switchbot.secret, "s");
        assert_eq!(config.server.api_key.as_deref(), Some("k"));
        assert_eq!(config.ai.model, "m");
    }

    #[test]
    fn debug_hides_secrets() {
        let mut config = Config::default();
        config.switchbot.secret = "hunter2".to_string();
        config.ai.api_key = "sk-123".to_string();
        let out = format!("{config:?}");
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("sk-123"));
    }
}
