use std::fmt::Write as _;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::automation::decision::{Decision, DecisionContext, DecisionStrategy, parse_decision};
use crate::config::{AiConfig, RulesConfig};
use crate::{Error, Result};

/// Asks a chat-completions model (OpenRouter API) for a decision.
pub struct OpenRouterStrategy {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    notes: String,
    rules: RulesConfig,
}

impl OpenRouterStrategy {
    pub fn new(ai: &AiConfig, rules: &RulesConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: ai.base_url.trim_end_matches('/').to_string(),
            api_key: ai.api_key.clone(),
            model: ai.model.clone(),
            notes: ai.notes.clone(),
            rules: rules.clone(),
        })
    }

    async fn complete(&self, prompt: String) -> Result<Decision> {
        if self.api_key.is_empty() {
            return Err(Error::Config("OPENROUTER_API_KEY not set".to_string()));
        }
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "requesting decision");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": 0.3,
                "max_tokens": 200,
            }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(Error::Status {
                status,
                path: "/chat/completions".to_string(),
            });
        }
        let data: Value = resp.json().await?;
        let content = data
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Parse("completion has no message content".to_string()))?;
        parse_decision(content)
    }
}

impl DecisionStrategy for OpenRouterStrategy {
    async fn decide(&self, context: &DecisionContext) -> Result<Decision> {
        let prompt = build_prompt(context, &self.rules, &self.notes);
        self.complete(prompt).await
    }
}

fn or_unknown<T: ToString>(v: Option<T>) -> String {
    v.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

pub fn build_prompt(ctx: &DecisionContext, rules: &RulesConfig, notes: &str) -> String {
    let room = ctx.room.unwrap_or_default();
    let weather = ctx.weather.clone().unwrap_or_default();
    let (min, max, acceptable) = (rules.optimal_min, rules.optimal_max, rules.acceptable_max);

    let mut p = String::new();
    let _ = writeln!(
        p,
        "You are an AI controlling a home AC at night. User sleeps WITH A BLANKET.\n"
    );
    let _ = writeln!(p, "CURRENT CONDITIONS:");
    let _ = writeln!(
        p,
        "- Room: {}°C, {}% humidity",
        or_unknown(room.temperature),
        or_unknown(room.humidity)
    );
    let _ = writeln!(
        p,
        "- Outside: {}°C (feels like {}°C)",
        or_unknown(weather.temperature),
        or_unknown(weather.feels_like)
    );
    let description = if weather.description.is_empty() {
        "unknown"
    } else {
        weather.description.as_str()
    };
    let _ = writeln!(p, "- Weather: {description}");
    let _ = writeln!(p, "- Time: {}\n", ctx.current_time);

    let _ = writeln!(p, "AC STATUS:");
    match &ctx.ac {
        Some(ac) => {
            let _ = writeln!(p, "- Power: {}", ac.power);
            let _ = writeln!(p, "- Temperature: {}°C", or_unknown(ac.temperature));
            let _ = writeln!(p, "- Mode: {}\n", or_unknown(ac.mode));
        }
        None => {
            let _ = writeln!(p, "- unknown\n");
        }
    }

    let _ = writeln!(p, "SLEEP SCIENCE (user sleeps with blanket):");
    let _ = writeln!(p, "- OPTIMAL: {min}-{max}°C (cool room + blanket = best sleep)");
    let _ = writeln!(p, "- ACCEPTABLE: {max}-{acceptable}°C (comfortable, no AC needed)");
    let _ = writeln!(p, "- TOO HOT: >{acceptable}°C (need cooling)");
    let _ = writeln!(p, "- TOO COLD: <{min}°C (need heating)\n");

    let _ = writeln!(p, "DECISION LOGIC:");
    let _ = writeln!(p, "1. Room {min}-{acceptable}°C → \"none\" or \"turn_off\" (comfortable range)");
    let _ = writeln!(p, "2. Room >{acceptable}°C → COOL mode (too hot)");
    let _ = writeln!(p, "3. Room <{min}°C → HEAT mode (too cold)");
    let _ = writeln!(p, "4. If AC is ON but room is comfortable → \"turn_off\" (save energy)");
    let _ = writeln!(p, "5. If outside is cold and room is fine → \"turn_off\" (natural cooling works)");
    let _ = writeln!(p, "Preferred mode when running: {}\n", rules.preferred_mode);

    if !notes.is_empty() {
        let _ = writeln!(p, "{notes}\n");
    }

    let history: Vec<_> = ctx.history.iter().take(2).collect();
    let history = serde_json::to_string_pretty(&history).unwrap_or_else(|_| "[]".to_string());
    let _ = writeln!(p, "HISTORY: {history}\n");

    p.push_str(
        "Respond with ONLY JSON:\n{\"action\": \"none\"|\"turn_on\"|\"turn_off\"|\"adjust_temp\"|\"change_mode\", \
         \"temperature\": <number or null>, \"mode\": \"cool\"|\"heat\"|\"auto\"|\"fan\"|\"dry\"|null, \
         \"fan_speed\": \"auto\"|\"low\"|\"medium\"|\"high\"|null, \"reasoning\": \"<brief>\"}",
    );
    p
}
