use chrono::{DateTime, Timelike, Utc};
use tracing::{info, warn};

use crate::Result;
use crate::automation::decision::{Decision, DecisionContext, DecisionStrategy};
use crate::automation::history::{DecisionLog, DecisionRecord};
use crate::automation::schedule::{Window, local_time};
use crate::automation::weather::{Weather, WeatherClient};
use crate::config::LocationConfig;
use crate::controller::{AcController, RoomLookup};
use crate::protocol::Command;
use crate::types::{AcStatus, Action, RoomReading};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Decide but send nothing and record nothing.
    pub dry_run: bool,
    /// Run outside the schedule window.
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub room: Option<RoomReading>,
    pub ac: Option<AcStatus>,
    pub weather: Option<Weather>,
    pub decision: Decision,
    pub command: Option<Command>,
    pub executed: bool,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    OutsideSchedule { hour: u32 },
    Completed(RunReport),
}

pub struct Automation<S> {
    controller: AcController,
    weather: WeatherClient,
    strategy: S,
    log: DecisionLog,
    window: Window,
    location: LocationConfig,
    history_limit: usize,
}

impl<S: DecisionStrategy> Automation<S> {
    pub fn new(
        controller: AcController,
        weather: WeatherClient,
        strategy: S,
        log: DecisionLog,
        window: Window,
        location: LocationConfig,
    ) -> Self {
        Self {
            controller,
            weather,
            strategy,
            log,
            window,
            location,
            history_limit: 10,
        }
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// One pass. Data-gathering failures degrade to absent readings and a failed
    /// log write is only a warning.
    pub async fn run_once(&self, now: DateTime<Utc>, options: RunOptions) -> Result<RunOutcome> {
        let local = local_time(now, self.location.tz()?);
        let hour = local.hour();
        if !options.force && !self.window.contains(hour) {
            info!(hour, "outside scheduled hours");
            return Ok(RunOutcome::OutsideSchedule { hour });
        }

        let room = match self.controller.room_reading().await {
            Ok(RoomLookup::Found { reading, hub_id }) => {
                info!(hub_id = %hub_id, temperature = ?reading.temperature, humidity = ?reading.humidity, "room conditions");
                Some(reading)
            }
            Ok(RoomLookup::HubNotFound) => {
                warn!("hub not found for AC remote, no room reading");
                None
            }
            Err(e) => {
                warn!("room reading failed: {e}");
                None
            }
        };

        let ac = match self.controller.status().await {
            Ok(status) => {
                info!(power = %status.power, temperature = ?status.temperature, "AC status");
                Some(status)
            }
            Err(e) => {
                warn!("AC status failed: {e}");
                None
            }
        };

        let weather = match self
            .weather
            .current(self.location.lat, self.location.lon)
            .await
        {
            Ok(w) => {
                info!(temperature = ?w.temperature, description = %w.description, "weather");
                Some(w)
            }
            Err(e) => {
                warn!("weather lookup failed: {e}");
                None
            }
        };

        let history = self.log.recent(self.history_limit).unwrap_or_else(|e| {
            warn!("could not read decision history: {e}");
            Vec::new()
        });

        let context = DecisionContext {
            room,
            ac: ac.clone(),
            weather: weather.clone(),
            current_time: local.format("%H:%M").to_string(),
            history,
        };

        let decision = if self.window.is_final_hour(hour) {
            info!("final run before wake up, turning off");
            Decision::turn_off("Final run before wake up")
        } else {
            self.strategy.decide(&context).await.unwrap_or_else(|e| {
                warn!("decision failed: {e}");
                Decision::none(format!("decision failed: {e}"))
            })
        };
        info!(action = %decision.action, reasoning = %decision.reasoning, "decision");

        let (command, executed, reason) = if decision.action == Action::None {
            (None, false, "No action".to_string())
        } else if options.dry_run {
            info!(action = %decision.action, "dry run, not executing");
            (None, false, "Dry run".to_string())
        } else {
            match self.controller.apply(&decision.intent()).await {
                Ok(cmd) => (cmd, true, "Success".to_string()),
                Err(e) => {
                    warn!("executing {} failed: {e}", decision.action);
                    (None, false, e.to_string())
                }
            }
        };

        if !options.dry_run {
            let record = DecisionRecord {
                created_at: now,
                room_temperature: room.and_then(|r| r.temperature),
                room_humidity: room.and_then(|r| r.humidity),
                outside_temperature: weather.as_ref().and_then(|w| w.temperature),
                ac_power: ac.as_ref().map(|s| s.power),
                ac_temperature: ac.as_ref().and_then(|s| s.temperature),
                ac_mode: ac.as_ref().and_then(|s| s.mode),
                action: decision.action,
                reasoning: decision.reasoning.clone(),
                executed,
            };
            if let Err(e) = self.log.append(&record) {
                warn!(path = %self.log.path().display(), "failed to record decision: {e}");
            }
        }

        Ok(RunOutcome::Completed(RunReport {
            room,
            ac,
            weather,
            decision,
            command,
            executed,
            reason,
        }))
    }
}
