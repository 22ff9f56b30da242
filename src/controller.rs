use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::SwitchBotClient;
use crate::command::{self, build_command, validate_temperature};
use crate::protocol::{Command, DeviceList};
use crate::status::{parse_ac_status, parse_room_reading};
use crate::types::*;
use crate::{Error, Result};

/// Outcome of the remote-to-hub association lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomLookup {
    Found { hub_id: String, reading: RoomReading },
    HubNotFound,
}

/// One air conditioner, addressed through its infrared remote profile.
pub struct AcController {
    client: SwitchBotClient,
    device_id: String,
    defaults: Defaults,
    // Held across status read + command send so a concurrent command never
    // rebuilds the tuple from a stale status.
    command_lock: Mutex<()>,
}

impl AcController {
    pub fn new(client: SwitchBotClient, device_id: impl Into<String>, defaults: Defaults) -> Self {
        Self {
            client,
            device_id: device_id.into(),
            defaults,
            command_lock: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &SwitchBotClient {
        &self.client
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub async fn status(&self) -> Result<AcStatus> {
        self.ensure_device()?;
        let body = self.client.get_status(&self.device_id).await?.into_body()?;
        Ok(parse_ac_status(&body))
    }

    pub async fn devices(&self) -> Result<DeviceList> {
        self.client.devices().await
    }

    /// Room temperature and humidity from the hub the AC remote is paired with.
    pub async fn room_reading(&self) -> Result<RoomLookup> {
        let devices = self.client.devices().await?;
        let Some(hub_id) = devices.hub_for(&self.device_id).map(str::to_string) else {
            debug!(device_id = %self.device_id, "no infrared remote with a hub for device");
            return Ok(RoomLookup::HubNotFound);
        };
        let body = self.client.get_status(&hub_id).await?.into_body()?;
        Ok(RoomLookup::Found {
            reading: parse_room_reading(&body),
            hub_id,
        })
    }

    pub async fn turn_on(&self, temperature: i32, mode: AcMode, fan_speed: FanSpeed) -> Result<()> {
        let cmd = command::turn_on(temperature, mode, fan_speed)?;
        let _guard = self.command_lock.lock().await;
        self.execute(&cmd).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        let _guard = self.command_lock.lock().await;
        self.execute(&command::turn_off()).await
    }

    pub async fn set_all(
        &self,
        power: Power,
        temperature: i32,
        mode: AcMode,
        fan_speed: FanSpeed,
    ) -> Result<()> {
        let cmd = command::set_all(power, temperature, mode, fan_speed)?;
        let _guard = self.command_lock.lock().await;
        self.execute(&cmd).await
    }

    /// Change only the temperature; mode and fan come from a fresh status read.
    pub async fn set_temperature(&self, temperature: i32) -> Result<()> {
        validate_temperature(temperature)?;
        self.modify(Intent::new(Action::AdjustTemp).temperature(temperature))
            .await
    }

    pub async fn set_mode(&self, mode: AcMode) -> Result<()> {
        self.modify(Intent::new(Action::ChangeMode).mode(mode)).await
    }

    pub async fn set_fan_speed(&self, fan_speed: FanSpeed) -> Result<()> {
        self.modify(Intent::new(Action::SetAll).fan_speed(fan_speed))
            .await
    }

    pub async fn custom(&self, name: &str, parameter: &str) -> Result<()> {
        let _guard = self.command_lock.lock().await;
        self.execute(&command::custom_command(name, parameter)).await
    }

    /// Carry out an intent. Returns the command sent, `None` for `Action::None`.
    ///
    /// `adjust_temp`/`change_mode` re-read the status first; other actions fill
    /// gaps from the configured defaults.
    pub async fn apply(&self, intent: &Intent) -> Result<Option<Command>> {
        if !matches!(intent.action, Action::None | Action::TurnOff)
            && let Some(t) = intent.temperature
        {
            validate_temperature(t)?;
        }

        match intent.action {
            Action::None => Ok(None),
            action if action.modifies_in_place() => {
                let _guard = self.command_lock.lock().await;
                let current = self.status().await?;
                self.build_and_execute(intent, Some(&current)).await
            }
            _ => {
                let _guard = self.command_lock.lock().await;
                self.build_and_execute(intent, None).await
            }
        }
    }

    async fn modify(&self, intent: Intent) -> Result<()> {
        let _guard = self.command_lock.lock().await;
        let current = self.status().await?;
        self.build_and_execute(&intent, Some(&current)).await?;
        Ok(())
    }

    async fn build_and_execute(
        &self,
        intent: &Intent,
        current: Option<&AcStatus>,
    ) -> Result<Option<Command>> {
        let Some(cmd) = build_command(intent, current, &self.defaults)? else {
            return Ok(None);
        };
        self.execute(&cmd).await?;
        Ok(Some(cmd))
    }

    async fn execute(&self, cmd: &Command) -> Result<()> {
        self.ensure_device()?;
        self.client
            .send_command(&self.device_id, cmd)
            .await?
            .into_body()?;
        info!(
            device_id = %self.device_id,
            command = %cmd.command,
            parameter = %cmd.parameter,
            "AC command accepted"
        );
        Ok(())
    }

    fn ensure_device(&self) -> Result<()> {
        if self.device_id.is_empty() {
            return Err(Error::Config("AC device id is not set".to_string()));
        }
        Ok(())
    }
}
