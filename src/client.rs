use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, trace};

use crate::logger::MessageLogger;
use crate::protocol::{
    API_BASE, Command, DeviceList, Envelope, commands_path, devices_path, status_path,
};
use crate::sign::Credentials;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SwitchBotClientBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
    log_path: Option<PathBuf>,
}

impl SwitchBotClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn message_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<SwitchBotClient> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        let logger = match self.log_path {
            Some(path) => Some(Mutex::new(MessageLogger::new(path)?)),
            None => None,
        };

        Ok(SwitchBotClient {
            http,
            base_url: self.base_url,
            credentials: self.credentials,
            logger,
        })
    }
}

/// Signed client for the SwitchBot cloud API.
///
/// Holds no mutable state apart from the optional wire log, so a shared reference
/// can serve concurrent callers.
pub struct SwitchBotClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    logger: Option<Mutex<MessageLogger>>,
}

impl SwitchBotClient {
    pub fn builder(credentials: Credentials) -> SwitchBotClientBuilder {
        SwitchBotClientBuilder::new(credentials)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// `GET /devices`: physical devices and infrared remotes.
    pub async fn list_devices(&self) -> Result<Envelope> {
        self.request(Method::GET, &devices_path(), None).await
    }

    /// `GET /devices/{id}/status`.
    pub async fn get_status(&self, device_id: &str) -> Result<Envelope> {
        self.request(Method::GET, &status_path(device_id), None)
            .await
    }

    /// `POST /devices/{id}/commands`.
    pub async fn send_command(&self, device_id: &str, command: &Command) -> Result<Envelope> {
        let body = command.to_body();
        debug!(
            device_id = %device_id,
            command = %command.command,
            parameter = %command.parameter,
            "sending command"
        );
        self.request(Method::POST, &commands_path(device_id), Some(&body))
            .await
    }

    /// Typed device list; fails with `Error::Api` on a non-100 envelope.
    pub async fn devices(&self) -> Result<DeviceList> {
        let body = self.list_devices().await?.into_body()?;
        DeviceList::from_body(body)
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Envelope> {
        let headers = self.credentials.headers()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "switchbot request");
        self.with_logger(|logger| logger.log_request(method.as_str(), path, body));

        let mut req = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in headers.pairs() {
            req = req.header(name, value);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            debug!(status, path = %path, "non-success HTTP status");
            self.with_logger(|logger| logger.log_response(path, status, None));
            return Err(Error::Status {
                status,
                path: path.to_string(),
            });
        }

        let text = resp.text().await?;
        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|e| Error::Parse(format!("invalid envelope from {path}: {e}")))?;
        trace!(
            status_code = envelope.status_code,
            message = %envelope.message,
            "switchbot response"
        );
        self.with_logger(|logger| logger.log_response(path, status, Some(&envelope)));
        Ok(envelope)
    }

    fn with_logger(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(logger) = &self.logger
            && let Ok(mut guard) = logger.lock()
        {
            f(&mut guard);
        }
    }
}
