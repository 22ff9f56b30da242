pub mod automation;
mod client;
pub mod command;
pub mod config;
mod controller;
mod error;
mod logger;
pub mod mcp;
pub mod protocol;
pub mod sign;
pub mod status;
pub mod tools;
mod types;

pub use client::{DEFAULT_TIMEOUT, SwitchBotClient, SwitchBotClientBuilder};
pub use config::Config;
pub use controller::{AcController, RoomLookup};
pub use error::{Error, Result};
pub use protocol::{Command, DeviceList, Envelope};
pub use sign::{AuthHeaders, Credentials};
pub use tools::AcTools;
pub use types::*;
