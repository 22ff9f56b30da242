use std::env;

use switchbot_ac::{AcController, Credentials, Defaults, RoomLookup, SwitchBotClient};

#[tokio::main]
async fn main() -> switchbot_ac::Result<()> {
    tracing_subscriber::fmt::init();

    let token = env::var("SWITCHBOT_TOKEN").unwrap_or_default();
    let secret = env::var("SWITCHBOT_SECRET").unwrap_or_default();
    let device_id = env::args()
        .nth(1)
        .or_else(|| env::var("SWITCHBOT_AC_DEVICE_ID").ok())
        .unwrap_or_default();

    let client = SwitchBotClient::builder(Credentials::new(token, secret)).build()?;
    let ac = AcController::new(client, device_id, Defaults::default());

    let devices = ac.devices().await?;
    for remote in &devices.infrared_remote_list {
        println!(
            "{} [{}] id={} hub={}",
            remote.device_name, remote.remote_type, remote.device_id, remote.hub_device_id
        );
    }

    let status = ac.status().await?;
    println!(
        "AC: {} | {:?}\u{00b0}C | mode: {:?} | fan: {:?}",
        status.power, status.temperature, status.mode, status.fan_speed
    );

    match ac.room_reading().await? {
        RoomLookup::Found { hub_id, reading } => println!(
            "Room ({hub_id}): {:?}\u{00b0}C / {:?}%",
            reading.temperature, reading.humidity
        ),
        RoomLookup::HubNotFound => println!("Room: hub not found"),
    }
    Ok(())
}
