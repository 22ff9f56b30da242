use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use switchbot_ac::automation::schedule::Window;
use switchbot_ac::automation::{
    Automation, DecisionLog, OpenRouterStrategy, RunOptions, RunOutcome, WeatherClient,
};
use switchbot_ac::{AcController, Config};
use tracing_subscriber::EnvFilter;

/// One pass of the night AC automation. Meant to be run hourly from cron.
#[derive(Debug, Parser)]
#[command(name = "ac-scheduler", version)]
struct Args {
    /// TOML config file (defaults to ./config.toml when present).
    #[arg(short, long, env = "SWITCHBOT_AC_CONFIG")]
    config: Option<PathBuf>,

    /// Decide without sending commands or recording the run.
    #[arg(long)]
    dry_run: bool,

    /// Run even outside the scheduled hours.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("switchbot_ac=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let client = config.switchbot.client_builder().build()?;
    let controller = AcController::new(
        client,
        config.switchbot.device_id.clone(),
        config.automation_defaults(),
    );
    let automation = Automation::new(
        controller,
        WeatherClient::new(config.weather.base_url.clone())?,
        OpenRouterStrategy::new(&config.ai, &config.rules)?,
        DecisionLog::new(&config.history.path),
        Window::from(config.schedule),
        config.location.clone(),
    )
    .history_limit(config.history.limit);

    let options = RunOptions {
        dry_run: args.dry_run,
        force: args.force,
    };
    match automation.run_once(Utc::now(), options).await? {
        RunOutcome::OutsideSchedule { hour } => {
            println!("Outside scheduled hours ({hour}:00). Use --force to run anyway.");
        }
        RunOutcome::Completed(report) => {
            println!("Action: {}", report.decision.action);
            println!("Reasoning: {}", report.decision.reasoning);
            if let Some(cmd) = &report.command {
                println!("Sent: {} {}", cmd.command, cmd.parameter);
            }
            println!(
                "Result: {}",
                if report.executed { "Success" } else { report.reason.as_str() }
            );
        }
    }
    Ok(())
}
