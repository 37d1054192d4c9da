use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{CallLifecycleController, HttpCallRegistry, OperatorRole, Screen};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod console;
mod session;

use commands::{Command, HELP};
use config::load_settings;
use console::{spawn_event_printer, ConsoleNotifier};
use session::{AgentSession, Flow};

#[derive(Parser, Debug)]
#[command(about = "Agent call console with simulated inbound calls")]
struct Args {
    #[arg(long)]
    registry_url: Option<String>,
    #[arg(long)]
    operator_id: Option<i64>,
    #[arg(long)]
    role: Option<OperatorRole>,
    /// Screen the operator starts on.
    #[arg(long, default_value = "calls")]
    screen: Screen,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.registry_url {
        settings.registry_url = url;
    }
    if let Some(operator_id) = args.operator_id {
        settings.operator_id = operator_id;
    }
    if let Some(role) = args.role {
        settings.role = role;
    }

    let registry = HttpCallRegistry::new(&settings.registry_url)?;
    let controller = CallLifecycleController::new(
        settings.simulator_config(false),
        Arc::new(registry),
        Arc::new(ConsoleNotifier),
    )
    .context("invalid simulator settings")?;
    let printer = spawn_event_printer(&controller);

    let mut session = AgentSession::open(Arc::clone(&controller), settings.role, args.screen).await;
    info!(
        registry = %settings.registry_url,
        operator_id = settings.operator_id,
        role = ?settings.role,
        screen = ?session.screen(),
        "agent console ready"
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                warn!(%err, "rejected console input");
                println!("{err}");
                continue;
            }
        };
        if session.handle(command).await == Flow::Quit {
            break;
        }
    }

    session.navigate(Screen::Dashboard).await;
    printer.abort();
    Ok(())
}
