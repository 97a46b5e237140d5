use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings_from, DEFAULT_SETTINGS_FILE},
    ActionReport, ControllerOptions, HttpRelationshipApi, RelationshipController,
};
use shared::domain::Username;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(about = "Show or change the friend relationship with another user")]
struct Args {
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    session_cookie: Option<String>,
    /// Refuse a second action while one is still pending.
    #[arg(long)]
    serialize_actions: bool,
    target: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Print the current relationship and the staged action.
    Show,
    /// Run the staged action (invite, accept, withdraw or unfriend).
    Act,
    /// Reject an invitation addressed to you.
    Reject,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config, |key| std::env::var(key).ok())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(cookie) = args.session_cookie {
        settings.session_cookie = Some(cookie);
    }
    if args.serialize_actions {
        settings.serialize_actions = true;
    }

    let target = Username::parse(&args.target)?;
    let api = HttpRelationshipApi::from_settings(&settings)
        .with_context(|| format!("failed to build client for '{}'", settings.server_url))?;
    let controller = RelationshipController::with_options(
        Arc::new(api),
        target,
        ControllerOptions::from(&settings),
    );

    let printer = tokio::spawn(render::print_events(controller.subscribe_events()));
    let outcome = run(&controller, args.command).await;
    let view = controller.view().await;
    drop(controller);
    let _ = printer.await;

    println!("{}", render::format_view(&view));
    let report = outcome?;
    if let Some(report) = report {
        println!("{}", render::format_report(&report));
    }
    Ok(())
}

async fn run(
    controller: &RelationshipController,
    command: Command,
) -> Result<Option<ActionReport>> {
    controller.init().await?;
    let report = match command {
        Command::Show => None,
        Command::Act => Some(controller.perform_action().await?),
        Command::Reject => Some(controller.reject_invitation().await?),
    };
    Ok(report)
}
