use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod api;
mod catalog;
mod config;
mod coords;
mod error;
mod remote;
mod service;

use catalog::Catalog;
use config::{Cli, CommandArgs, Mode, RunArgs, ServeArgs};
use remote::MountApi;
use service::{Command, ControlSession, MessageKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with colors and stderr output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oat_control=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let Some(mode) = cli.mode.clone() else {
        eprintln!("Error: Please specify a mode (serve, status, catalog or run)");
        eprintln!("Use --help for usage information");
        std::process::exit(1);
    };

    let catalog = Catalog::load_or_fallback(cli.catalog.as_deref()).await;

    if let Mode::Catalog(args) = &mode {
        let term = args.query.clone().unwrap_or_default();
        for entry in catalog.search(&term) {
            let target = entry.target();
            println!(
                "{:<28} {:<20} {}  {}",
                entry.display_name(),
                entry.object_type,
                target.ra,
                target.dec
            );
        }
        return Ok(());
    }

    let api = MountApi::http(&cli.api_url, cli.request_timeout())?;
    tracing::info!("Using device-control service at {}", api.endpoint());

    match mode {
        Mode::Serve(args) => serve(&cli, args, api, catalog).await?,
        Mode::Status => {
            let session = ControlSession::idle(api, catalog, cli.to_session_config());
            session.sync_status().await;
            let board = session.status_snapshot().await;
            println!("{}", serde_json::to_string_pretty(&board)?);
        }
        Mode::Run(args) => run_command(&cli, args, api, catalog).await?,
        Mode::Catalog(_) => {}
    }

    Ok(())
}

/// Run the panel API until Ctrl+C
async fn serve(
    cli: &Cli,
    args: ServeArgs,
    api: MountApi,
    catalog: Catalog,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting control panel on {}:{} ({} catalog objects)",
        args.host,
        args.listen,
        catalog.len()
    );

    let session = Arc::new(ControlSession::start(api, catalog, cli.to_session_config()));

    let router = api::create_router(session.clone());
    let addr: SocketAddr = format!("{}:{}", args.host, args.listen).parse()?;

    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");
    session.shutdown().await;

    Ok(())
}

/// Sync status, send one command and print every log entry it produced
async fn run_command(
    cli: &Cli,
    args: RunArgs,
    api: MountApi,
    catalog: Catalog,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = ControlSession::idle(api, catalog, cli.to_session_config());

    // Toggles derive their target state from the last known status
    session.sync_status().await;

    let command = match (&args.command, args.command.to_command()?) {
        (_, Some(command)) => command,
        (CommandArgs::Select { id }, None) => {
            Command::SetTarget(session.select_catalog_entry(id)?)
        }
        (other, None) => {
            return Err(format!("{:?} does not map to a mount command", other).into());
        }
    };

    let result = session.execute(command).await;

    for entry in session.log().snapshot() {
        let marker = match entry.kind {
            MessageKind::Info => " ",
            MessageKind::Success => "+",
            MessageKind::Error => "!",
        };
        println!(
            "{} [{}] {}",
            entry.timestamp.format("%H:%M:%S"),
            marker,
            entry.text
        );
    }

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome.reply)?);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Wait for shutdown signal (Ctrl+C)
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
