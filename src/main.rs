use std::sync::Arc;

use clap::Parser;
use dashfeed::{
    analytics::ReportingClient,
    auth::Authenticator,
    config::FeederConfig,
    dashboard::build_sink,
    jobs::{AnalyticsSync, RunOutcome, start_analytics_sync_worker},
    observability,
};
use tokio_util::sync::CancellationToken;

/// CLI arguments for dashfeed
#[derive(Parser, Debug)]
#[command(version, about = "Google Analytics dashboard feeder", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (built-in defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run the sync on its schedule until interrupted (default)
    Run,
    /// Execute a single sync now and exit
    Once,
    /// Print the event names a run emits
    Events,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match FeederConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => FeederConfig::default(),
    };

    if let Err(e) = observability::init_tracing(&config.observability.logging) {
        eprintln!("Failed to initialize tracing: {e}");
        std::process::exit(1);
    }

    for warning in config.startup_warnings() {
        tracing::warn!("{warning}");
    }

    let http = match reqwest::Client::builder()
        .user_agent(concat!("dashfeed/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let authenticator = Authenticator::from_env(&config.analytics, http.clone());
    let api = Arc::new(ReportingClient::new(&config.analytics, http.clone()));
    let sink = build_sink(&config.dashboard, http);
    let sync = AnalyticsSync::new(authenticator, api, sink, &config.analytics);

    match args.command.unwrap_or(Command::Run) {
        Command::Events => {
            for metric in sync.plan() {
                println!("{}", metric.event_name);
            }
        }
        Command::Once => run_once(&sync, &config).await,
        Command::Run => run_scheduled(sync, &config).await,
    }
}

async fn run_once(sync: &AnalyticsSync, config: &FeederConfig) {
    let today = chrono::Local::now().date_naive();
    match sync
        .run_with_timeout(today, config.schedule.run_timeout())
        .await
    {
        Ok(RunOutcome::Completed(summary)) => {
            tracing::info!(
                queries = summary.queries,
                events_emitted = summary.events_emitted,
                emit_failures = summary.emit_failures,
                duration_ms = summary.duration_ms,
                "Analytics sync complete"
            );
            if summary.emit_failures > 0 {
                std::process::exit(1);
            }
        }
        Ok(RunOutcome::Skipped { reason }) => {
            tracing::error!(reason = %reason, "Analytics sync skipped");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "Analytics sync failed");
            std::process::exit(1);
        }
    }
}

async fn run_scheduled(sync: AnalyticsSync, config: &FeederConfig) {
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(start_analytics_sync_worker(
        sync,
        config.schedule.clone(),
        cancel.clone(),
    ));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping analytics sync");
    cancel.cancel();

    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Analytics sync worker panicked");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
