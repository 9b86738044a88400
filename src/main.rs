use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use puppet_webhook::bootstrap::bootstrap;
use puppet_webhook::config::{Cli, Config, log_filter};
use puppet_webhook::git::CommandGitInterpreter;
use puppet_webhook::server::{AppState, build_router};
use puppet_webhook::sync::Syncer;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level_filter = log_filter(&cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                level_filter
                    .clone()
                    .unwrap_or_else(|| "puppet_webhook=info,tower_http=info".to_string())
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if level_filter.is_none() {
        warn!(log_level = %cli.log_level, "Unknown LOG_LEVEL, using info");
    }

    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let syncer = Syncer::new(CommandGitInterpreter::new());

    match bootstrap(&config, &syncer).await {
        Ok(outcome) => {
            info!("{}", outcome);
            info!("Setup Complete");
        }
        Err(e) => {
            error!(error = %e, "Startup synchronization failed");
            std::process::exit(1);
        }
    }

    let app = build_router(AppState::from_config(&config, syncer));

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.listen_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };
    info!("listening on {}", config.listen_addr);

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
    info!("Shut down");
}

/// Cancels `token` on SIGINT or SIGTERM.
async fn shutdown_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    token.cancel();
}
