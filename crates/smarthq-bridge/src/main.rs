mod cli;
mod entities;
mod error;
mod event_log;
mod http;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smarthq_api::WebSocketTransport;
use smarthq_core::{Client, CoreError};

use crate::cli::Cli;
use crate::error::BridgeError;
use crate::event_log::EventLog;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), BridgeError> {
    let mut config = smarthq_config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    init_tracing(cli.log_filter(&config.log_level));

    let client_config = config.client_config()?;
    let authenticator = config.authenticator()?;
    let addr = config.bind_addr()?;

    let client = Client::new(
        client_config,
        authenticator,
        Arc::new(WebSocketTransport::new()),
    );
    let events = Arc::new(EventLog::new(config.event_log_capacity));
    events.attach(client.events());

    match client.connect().await {
        Ok(()) => {}
        Err(source @ CoreError::AuthenticationFailed { .. }) => {
            return Err(BridgeError::Authentication { source });
        }
        Err(e) => {
            tracing::warn!(error = %e, "initial connection failed, retrying in the background");
            client.start_reconnecting();
        }
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| BridgeError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    tracing::info!(%addr, region = %config.region, "HTTP facade listening");

    let state = http::AppState {
        client: client.clone(),
        events,
        region: Arc::from(config.region.as_str()),
    };
    let served = axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    client.disconnect().await;
    served.map_err(BridgeError::Serve)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
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
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
