use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use keyword_harvest::api::{AppState, create_router};
use keyword_harvest::config::{Config, Profile};
use keyword_harvest::sheets::GoogleSheet;
use tokio_util::sync::CancellationToken;

/// Checks the URLs of a spreadsheet for a keyword and writes the matches back.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration profile (falls back to APP_ENV)
    #[arg(long = "env", value_enum)]
    profile: Option<Profile>,

    /// Address to bind (falls back to HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (falls back to PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env(args.profile)?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let level = match config.profile {
        Profile::Development => tracing::Level::DEBUG,
        Profile::Production | Profile::Testing => tracing::Level::INFO,
    };
    // Also captures the `log` facade used by the checker.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .init();

    if config.sheet.access_token.is_none() || config.sheet.spreadsheet_id.is_none() {
        tracing::warn!("spreadsheet credentials missing, /api/search-keyword will answer 400");
    }

    let state = AppState {
        sheet: Arc::new(GoogleSheet::new(&config.sheet)),
        search: config.search.clone(),
    };
    let app = create_router(state, &config.static_dir);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(profile = ?config.profile, "keyword search service listening on {addr}");

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                trigger.cancel();
            }
            Err(e) => tracing::warn!("cannot listen for shutdown signal: {e}"),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server error")?;
    Ok(())
}
