#![deny(
    clippy::expect_used,
    clippy::future_not_send,
    clippy::pedantic,
    clippy::as_conversions,
    clippy::unwrap_used,
    unsafe_code
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::manual_non_exhaustive,
    clippy::multiple_crate_versions
)]

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use course_manager::{Command, CourseManagerArgs, ServerArgs, db, logging, models::User, server};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        return Err(err).context("failed to load .env");
    }

    let args = CourseManagerArgs::parse();

    logging::init(args.log_json).context("failed to initialise logging")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(args.server).await,
        Command::CreateSuperuser {
            email,
            username,
            password,
        } => create_superuser(&args.server, &email, &username, &password).await,
    }
}

async fn serve(config: ServerArgs) -> Result<()> {
    let address = SocketAddr::new(config.host, config.port);

    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    let app = server(config).await.context("failed to build application")?;

    info!(%address, "starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = shutdown_signal().await {
                error!("error while waiting for shutdown signal: {e:#}");
            }
            info!("shutdown signal received, draining connections");
        })
        .await
        .context("HTTP server failed")?;

    info!("server shutdown complete");

    Ok(())
}

async fn create_superuser(
    config: &ServerArgs,
    email: &str,
    username: &str,
    password: &str,
) -> Result<()> {
    let pool = db::connect(&config.database_url)
        .await
        .context("failed to open database")?;

    let user = User::create_superuser(&pool, email, username, password)
        .await
        .context("failed to create superuser")?;

    info!(user_id = %user.id, email = %user.email, "superuser created");

    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
