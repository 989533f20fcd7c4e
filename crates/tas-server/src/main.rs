mod api;
mod middleware;

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = tas_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let offices_file = tas_core::load_offices(&config.offices_path).with_context(|| {
        format!("loading offices from {}", config.offices_path.display())
    })?;
    let primary_contact = offices_file.primary_contact.clone();
    let offices = offices_file.into_directory()?;
    tracing::info!(
        env = %config.env,
        offices = offices.len(),
        head_office = %offices.head_office().id,
        "office directory loaded"
    );

    let state = AppState {
        offices,
        primary_contact,
        whatsapp_country_code: config.whatsapp_country_code.clone(),
        position_options: tas_locator::PositionOptions::from_app_config(&config),
    };
    let rate_limit = default_rate_limit_state(config.rate_limit_per_minute)
        .trust_forwarded_for(config.trust_forwarded_for);
    let app = build_app(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
