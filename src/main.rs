use anyhow::{Context, Result};
use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use incubator_monitor::{
    api,
    config::Config,
    device::DeviceClient,
    monitor::{spawn_timers, Engine, MonitorState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent, env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        data_source = ?config.data_source,
        device_api_url = %config.device_api_url,
        "Configuration loaded"
    );

    let mut rng = StdRng::from_entropy();
    let state = MonitorState::seeded(config.data_source, &mut rng, Utc::now());
    let device = DeviceClient::new(&config.device_api_url, config.request_timeout());
    let (engine, monitor) = Engine::new(state, device, config.log_fetch_limit, rng);

    tokio::spawn(engine.run());

    let intervals = config.poll_intervals();
    let _timers = spawn_timers(monitor.events(), intervals);
    info!(
        status_interval_secs = intervals.status.as_secs(),
        log_interval_secs = intervals.logs.as_secs(),
        "Polling timers started"
    );

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(monitor))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
