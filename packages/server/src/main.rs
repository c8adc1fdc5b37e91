use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::RandomIdGenerator;
use server::config::AppConfig;
use server::consumers::consume_updates;
use server::state::AppState;
use server::{build_router, database, faults};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use transport::{TelegramClient, Transport, TransportMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("filelink=info,server=info,transport=info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        mode = ?config.transport.mode,
        max_bytes = config.upload.max_bytes,
        "Configuration loaded"
    );

    let db = database::init_db(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to initialize database")?;
    database::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;

    let transport: Arc<dyn Transport> = Arc::new(
        TelegramClient::new(&config.transport).context("Failed to build Telegram client")?,
    );
    let fault_reporter = faults::reporter_for(
        transport.clone(),
        config.faults.admin_chat_id,
        Duration::from_secs(config.faults.report_timeout_secs),
    );

    let state = AppState::new(
        config.clone(),
        db,
        transport.clone(),
        fault_reporter,
        Arc::new(RandomIdGenerator),
    );

    let consumer = match config.transport.mode {
        TransportMode::Polling => Some(tokio::spawn(consume_updates(
            transport,
            state.dispatcher.clone(),
            config.transport.poll_timeout(),
            config.transport.worker_concurrency,
        ))),
        TransportMode::Webhook => {
            info!("Webhook mode, updates are accepted on POST /webhook");
            None
        }
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        "Server running at http://{}, links use {}",
        addr, config.server.public_base_url
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(consumer) = consumer {
        consumer.abort();
    }
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
