//! Weather bot
//!
//! Main entry point: answers chat commands and pushes periodic
//! temperature and rain notifications.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use application::{
    ApplicationError, ChatService, MessengerPort, NotificationService, UserRegistry,
    UserSnapshotStore, WeatherPort,
};
use infrastructure::{
    AppConfig, JsonUserStore, NotificationScheduler, TelegramMessengerAdapter, WeatherAdapter,
    init_tracing,
};
use presentation_bot::spawn_telegram_polling_task;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.telemetry).context("Failed to initialize logging")?;

    info!("🌦️ Weather bot v{} starting...", env!("CARGO_PKG_VERSION"));
    config.validate().context("Invalid configuration")?;

    info!(
        interval_secs = config.notifications.interval_secs,
        notifications = config.notifications.enabled,
        snapshot = %config.storage.snapshot_path.display(),
        "Configuration loaded"
    );

    // Adapters
    let weather: Arc<dyn WeatherPort> =
        Arc::new(WeatherAdapter::with_config(config.weather.to_client_config())?);
    let telegram = Arc::new(TelegramMessengerAdapter::new(
        config.telegram.to_client_config(),
    )?);
    match telegram.verify().await {
        Ok(name) => info!(bot = %name, "Connected to Telegram"),
        Err(ApplicationError::Configuration(reason)) => {
            anyhow::bail!("Telegram rejected the bot token: {reason}")
        },
        Err(e) => warn!(error = %e, "Telegram unreachable at startup, polling will retry"),
    }
    let messenger: Arc<dyn MessengerPort> = telegram;

    // Restore users
    let store = Arc::new(JsonUserStore::new(&config.storage.snapshot_path));
    let snapshots = store.load().await.context("Failed to load user snapshot")?;
    let registry = Arc::new(UserRegistry::from_snapshots(snapshots));
    info!(
        users = registry.len(),
        watched = registry.watched_users().len(),
        "User registry restored"
    );

    // Services
    let chat_service = Arc::new(
        ChatService::new(
            Arc::clone(&weather),
            Arc::clone(&messenger),
            Arc::clone(&registry),
        )
        .with_store(Arc::clone(&store) as Arc<dyn UserSnapshotStore>),
    );

    let shutdown = CancellationToken::new();

    let scheduler = if config.notifications.enabled {
        let service = Arc::new(NotificationService::new(
            weather,
            Arc::clone(&messenger),
            Arc::clone(&registry),
        ));
        let scheduler = NotificationScheduler::new(service, config.notifications.interval())?;
        Some(scheduler.start(shutdown.child_token()))
    } else {
        info!("Periodic notifications disabled");
        None
    };

    let mut poller = spawn_telegram_polling_task(
        messenger,
        chat_service,
        Duration::from_secs(config.telegram.error_backoff_secs),
        shutdown.child_token(),
    );

    let poller_finished = tokio::select! {
        () = shutdown_signal() => false,
        result = &mut poller => {
            if let Err(e) = result {
                error!(error = %e, "Telegram polling task failed");
            }
            warn!("Telegram polling ended, shutting down");
            true
        },
    };

    shutdown.cancel();

    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            error!(error = %e, "Notification scheduler did not stop cleanly");
        }
    }
    if !poller_finished {
        if let Err(e) = poller.await {
            error!(error = %e, "Telegram polling task failed");
        }
    }

    if let Err(e) = store.save(registry.snapshot()).await {
        warn!(error = %e, "Failed to persist users on shutdown");
    }

    info!("👋 Weather bot stopped");
    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("📥 Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("📥 Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
