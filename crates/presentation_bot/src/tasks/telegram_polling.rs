//! Telegram update polling background task
//!
//! Long-polls the messenger for updates and hands each one to the chat
//! service. The offset only advances after a batch was fetched, so a crash
//! mid-batch replays at most that batch.

use std::sync::Arc;
use std::time::Duration;

use application::ChatService;
use application::error::ApplicationError;
use application::ports::MessengerPort;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Spawn a background task that polls the messenger until `token` is cancelled.
///
/// Fetch failures are retried after `error_backoff`. A rejected bot token
/// stops the task since retrying cannot fix it.
///
/// Returns a `JoinHandle` that resolves once the loop has exited.
pub fn spawn_telegram_polling_task(
    messenger: Arc<dyn MessengerPort>,
    chat_service: Arc<ChatService>,
    error_backoff: Duration,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    info!(
        backoff_secs = error_backoff.as_secs(),
        "Starting Telegram polling background task"
    );

    tokio::spawn(async move {
        let mut offset: Option<i64> = None;

        loop {
            let fetched = tokio::select! {
                () = token.cancelled() => break,
                fetched = messenger.fetch_updates(offset) => fetched,
            };

            match fetched {
                Ok(batch) => {
                    if let Some(next) = batch.next_offset {
                        offset = Some(next);
                    }
                    if !batch.updates.is_empty() {
                        debug!(count = batch.updates.len(), "Processing updates");
                    }
                    for update in batch.updates {
                        let chat_id = update.chat_id();
                        if let Err(e) = chat_service.handle_update(update).await {
                            warn!(%chat_id, error = %e, "Failed to answer update");
                        }
                    }
                },
                Err(ApplicationError::Configuration(reason)) => {
                    error!(%reason, "Telegram rejected the bot configuration, polling stopped");
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "Telegram poll failed, backing off");
                    tokio::select! {
                        () = token.cancelled() => break,
                        () = tokio::time::sleep(error_backoff) => {},
                    }
                },
            }
        }

        info!("Telegram polling stopped");
    })
}
