//! Periodic notification scheduler
//!
//! Runs a notification tick immediately on start, then sleeps a fixed
//! interval after each completed tick. Ticks never overlap and a slow tick
//! delays the next one rather than queueing it. Cancellation interrupts
//! both the sleep and an in-flight tick. A tick that panics is logged and
//! counted, and the loop carries on with the next one.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use application::services::{NotificationService, TickReport};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Interval must be positive
    #[error("Invalid interval: {0:?}")]
    InvalidInterval(Duration),

    /// The scheduler task panicked
    #[error("Scheduler task failed: {0}")]
    TaskFailed(String),
}

/// Counters describing scheduler activity
#[derive(Debug, Default)]
pub struct SchedulerStats {
    ticks_completed: AtomicU64,
    ticks_failed: AtomicU64,
    notifications_sent: AtomicU64,
    last_tick: RwLock<Option<DateTime<Utc>>>,
    last_report: RwLock<Option<TickReport>>,
}

impl SchedulerStats {
    fn record(&self, started_at: DateTime<Utc>, report: TickReport) {
        self.ticks_completed.fetch_add(1, Ordering::Relaxed);
        self.notifications_sent
            .fetch_add(report.notifications_sent as u64, Ordering::Relaxed);
        *self.last_tick.write() = Some(started_at);
        *self.last_report.write() = Some(report);
    }

    /// Number of ticks that ran to completion
    pub fn ticks_completed(&self) -> u64 {
        self.ticks_completed.load(Ordering::Relaxed)
    }

    /// Number of ticks that panicked
    pub fn ticks_failed(&self) -> u64 {
        self.ticks_failed.load(Ordering::Relaxed)
    }

    /// Notifications sent across all ticks
    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    /// Start time of the last completed tick
    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        *self.last_tick.read()
    }

    /// Report of the last completed tick
    pub fn last_report(&self) -> Option<TickReport> {
        *self.last_report.read()
    }
}

/// Drives [`NotificationService::run_tick`] on a fixed interval
pub struct NotificationScheduler {
    service: Arc<NotificationService>,
    interval: Duration,
}

impl std::fmt::Debug for NotificationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationScheduler")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl NotificationScheduler {
    /// Create a scheduler
    ///
    /// # Errors
    ///
    /// Returns an error if `interval` is zero.
    pub fn new(
        service: Arc<NotificationService>,
        interval: Duration,
    ) -> Result<Self, SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(interval));
        }
        Ok(Self { service, interval })
    }

    /// Spawn the loop; it stops when `token` is cancelled
    #[must_use]
    pub fn start(self, token: CancellationToken) -> SchedulerHandle {
        let stats = Arc::new(SchedulerStats::default());
        info!(interval_secs = self.interval.as_secs(), "Starting notification scheduler");

        let join = tokio::spawn(run_loop(
            self.service,
            self.interval,
            token.clone(),
            Arc::clone(&stats),
        ));

        SchedulerHandle { token, join, stats }
    }
}

#[instrument(skip_all, name = "notification_scheduler")]
async fn run_loop(
    service: Arc<NotificationService>,
    interval: Duration,
    token: CancellationToken,
    stats: Arc<SchedulerStats>,
) {
    loop {
        let started_at = Utc::now();
        // Own task per tick so a panic ends the tick, not the loop
        let mut tick = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.run_tick(started_at).await }
        });
        tokio::select! {
            () = token.cancelled() => {
                tick.abort();
                break;
            },
            outcome = &mut tick => match outcome {
                Ok(report) => stats.record(started_at, report),
                Err(e) => {
                    stats.ticks_failed.fetch_add(1, Ordering::Relaxed);
                    error!(error = %e, "Notification tick panicked");
                },
            },
        }

        debug!(next_in_secs = interval.as_secs(), "Tick complete, sleeping");
        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(interval) => {},
        }
    }
    info!(
        ticks = stats.ticks_completed(),
        failed = stats.ticks_failed(),
        "Notification scheduler stopped"
    );
}

/// Handle to a running scheduler
#[derive(Debug)]
pub struct SchedulerHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
    stats: Arc<SchedulerStats>,
}

impl SchedulerHandle {
    /// Activity counters
    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    /// Whether the loop is still running
    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Cancel the loop and wait for it to exit
    ///
    /// # Errors
    ///
    /// Returns an error if the loop task panicked.
    pub async fn shutdown(self) -> Result<(), SchedulerError> {
        self.token.cancel();
        self.join.await.map_err(|e| {
            error!(error = %e, "Notification scheduler task failed");
            SchedulerError::TaskFailed(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use application::error::ApplicationError;
    use application::ports::{
        CurrentConditions, ForecastEntry, InlineButton, MenuButton, MessengerPort,
        PollutantConcentrations, ResolvedPlace, UpdateBatch, WeatherPort,
    };
    use application::services::UserRegistry;
    use async_trait::async_trait;
    use domain::value_objects::{ChatId, GeoLocation};

    use super::*;

    #[derive(Default)]
    struct CountingWeather {
        current_calls: AtomicUsize,
        delay: Duration,
        panics: bool,
    }

    #[async_trait]
    impl WeatherPort for CountingWeather {
        async fn resolve_city(&self, name: &str) -> Result<ResolvedPlace, ApplicationError> {
            Err(ApplicationError::LocationNotFound(name.to_string()))
        }

        async fn current_conditions(
            &self,
            _: &GeoLocation,
        ) -> Result<CurrentConditions, ApplicationError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            if self.panics {
                panic!("weather adapter bug");
            }
            tokio::time::sleep(self.delay).await;
            Err(ApplicationError::ProviderUnavailable("offline".into()))
        }

        async fn forecast(&self, _: &GeoLocation) -> Result<Vec<ForecastEntry>, ApplicationError> {
            Err(ApplicationError::ProviderUnavailable("offline".into()))
        }

        async fn air_pollution(
            &self,
            _: &GeoLocation,
        ) -> Result<PollutantConcentrations, ApplicationError> {
            Ok(Vec::new())
        }
    }

    struct SilentMessenger;

    #[async_trait]
    impl MessengerPort for SilentMessenger {
        async fn send_text(&self, _: ChatId, _: &str) -> Result<(), ApplicationError> {
            Ok(())
        }

        async fn send_with_buttons(
            &self,
            _: ChatId,
            _: &str,
            _: Vec<InlineButton>,
        ) -> Result<(), ApplicationError> {
            Ok(())
        }

        async fn send_with_menu(
            &self,
            _: ChatId,
            _: &str,
            _: Vec<MenuButton>,
        ) -> Result<(), ApplicationError> {
            Ok(())
        }

        async fn edit_message(
            &self,
            _: ChatId,
            _: i64,
            _: &str,
            _: Vec<InlineButton>,
        ) -> Result<(), ApplicationError> {
            Ok(())
        }

        async fn clear_buttons(&self, _: ChatId, _: i64) -> Result<(), ApplicationError> {
            Ok(())
        }

        async fn answer_callback(&self, _: &str, _: &str) -> Result<(), ApplicationError> {
            Ok(())
        }

        async fn fetch_updates(&self, _: Option<i64>) -> Result<UpdateBatch, ApplicationError> {
            Ok(UpdateBatch::default())
        }
    }

    fn service(weather: Arc<CountingWeather>) -> Arc<NotificationService> {
        let registry = Arc::new(UserRegistry::new());
        registry.set_location(ChatId::new(1), GeoLocation::new(59.91, 10.75).unwrap());
        registry.set_subscription(ChatId::new(1), true);
        Arc::new(NotificationService::new(
            weather,
            Arc::new(SilentMessenger),
            registry,
        ))
    }

    async fn wait_for_ticks(stats: &SchedulerStats, ticks: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while stats.ticks_completed() < ticks {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn zero_interval_is_rejected() {
        let weather = Arc::new(CountingWeather::default());
        let err = NotificationScheduler::new(service(weather), Duration::ZERO).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidInterval(_)));
    }

    #[tokio::test]
    async fn first_tick_runs_immediately() {
        let weather = Arc::new(CountingWeather::default());
        let scheduler =
            NotificationScheduler::new(service(Arc::clone(&weather)), Duration::from_secs(3600))
                .unwrap();

        let handle = scheduler.start(CancellationToken::new());
        let stats = handle.stats();
        wait_for_ticks(&stats, 1).await;

        assert_eq!(weather.current_calls.load(Ordering::SeqCst), 1);
        let report = stats.last_report().unwrap();
        assert_eq!(report.users_total, 1);
        assert_eq!(report.users_degraded, 1);
        assert!(stats.last_tick().is_some());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn ticks_repeat_after_interval() {
        let weather = Arc::new(CountingWeather::default());
        let scheduler =
            NotificationScheduler::new(service(Arc::clone(&weather)), Duration::from_millis(20))
                .unwrap();

        let handle = scheduler.start(CancellationToken::new());
        wait_for_ticks(&handle.stats(), 3).await;
        handle.shutdown().await.unwrap();

        assert!(weather.current_calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn shutdown_interrupts_sleep() {
        let weather = Arc::new(CountingWeather::default());
        let scheduler =
            NotificationScheduler::new(service(weather), Duration::from_secs(3600)).unwrap();

        let handle = scheduler.start(CancellationToken::new());
        wait_for_ticks(&handle.stats(), 1).await;
        assert!(handle.is_running());

        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn parent_token_cancels_in_flight_tick() {
        let weather = Arc::new(CountingWeather {
            delay: Duration::from_secs(3600),
            ..Default::default()
        });
        let scheduler =
            NotificationScheduler::new(service(Arc::clone(&weather)), Duration::from_secs(3600))
                .unwrap();

        let token = CancellationToken::new();
        let handle = scheduler.start(token.clone());
        tokio::time::timeout(Duration::from_secs(5), async {
            while weather.current_calls.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        token.cancel();
        let stats = handle.stats();
        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.ticks_completed(), 0);
    }

    #[tokio::test]
    async fn panicking_tick_does_not_stop_loop() {
        let weather = Arc::new(CountingWeather {
            panics: true,
            ..Default::default()
        });
        let scheduler =
            NotificationScheduler::new(service(Arc::clone(&weather)), Duration::from_millis(20))
                .unwrap();

        let handle = scheduler.start(CancellationToken::new());
        let stats = handle.stats();
        tokio::time::timeout(Duration::from_secs(5), async {
            while stats.ticks_failed() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert!(handle.is_running());
        assert_eq!(stats.ticks_completed(), 0);
        assert!(weather.current_calls.load(Ordering::SeqCst) >= 2);
        handle.shutdown().await.unwrap();
    }
}
