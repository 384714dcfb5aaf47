//! Bounded-duration confirmation polling.

use std::sync::Arc;
use std::time::Duration;

use plan_core::{PaymentError, PaymentGateway, PaymentStatus};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

/// Default time between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default time after which polling gives up.
pub const DEFAULT_MAX_POLL_DURATION: Duration = Duration::from_secs(10 * 60);

/// Shortest interval a poller accepts. Shorter ones are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How a poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The provider confirmed the payment.
    Confirmed,
    /// The maximum duration elapsed without a terminal status.
    TimedOut,
    /// The provider reported a terminal non-success status.
    Failed(PaymentStatus),
    /// The poll was cancelled by its owner.
    Cancelled,
}

/// Timing for a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between checks. The first check happens one interval after start.
    pub interval: Duration,
    /// Time after which the poll reports [`PollOutcome::TimedOut`].
    pub max_duration: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_duration: DEFAULT_MAX_POLL_DURATION,
        }
    }
}

/// Polls a [`PaymentGateway`] until a payment reaches a terminal status.
#[derive(Clone)]
pub struct PaymentPoller {
    gateway: Arc<dyn PaymentGateway>,
    config: PollConfig,
}

impl PaymentPoller {
    /// Create a poller. An interval below [`MIN_POLL_INTERVAL`] is raised to it.
    pub fn new(gateway: Arc<dyn PaymentGateway>, mut config: PollConfig) -> Self {
        if config.interval < MIN_POLL_INTERVAL {
            warn!(
                "Poll interval {:?} is too short, using {:?}",
                config.interval, MIN_POLL_INTERVAL
            );
            config.interval = MIN_POLL_INTERVAL;
        }
        Self { gateway, config }
    }

    /// Create a poller with the default 5 second interval and 10 minute limit.
    pub fn with_defaults(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self::new(gateway, PollConfig::default())
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Poll `external_id` until it is confirmed, fails, times out, or
    /// `cancel` fires.
    ///
    /// Transient errors on a tick (provider errors, network failures,
    /// unknown id) are logged and the payment is treated as still pending.
    /// Only configuration and validation errors end the poll with `Err`.
    pub async fn poll(
        &self,
        external_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PaymentError> {
        let PollConfig {
            interval,
            max_duration,
        } = self.config;

        let start = Instant::now();
        let deadline = sleep_until(start + max_duration);
        tokio::pin!(deadline);

        let mut ticker = interval_at(start + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks: u32 = 0;

        info!(
            "Polling {} payment {} every {:?} (max {:?})",
            self.gateway.provider(),
            external_id,
            interval,
            max_duration
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Polling for payment {} cancelled after {} checks", external_id, ticks);
                    return Ok(PollOutcome::Cancelled);
                }
                _ = &mut deadline => {
                    info!("Polling for payment {} timed out after {} checks", external_id, ticks);
                    return Ok(PollOutcome::TimedOut);
                }
                _ = ticker.tick() => {}
            }

            ticks += 1;

            let checked = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Polling for payment {} cancelled during check {}", external_id, ticks);
                    return Ok(PollOutcome::Cancelled);
                }
                result = self.gateway.check_status(external_id) => result,
            };

            match checked {
                Ok(PaymentStatus::Confirmed) => {
                    info!("Payment {} confirmed after {} checks", external_id, ticks);
                    return Ok(PollOutcome::Confirmed);
                }
                Ok(PaymentStatus::Pending) => {
                    debug!("Payment {} still pending (check {})", external_id, ticks);
                }
                Ok(status) => {
                    warn!("Payment {} ended with status {}", external_id, status);
                    return Ok(PollOutcome::Failed(status));
                }
                Err(err) if err.is_transient() => {
                    warn!("Check {} for payment {} failed, still pending: {}", ticks, external_id, err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Run [`poll`](Self::poll) on a background task.
    ///
    /// The returned handle cancels the poll when dropped.
    pub fn spawn(&self, external_id: impl Into<String>) -> PollHandle {
        let cancel = CancellationToken::new();
        let poller = self.clone();
        let external_id = external_id.into();
        let token = cancel.clone();

        let task = tokio::spawn(async move { poller.poll(&external_id, &token).await });

        PollHandle {
            cancel: cancel.clone(),
            guard: cancel.drop_guard(),
            task,
        }
    }
}

/// Handle to a spawned poll.
pub struct PollHandle {
    cancel: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<Result<PollOutcome, PaymentError>>,
}

impl PollHandle {
    /// Stop polling. Calling this more than once, or after the poll has
    /// finished, does nothing.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the poll has already stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the poll to end.
    pub async fn outcome(self) -> Result<PollOutcome, PaymentError> {
        let PollHandle { guard, task, .. } = self;
        let result = task.await;
        drop(guard);

        match result {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => Ok(PollOutcome::Cancelled),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_providers::ScriptedGateway;

    fn poller(gateway: Arc<ScriptedGateway>, interval_secs: u64, max_secs: u64) -> PaymentPoller {
        PaymentPoller::new(
            gateway,
            PollConfig {
                interval: Duration::from_secs(interval_secs),
                max_duration: Duration::from_secs(max_secs),
            },
        )
    }

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.max_duration, Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_raised_to_minimum() {
        let gateway = Arc::new(ScriptedGateway::confirms_on(2));
        let poller = poller(gateway.clone(), 0, 60);
        assert_eq!(poller.config().interval, MIN_POLL_INTERVAL);

        let outcome = poller.poll("pay_1", &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, PollOutcome::Confirmed);
        assert_eq!(gateway.check_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_on_third_check_stops() {
        let gateway = Arc::new(ScriptedGateway::confirms_on(3));
        let poller = poller(gateway.clone(), 5, 600);

        let start = Instant::now();
        let outcome = poller.poll("pay_1", &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome, PollOutcome::Confirmed);
        assert_eq!(gateway.check_calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(15));

        // Nothing keeps running after the poll returned.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.check_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_confirming_times_out() {
        let gateway = Arc::new(ScriptedGateway::never_confirms());
        let poller = poller(gateway.clone(), 5, 60);

        let start = Instant::now();
        let outcome = poller.poll("pay_1", &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        // Checks at 5..=55; the deadline wins the tie at 60.
        assert_eq!(gateway.check_calls(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_ends_poll() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok(PaymentStatus::Pending),
            Ok(PaymentStatus::Failed),
        ]));
        let poller = poller(gateway.clone(), 5, 600);

        let outcome = poller.poll("pay_1", &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome, PollOutcome::Failed(PaymentStatus::Failed));
        assert_eq!(gateway.check_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_tolerated() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(PaymentError::Network("connection reset".into())),
            Err(PaymentError::NotFound("pay_1".into())),
            Ok(PaymentStatus::Confirmed),
        ]));
        let poller = poller(gateway.clone(), 5, 600);

        let outcome = poller.poll("pay_1", &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome, PollOutcome::Confirmed);
        assert_eq!(gateway.check_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configuration_error_is_fatal() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(PaymentError::Configuration(
            "missing key".into(),
        ))]));
        let poller = poller(gateway.clone(), 5, 600);

        let result = poller.poll("pay_1", &CancellationToken::new()).await;
        assert!(matches!(result, Err(PaymentError::Configuration(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks_and_is_idempotent() {
        let gateway = Arc::new(ScriptedGateway::never_confirms());
        let poller = poller(gateway.clone(), 5, 600);

        let handle = poller.spawn("pay_1");
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(gateway.check_calls(), 2);

        handle.cancel();
        handle.cancel();
        assert_eq!(handle.outcome().await.unwrap(), PollOutcome::Cancelled);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.check_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let gateway = Arc::new(ScriptedGateway::never_confirms());
        let poller = poller(gateway.clone(), 5, 600);

        let handle = poller.spawn("pay_1");
        tokio::time::sleep(Duration::from_secs(6)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.check_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_finish_is_noop() {
        let gateway = Arc::new(ScriptedGateway::confirms_on(1));
        let poller = poller(gateway.clone(), 5, 600);

        let handle = poller.spawn("pay_1");
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(handle.is_finished());

        handle.cancel();
        assert_eq!(handle.outcome().await.unwrap(), PollOutcome::Confirmed);
    }
}
