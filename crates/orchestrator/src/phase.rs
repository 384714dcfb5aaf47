//! Time-based progress phases shown while a plan is generated.

use std::time::Duration;

use plan_core::{GenerationPhase, PhaseState};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Seconds after which the phase moves to `Analyzing`.
pub const ANALYZING_AFTER_SECS: u64 = 5;
/// Seconds after which the phase moves to `Generating`.
pub const GENERATING_AFTER_SECS: u64 = 15;
/// Seconds after which the phase moves to `Finalizing`.
pub const FINALIZING_AFTER_SECS: u64 = 30;

const TICK: Duration = Duration::from_secs(1);

/// Maps elapsed time to a [`GenerationPhase`].
///
/// Phases are cosmetic: they do not reflect actual AI progress.
pub struct PhaseSimulator;

impl PhaseSimulator {
    pub fn phase_at(elapsed: Duration) -> GenerationPhase {
        match elapsed.as_secs() {
            s if s < ANALYZING_AFTER_SECS => GenerationPhase::Preparing,
            s if s < GENERATING_AFTER_SECS => GenerationPhase::Analyzing,
            s if s < FINALIZING_AFTER_SECS => GenerationPhase::Generating,
            _ => GenerationPhase::Finalizing,
        }
    }

    pub fn state_at(elapsed: Duration) -> PhaseState {
        PhaseState {
            phase: Self::phase_at(elapsed),
            elapsed_seconds: elapsed.as_secs(),
        }
    }

    /// Call `sink` now and then once per second until the returned ticker
    /// is stopped or dropped.
    pub fn start<F>(mut sink: F) -> PhaseTicker
    where
        F: FnMut(PhaseState) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let start = Instant::now();
        let mut last = Self::state_at(Duration::ZERO);
        sink(last);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(start + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let next = Self::state_at(start.elapsed());
                last = PhaseState {
                    phase: next.phase.max(last.phase),
                    elapsed_seconds: next.elapsed_seconds.max(last.elapsed_seconds),
                };
                sink(last);
            }
        });

        PhaseTicker {
            cancel: cancel.clone(),
            _guard: cancel.drop_guard(),
            task,
        }
    }
}

/// Running phase ticker. Stops when dropped.
pub struct PhaseTicker {
    cancel: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<()>,
}

impl PhaseTicker {
    /// Signal the ticker to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the ticker and wait until it can no longer call its sink.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_phase_boundaries() {
        let at = |secs| PhaseSimulator::phase_at(Duration::from_secs(secs));

        assert_eq!(at(0), GenerationPhase::Preparing);
        assert_eq!(at(4), GenerationPhase::Preparing);
        assert_eq!(at(5), GenerationPhase::Analyzing);
        assert_eq!(at(14), GenerationPhase::Analyzing);
        assert_eq!(at(15), GenerationPhase::Generating);
        assert_eq!(at(29), GenerationPhase::Generating);
        assert_eq!(at(30), GenerationPhase::Finalizing);
        assert_eq!(at(3600), GenerationPhase::Finalizing);

        assert_eq!(
            PhaseSimulator::phase_at(Duration::from_millis(4999)),
            GenerationPhase::Preparing
        );
    }

    fn recording() -> (Arc<Mutex<Vec<PhaseState>>>, impl FnMut(PhaseState) + Send + 'static) {
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink_states = states.clone();
        (states, move |state| sink_states.lock().unwrap().push(state))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_emits_every_second_without_regressing() {
        let (states, sink) = recording();
        let ticker = PhaseSimulator::start(sink);

        tokio::time::sleep(Duration::from_millis(32_500)).await;
        ticker.stop().await;

        let states = states.lock().unwrap().clone();
        // One at start plus one per elapsed second.
        assert_eq!(states.len(), 33);
        assert_eq!(states[0].phase, GenerationPhase::Preparing);
        assert_eq!(states[5].phase, GenerationPhase::Analyzing);
        assert_eq!(states[15].phase, GenerationPhase::Generating);
        assert_eq!(states[30].phase, GenerationPhase::Finalizing);

        for pair in states.windows(2) {
            assert!(pair[1].phase >= pair[0].phase);
            assert!(pair[1].elapsed_seconds > pair[0].elapsed_seconds);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_ticker_stops_emitting() {
        let (states, sink) = recording();
        let ticker = PhaseSimulator::start(sink);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drop(ticker);
        let emitted = states.lock().unwrap().len();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(states.lock().unwrap().len(), emitted);
        assert_eq!(emitted, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let (_states, sink) = recording();
        let ticker = PhaseSimulator::start(sink);

        ticker.cancel();
        ticker.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(ticker.is_stopped());
        ticker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_state_is_emitted_before_start_returns() {
        let (states, sink) = recording();
        let ticker = PhaseSimulator::start(sink);

        assert_eq!(
            states.lock().unwrap().as_slice(),
            &[PhaseState {
                phase: GenerationPhase::Preparing,
                elapsed_seconds: 0,
            }]
        );
        ticker.stop().await;
    }
}
