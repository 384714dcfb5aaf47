//! At-most-one generation per session.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle of a session's generation.
///
/// `Completed` never goes back to `NotStarted`; a new attempt from
/// `Completed` has to be an explicit retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    NotStarted,
    InFlight { attempt_id: Uuid },
    Completed,
}

/// Why a guard could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardRejection {
    #[error("attempt {attempt_id} is already generating")]
    AlreadyGenerating { attempt_id: Uuid },

    #[error("a generation was already attempted in this session")]
    AlreadyAttempted,
}

/// Per-session generation guard.
///
/// Clones share state, so a clone can be handed to a spawned attempt.
#[derive(Debug, Clone)]
pub struct GenerationGuard {
    state: Arc<Mutex<GuardState>>,
}

impl Default for GenerationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationGuard {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GuardState::NotStarted)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> GuardState {
        *self.lock()
    }

    /// A generation is in flight.
    pub fn is_generating(&self) -> bool {
        matches!(self.state(), GuardState::InFlight { .. })
    }

    /// A generation was started at some point in this session.
    pub fn was_attempted(&self) -> bool {
        !matches!(self.state(), GuardState::NotStarted)
    }

    /// Try to move into `InFlight` without a scoped permit.
    ///
    /// Returns false while a generation is in flight, and after a completed
    /// attempt unless `retry` is set. Pair with [`release`](Self::release).
    pub fn try_acquire(&self, retry: bool) -> bool {
        self.enter(Uuid::new_v4(), retry).is_ok()
    }

    /// Leave `InFlight`. Does nothing in any other state.
    pub fn release(&self) {
        let mut state = self.lock();
        if let GuardState::InFlight { attempt_id } = *state {
            debug!("Guard released by attempt {}", attempt_id);
            *state = GuardState::Completed;
        }
    }

    /// Acquire the guard for `attempt_id`. The returned permit releases it
    /// when dropped.
    pub fn acquire(&self, attempt_id: Uuid, retry: bool) -> Result<GuardPermit, GuardRejection> {
        self.enter(attempt_id, retry)?;
        Ok(GuardPermit {
            guard: self.clone(),
            attempt_id,
        })
    }

    fn enter(&self, attempt_id: Uuid, retry: bool) -> Result<(), GuardRejection> {
        let mut state = self.lock();
        match *state {
            GuardState::InFlight {
                attempt_id: current,
            } => {
                info!("Rejecting attempt {}: attempt {} in flight", attempt_id, current);
                Err(GuardRejection::AlreadyGenerating {
                    attempt_id: current,
                })
            }
            GuardState::Completed if !retry => {
                info!("Rejecting attempt {}: already attempted", attempt_id);
                Err(GuardRejection::AlreadyAttempted)
            }
            GuardState::NotStarted | GuardState::Completed => {
                *state = GuardState::InFlight { attempt_id };
                Ok(())
            }
        }
    }

    /// Release only if `attempt_id` still holds the guard.
    fn release_attempt(&self, attempt_id: Uuid) {
        let mut state = self.lock();
        if *state == (GuardState::InFlight { attempt_id }) {
            debug!("Guard released by attempt {}", attempt_id);
            *state = GuardState::Completed;
        }
    }
}

/// Scoped hold on a [`GenerationGuard`].
#[derive(Debug)]
pub struct GuardPermit {
    guard: GenerationGuard,
    attempt_id: Uuid,
}

impl GuardPermit {
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }
}

impl Drop for GuardPermit {
    fn drop(&mut self) {
        self.guard.release_attempt(self.attempt_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_acquire_and_release() {
        let guard = GenerationGuard::new();
        assert_eq!(guard.state(), GuardState::NotStarted);
        assert!(!guard.was_attempted());

        assert!(guard.try_acquire(false));
        assert!(guard.is_generating());

        // Held: nobody else gets in, retry or not.
        assert!(!guard.try_acquire(false));
        assert!(!guard.try_acquire(true));

        guard.release();
        assert!(!guard.is_generating());
        assert!(guard.was_attempted());

        // Right after release a retry gets in again.
        assert!(guard.try_acquire(true));
    }

    #[test]
    fn test_completed_requires_retry() {
        let guard = GenerationGuard::new();
        assert!(guard.try_acquire(false));
        guard.release();

        assert!(!guard.try_acquire(false));
        assert_eq!(guard.state(), GuardState::Completed);
    }

    #[test]
    fn test_release_without_acquire_is_noop() {
        let guard = GenerationGuard::new();
        guard.release();
        assert_eq!(guard.state(), GuardState::NotStarted);
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let guard = GenerationGuard::new();
        let attempt = Uuid::new_v4();

        let permit = guard.acquire(attempt, false).unwrap();
        assert_eq!(permit.attempt_id(), attempt);
        assert_eq!(guard.state(), GuardState::InFlight { attempt_id: attempt });

        let second = guard.acquire(Uuid::new_v4(), true);
        assert_eq!(
            second.unwrap_err(),
            GuardRejection::AlreadyGenerating { attempt_id: attempt }
        );

        drop(permit);
        assert_eq!(guard.state(), GuardState::Completed);
        assert_eq!(
            guard.acquire(Uuid::new_v4(), false).unwrap_err(),
            GuardRejection::AlreadyAttempted
        );
    }

    #[test]
    fn test_stale_permit_does_not_release_newer_attempt() {
        let guard = GenerationGuard::new();
        let first = guard.acquire(Uuid::new_v4(), false).unwrap();

        // Someone force-releases, then a retry takes the guard.
        guard.release();
        let second_id = Uuid::new_v4();
        let _second = guard.acquire(second_id, true).unwrap();

        drop(first);
        assert_eq!(guard.state(), GuardState::InFlight { attempt_id: second_id });
    }

    #[test]
    fn test_clones_share_state() {
        let guard = GenerationGuard::new();
        let clone = guard.clone();

        assert!(clone.try_acquire(false));
        assert!(guard.is_generating());
    }

    #[test]
    fn test_concurrent_acquire_admits_one() {
        let guard = GenerationGuard::new();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let guard = guard.clone();
                std::thread::spawn(move || guard.try_acquire(true))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
