//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use orchestrator::{PlanGenerationCoordinator, Session};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::config::DEFAULT_SESSION_TTL;

type Attempts = Arc<Mutex<HashMap<Uuid, CancellationToken>>>;

struct SessionEntry {
    session: Session,
    last_used: Instant,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: PlanGenerationCoordinator,
    /// Bearer token required on plan routes.
    pub api_token: Option<String>,
    /// One session per user id, dropped after `session_ttl` of inactivity.
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    session_ttl: Duration,
    /// Running attempts, for cancellation.
    attempts: Attempts,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AppState {
    pub fn new(coordinator: PlanGenerationCoordinator, api_token: Option<String>) -> Self {
        Self {
            coordinator,
            api_token,
            sessions: Arc::default(),
            session_ttl: DEFAULT_SESSION_TTL,
            attempts: Arc::default(),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// The session of `user_id`, created on first use.
    ///
    /// Idle sessions are evicted first. A session with a generation in
    /// flight is always kept.
    pub fn session(&self, user_id: &str) -> Session {
        let mut sessions = lock(&self.sessions);

        let ttl = self.session_ttl;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.session.guard().is_generating() || entry.last_used.elapsed() < ttl
        });
        if sessions.len() < before {
            debug!("Evicted {} idle sessions", before - sessions.len());
        }

        let entry = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| SessionEntry {
                session: Session::new(user_id),
                last_used: Instant::now(),
            });
        entry.last_used = Instant::now();
        entry.session.clone()
    }

    /// Register a running attempt until the returned guard is dropped.
    pub fn track(&self, attempt_id: Uuid, cancel: CancellationToken) -> TrackedAttempt {
        lock(&self.attempts).insert(attempt_id, cancel);
        TrackedAttempt {
            attempts: self.attempts.clone(),
            attempt_id,
        }
    }

    /// Cancel a running attempt. Returns false if it is not running.
    pub fn cancel(&self, attempt_id: Uuid) -> bool {
        match lock(&self.attempts).get(&attempt_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Removes its attempt from the registry when dropped.
pub struct TrackedAttempt {
    attempts: Attempts,
    attempt_id: Uuid,
}

impl Drop for TrackedAttempt {
    fn drop(&mut self) {
        lock(&self.attempts).remove(&self.attempt_id);
    }
}
