//! Caller sessions.

use crate::guard::GenerationGuard;

/// One caller's session. Every attempt made through the same session shares
/// its [`GenerationGuard`]; sessions never share guards with each other.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    guard: GenerationGuard,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            guard: GenerationGuard::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn guard(&self) -> &GenerationGuard {
        &self.guard
    }
}
