//! Delayed completion provider - wraps another provider with artificial delay.

use std::time::Duration;

use plan_core::{async_trait, AiError, ChatMessage, CompletionProvider};
use tokio::time::sleep;

/// A provider that wraps another provider and adds artificial delay.
///
/// Useful for exercising the phase ticker and cancellation while a
/// generation call is in flight.
pub struct DelayedCompletion<P: CompletionProvider> {
    inner: P,
    delay: Duration,
}

impl<P: CompletionProvider> DelayedCompletion<P> {
    /// Create a new DelayedCompletion wrapping `inner` with the specified delay.
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a provider with a delay in seconds.
    pub fn with_secs(inner: P, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// Get the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for DelayedCompletion<P> {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        sleep(self.delay).await;
        self.inner.complete(messages).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
