//! Scripted completion provider - replays a fixed sequence of results.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use plan_core::{async_trait, AiError, ChatMessage, CompletionProvider};

/// A completion provider whose answers come from a script.
///
/// The last scripted entry is repeated once the script runs out, so a
/// single-entry script behaves like a fixed response.
pub struct ScriptedCompletion {
    name: String,
    script: Mutex<VecDeque<Result<String, AiError>>>,
    last: Mutex<Option<Result<String, AiError>>>,
    calls: AtomicUsize,
    received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    /// Create a provider that replays `script`.
    pub fn new(name: impl Into<String>, script: Vec<Result<String, AiError>>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always returns `content`.
    pub fn replying(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(name, vec![Ok(content.into())])
    }

    /// A provider that always fails with `error`.
    pub fn failing(name: impl Into<String>, error: AiError) -> Self {
        Self::new(name, vec![Err(error)])
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message lists received so far, in call order.
    pub fn received(&self) -> Vec<Vec<ChatMessage>> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(messages.to_vec());

        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(AiError::Network("script exhausted".to_string()))),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
