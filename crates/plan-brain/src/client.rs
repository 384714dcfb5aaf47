//! Primary/fallback plan generation.

use std::sync::Arc;

use plan_core::{AiError, ChatMessage, CompletionProvider, PlanCategory, PlanDocument};
use tracing::{debug, info, warn};

use crate::config::{AiProviderConfig, PromptLibrary};
use crate::parse::parse_plan;
use crate::provider::HttpCompletionProvider;

/// Per-request generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationContext {
    pub category: PlanCategory,
    /// Retry once on the fallback provider when the primary is unreachable.
    pub use_fallback: bool,
}

impl GenerationContext {
    pub fn new(category: PlanCategory) -> Self {
        Self {
            category,
            use_fallback: false,
        }
    }

    pub fn with_fallback(mut self, use_fallback: bool) -> Self {
        self.use_fallback = use_fallback;
        self
    }
}

/// Generates plans with a primary provider and an optional fallback.
///
/// The fallback is only tried after a transport failure of the primary,
/// and only when the request asks for it.
#[derive(Clone)]
pub struct AiGenerationClient {
    primary: Arc<dyn CompletionProvider>,
    fallback: Option<Arc<dyn CompletionProvider>>,
    prompts: PromptLibrary,
}

impl AiGenerationClient {
    pub fn new(primary: Arc<dyn CompletionProvider>) -> Self {
        Self {
            primary,
            fallback: None,
            prompts: PromptLibrary::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn CompletionProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    /// Build a client from environment variables.
    ///
    /// See [`AiProviderConfig::primary_from_env`],
    /// [`AiProviderConfig::fallback_from_env`] and [`PromptLibrary::from_env`].
    pub fn from_env() -> Result<Self, AiError> {
        let primary = HttpCompletionProvider::new(AiProviderConfig::primary_from_env())?;
        let mut client = Self::new(Arc::new(primary)).with_prompts(PromptLibrary::from_env());

        if let Some(config) = AiProviderConfig::fallback_from_env() {
            client = client.with_fallback(Arc::new(HttpCompletionProvider::new(config)?));
        }

        Ok(client)
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    /// Generate a plan for `prompt`.
    pub async fn generate(
        &self,
        prompt: &str,
        context: &GenerationContext,
    ) -> Result<PlanDocument, AiError> {
        let messages = [
            ChatMessage::system(self.prompts.system_prompt(context.category)),
            ChatMessage::user(prompt),
        ];

        info!(
            "Generating {} plan with '{}' (fallback {})",
            context.category,
            self.primary.name(),
            if context.use_fallback { "enabled" } else { "disabled" }
        );

        let raw = match self.primary.complete(&messages).await {
            Ok(raw) => raw,
            Err(err) if err.is_transport() && context.use_fallback => {
                let Some(ref fallback) = self.fallback else {
                    warn!("Primary provider unreachable and no fallback configured: {}", err);
                    return Err(err);
                };
                warn!(
                    "Primary provider '{}' unreachable ({}), switching to '{}'",
                    self.primary.name(),
                    err,
                    fallback.name()
                );
                fallback.complete(&messages).await?
            }
            Err(err) => return Err(err),
        };

        debug!("Received {} bytes of plan content", raw.len());

        parse_plan(context.category, &raw)
    }
}
