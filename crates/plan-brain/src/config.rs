//! Configuration for AI plan providers.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

use plan_core::PlanCategory;
use tracing::{debug, info};

/// Default API URL for the primary provider.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default request timeout, in seconds. Plans are long and slow to generate.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for a single chat completion provider.
#[derive(Clone)]
pub struct AiProviderConfig {
    /// Name used in logs and errors.
    pub name: String,

    /// Base API URL; `/v1/chat/completions` is appended.
    pub api_url: String,

    /// API key for authentication. Empty means not configured.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for the response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AiProviderConfig {
    fn default() -> Self {
        Self {
            name: "primary".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: Some(4096),
            temperature: Some(0.7),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for AiProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiProviderConfig")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AiProviderConfig {
    /// Create the primary provider configuration from environment variables.
    ///
    /// - `PLAN_AI_PRIMARY_URL` - API URL (default: https://api.openai.com)
    /// - `PLAN_AI_PRIMARY_KEY` - API key (checked when a request is made)
    /// - `PLAN_AI_PRIMARY_MODEL` - Model name (default: gpt-4o-mini)
    ///
    /// plus the shared tuning variables, see [`apply_tuning_from_env`](Self::apply_tuning_from_env).
    pub fn primary_from_env() -> Self {
        Self::from_env_prefixed("PLAN_AI_PRIMARY", "primary")
    }

    /// Create the fallback provider configuration from environment variables.
    ///
    /// Returns `None` unless `PLAN_AI_FALLBACK_URL` or `PLAN_AI_FALLBACK_KEY`
    /// is set.
    pub fn fallback_from_env() -> Option<Self> {
        let configured = ["PLAN_AI_FALLBACK_URL", "PLAN_AI_FALLBACK_KEY"]
            .iter()
            .any(|name| env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false));

        if !configured {
            debug!("No fallback AI provider configured");
            return None;
        }

        Some(Self::from_env_prefixed("PLAN_AI_FALLBACK", "fallback"))
    }

    /// Read `{prefix}_URL`, `{prefix}_KEY` and `{prefix}_MODEL`.
    pub fn from_env_prefixed(prefix: &str, name: &str) -> Self {
        let api_url = env::var(format!("{}_URL", prefix))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_key = env::var(format!("{}_KEY", prefix)).unwrap_or_default();

        let model = env::var(format!("{}_MODEL", prefix))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            name: name.to_string(),
            api_url,
            api_key,
            model,
            ..Self::default()
        }
        .apply_tuning_from_env()
    }

    /// Apply the tuning variables shared by every provider.
    ///
    /// - `PLAN_AI_TEMPERATURE` - Temperature (default: 0.7)
    /// - `PLAN_AI_MAX_TOKENS` - Max tokens (default: 4096)
    /// - `PLAN_AI_TIMEOUT_SECS` - Request timeout (default: 120)
    pub fn apply_tuning_from_env(mut self) -> Self {
        if let Some(temperature) = env::var("PLAN_AI_TEMPERATURE").ok().and_then(|v| v.parse().ok()) {
            self.temperature = Some(temperature);
        }
        if let Some(max_tokens) = env::var("PLAN_AI_MAX_TOKENS").ok().and_then(|v| v.parse().ok()) {
            self.max_tokens = Some(max_tokens);
        }
        if let Some(timeout) = env::var("PLAN_AI_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()) {
            self.timeout_secs = timeout;
        }
        self
    }

    /// Create a new config builder.
    pub fn builder() -> AiProviderConfigBuilder {
        AiProviderConfigBuilder::default()
    }
}

/// Builder for AiProviderConfig.
#[derive(Debug, Default)]
pub struct AiProviderConfigBuilder {
    config: AiProviderConfig,
}

impl AiProviderConfigBuilder {
    /// Set the provider name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AiProviderConfig {
        self.config
    }
}

/// Per-category system prompts.
///
/// Built-in prompts can be overridden by `{meal,workout,rehab}.md` files in
/// a prompt directory.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    overrides: HashMap<PlanCategory, String>,
}

impl PromptLibrary {
    /// Built-in prompts only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from `PLAN_PROMPT_DIR`, if set.
    pub fn from_env() -> Self {
        match env::var("PLAN_PROMPT_DIR") {
            Ok(dir) if !dir.trim().is_empty() => Self::from_dir(dir),
            _ => Self::new(),
        }
    }

    /// Load overrides from a directory. Missing or empty files are skipped.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut overrides = HashMap::new();

        for category in PlanCategory::ALL {
            let path = dir.join(format!("{}.md", category.slug()));
            if let Some(prompt) = load_prompt_file(&path) {
                info!("Loaded {} prompt override from {}", category, path.display());
                overrides.insert(category, prompt);
            }
        }

        Self { overrides }
    }

    /// Override the prompt for one category.
    pub fn with_prompt(mut self, category: PlanCategory, prompt: impl Into<String>) -> Self {
        self.overrides.insert(category, prompt.into());
        self
    }

    /// The system prompt used for `category`.
    pub fn system_prompt(&self, category: PlanCategory) -> &str {
        self.overrides
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| builtin_prompt(category))
    }
}

fn builtin_prompt(category: PlanCategory) -> &'static str {
    match category {
        PlanCategory::Meal => include_str!("../prompts/meal.md"),
        PlanCategory::Workout => include_str!("../prompts/workout.md"),
        PlanCategory::Rehab => include_str!("../prompts/rehab.md"),
    }
}

/// Load a prompt file, returning None if not found or empty.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}
