//! Coordinator configuration.

use std::env;
use std::time::Duration;

use payment_gateway::PollConfig;
use plan_core::PlanCategory;
use tracing::warn;

/// Price of each plan category, in cents. Zero means the category is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    pub meal_cents: i64,
    pub workout_cents: i64,
    pub rehab_cents: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            meal_cents: 1990,
            workout_cents: 1990,
            rehab_cents: 2490,
        }
    }
}

impl PricingConfig {
    /// Every category free.
    pub fn free() -> Self {
        Self {
            meal_cents: 0,
            workout_cents: 0,
            rehab_cents: 0,
        }
    }

    /// Load prices from environment variables.
    ///
    /// - `PLAN_PRICE_MEAL_CENTS` (default: 1990)
    /// - `PLAN_PRICE_WORKOUT_CENTS` (default: 1990)
    /// - `PLAN_PRICE_REHAB_CENTS` (default: 2490)
    ///
    /// Negative or unparsable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            meal_cents: price_from_env("PLAN_PRICE_MEAL_CENTS", defaults.meal_cents),
            workout_cents: price_from_env("PLAN_PRICE_WORKOUT_CENTS", defaults.workout_cents),
            rehab_cents: price_from_env("PLAN_PRICE_REHAB_CENTS", defaults.rehab_cents),
        }
    }

    /// Set the price for one category.
    pub fn with_price(mut self, category: PlanCategory, cents: i64) -> Self {
        let cents = cents.max(0);
        match category {
            PlanCategory::Meal => self.meal_cents = cents,
            PlanCategory::Workout => self.workout_cents = cents,
            PlanCategory::Rehab => self.rehab_cents = cents,
        }
        self
    }

    pub fn price_for(&self, category: PlanCategory) -> i64 {
        match category {
            PlanCategory::Meal => self.meal_cents,
            PlanCategory::Workout => self.workout_cents,
            PlanCategory::Rehab => self.rehab_cents,
        }
    }

    pub fn requires_payment(&self, category: PlanCategory) -> bool {
        self.price_for(category) > 0
    }
}

fn price_from_env(name: &str, default: i64) -> i64 {
    match env::var(name) {
        Ok(value) => match value.trim().parse::<i64>() {
            Ok(cents) if cents >= 0 => cents,
            _ => {
                warn!("Ignoring invalid {}={:?}, using {}", name, value, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Settings for [`PlanGenerationCoordinator`](crate::PlanGenerationCoordinator).
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    pub pricing: PricingConfig,
    pub poll: PollConfig,
}

impl CoordinatorConfig {
    /// Load configuration from environment variables.
    ///
    /// Prices come from [`PricingConfig::from_env`]; polling from
    /// `PLAN_POLL_INTERVAL_SECS` (default: 5) and `PLAN_POLL_MAX_SECS`
    /// (default: 600).
    pub fn from_env() -> Self {
        let defaults = PollConfig::default();

        let interval = env::var("PLAN_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.interval);

        let max_duration = env::var("PLAN_POLL_MAX_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_duration);

        Self {
            pricing: PricingConfig::from_env(),
            poll: PollConfig {
                interval,
                max_duration,
            },
        }
    }

    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }
}
