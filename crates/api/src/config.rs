//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Default idle time after which a user's session is forgotten.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Bearer token required on plan routes. `None` disables authorization.
    pub api_token: Option<String>,
    /// Idle time after which a session that is not generating is dropped.
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PLAN_API_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `PLAN_API_TOKEN` | Bearer token for plan routes | (unset) |
    /// | `PLAN_API_SESSION_TTL_SECS` | Idle session lifetime | `1800` |
    ///
    /// Coordinator settings (payment, AI, pricing, `SQLITE_PATH`) are read by
    /// `PlanGenerationCoordinator::from_env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("PLAN_API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let api_token = env::var("PLAN_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let session_ttl = env::var("PLAN_API_SESSION_TTL_SECS")
            .ok()
            .and_then(|secs| secs.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SESSION_TTL);

        Ok(Self {
            addr,
            api_token,
            session_ttl,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PLAN_API_ADDR format")]
    InvalidAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        std::env::remove_var("PLAN_API_ADDR");
        std::env::remove_var("PLAN_API_TOKEN");
        std::env::remove_var("PLAN_API_SESSION_TTL_SECS");
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8790");
        assert!(config.api_token.is_none());
        assert_eq!(config.session_ttl, DEFAULT_SESSION_TTL);

        std::env::set_var("PLAN_API_SESSION_TTL_SECS", "60");
        assert_eq!(Config::from_env().unwrap().session_ttl, Duration::from_secs(60));
        std::env::set_var("PLAN_API_SESSION_TTL_SECS", "soon");
        assert_eq!(Config::from_env().unwrap().session_ttl, DEFAULT_SESSION_TTL);
        std::env::remove_var("PLAN_API_SESSION_TTL_SECS");

        std::env::set_var("PLAN_API_ADDR", "0.0.0.0:9000");
        std::env::set_var("PLAN_API_TOKEN", "secret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.api_token.as_deref(), Some("secret"));

        std::env::set_var("PLAN_API_TOKEN", "  ");
        assert!(Config::from_env().unwrap().api_token.is_none());

        std::env::set_var("PLAN_API_ADDR", "not an address");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidAddr)));

        std::env::remove_var("PLAN_API_ADDR");
        std::env::remove_var("PLAN_API_TOKEN");
    }
}
