use crate::client::{PollBudget, CREATE_TIMEOUT};
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub port: u16,
    pub frontend_dir: String,
    pub payment_api_url: String,
    pub create_timeout: Duration,
    /// Status page follow-up polling.
    pub status_poll: PollBudget,
    /// Waiting for the outcome right after checkout.
    pub checkout_poll: PollBudget,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            frontend_dir: "frontend/dist".to_string(),
            payment_api_url: "http://localhost:8000/api".to_string(),
            create_timeout: CREATE_TIMEOUT,
            status_poll: PollBudget::STATUS_PAGE,
            checkout_poll: PollBudget::CHECKOUT_WAIT,
        }
    }
}

impl SiteConfig {
    /// Reads the environment; `.env` is loaded beforehand by the binary.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|value| {
                    u64::from_str(value.trim())
                        .with_context(|| format!("{key} must be a whole number, got: {value}"))
                })
                .transpose()
        };
        let millis = |key: &str, default: Duration| -> Result<Duration> {
            Ok(parsed(key)?.map(Duration::from_millis).unwrap_or(default))
        };
        let attempts = |key: &str, default: u32| -> Result<u32> {
            parsed(key)?
                .map(|value| u32::try_from(value).with_context(|| format!("{key} is too large")))
                .transpose()
                .map(|value| value.unwrap_or(default))
        };

        let port = parsed("PORT")?
            .map(|value| u16::try_from(value).with_context(|| format!("Invalid port: {value}")))
            .transpose()?
            .unwrap_or(defaults.port);

        Ok(Self {
            port,
            frontend_dir: lookup("FRONTEND_DIR").unwrap_or(defaults.frontend_dir),
            payment_api_url: lookup("PAYMENT_API_URL").unwrap_or(defaults.payment_api_url),
            create_timeout: millis("PAYMENT_CREATE_TIMEOUT_MS", defaults.create_timeout)?,
            status_poll: PollBudget {
                max_attempts: attempts("STATUS_POLL_ATTEMPTS", defaults.status_poll.max_attempts)?,
                interval: millis("STATUS_POLL_INTERVAL_MS", defaults.status_poll.interval)?,
                ..defaults.status_poll
            },
            checkout_poll: PollBudget {
                max_attempts: attempts(
                    "CHECKOUT_POLL_ATTEMPTS",
                    defaults.checkout_poll.max_attempts,
                )?,
                interval: millis("CHECKOUT_POLL_INTERVAL_MS", defaults.checkout_poll.interval)?,
                ..defaults.checkout_poll
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<SiteConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SiteConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.status_poll.max_attempts, 5);
        assert_eq!(config.checkout_poll.max_attempts, 30);
        assert_eq!(config.create_timeout, Duration::from_secs(15));
    }

    #[test]
    fn poll_budgets_are_configured_separately() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("STATUS_POLL_ATTEMPTS", "7"),
            ("CHECKOUT_POLL_INTERVAL_MS", "500"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.status_poll.max_attempts, 7);
        assert_eq!(config.status_poll.interval, Duration::from_secs(3));
        assert!(config.status_poll.delay_first);
        assert_eq!(config.checkout_poll.max_attempts, 30);
        assert_eq!(config.checkout_poll.interval, Duration::from_millis(500));
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("PORT", "70000")]).is_err());
        assert!(config_from(&[("STATUS_POLL_ATTEMPTS", "-1")]).is_err());
    }
}
