use std::{fmt, time::Duration};

use anyhow::Context;

use crate::indicators::RetryPolicy;

pub const DEFAULT_MINDICADOR_URL: &str = "https://mindicador.cl";

/// Connection parameters for the backing store.
#[derive(Clone)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    /// `host[:port]/database` or a full `postgres://` URL.
    pub dsn: String,
    pub max_connections: u32,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dsn", &self.dsn)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MINDICADOR_URL.into(),
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub provider: ProviderConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("environment variable {key} is not set"))
        };
        let parsed = |key: &str, default: u64| -> anyhow::Result<u64> {
            match get(key) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{key} must be a non-negative integer, got {v:?}")),
                None => Ok(default),
            }
        };

        let parsed_u32 = |key: &str, default: u32| -> anyhow::Result<u32> {
            u32::try_from(parsed(key, u64::from(default))?)
                .with_context(|| format!("{key} is too large"))
        };

        let db = DbConfig {
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            dsn: required("DB_DSN")?,
            max_connections: parsed_u32("DB_MAX_CONNECTIONS", 5)?,
        };

        let defaults = RetryPolicy::default();
        let provider = ProviderConfig {
            base_url: get("MINDICADOR_BASE_URL").unwrap_or_else(|| DEFAULT_MINDICADOR_URL.into()),
            timeout: Duration::from_secs(parsed("PROVIDER_TIMEOUT_SECS", 5)?),
            retry: RetryPolicy {
                max_attempts: parsed_u32("PROVIDER_MAX_ATTEMPTS", defaults.max_attempts)?,
                base_delay: Duration::from_millis(parsed(
                    "PROVIDER_BACKOFF_MS",
                    defaults.base_delay.as_millis() as u64,
                )?),
            },
        };

        Ok(Self { db, provider })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_required_and_default_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DB_USER", "eco"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_DSN", "localhost:5432/ecotech"),
        ]))
        .unwrap();

        assert_eq!(config.db.user, "eco");
        assert_eq!(config.db.dsn, "localhost:5432/ecotech");
        assert_eq!(config.db.max_connections, 5);
        assert_eq!(config.provider.base_url, DEFAULT_MINDICADOR_URL);
        assert_eq!(config.provider.timeout, Duration::from_secs(5));
        assert_eq!(config.provider.retry.max_attempts, 3);
    }

    #[test]
    fn overrides_provider_settings() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DB_USER", "eco"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_DSN", "db/ecotech"),
            ("MINDICADOR_BASE_URL", "http://127.0.0.1:9999"),
            ("PROVIDER_TIMEOUT_SECS", "2"),
            ("PROVIDER_MAX_ATTEMPTS", "1"),
            ("PROVIDER_BACKOFF_MS", "50"),
        ]))
        .unwrap();

        assert_eq!(config.provider.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.provider.timeout, Duration::from_secs(2));
        assert_eq!(config.provider.retry.max_attempts, 1);
        assert_eq!(config.provider.retry.base_delay, Duration::from_millis(50));
    }

    #[test]
    fn out_of_range_counts_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DB_USER", "eco"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_DSN", "db/ecotech"),
            ("PROVIDER_MAX_ATTEMPTS", "4294967297"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PROVIDER_MAX_ATTEMPTS"));

        let err = AppConfig::from_lookup(lookup(&[
            ("DB_USER", "eco"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_DSN", "db/ecotech"),
            ("DB_MAX_CONNECTIONS", "4294967296"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn missing_credentials_fail() {
        let err = AppConfig::from_lookup(lookup(&[("DB_USER", "eco")])).unwrap_err();
        assert!(err.to_string().contains("DB_PASSWORD"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DB_USER", "eco"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_DSN", "db/ecotech"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
    }
}
