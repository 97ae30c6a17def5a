use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// What `DELETE /todo` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearScope {
    /// Drop the key list, then FLUSHDB the whole database.
    #[default]
    Flush,
    /// Remove only the items named in the key list.
    Todos,
}

impl FromStr for ClearScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flush" => Ok(Self::Flush),
            "todos" => Ok(Self::Todos),
            other => bail!("unknown clear scope {other:?}, expected \"flush\" or \"todos\""),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub service_host: String,
    pub service_port: u16,
    pub store_timeout: Duration,
    pub public_url: Option<String>,
    pub clear_scope: ClearScope,
}

pub const MEMORY_URL: &str = "memory://";

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

        let service_host = lookup("SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let service_port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let timeout_ms = lookup("TODO_STORE_TIMEOUT_MS")
            .unwrap_or_else(|| "2000".to_string())
            .parse::<u64>()
            .context("TODO_STORE_TIMEOUT_MS must be a whole number of milliseconds")?;
        if timeout_ms == 0 {
            bail!("TODO_STORE_TIMEOUT_MS must be greater than zero");
        }

        let public_url = lookup("TODO_PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let clear_scope = match lookup("TODO_CLEAR_SCOPE") {
            Some(raw) => raw.parse::<ClearScope>().context("invalid TODO_CLEAR_SCOPE")?,
            None => ClearScope::default(),
        };

        Ok(Config {
            redis_url,
            service_host,
            service_port,
            store_timeout: Duration::from_millis(timeout_ms),
            public_url,
            clear_scope,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.redis_url.starts_with(MEMORY_URL)
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Store: {}", if self.uses_memory_store() { "in-process memory" } else { self.redis_url.as_str() });
        tracing::info!("  Store round-trip timeout: {:?}", self.store_timeout);
        tracing::info!("  Public url: {}", self.public_url.as_deref().unwrap_or("derived from Host header"));
        tracing::info!("  Clear scope: {:?}", self.clear_scope);
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.service_host, "0.0.0.0");
        assert_eq!(config.service_port, 8000);
        assert_eq!(config.store_timeout, Duration::from_secs(2));
        assert_eq!(config.public_url, None);
        assert_eq!(config.clear_scope, ClearScope::Flush);
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("REDIS_URL", "memory://"),
            ("SERVICE_PORT", "9090"),
            ("TODO_STORE_TIMEOUT_MS", "150"),
            ("TODO_PUBLIC_URL", "https://todo.example.com/"),
            ("TODO_CLEAR_SCOPE", "Todos"),
        ])
        .unwrap();
        assert!(config.uses_memory_store());
        assert_eq!(config.service_port, 9090);
        assert_eq!(config.store_timeout, Duration::from_millis(150));
        assert_eq!(config.public_url.as_deref(), Some("https://todo.example.com"));
        assert_eq!(config.clear_scope, ClearScope::Todos);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = config(&[("SERVICE_PORT", "99999")]).unwrap_err();
        assert!(err.to_string().contains("SERVICE_PORT"));
        assert!(config(&[("TODO_STORE_TIMEOUT_MS", "0")]).is_err());
        assert!(config(&[("TODO_STORE_TIMEOUT_MS", "soon")]).is_err());
        assert!(config(&[("TODO_CLEAR_SCOPE", "everything")]).is_err());
    }
}
