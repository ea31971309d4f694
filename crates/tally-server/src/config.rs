use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Result, anyhow, bail};
use tracing::debug;

use tally_db::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Redis,
    Memory,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Backend::Redis),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("unknown backend '{other}' (expected redis or memory)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub redis_url: String,
    pub queue_capacity: usize,
    pub block_timeout: Duration,
    pub max_block_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let load = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| {
                debug!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let queue_capacity: usize = parse(
            "TALLY_QUEUE_CAPACITY",
            &load("TALLY_QUEUE_CAPACITY", &DEFAULT_QUEUE_CAPACITY.to_string()),
        )?;
        if queue_capacity == 0 {
            bail!("TALLY_QUEUE_CAPACITY must be at least 1");
        }

        let block_secs: u64 = parse("TALLY_BLOCK_TIMEOUT_SECS", &load("TALLY_BLOCK_TIMEOUT_SECS", "5"))?;
        let max_block_secs: u64 = parse(
            "TALLY_MAX_BLOCK_TIMEOUT_SECS",
            &load("TALLY_MAX_BLOCK_TIMEOUT_SECS", "30"),
        )?;
        if block_secs == 0 || max_block_secs == 0 {
            bail!("Blocking timeouts must be at least one second");
        }
        if block_secs > max_block_secs {
            bail!(
                "TALLY_BLOCK_TIMEOUT_SECS ({block_secs}) exceeds TALLY_MAX_BLOCK_TIMEOUT_SECS ({max_block_secs})"
            );
        }

        Ok(Self {
            host: load("TALLY_HOST", "0.0.0.0"),
            port: parse("TALLY_PORT", &load("TALLY_PORT", "3000"))?,
            backend: parse("TALLY_BACKEND", &load("TALLY_BACKEND", "redis"))?,
            redis_url: load("TALLY_REDIS_URL", "redis://127.0.0.1:6379"),
            queue_capacity,
            block_timeout: Duration::from_secs(block_secs),
            max_block_timeout: Duration::from_secs(max_block_secs),
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.backend, Backend::Redis);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.block_timeout, Duration::from_secs(5));
        assert_eq!(config.max_block_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("TALLY_PORT", "8080"),
            ("TALLY_BACKEND", "Memory"),
            ("TALLY_QUEUE_CAPACITY", "10"),
            ("TALLY_BLOCK_TIMEOUT_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.block_timeout, Duration::from_secs(2));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("TALLY_PORT", "not-a-port")]).is_err());
        assert!(config(&[("TALLY_BACKEND", "postgres")]).is_err());
        assert!(config(&[("TALLY_QUEUE_CAPACITY", "0")]).is_err());
        assert!(config(&[("TALLY_BLOCK_TIMEOUT_SECS", "60")]).is_err());
    }
}
