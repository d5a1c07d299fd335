//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Maximum number of concurrently active (non-terminal) tasks.
    pub max_active_tasks: usize,
    /// Per-task agent execution timeout.
    pub task_timeout: Duration,
    /// Running tasks whose last update is older than this are treated as
    /// orphaned and failed by the staleness sweeper.
    pub stale_threshold: Duration,
    /// Interval between staleness / expiry sweeps.
    pub sweep_interval: Duration,
    /// Terminal tasks older than this are pruned from the registry.
    pub task_retention: Duration,
    /// Default time-to-live for appended memory items (None = no expiry).
    pub memory_item_ttl: Option<Duration>,
    /// Upstream agent endpoint. When unset, the built-in static agent is used.
    pub agent_endpoint: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            max_active_tasks: 10,
            task_timeout: Duration::from_secs(300),
            stale_threshold: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
            task_retention: Duration::from_secs(24 * 3600),
            memory_item_ttl: None,
            agent_endpoint: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `RESEARCH_ASSIST_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("RESEARCH_ASSIST_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(n) = env_parse::<usize>("RESEARCH_ASSIST_MAX_ACTIVE_TASKS")? {
            if n == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "RESEARCH_ASSIST_MAX_ACTIVE_TASKS".to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
            config.max_active_tasks = n;
        }
        if let Some(secs) = env_parse::<u64>("RESEARCH_ASSIST_TASK_TIMEOUT_SECS")? {
            config.task_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("RESEARCH_ASSIST_STALE_THRESHOLD_SECS")? {
            config.stale_threshold = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("RESEARCH_ASSIST_SWEEP_INTERVAL_SECS")? {
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("RESEARCH_ASSIST_TASK_RETENTION_SECS")? {
            config.task_retention = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("RESEARCH_ASSIST_MEMORY_TTL_SECS")? {
            config.memory_item_ttl = Some(Duration::from_secs(secs));
        }
        if let Ok(url) = std::env::var("RESEARCH_ASSIST_AGENT_ENDPOINT") {
            if !url.trim().is_empty() {
                config.agent_endpoint = Some(url);
            }
        }

        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("could not parse {raw:?}"),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_active_tasks, 10);
        assert!(config.agent_endpoint.is_none());
        assert!(config.memory_item_ttl.is_none());
    }
}
