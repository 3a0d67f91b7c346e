//! Server configuration from environment.

use std::env;
use std::time::Duration;

use repeater_search::SearchConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_port: u16,
    /// Tasks disappear this long after their last update.
    pub task_ttl: Duration,
    pub task_prune_interval: Duration,
    pub max_tracked_tasks: usize,
    pub max_concurrent_searches: usize,
    pub search: SearchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            task_ttl: Duration::from_secs(3600),
            task_prune_interval: Duration::from_secs(60),
            max_tracked_tasks: 1000,
            max_concurrent_searches: 4,
            search: SearchConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_parse("REPEATER_PORT").unwrap_or(defaults.server_port),
            task_ttl: env_parse("TASK_TTL_S")
                .map(Duration::from_secs)
                .unwrap_or(defaults.task_ttl),
            task_prune_interval: env_parse("TASK_PRUNE_INTERVAL_S")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.task_prune_interval),
            max_tracked_tasks: env_parse("MAX_TRACKED_TASKS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_tracked_tasks),
            max_concurrent_searches: env_parse("MAX_CONCURRENT_SEARCHES")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_searches),
            search: SearchConfig::from_env(),
        }
    }

    /// Non-terminal tasks allowed before new submissions are refused.
    pub fn max_pending_searches(&self) -> usize {
        self.max_concurrent_searches.saturating_mul(4)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
