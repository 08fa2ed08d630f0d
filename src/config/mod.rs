// src/config/mod.rs
//! Runtime configuration, read once at startup and passed down explicitly.

pub mod ai;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub use ai::{AiConfig, Credential};

pub const ENV_FETCH_TIMEOUT_SECS: &str = "NEWS_FETCH_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "NEWS_USER_AGENT";
pub const ENV_ARTIFACT_PATH: &str = "NEWS_ARTIFACT_PATH";
pub const ENV_SOURCES_PATH: &str = "NEWS_SOURCES_PATH";
pub const ENV_CACHE_TTL_SECS: &str = "NEWS_CACHE_TTL_SECS";
pub const ENV_RUN_DEADLINE_SECS: &str = "NEWS_RUN_DEADLINE_SECS";

pub const DEFAULT_ARTIFACT_PATH: &str = "data/generated_news.ts";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

pub fn default_user_agent() -> String {
    format!(
        "news-brief/{} (+personal dashboard news pipeline)",
        env!("CARGO_PKG_VERSION")
    )
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub user_agent: String,
    pub fetch_timeout: Duration,
    /// On-demand fetch cache window.
    pub cache_ttl: Duration,
    /// Optional bound on the whole fetch stage.
    pub run_deadline: Option<Duration>,
    pub artifact_path: PathBuf,
    pub sources_path: Option<PathBuf>,
    pub ai: AiConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            run_deadline: None,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            sources_path: None,
            ai: AiConfig::default(),
        }
    }
}

fn parse_secs(raw: Option<String>) -> Option<Duration> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
        .map(Duration::from_secs)
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let d = PipelineConfig::default();
        PipelineConfig {
            user_agent: get(ENV_USER_AGENT)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(d.user_agent),
            fetch_timeout: parse_secs(get(ENV_FETCH_TIMEOUT_SECS)).unwrap_or(d.fetch_timeout),
            cache_ttl: parse_secs(get(ENV_CACHE_TTL_SECS)).unwrap_or(d.cache_ttl),
            run_deadline: parse_secs(get(ENV_RUN_DEADLINE_SECS)),
            artifact_path: get(ENV_ARTIFACT_PATH)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(d.artifact_path),
            sources_path: get(ENV_SOURCES_PATH)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            ai: AiConfig::from_lookup(&get),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_env_empty() {
        let cfg = PipelineConfig::from_lookup(|_| None);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(3600));
        assert!(cfg.run_deadline.is_none());
        assert!(cfg.user_agent.starts_with("news-brief/"));
        assert_eq!(cfg.artifact_path, PathBuf::from(DEFAULT_ARTIFACT_PATH));
        assert!(!cfg.ai.credential.is_present());
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let cfg = PipelineConfig::from_lookup(|k| match k {
            ENV_FETCH_TIMEOUT_SECS => Some("abc".into()),
            ENV_RUN_DEADLINE_SECS => Some("0".into()),
            ENV_CACHE_TTL_SECS => Some("60".into()),
            _ => None,
        });
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert!(cfg.run_deadline.is_none());
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
    }

    #[serial_test::serial]
    #[test]
    fn from_env_reads_process_environment() {
        env::set_var(ENV_FETCH_TIMEOUT_SECS, "7");
        env::set_var(ENV_RUN_DEADLINE_SECS, "20");
        env::set_var(ENV_SOURCES_PATH, "  ");
        let cfg = PipelineConfig::from_env();
        env::remove_var(ENV_FETCH_TIMEOUT_SECS);
        env::remove_var(ENV_RUN_DEADLINE_SECS);
        env::remove_var(ENV_SOURCES_PATH);

        assert_eq!(cfg.fetch_timeout, Duration::from_secs(7));
        assert_eq!(cfg.run_deadline, Some(Duration::from_secs(20)));
        assert!(cfg.sources_path.is_none());
    }
}
