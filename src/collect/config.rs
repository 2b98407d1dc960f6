// src/collect/config.rs
//
// Collector behavior as data: timeouts, pacing, variant suffixes, microblog
// instances, and the fallback toggle live in one TOML file so per-source
// retry/fallback policy is configuration, not copy-pasted control flow.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_COLLECTORS_CONFIG_PATH: &str = "config/collectors.toml";
pub const ENV_COLLECTORS_CONFIG_PATH: &str = "COLLECTORS_CONFIG_PATH";

fn default_timeout_secs() -> u64 {
    12
}
fn default_gateway_deadline_secs() -> u64 {
    15
}
fn default_pacing_ms() -> u64 {
    500
}
fn default_max_results() -> usize {
    50
}
fn default_response_cap() -> usize {
    20
}
fn default_fallback_enabled() -> bool {
    true
}
fn default_social_suffixes() -> Vec<String> {
    ["company", "review", "experience", "product", "service"]
        .map(String::from)
        .to_vec()
}
fn default_news_suffixes() -> Vec<String> {
    ["company", "business", "technology", "innovation"]
        .map(String::from)
        .to_vec()
}
fn default_microblog_instances() -> Vec<String> {
    [
        "mastodon.social",
        "mastodon.online",
        "fosstodon.org",
        "mastodon.xyz",
    ]
    .map(String::from)
    .to_vec()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSettings {
    /// Per-call upstream timeout, seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overall budget the gateway grants each collector task. On expiry the
    /// request proceeds with whatever subset has resolved.
    #[serde(default = "default_gateway_deadline_secs")]
    pub gateway_deadline_secs: u64,
    /// Sleep between variant queries against the same upstream.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Stop broadening queries once this many raw items were found.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Mentions included per source in API responses.
    #[serde(default = "default_response_cap")]
    pub response_cap: usize,
    /// When true, reachability failures and empty results resolve to the
    /// fixture dataset (tagged `is_fallback`) instead of `Unavailable`.
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,
    #[serde(default = "default_social_suffixes")]
    pub social_suffixes: Vec<String>,
    #[serde(default = "default_news_suffixes")]
    pub news_suffixes: Vec<String>,
    #[serde(default = "default_microblog_instances")]
    pub microblog_instances: Vec<String>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        toml::from_str("").expect("defaults deserialize")
    }
}

impl CollectorSettings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing collector settings TOML")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading collector settings from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using `$COLLECTORS_CONFIG_PATH`, then `config/collectors.toml`,
    /// then built-in defaults. A broken file falls back to defaults with a
    /// warning rather than failing startup.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_COLLECTORS_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_COLLECTORS_CONFIG_PATH));
        if path.exists() {
            match Self::from_file(&path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(error = ?e, path = %path.display(), "collector settings unreadable, using defaults");
                }
            }
        }
        Self::default()
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn pacing(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.pacing_ms)
    }

    pub fn gateway_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.gateway_deadline_secs)
    }
}
