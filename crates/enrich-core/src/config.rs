use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Environment variable that overrides `[lookup] api_key`.
pub const API_KEY_ENV: &str = "ENRICH_API_KEY";

/// Retry parameters for lookups (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of lookup attempts per key (including the first).
    pub max_attempts: u32,
    /// Fixed wait in seconds after each failed attempt.
    pub delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 5.0,
        }
    }
}

impl RetryConfig {
    /// Build the policy. `delay_secs` must be finite and fit a `Duration`;
    /// negative values count as zero.
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        let delay = Duration::try_from_secs_f64(self.delay_secs.max(0.0))
            .map_err(|e| anyhow::anyhow!("invalid [retry] delay_secs {}: {}", self.delay_secs, e))?;
        Ok(RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            delay,
        })
    }
}

/// Remote rating service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Endpoint queried with `?t=<key>&apikey=<key>`.
    pub base_url: String,
    /// Service credential; `ENRICH_API_KEY` takes precedence when set.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.omdbapi.com/".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl LookupConfig {
    /// API key from the environment, falling back to the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }
}

/// Global configuration loaded from `~/.config/enrich/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Number of rows per work batch (also the unit of progress flush).
    pub batch_size: usize,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Input column holding the lookup key.
    pub key_column: String,
    /// Name of the column appended to the output table.
    pub output_column: String,
    /// Re-fetch rows recorded without a value on a previous run.
    #[serde(default)]
    pub retry_misses: bool,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            workers: 4,
            key_column: "title".to_string(),
            output_column: "IMDB_Rating".to_string(),
            retry_misses: false,
            retry: RetryConfig::default(),
            lookup: LookupConfig::default(),
        }
    }
}

impl EnrichConfig {
    /// Batch size clamped to at least 1.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    /// Worker count clamped to at least 1.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("enrich")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EnrichConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<EnrichConfig> {
    if !path.exists() {
        let default_cfg = EnrichConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: EnrichConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.retry
        .to_policy()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = EnrichConfig::default();
        assert_eq!(cfg.batch_size, 5);
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.key_column, "title");
        assert_eq!(cfg.output_column, "IMDB_Rating");
        assert!(!cfg.retry_misses);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert!((cfg.retry.delay_secs - 5.0).abs() < 1e-9);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = EnrichConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EnrichConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.batch_size, cfg.batch_size);
        assert_eq!(parsed.workers, cfg.workers);
        assert_eq!(parsed.key_column, cfg.key_column);
        assert_eq!(parsed.lookup.base_url, cfg.lookup.base_url);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            batch_size = 10
            workers = 2
            key_column = "name"
            output_column = "Score"
            retry_misses = true

            [retry]
            max_attempts = 5
            delay_secs = 0.5

            [lookup]
            base_url = "http://localhost:8080/"
            api_key = "abc123"
            timeout_secs = 5
        "#;
        let cfg: EnrichConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.key_column, "name");
        assert_eq!(cfg.output_column, "Score");
        assert!(cfg.retry_misses);
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.lookup.api_key.as_deref(), Some("abc123"));
        assert_eq!(cfg.lookup.timeout_secs, 5);
    }

    #[test]
    fn config_toml_sections_optional() {
        let toml = r#"
            batch_size = 5
            workers = 4
            key_column = "title"
            output_column = "IMDB_Rating"
        "#;
        let cfg: EnrichConfig = toml::from_str(toml).unwrap();
        assert!(!cfg.retry_misses);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert!(cfg.lookup.api_key.is_none());
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let cfg = EnrichConfig {
            batch_size: 0,
            workers: 0,
            ..EnrichConfig::default()
        };
        assert_eq!(cfg.effective_batch_size(), 1);
        assert_eq!(cfg.effective_workers(), 1);
    }

    #[test]
    fn retry_config_to_policy() {
        let rc = RetryConfig {
            max_attempts: 0,
            delay_secs: 0.25,
        };
        let p = rc.to_policy().unwrap();
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.delay, Duration::from_millis(250));
    }

    #[test]
    fn unrepresentable_retry_delay_is_an_error() {
        for delay_secs in [f64::INFINITY, 1e30] {
            let rc = RetryConfig {
                max_attempts: 3,
                delay_secs,
            };
            assert!(rc.to_policy().is_err(), "delay_secs = {}", delay_secs);
        }
        let negative = RetryConfig {
            max_attempts: 3,
            delay_secs: -1.0,
        };
        assert_eq!(negative.to_policy().unwrap().delay, Duration::ZERO);
    }

    #[test]
    fn load_rejects_infinite_retry_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "batch_size = 5\nworkers = 4\nkey_column = \"title\"\noutput_column = \"IMDB_Rating\"\n\n[retry]\nmax_attempts = 3\ndelay_secs = inf\n",
        )
        .unwrap();

        let err = load_or_init_at(&path).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("invalid config"), "{}", msg);
        assert!(msg.contains("delay_secs"), "{}", msg);
    }

    #[test]
    fn load_or_init_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.batch_size, 5);
        let again = load_or_init_at(&path).unwrap();
        assert_eq!(again.workers, 4);
    }
}
