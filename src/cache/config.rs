//! Configuration for the cache system

use crate::cache::ttl::TtlPolicy;
use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable: background GC interval in seconds
pub const ENV_GC_INTERVAL_SECS: &str = "CONTEXT_CACHE_GC_INTERVAL_SECS";
/// Environment variable: `true`/`false` toggle for the background GC task
pub const ENV_AUTO_GC: &str = "CONTEXT_CACHE_AUTO_GC";
/// Environment variable: context stack TTL in seconds
pub const ENV_STACK_TTL_SECS: &str = "CONTEXT_CACHE_STACK_TTL_SECS";
/// Environment variable: session ledger TTL in seconds
pub const ENV_SESSION_TTL_SECS: &str = "CONTEXT_CACHE_SESSION_TTL_SECS";
/// Environment variable: comma separated repository-doc file names
pub const ENV_REPO_DOC_FILES: &str = "CONTEXT_CACHE_REPO_DOC_FILES";

/// Configuration for the context cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetimes per layer kind, stack and session
    pub ttl_policy: TtlPolicy,

    /// Run the background GC task (see `start_auto_gc`)
    pub enable_auto_gc: bool,

    /// Interval between background GC sweeps
    pub gc_interval: Duration,

    /// File names that count as repository docs for push invalidation
    /// Matched against the base name of each changed path
    pub repo_doc_files: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_policy: TtlPolicy::default(),
            enable_auto_gc: true,
            // Sweep every 5 minutes
            gc_interval: Duration::from_secs(300),
            repo_doc_files: vec!["CLAUDE.md".to_string()],
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.gc_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "gc_interval must be greater than 0".to_string(),
            ));
        }

        if self.repo_doc_files.iter().any(|name| name.trim().is_empty()) {
            return Err(CacheError::InvalidConfig(
                "repo_doc_files must not contain empty names".to_string(),
            ));
        }

        self.ttl_policy.validate().map_err(CacheError::InvalidConfig)
    }

    /// Load configuration from the process environment (and `.env` if present),
    /// falling back to defaults for unset variables
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = CacheConfig::builder();

        if let Some(secs) = parse_secs(&lookup, ENV_GC_INTERVAL_SECS)? {
            builder = builder.gc_interval(secs);
        }

        if let Some(raw) = lookup(ENV_AUTO_GC) {
            let enable = raw.trim().parse::<bool>().map_err(|_| {
                CacheError::InvalidConfig(format!("{} must be true or false, got {:?}", ENV_AUTO_GC, raw))
            })?;
            builder = builder.enable_auto_gc(enable);
        }

        if let Some(secs) = parse_secs(&lookup, ENV_STACK_TTL_SECS)? {
            builder = builder.context_stack_ttl(secs);
        }

        if let Some(secs) = parse_secs(&lookup, ENV_SESSION_TTL_SECS)? {
            builder = builder.session_ttl(secs);
        }

        if let Some(raw) = lookup(ENV_REPO_DOC_FILES) {
            let files = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
            builder = builder.repo_doc_files(files);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}

fn parse_secs<F>(lookup: &F, name: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| {
                CacheError::InvalidConfig(format!("{} must be a number of seconds, got {:?}", name, raw))
            }),
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    ttl_policy: Option<TtlPolicy>,
    context_stack_ttl: Option<Duration>,
    session_ttl: Option<Duration>,
    enable_auto_gc: Option<bool>,
    gc_interval: Option<Duration>,
    repo_doc_files: Option<Vec<String>>,
}

impl CacheConfigBuilder {
    /// Replace the whole TTL policy
    pub fn ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = Some(policy);
        self
    }

    /// Override the assembled-stack TTL only
    pub fn context_stack_ttl(mut self, ttl: Duration) -> Self {
        self.context_stack_ttl = Some(ttl);
        self
    }

    /// Override the session ledger TTL only
    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Enable or disable the background GC task
    pub fn enable_auto_gc(mut self, enable: bool) -> Self {
        self.enable_auto_gc = Some(enable);
        self
    }

    /// Set GC interval
    pub fn gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = Some(interval);
        self
    }

    /// Set the repository-doc file names watched on push
    pub fn repo_doc_files(mut self, files: Vec<String>) -> Self {
        self.repo_doc_files = Some(files);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        let mut ttl_policy = self.ttl_policy.unwrap_or(defaults.ttl_policy);
        if let Some(ttl) = self.context_stack_ttl {
            ttl_policy.context_stack = ttl;
        }
        if let Some(ttl) = self.session_ttl {
            ttl_policy.session = ttl;
        }

        CacheConfig {
            ttl_policy,
            enable_auto_gc: self.enable_auto_gc.unwrap_or(defaults.enable_auto_gc),
            gc_interval: self.gc_interval.unwrap_or(defaults.gc_interval),
            repo_doc_files: self.repo_doc_files.unwrap_or(defaults.repo_doc_files),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ttl::{CONTEXT_STACK_TTL, SESSION_TTL};
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.gc_interval, Duration::from_secs(300));
        assert_eq!(config.ttl_policy.context_stack, CONTEXT_STACK_TTL);
        assert_eq!(config.repo_doc_files, vec!["CLAUDE.md".to_string()]);
        assert!(config.enable_auto_gc);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid_config = CacheConfig::default();
        invalid_config.gc_interval = Duration::ZERO;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.repo_doc_files = vec![" ".to_string()];
        assert!(invalid_config.validate().is_err());

        let invalid_config = CacheConfig::builder()
            .session_ttl(Duration::ZERO)
            .build();
        assert!(matches!(
            invalid_config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .context_stack_ttl(Duration::from_secs(30))
            .gc_interval(Duration::from_secs(60))
            .enable_auto_gc(false)
            .repo_doc_files(vec!["CLAUDE.md".to_string(), "AGENTS.md".to_string()])
            .build();

        assert_eq!(config.ttl_policy.context_stack, Duration::from_secs(30));
        assert_eq!(config.ttl_policy.session, SESSION_TTL);
        assert_eq!(config.gc_interval, Duration::from_secs(60));
        assert!(!config.enable_auto_gc);
        assert_eq!(config.repo_doc_files.len(), 2);
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            (ENV_GC_INTERVAL_SECS, "30"),
            (ENV_AUTO_GC, "false"),
            (ENV_STACK_TTL_SECS, "45"),
            (ENV_SESSION_TTL_SECS, "7200"),
            (ENV_REPO_DOC_FILES, "CLAUDE.md, AGENTS.md,"),
        ]))
        .unwrap();

        assert_eq!(config.gc_interval, Duration::from_secs(30));
        assert!(!config.enable_auto_gc);
        assert_eq!(config.ttl_policy.context_stack, Duration::from_secs(45));
        assert_eq!(config.ttl_policy.session, Duration::from_secs(7200));
        assert_eq!(
            config.repo_doc_files,
            vec!["CLAUDE.md".to_string(), "AGENTS.md".to_string()]
        );
    }

    #[test]
    fn test_from_lookup_defaults_and_errors() {
        let config = CacheConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.gc_interval, CacheConfig::default().gc_interval);

        let err = CacheConfig::from_lookup(lookup_from(&[(ENV_GC_INTERVAL_SECS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_GC_INTERVAL_SECS));

        let err = CacheConfig::from_lookup(lookup_from(&[(ENV_AUTO_GC, "maybe")])).unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(_)));

        assert!(CacheConfig::from_lookup(lookup_from(&[(ENV_GC_INTERVAL_SECS, "0")])).is_err());
    }
}
