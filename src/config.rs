//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api_cache::TtlPolicy;
use crate::booking::{RetryPolicy, WizardSettings};

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Sliding lifetime of each booking step record, in milliseconds
    pub step_ttl_ms: u64,
    /// Lifetime of a session's current-step pointer, in milliseconds
    pub session_ttl_ms: u64,
    /// Interval between expiry sweeps, in milliseconds
    pub sweep_interval_ms: u64,
    /// TTL for cache namespaces without their own entry, in milliseconds
    pub default_cache_ttl_ms: u64,
    /// Serve expired API entries while refetching them
    pub stale_while_revalidate: bool,
    /// How long expired API entries stay available as stale, in milliseconds
    pub stale_retention_ms: u64,
    /// Total submission attempts, including the first
    pub submit_max_attempts: u32,
    /// Backoff base between submission attempts, in milliseconds
    pub submit_base_delay_ms: u64,
    /// Share of simulated submissions that fail, 0.0 to 1.0
    pub simulated_failure_rate: f64,
    /// Simulated submission latency, in milliseconds
    pub simulated_latency_ms: u64,
    /// JSON file for persistent storage; in memory when unset
    pub storage_path: Option<PathBuf>,
    /// Storage quota in bytes
    pub storage_quota_bytes: usize,
    /// Base URL of the studio backend for read-through requests
    pub upstream_url: Option<String>,
    /// Upstream request timeout, in milliseconds
    pub upstream_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STEP_TTL_MS` - Step record lifetime (default: 60000)
    /// - `SESSION_TTL_MS` - Current-step pointer lifetime (default: 1800000)
    /// - `SWEEP_INTERVAL_MS` - Expiry sweep frequency (default: 10000)
    /// - `DEFAULT_CACHE_TTL_MS` - Fallback API cache TTL (default: 300000)
    /// - `STALE_WHILE_REVALIDATE` - `true` or `false` (default: true)
    /// - `STALE_RETENTION_MS` - Stale API entry retention (default: 3600000)
    /// - `SUBMIT_MAX_ATTEMPTS` - Submission attempts (default: 3)
    /// - `SUBMIT_BASE_DELAY_MS` - Submission backoff base (default: 1000)
    /// - `SIMULATED_FAILURE_RATE` - Simulated failure share (default: 0.1)
    /// - `SIMULATED_LATENCY_MS` - Simulated submission latency (default: 200)
    /// - `STORAGE_PATH` - Storage file (default: unset, in memory)
    /// - `STORAGE_QUOTA_BYTES` - Storage quota (default: 5242880)
    /// - `UPSTREAM_URL` - Studio backend base URL (default: unset)
    /// - `UPSTREAM_TIMEOUT_MS` - Upstream timeout (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            step_ttl_ms: parse_env("STEP_TTL_MS", defaults.step_ttl_ms),
            session_ttl_ms: parse_env("SESSION_TTL_MS", defaults.session_ttl_ms),
            sweep_interval_ms: parse_env("SWEEP_INTERVAL_MS", defaults.sweep_interval_ms),
            default_cache_ttl_ms: parse_env("DEFAULT_CACHE_TTL_MS", defaults.default_cache_ttl_ms),
            stale_while_revalidate: parse_env(
                "STALE_WHILE_REVALIDATE",
                defaults.stale_while_revalidate,
            ),
            stale_retention_ms: parse_env("STALE_RETENTION_MS", defaults.stale_retention_ms),
            submit_max_attempts: parse_env("SUBMIT_MAX_ATTEMPTS", defaults.submit_max_attempts),
            submit_base_delay_ms: parse_env("SUBMIT_BASE_DELAY_MS", defaults.submit_base_delay_ms),
            simulated_failure_rate: parse_env(
                "SIMULATED_FAILURE_RATE",
                defaults.simulated_failure_rate,
            ),
            simulated_latency_ms: parse_env("SIMULATED_LATENCY_MS", defaults.simulated_latency_ms),
            storage_path: non_empty_env("STORAGE_PATH").map(PathBuf::from),
            storage_quota_bytes: parse_env("STORAGE_QUOTA_BYTES", defaults.storage_quota_bytes),
            upstream_url: non_empty_env("UPSTREAM_URL"),
            upstream_timeout_ms: parse_env("UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout_ms),
        }
    }

    pub fn wizard_settings(&self) -> WizardSettings {
        WizardSettings {
            step_ttl_ms: self.step_ttl_ms.max(1),
            session_ttl_ms: self.session_ttl_ms.max(1),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.submit_max_attempts,
            Duration::from_millis(self.submit_base_delay_ms),
        )
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy::new(self.default_cache_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }

    pub fn stale_retention(&self) -> Duration {
        Duration::from_millis(self.stale_retention_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            step_ttl_ms: 60_000,
            session_ttl_ms: 1_800_000,
            sweep_interval_ms: 10_000,
            default_cache_ttl_ms: 300_000,
            stale_while_revalidate: true,
            stale_retention_ms: 3_600_000,
            submit_max_attempts: 3,
            submit_base_delay_ms: 1_000,
            simulated_failure_rate: 0.1,
            simulated_latency_ms: 200,
            storage_path: None,
            storage_quota_bytes: 5 * 1024 * 1024,
            upstream_url: None,
            upstream_timeout_ms: 5_000,
        }
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
