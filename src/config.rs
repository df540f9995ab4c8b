// src/config.rs
//
// Runtime configuration for the S3 client, resolved from the environment.

use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_OPERATION_TIMEOUT_SECS,
    ENV_CA_BUNDLE_PATH, ENV_ENDPOINT_URL, ENV_OPERATION_TIMEOUT_SECS, ENV_REGION, ENV_RT_THREADS,
    MAX_RUNTIME_THREADS, MIN_RUNTIME_THREADS,
};

/// Output formats understood by the renderers. CLI shows cli, csv, json.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ViewType {
    #[default]
    Cli,
    Csv,
    Json,
}

/// Connection parameters used by `S3ObjectClient::connect`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Explicit region; `None` defers to the AWS provider chain, then `us-east-1`.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services; forces path-style addressing.
    pub endpoint_url: Option<String>,
    /// PEM bundle used as the only trust root when set.
    pub ca_bundle_path: Option<PathBuf>,
    pub operation_timeout: Duration,
    pub connect_timeout: Duration,
    /// Worker threads of the global runtime behind the blocking helpers.
    pub runtime_threads: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            ca_bundle_path: None,
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            runtime_threads: default_runtime_threads(),
        }
    }
}

impl ClientConfig {
    /// Load `.env` (if any) and read the configuration from the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source. Empty values
    /// count as unset; unparsable numbers fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            region: get(ENV_REGION),
            endpoint_url: get(ENV_ENDPOINT_URL),
            ca_bundle_path: get(ENV_CA_BUNDLE_PATH).map(PathBuf::from),
            operation_timeout: get(ENV_OPERATION_TIMEOUT_SECS)
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.operation_timeout),
            connect_timeout: defaults.connect_timeout,
            runtime_threads: get(ENV_RT_THREADS)
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.runtime_threads),
        }
    }
}

/// Two threads per core, clamped to a sane range.
fn default_runtime_threads() -> usize {
    (num_cpus::get() * 2).clamp(MIN_RUNTIME_THREADS, MAX_RUNTIME_THREADS)
}
