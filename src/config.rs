// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use clap::{Args, ValueEnum};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("error backoff base ({base}s) must not exceed the maximum ({max}s)")]
    BackoffRange { base: u64, max: u64 },
    #[error("store timeout must be greater than zero")]
    ZeroStoreTimeout,
}

/// Settings shared by both controllers.
#[derive(Debug, Clone, Args)]
pub struct ControllerConfig {
    /// Only watch objects in this namespace (all namespaces when unset)
    #[arg(long, env = "LUNAR_NAMESPACE")]
    pub namespace: Option<String>,

    /// Delay before re-checking an object after the controller changed it
    #[arg(long, env = "LUNAR_REQUEUE_AFTER_SECS", default_value_t = 1)]
    pub requeue_after_secs: u64,

    /// First retry delay after a failed reconcile; doubles on every further failure
    #[arg(long, env = "LUNAR_ERROR_BACKOFF_BASE_SECS", default_value_t = 1)]
    pub error_backoff_base_secs: u64,

    /// Upper bound for the retry delay after failed reconciles
    #[arg(long, env = "LUNAR_ERROR_BACKOFF_MAX_SECS", default_value_t = 300)]
    pub error_backoff_max_secs: u64,

    /// Deadline for every call to the API server
    #[arg(long, env = "LUNAR_STORE_TIMEOUT_SECS", default_value_t = 30)]
    pub store_timeout_secs: u64,

    /// Objects reconciled in parallel per controller (0 means unbounded)
    #[arg(long, env = "LUNAR_CONCURRENCY", default_value_t = 0)]
    pub concurrency: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            namespace: None,
            requeue_after_secs: 1,
            error_backoff_base_secs: 1,
            error_backoff_max_secs: 300,
            store_timeout_secs: 30,
            concurrency: 0,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.error_backoff_base_secs > self.error_backoff_max_secs {
            return Err(ConfigError::BackoffRange {
                base: self.error_backoff_base_secs,
                max: self.error_backoff_max_secs,
            });
        }
        if self.store_timeout_secs == 0 {
            return Err(ConfigError::ZeroStoreTimeout);
        }
        Ok(())
    }

    pub fn requeue_after(&self) -> Duration {
        Duration::from_secs(self.requeue_after_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Retry delay after the `failures`-th consecutive failure (1-based).
    pub fn error_backoff(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(32);
        let secs = self
            .error_backoff_base_secs
            .saturating_mul(1u64 << exponent)
            .min(self.error_backoff_max_secs);
        Duration::from_secs(secs)
    }
}
