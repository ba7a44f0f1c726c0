//! Environment-driven configuration for the benchmark driver.
//!
//! Mirrors the driver's command surface: absent variables take defaults,
//! malformed variables are reported instead of silently ignored.

use std::env;
use std::num::ParseIntError;

use thiserror::Error;

use crate::trace::warn;

/// Values transferred per queue when `ITERATIONS` is unset.
pub const DEFAULT_ITERATIONS: usize = 1_000_000;

/// CPU the producer thread is pinned to when `PRODUCER_CPU` is unset.
pub const DEFAULT_PRODUCER_CPU: usize = 0;

/// CPU the consumer thread is pinned to when `CONSUMER_CPU` is unset.
pub const DEFAULT_CONSUMER_CPU: usize = 2;

/// Error reading benchmark configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but didn't parse as an integer.
    #[error("invalid value {value:?} for {name}: {source}")]
    InvalidVar {
        name: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// An environment variable was set to non-unicode bytes.
    #[error("{name} is not valid unicode")]
    NotUnicode { name: &'static str },
}

/// Benchmark driver settings.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Number of values each benchmark transfers end to end.
    pub iterations: usize,
    /// CPU to pin the producer thread to, if any.
    pub producer_cpu: Option<usize>,
    /// CPU to pin the consumer thread to, if any.
    pub consumer_cpu: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            producer_cpu: Some(DEFAULT_PRODUCER_CPU),
            consumer_cpu: Some(DEFAULT_CONSUMER_CPU),
        }
    }
}

impl BenchConfig {
    /// Reads the configuration from `ITERATIONS`, `PRODUCER_CPU` and
    /// `CONSUMER_CPU`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let iterations = parse_var("ITERATIONS")?.unwrap_or(DEFAULT_ITERATIONS);
        let producer_cpu = parse_var("PRODUCER_CPU")?.or(Some(DEFAULT_PRODUCER_CPU));
        let consumer_cpu = parse_var("CONSUMER_CPU")?.or(Some(DEFAULT_CONSUMER_CPU));

        if let (Some(p), Some(c)) = (producer_cpu, consumer_cpu)
            && p == c
        {
            warn!("producer and consumer both pinned to CPU {p}");
        }

        Ok(Self {
            iterations,
            producer_cpu,
            consumer_cpu,
        })
    }
}

fn parse_var(name: &'static str) -> Result<Option<usize>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|source| ConfigError::InvalidVar {
                name,
                value,
                source,
            }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { name }),
    }
}
