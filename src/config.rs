//! Refinement and analysis settings.
//!
//! Read from the environment, then overridden by CLI flags:
//! - `PYREFINE_MAX_ITERATIONS` (default 8)
//! - `PYREFINE_PLATEAU_THRESHOLD` (default 1.0)
//! - `PYREFINE_SCAN_TIMEOUT_SECS` (default 10, at most 30)
//! - `PYREFINE_BANDIT` (default `bandit`)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::analysis::signals::DEFAULT_SCAN_TIMEOUT;

pub const DEFAULT_MAX_ITERATIONS: u32 = 8;
pub const DEFAULT_PLATEAU_THRESHOLD: f64 = 1.0;
pub const DEFAULT_BANDIT_PROGRAM: &str = "bandit";
/// Upper bound on a single security scan.
pub const MAX_SCAN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct RefineConfig {
    pub max_iterations: u32,
    /// Smallest score gain that still counts as progress.
    pub plateau_threshold: f64,
    pub scan_timeout: Duration,
    pub bandit_program: String,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            plateau_threshold: DEFAULT_PLATEAU_THRESHOLD,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            bandit_program: DEFAULT_BANDIT_PROGRAM.to_string(),
        }
    }
}

impl RefineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; invalid values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_iterations: parse_var(&lookup, "PYREFINE_MAX_ITERATIONS")
                .unwrap_or(defaults.max_iterations),
            plateau_threshold: parse_var(&lookup, "PYREFINE_PLATEAU_THRESHOLD")
                .unwrap_or(defaults.plateau_threshold),
            scan_timeout: parse_var(&lookup, "PYREFINE_SCAN_TIMEOUT_SECS")
                .map(|secs| clamp_scan_timeout(Duration::from_secs(secs)))
                .unwrap_or(defaults.scan_timeout),
            bandit_program: lookup("PYREFINE_BANDIT")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.bandit_program),
        }
    }

    /// Merge with CLI overrides. CLI values take precedence.
    pub fn with_overrides(mut self, max_iterations: Option<u32>) -> Self {
        if let Some(n) = max_iterations {
            self.max_iterations = n;
        }
        self
    }
}

fn clamp_scan_timeout(timeout: Duration) -> Duration {
    if timeout > MAX_SCAN_TIMEOUT {
        warn!(
            "Scan timeout {:?} exceeds the {:?} limit, using the limit",
            timeout, MAX_SCAN_TIMEOUT
        );
        MAX_SCAN_TIMEOUT
    } else {
        timeout
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value '{}' for {}", raw, key);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RefineConfig::from_lookup(lookup(&[]));
        assert_eq!(config, RefineConfig::default());
        assert_eq!(config.max_iterations, 8);
        assert_eq!(config.scan_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_env_values() {
        let config = RefineConfig::from_lookup(lookup(&[
            ("PYREFINE_MAX_ITERATIONS", "3"),
            ("PYREFINE_PLATEAU_THRESHOLD", "2.5"),
            ("PYREFINE_SCAN_TIMEOUT_SECS", "30"),
            ("PYREFINE_BANDIT", "/opt/bin/bandit"),
        ]));
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.plateau_threshold, 2.5);
        assert_eq!(config.scan_timeout, Duration::from_secs(30));
        assert_eq!(config.bandit_program, "/opt/bin/bandit");
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = RefineConfig::from_lookup(lookup(&[
            ("PYREFINE_MAX_ITERATIONS", "many"),
            ("PYREFINE_BANDIT", "  "),
        ]));
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.bandit_program, "bandit");
    }

    #[test]
    fn test_scan_timeout_is_capped() {
        let config = RefineConfig::from_lookup(lookup(&[("PYREFINE_SCAN_TIMEOUT_SECS", "120")]));
        assert_eq!(config.scan_timeout, MAX_SCAN_TIMEOUT);

        let config = RefineConfig::from_lookup(lookup(&[("PYREFINE_SCAN_TIMEOUT_SECS", "5")]));
        assert_eq!(config.scan_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_cli_override() {
        let config = RefineConfig::new().with_overrides(Some(2));
        assert_eq!(config.max_iterations, 2);
        assert_eq!(RefineConfig::new().with_overrides(None).max_iterations, 8);
    }
}
