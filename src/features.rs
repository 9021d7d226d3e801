//! Feature flags for optional scoring behaviors.
//!
//! Features can be enabled via:
//! - CLI: `--features strict-security`
//! - Environment: `PYREFINE_FEATURES=strict-security`

use std::collections::HashSet;
use std::env;
use std::sync::OnceLock;

use clap::ValueEnum;
use log::warn;
use serde::{Deserialize, Serialize};

/// Available feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Cap the security category when the scanner could not run, instead of
    /// crediting an unverified scan with full marks.
    StrictSecurity,
}

impl Feature {
    /// Check if this feature is enabled in the global config.
    pub fn is_enabled(&self) -> bool {
        Features::global().is_enabled(*self)
    }
}

/// Collection of enabled features.
#[derive(Debug, Clone, Default)]
pub struct Features {
    enabled: HashSet<Feature>,
}

static GLOBAL_FEATURES: OnceLock<Features> = OnceLock::new();

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from `PYREFINE_FEATURES`.
    pub fn from_env() -> Self {
        match env::var("PYREFINE_FEATURES") {
            Ok(value) => Self::parse_list(&value),
            Err(_) => Self::new(),
        }
    }

    /// Parse a comma separated list, skipping unknown names.
    pub fn parse_list(value: &str) -> Self {
        let mut features = Self::new();
        for name in value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
            match Feature::from_str(name, true) {
                Ok(feature) => features.enable(feature),
                Err(_) => warn!("Unknown feature '{}' in PYREFINE_FEATURES", name),
            }
        }
        features
    }

    pub fn enable(&mut self, feature: Feature) {
        self.enabled.insert(feature);
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }

    /// Merge with CLI overrides.
    pub fn with_overrides(mut self, cli_features: Option<&[Feature]>) -> Self {
        for feature in cli_features.unwrap_or_default() {
            self.enable(*feature);
        }
        self
    }

    /// Get the global feature configuration.
    pub fn global() -> &'static Features {
        GLOBAL_FEATURES.get_or_init(Features::from_env)
    }

    /// Initialize the global feature configuration.
    /// Should be called once at startup with CLI overrides.
    pub fn init_global(features: Features) {
        let _ = GLOBAL_FEATURES.set(features);
    }
}
